// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! transit-track: live bus-tracking event stream.
//!
//! Connects to the tracking backend, joins the requested rooms on every
//! connect, and prints each delivered event to stdout as one JSON line.
//! Logs go to stderr.

mod args;
mod error;
mod stream;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use transit_realtime::{
    JsonFilePersistence, NotificationList, NotificationSink, RealtimeClient, SessionStore,
};

use args::Args;
use error::{Error, Result};
use stream::Rooms;

/// Time allowed for the close frame to go out after Ctrl-C.
const CLOSE_GRACE: Duration = Duration::from_millis(200);

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = args.realtime_config()?;
    let token = args.token.clone().ok_or(Error::MissingToken)?;
    let store = Arc::new(SessionStore::hydrated(Some(token)));

    let list = match &args.notifications {
        Some(path) => NotificationList::open(Box::new(JsonFilePersistence::new(path)))?,
        None => NotificationList::in_memory(),
    };

    info!(base_url = %config.base_url, "starting transit-track");
    let client = RealtimeClient::builder(config, store)
        .notification_port(Arc::new(NotificationSink::new(list.clone())))
        .spawn()?;

    let _printers = stream::print_events(&client, &args.event_kinds());
    let _rooms = stream::rejoin_on_connect(
        &client,
        Rooms {
            buses: args.buses.clone(),
            routes: args.routes.clone(),
            area: args.area,
        },
    );

    client.start();

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to wait for Ctrl-C");
    }
    info!("shutting down");
    client.disconnect();
    tokio::time::sleep(CLOSE_GRACE).await;

    info!(
        stored = list.len(),
        unread = list.unread_count(),
        "notifications"
    );
    Ok(())
}
