// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use transit_core::{AreaBounds, EventKind};
use transit_realtime::RealtimeConfig;

use crate::error::Result;

/// transit-track: stream live bus-tracking events as JSON lines
#[derive(Parser, Debug)]
#[command(name = "transit-track", version)]
#[command(about = "Stream live bus-tracking events as JSON lines")]
pub struct Args {
    /// TOML config file
    #[arg(short, long, env = "TRANSIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend base URL (ws:// or wss://), overrides the config file
    #[arg(long, env = "TRANSIT_WS_URL")]
    pub url: Option<String>,

    /// Bearer token for the WebSocket session
    #[arg(long, env = "TRANSIT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Join a bus room on every connect (repeatable)
    #[arg(long = "bus", value_name = "ID")]
    pub buses: Vec<String>,

    /// Join a route room on every connect (repeatable)
    #[arg(long = "route", value_name = "ID")]
    pub routes: Vec<String>,

    /// Subscribe to an area on every connect
    #[arg(long, value_name = "N,S,E,W", value_parser = parse_area, allow_hyphen_values = true)]
    pub area: Option<AreaBounds>,

    /// Persist pushed notifications to this JSON file
    #[arg(long, value_name = "PATH")]
    pub notifications: Option<PathBuf>,

    /// Event kinds to print (default: all)
    #[arg(long, value_name = "KIND,...", value_delimiter = ',', value_parser = parse_kind)]
    pub events: Vec<EventKind>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Loads the config file, if any, and applies command-line overrides.
    pub fn realtime_config(&self) -> Result<RealtimeConfig> {
        let mut config = match &self.config {
            Some(path) => RealtimeConfig::load(path)?,
            None => RealtimeConfig::default(),
        };
        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        config.validate()?;
        Ok(config)
    }

    /// Event kinds to print.
    pub fn event_kinds(&self) -> Vec<EventKind> {
        if self.events.is_empty() {
            EventKind::ALL.to_vec()
        } else {
            self.events.clone()
        }
    }
}

/// Parses `north,south,east,west`.
pub fn parse_area(s: &str) -> std::result::Result<AreaBounds, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [north, south, east, west] = parts.as_slice() else {
        return Err(format!(
            "expected 4 comma-separated values (north,south,east,west), got {}",
            parts.len()
        ));
    };
    let number = |name: &str, value: &str| {
        value
            .parse::<f64>()
            .map_err(|_| format!("invalid {} bound '{}'", name, value))
    };
    let bounds = AreaBounds {
        north: number("north", north)?,
        south: number("south", south)?,
        east: number("east", east)?,
        west: number("west", west)?,
    };
    if bounds.north < bounds.south {
        return Err(format!(
            "north ({}) must not be below south ({})",
            bounds.north, bounds.south
        ));
    }
    Ok(bounds)
}

fn parse_kind(s: &str) -> std::result::Result<EventKind, String> {
    s.parse::<EventKind>().map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
