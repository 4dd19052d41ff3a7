// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker daemon configuration

use chrono_tz::Tz;
use clap::Parser;
use std::time::Duration;

/// Command line arguments for `hjd`
#[derive(Parser, Debug)]
#[command(name = "hjd", about = "Heron Jobs worker daemon", version)]
pub struct Args {
    /// Port for the dashboard and health endpoints
    #[arg(long, env = "PORT", default_value_t = 4100)]
    pub port: u16,

    /// Default IANA timezone for schedules that do not pin one
    #[arg(long, default_value = "UTC")]
    pub timezone: String,

    /// Graceful shutdown deadline in seconds
    #[arg(long, default_value_t = 30)]
    pub shutdown_timeout: u64,
}

/// Resolved daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub default_timezone: Tz,
    pub shutdown_timeout: Duration,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, String> {
        let default_timezone: Tz = args
            .timezone
            .parse()
            .map_err(|_| format!("unknown timezone: '{}'", args.timezone))?;
        Ok(Self {
            port: args.port,
            default_timezone,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let args = Args::parse_from(["hjd"]);
        let config = Config::from_args(args).unwrap();
        assert_eq!(config.port, 4100);
        assert_eq!(config.default_timezone, chrono_tz::UTC);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
    }

    #[test]
    fn parses_timezone_flag() {
        let args = Args::parse_from(["hjd", "--timezone", "America/New_York", "--port", "9000"]);
        let config = Config::from_args(args).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.default_timezone, chrono_tz::America::New_York);
    }

    #[test]
    fn rejects_unknown_timezone() {
        let args = Args::parse_from(["hjd", "--timezone", "Nowhere/Atlantis"]);
        let err = Config::from_args(args).unwrap_err();
        assert!(err.contains("Nowhere/Atlantis"));
    }
}
