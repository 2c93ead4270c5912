//! One-shot routing decision utility
//!
//! Loads a router configuration (with its agent roster), reads a raw task
//! profile from a JSON file or inline string, runs one routing decision, and
//! prints the resulting selection as JSON. Handy for experimenting with
//! strategies and for validating a roster before deploying it.
//!
//! ## Usage
//!
//! ```bash
//! # Route a profile file against a config
//! route-task --config router.toml --profile task.json
//!
//! # Inline profile
//! route-task --config router.toml \
//!   --profile-json '{"urgency": "high", "domain": "gaming-security"}'
//!
//! # Human-readable output
//! route-task --config router.toml --profile task.json --pretty
//! ```

use clap::Parser;
use flowroute::config::RouterConfig;
use flowroute::observability::init_default_logging;
use flowroute::profile::RawTaskProfile;
use flowroute::router::TaskRouter;
use std::path::PathBuf;
use std::process;
use tracing::error;

#[derive(Parser)]
#[command(
    name = "route-task",
    about = "Run one routing decision against a configured agent roster",
    version
)]
struct Args {
    /// Router configuration file (TOML, includes the agent roster)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Raw task profile as a JSON file
    #[arg(long, value_name = "FILE", conflicts_with = "profile_json")]
    profile: Option<PathBuf>,

    /// Raw task profile as an inline JSON string
    #[arg(long, value_name = "JSON")]
    profile_json: Option<String>,

    /// Pretty-print the selection result
    #[arg(long)]
    pretty: bool,
}

fn main() {
    init_default_logging();
    let args = Args::parse();

    let config = match RouterConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let raw = match load_profile(&args) {
        Ok(raw) => raw,
        Err(message) => {
            error!("{}", message);
            process::exit(1);
        }
    };

    let router = match TaskRouter::from_config(config) {
        Ok(router) => router,
        Err(e) => {
            error!("Failed to build router: {}", e);
            process::exit(1);
        }
    };

    match router.route(&raw) {
        Ok(selection) => {
            let rendered = if args.pretty {
                serde_json::to_string_pretty(&selection)
            } else {
                serde_json::to_string(&selection)
            };
            match rendered {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    error!("Failed to render selection: {}", e);
                    process::exit(1);
                }
            }
        }
        Err(e) => {
            error!("Routing failed: {}", e);
            process::exit(2);
        }
    }
}

fn load_profile(args: &Args) -> Result<RawTaskProfile, String> {
    if let Some(json) = &args.profile_json {
        return serde_json::from_str(json).map_err(|e| format!("Invalid profile JSON: {e}"));
    }
    if let Some(path) = &args.profile {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read profile file: {e}"))?;
        return serde_json::from_str(&contents)
            .map_err(|e| format!("Invalid profile JSON in {}: {e}", path.display()));
    }
    // No profile given: route with an empty record, everything defaulted.
    Ok(RawTaskProfile::default())
}
