//! RideTrack CLI - Command-line interface
//!
//! Runs live tracking sessions and one-shot mapping queries on top of the
//! ridetrack library.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use ridetrack::coord::Coordinate;

use commands::common::RoleArg;
use commands::config::ConfigCommands;
use commands::track::TrackArgs;

#[derive(Parser)]
#[command(name = "ridetrack")]
#[command(version = ridetrack::VERSION)]
#[command(about = "Live rider/driver tracking with ETAs and route previews", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a tracking session and print view changes
    Track {
        /// Replay a GPS path from a file of "lat,lng" lines
        #[arg(long, value_name = "FILE", conflicts_with = "demo")]
        replay: Option<String>,

        /// Replay a built-in path against an in-process server
        #[arg(long)]
        demo: bool,

        /// Route destination as "lat,lng"
        #[arg(long, allow_hyphen_values = true)]
        destination: Option<Coordinate>,

        /// Override the configured role
        #[arg(long, value_enum)]
        role: Option<RoleArg>,

        /// Seconds between replayed fixes
        #[arg(long, default_value = "1")]
        cadence: u64,

        /// Stop after this many seconds (default: run until Ctrl-C)
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Search places by text
    Search {
        /// Free-form query (at least 2 characters)
        query: String,
    },

    /// Look up a place by id
    Place {
        place_id: String,
    },

    /// Reverse geocode a coordinate
    Geocode {
        /// Coordinate as "lat,lng"
        #[arg(allow_hyphen_values = true)]
        coordinate: Coordinate,
    },

    /// Traffic-aware driving ETA between two coordinates
    Eta {
        #[arg(allow_hyphen_values = true)]
        from: Coordinate,
        #[arg(allow_hyphen_values = true)]
        to: Coordinate,
    },

    /// Driving route between two coordinates
    Route {
        #[arg(allow_hyphen_values = true)]
        from: Coordinate,
        #[arg(allow_hyphen_values = true)]
        to: Coordinate,

        /// Print every decoded point
        #[arg(long)]
        points: bool,
    },

    /// Decode an encoded polyline
    Decode {
        polyline: String,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Track {
            replay,
            demo,
            destination,
            role,
            cadence,
            duration,
        } => commands::track::run(TrackArgs {
            replay,
            demo,
            destination,
            role,
            cadence,
            duration,
            debug: cli.debug,
        }),
        Commands::Search { query } => commands::maps::run_search(&query, cli.debug),
        Commands::Place { place_id } => commands::maps::run_place(&place_id, cli.debug),
        Commands::Geocode { coordinate } => commands::maps::run_geocode(coordinate, cli.debug),
        Commands::Eta { from, to } => commands::maps::run_eta(from, to, cli.debug),
        Commands::Route { from, to, points } => {
            commands::maps::run_route(from, to, points, cli.debug)
        }
        Commands::Decode { polyline } => commands::maps::run_decode(&polyline),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
