//! CLI command definitions and subcommands

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::models::PackingRequest;

/// Packwise - weather-aware packing plans
#[derive(Debug, Parser)]
#[command(
    name = "packwise",
    about = "Weather-aware outfit and packing plans for your next trip",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Produce a packing plan and print it
    Plan {
        /// Destination, e.g. "Paris, France"
        #[arg(short, long)]
        location: String,

        /// Trip length in days
        #[arg(short, long)]
        days: u32,

        /// Style preferences
        #[arg(short, long, default_value = "")]
        preferences: String,

        /// First day of the trip (YYYY-MM-DD); defaults to today
        #[arg(long, value_name = "DATE")]
        start_date: Option<NaiveDate>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the HTTP API
    Serve {
        /// Port to listen on, overrides the config file
        #[arg(short, long)]
        port: Option<u16>,
    },
}

impl Command {
    /// Build the planner input for `plan`
    #[must_use]
    pub fn packing_request(&self) -> Option<PackingRequest> {
        match self {
            Command::Plan {
                location,
                days,
                preferences,
                start_date,
                ..
            } => {
                let mut request = PackingRequest::new(*days, location.clone(), preferences.clone());
                request.start_date = *start_date;
                Some(request)
            }
            Command::Serve { .. } => None,
        }
    }
}
