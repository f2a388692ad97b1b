//! Packwise - weather-aware packing plans
//!
//! CLI entry point for one-shot plans and the HTTP API.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use packwise::cli::{Cli, Command};
use packwise::config::PackwiseConfig;
use packwise::{PackingPlanner, PackingRequest, PackwiseError, PlannerOptions, create_service, telemetry, web};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<PackwiseError>() {
                Some(err) => eprintln!("Error: {}", err.user_message()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = PackwiseConfig::load_from_path(cli.config.clone())?;
    let _telemetry = telemetry::init(&config.logging, cli.verbose)?;

    let request = cli.command.packing_request();
    match cli.command {
        Command::Plan { json, .. } => {
            let request = request.context("plan command without a request")?;
            plan(&config, request, json).await
        }
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let planner = Arc::new(build_planner(&config)?);
            web::run(&config.server, planner).await
        }
    }
}

fn build_planner(config: &PackwiseConfig) -> Result<PackingPlanner> {
    let model = create_service(config).context("Failed to create model service")?;
    Ok(PackingPlanner::with_options(
        model,
        PlannerOptions::from(&config.pipeline),
    ))
}

async fn plan(config: &PackwiseConfig, request: PackingRequest, json: bool) -> Result<()> {
    request.validate()?;
    let planner = build_planner(config)?;

    info!(location = %request.location, days = request.number_of_days, "Planning trip");
    let result = tokio::select! {
        result = planner.produce_packing_plan(request) => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, abandoning packing plan");
            return Err(PackwiseError::general("Interrupted").into());
        }
    };

    if json {
        let output = serde_json::to_string_pretty(&result).context("Failed to serialize plan")?;
        println!("{output}");
    } else {
        print!("{result}");
    }
    Ok(())
}
