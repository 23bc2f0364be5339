mod logging;
mod metadata;
mod settings;

use fiber_plan_lib::{PlanError, Planner, input};
use settings::Settings;
use std::process::ExitCode;

/// Errors surfaced by the planner binary
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    logging::setup_logging();
    metadata::log_version_info();

    let settings = Settings::from_cli();
    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> Result<(), CliError> {
    let material = settings.material_spec();
    material.validate()?;
    let planner = Planner::new(settings.plan_config())?;

    let plan_input = input::load_from_files(settings.gpx_files.clone())?;
    tracing::info!(
        "Loaded {} feeder routes and {} cabinets from {} file(s)",
        plan_input.routes.len(),
        plan_input.origins.len(),
        settings.gpx_files.len()
    );

    let plan = planner.run(plan_input.routes, plan_input.origins)?;

    if settings.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("{}", plan.material_report(&material));
    }
    Ok(())
}
