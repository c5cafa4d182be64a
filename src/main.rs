use std::process::ExitCode;

use clap::Parser;
use ridgeline::cli::CliArgs;
use ridgeline::config::Params;
use ridgeline::error::{Error, RenderError};
use ridgeline::{logging, render};

fn run(args: &CliArgs) -> Result<(), Error> {
    let mut params = match &args.config {
        Some(path) => Params::load(path)?,
        None => Params::default(),
    };
    params.apply_cli_overrides(args)?;

    tracing::info!(
        mode = ?params.mode,
        depth = params.depth,
        seed = params.seed,
        policy = ?params.seed_policy,
        "generating {}x{} landscape",
        params.width,
        params.height
    );

    let (landscape, _timings) = ridgeline::build(&params)?;

    if let Some(dir) = args.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| RenderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    render::save_png(&args.output, &landscape.rgba, landscape.width, landscape.height)?;
    tracing::info!("saved {}", args.output.display());

    if args.json {
        match serde_json::to_string(&landscape.shape) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!("could not serialize points: {e}"),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    logging::init_logging(args.log_level.as_deref());

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
