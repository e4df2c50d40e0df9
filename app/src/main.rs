mod cli;
mod input;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use diagnos::Predictor;
use log::LevelFilter;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("DIAGNOS_LOG", "error,diagnos=info"))
        .init();

    let matches = cli::build_cli().get_matches();
    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config = input::train_config_from_arguments(matches)?;
    log::info!(
        "Training on {:?} (label column '{}')",
        config.dataset_path,
        config.label_column
    );

    let report = diagnos::run(&config)
        .with_context(|| format!("Training on {:?} failed", config.dataset_path))?;

    println!("✅ {}", report);
    println!(
        "✅ Model and metadata saved to {}",
        config.output_path.display()
    );
    Ok(())
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let model_path = matches
        .get_one::<PathBuf>("model")
        .context("A model path is required")?;
    let symptoms: Vec<&String> = matches
        .get_many::<String>("symptoms")
        .context("At least one symptom is required")?
        .collect();

    let predictor = Predictor::load(model_path)
        .with_context(|| format!("Failed to load model {:?}", model_path))?;
    let prediction = predictor.predict_symptoms(&symptoms)?;

    println!(
        "{} ({:.0}% of trees)",
        prediction.disease,
        prediction.confidence * 100.0
    );
    Ok(())
}
