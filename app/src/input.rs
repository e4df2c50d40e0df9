use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use diagnos::TrainConfig;

/// Builds the training config: defaults, then the config file, then CLI flags.
pub fn train_config_from_arguments(matches: &ArgMatches) -> Result<TrainConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => TrainConfig::from_file(path)
            .with_context(|| format!("Failed to load config file: {:?}", path))?,
        None => TrainConfig::default(),
    };

    if let Some(data) = matches.get_one::<PathBuf>("data") {
        config.dataset_path = data.clone();
    }
    if let Some(output) = matches.get_one::<PathBuf>("output") {
        config.output_path = output.clone();
    }
    if let Some(label_column) = matches.get_one::<String>("label_column") {
        config.label_column = label_column.clone();
    }
    if let Some(&test_ratio) = matches.get_one::<f64>("test_ratio") {
        config.test_ratio = test_ratio;
    }
    if let Some(&seed) = matches.get_one::<u64>("seed") {
        config.seed = seed;
    }
    if let Some(&trees) = matches.get_one::<usize>("trees") {
        config.forest.n_trees = trees;
    }

    config.validate().context("Invalid training configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::build_cli;
    use std::io::Write;

    fn train_matches(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["diagnos", "train"];
        argv.extend_from_slice(args);
        let matches = build_cli().try_get_matches_from(argv).unwrap();
        matches.subcommand_matches("train").unwrap().clone()
    }

    #[test]
    fn defaults_without_config() {
        let config = train_config_from_arguments(&train_matches(&[])).unwrap();
        assert_eq!(config, TrainConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"dataset_path": "from_file.csv", "seed": 1, "forest": {{"n_trees": 5}}}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = train_config_from_arguments(&train_matches(&[
            path.as_str(),
            "--data",
            "from_flag.csv",
            "--trees",
            "12",
        ]))
        .unwrap();

        assert_eq!(config.dataset_path, PathBuf::from("from_flag.csv"));
        assert_eq!(config.forest.n_trees, 12);
        assert_eq!(config.seed, 1);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let err =
            train_config_from_arguments(&train_matches(&["--test-ratio", "1.5"])).unwrap_err();
        assert!(format!("{:#}", err).contains("test_ratio"));
    }
}
