use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, ValueHint};

pub fn build_cli() -> Command {
    Command::new("diagnos")
        .version(clap::crate_version!())
        .about("Train a symptom/disease classifier and predict diseases from symptoms")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train a random forest on a symptom/disease CSV and save the model")
                .arg(
                    Arg::new("config")
                        .help("Path to a JSON training configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .help(
                            "Path to the training CSV. Overrides the dataset path \
                             specified in the configuration file.",
                        )
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(
                            "File the trained model is written to. \
                             Overrides the output path specified in the configuration file.",
                        )
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("label_column")
                        .long("label-column")
                        .help("Name of the column holding the disease label")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("test_ratio")
                        .long("test-ratio")
                        .help("Share of rows held out for evaluation")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the train/test split and the forest")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("trees")
                        .long("trees")
                        .help("Number of trees in the forest")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Predict a disease from a list of symptoms using a trained model")
                .arg(
                    Arg::new("model")
                        .short('m')
                        .long("model")
                        .help("Path to the trained model file")
                        .default_value(diagnos::config::DEFAULT_ARTIFACT)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("symptoms")
                        .help("Symptoms present, named exactly as the training columns")
                        .required(true)
                        .action(ArgAction::Append)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        build_cli().debug_assert();
    }

    #[test]
    fn predict_collects_symptoms() {
        let matches = build_cli()
            .try_get_matches_from(["diagnos", "predict", "Fever", "Cough"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "predict");
        let symptoms: Vec<&String> = sub.get_many::<String>("symptoms").unwrap().collect();
        assert_eq!(symptoms, ["Fever", "Cough"]);
        assert_eq!(
            sub.get_one::<PathBuf>("model").unwrap(),
            &PathBuf::from("model/disease_model.json")
        );
    }

    #[test]
    fn predict_requires_symptoms() {
        assert!(build_cli().try_get_matches_from(["diagnos", "predict"]).is_err());
    }
}
