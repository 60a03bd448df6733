use clap::{Arg, ArgAction, Command, ValueHint};
use std::path::PathBuf;

pub fn build_cli() -> Command {
    Command::new("appraise")
        .version(clap::crate_version!())
        .about("\u{1F3E0} appraise - train and compare house-price regression models")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Split a dataset, train every configured strategy and write the models")
                .arg(
                    Arg::new("config")
                        .help("Path to the JSON run configuration. Defaults are used when omitted.")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("input")
                        .short('i')
                        .long("input")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the labeled dataset (*.csv or *.tsv). \
                             Overrides the input file specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output-dir")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help(
                            "Directory that receives one sub-directory per strategy. \
                             Overrides the output directory specified in the configuration file.",
                        )
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("seed")
                        .short('s')
                        .long("seed")
                        .value_parser(clap::value_parser!(u64))
                        .help("Seed of the train/test split."),
                )
                .arg(
                    Arg::new("train_ratio")
                        .short('r')
                        .long("train-ratio")
                        .value_parser(clap::value_parser!(f64))
                        .help("Fraction of records used for training, strictly between 0 and 1."),
                )
                .arg(
                    Arg::new("timeout")
                        .short('t')
                        .long("timeout")
                        .value_parser(clap::value_parser!(u64))
                        .help("Per-strategy fit timeout in seconds."),
                )
                .arg(
                    Arg::new("threads")
                        .long("threads")
                        .value_parser(clap::value_parser!(usize))
                        .help("Number of worker threads. Defaults to one per core."),
                )
                .arg(
                    Arg::new("model")
                        .short('m')
                        .long("model")
                        .action(ArgAction::Append)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Strategy to train with default hyper-parameters \
                             (linear, decision_tree, random_forest, gbt). Repeat to train several. \
                             Replaces the strategies of the configuration file.",
                        )
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("stats")
                .about("Log descriptive statistics and the feature correlation matrix of a dataset")
                .arg(
                    Arg::new("data")
                        .help("Path to the labeled dataset (*.csv or *.tsv)")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Score a saved model against a labeled dataset")
                .arg(
                    Arg::new("model_path")
                        .short('m')
                        .long("model")
                        .required(true)
                        .help("Path to a saved model artifact (model.json)")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data")
                        .help("Path to the labeled dataset (*.csv or *.tsv)")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Write label and prediction per record to this file (*.csv or *.tsv)")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
}
