//! Parsing Options.
//! `pn --model token-generator -m coverability` or `pn --net net.json -m bounded --state-limit 500`

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgGroup, Command, value_parser};

use crate::analysis::coverability::AncestorPolicy;
use crate::analysis::reachability::ExplorationMode;
use crate::config::ExploreConfig;
use crate::models;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetSource {
    File(PathBuf),
    Model(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn make_options_parser() -> clap::Command {
    Command::new("pn")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Reachability and coverability graphs of place/transition nets")
        .arg(
            Arg::new("net")
                .long("net")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Net description (.json, .ron, .yaml, .toml)"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .value_name("NAME")
                .value_parser(models::NAMES.to_vec())
                .help("Built-in net"),
        )
        .group(
            ArgGroup::new("source")
                .args(["net", "model"])
                .required(true),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_parser(["bounded", "coverability"])
                .help("Exploration mode [config default: coverability]"),
        )
        .arg(
            Arg::new("policy")
                .long("policy")
                .value_parser(["path", "visited"])
                .help("Markings a successor is accelerated against"),
        )
        .arg(
            Arg::new("state-limit")
                .long("state-limit")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Stop after N states, 0 for no limit"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .default_value("pn.toml"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            Arg::new("simulate")
                .long("simulate")
                .value_name("STEPS")
                .value_parser(value_parser!(usize))
                .help("Also play the token game for up to STEPS firings"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .help("Pick enabled transitions at random with this seed"),
        )
        .arg(
            Arg::new("print-net")
                .long("print-net")
                .action(ArgAction::SetTrue)
                .help("Print the parsed net description before exploring"),
        )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub source: NetSource,
    pub config: PathBuf,
    pub format: OutputFormat,
    pub mode: Option<ExplorationMode>,
    pub policy: Option<AncestorPolicy>,
    /// `Some(None)` clears the configured limit.
    pub state_limit: Option<Option<usize>>,
    pub simulate: Option<usize>,
    pub seed: Option<u64>,
    pub print_net: bool,
}

impl Options {
    pub fn parse_from_args(flags: &[String]) -> Result<Self, clap::Error> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;

        let source = match (
            matches.get_one::<PathBuf>("net"),
            matches.get_one::<String>("model"),
        ) {
            (Some(path), _) => NetSource::File(path.clone()),
            (None, Some(name)) => NetSource::Model(name.clone()),
            (None, None) => {
                return Err(make_options_parser().error(
                    clap::error::ErrorKind::MissingRequiredArgument,
                    "one of --net or --model is required",
                ));
            }
        };

        let mode = match matches.get_one::<String>("mode").map(String::as_str) {
            Some("bounded") => Some(ExplorationMode::Bounded),
            Some("coverability") => Some(ExplorationMode::Coverability),
            _ => None,
        };
        let policy = match matches.get_one::<String>("policy").map(String::as_str) {
            Some("path") => Some(AncestorPolicy::Path),
            Some("visited") => Some(AncestorPolicy::Visited),
            _ => None,
        };
        let format = match matches.get_one::<String>("format").map(String::as_str) {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        };
        let state_limit = matches
            .get_one::<usize>("state-limit")
            .map(|&limit| (limit > 0).then_some(limit));

        Ok(Options {
            source,
            config: matches
                .get_one::<PathBuf>("config")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("pn.toml")),
            format,
            mode,
            policy,
            state_limit,
            simulate: matches.get_one::<usize>("simulate").copied(),
            seed: matches.get_one::<u64>("seed").copied(),
            print_net: matches.get_flag("print-net"),
        })
    }

    /// Command-line flags take precedence over the loaded file.
    pub fn apply(&self, config: &mut ExploreConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(limit) = self.state_limit {
            config.state_limit = limit;
        }
        if let Some(steps) = self.simulate {
            config.simulation_steps = Some(steps);
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
    }
}
