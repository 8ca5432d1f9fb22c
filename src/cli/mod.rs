//! CLI command definitions and handlers

mod assess;
mod group;
mod health;
mod init;
mod input;
mod rules;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use repolens::config::{load_config, load_config_file, EngineConfig, UserConfig};
use repolens::engine::build_llm;
use repolens::grouping::DEFAULT_THEME;
use repolens::Engine;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::reporters::OutputFormat;

const DEFAULT_WORKERS: usize = 8;
const DEFAULT_RULE_SET: &str = "general";
const DEFAULT_MIN_SCORE: f64 = 70.0;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// Parse a score threshold in [0, 100]
fn parse_score(s: &str) -> Result<f64, String> {
    let n: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if (0.0..=100.0).contains(&n) {
        Ok(n)
    } else {
        Err("score must be between 0 and 100".to_string())
    }
}

/// repolens - classify and audit a repository portfolio
#[derive(Parser, Debug)]
#[command(name = "repolens")]
#[command(
    version,
    about = "Topics, categories and health grades for a portfolio of repositories",
    long_about = "repolens reads repository snapshots (the JSON a code-hosting API returns, \
one object or an array) and classifies each repository into a category with a curated \
topic list, then scores it against a named health rule set.\n\n\
Rule-based classification always runs. An LLM can be enabled in repolens.toml as a \
second opinion; when it is unreachable the rule-based result is used unchanged.",
    after_help = "\
Examples:
  repolens classify repos.json                  Categories and topics
  repolens health repos.json --rules academic   Health grades with a portfolio summary
  repolens assess repo.json --format json       Everything, as JSON
  repolens group repos.json --theme resume      Theme-ordered category groups
  repolens rules                                List rule sets"
)]
pub struct Cli {
    /// Config file (default: repolens.toml or .repolensrc.json in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel workers (1-64)
    #[arg(long, global = true, value_parser = parse_workers)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output flags shared by the reporting commands
#[derive(clap::Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format: text, json
    #[arg(long, short = 'f', value_parser = ["text", "json"])]
    pub format: Option<String>,

    /// Output file path (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an example repolens.toml
    Init {
        /// Directory to write into
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Also create the user config (~/.config/repolens/config.toml)
        #[arg(long)]
        user: bool,
    },

    /// Classify repositories into a category and topics
    Classify {
        /// Snapshot JSON file (one object or an array), or - for stdin
        input: PathBuf,

        /// Rule-based classification only
        #[arg(long)]
        no_llm: bool,

        /// Grouping theme (portfolio, research, educational, resume)
        #[arg(long)]
        theme: Option<String>,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Score repositories against a health rule set
    Health {
        /// Snapshot JSON file (one object or an array), or - for stdin
        input: PathBuf,

        /// Rule set name (see `repolens rules`)
        #[arg(long)]
        rules: Option<String>,

        /// Portfolio pass threshold
        #[arg(long, value_parser = parse_score)]
        min_score: Option<f64>,

        /// Only show repositories scoring below --min-score
        #[arg(long)]
        only_failed: bool,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Classification, health and proposals in one record
    Assess {
        /// Snapshot JSON file (one object or an array), or - for stdin
        input: PathBuf,

        /// Rule set name (see `repolens rules`)
        #[arg(long)]
        rules: Option<String>,

        /// Rule-based classification only
        #[arg(long)]
        no_llm: bool,

        /// Grouping theme (portfolio, research, educational, resume)
        #[arg(long)]
        theme: Option<String>,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Group repositories by category in a theme's display order
    Group {
        /// Snapshot JSON file (one object or an array), or - for stdin
        input: PathBuf,

        /// Grouping theme (portfolio, research, educational, resume)
        #[arg(long)]
        theme: Option<String>,

        /// Rule-based classification only
        #[arg(long)]
        no_llm: bool,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// List registered rule sets and their rules
    Rules {
        /// Output format: text, json
        #[arg(long, short = 'f', value_parser = ["text", "json"])]
        format: Option<String>,
    },
}

/// Loaded configuration plus the engine built from it
pub(crate) struct Session {
    pub engine: Engine,
    pub config: EngineConfig,
    pub workers: usize,
}

impl Session {
    /// Load config and build the engine; attaches the LLM when enabled and `use_llm`
    fn open(cli: &CliGlobals, use_llm: bool) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => load_config_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => load_config(Path::new(".")).context("Failed to load project config")?,
        };

        let mut engine = Engine::new(&config).context("Invalid configuration")?;
        if use_llm && config.llm.enabled {
            let llm = UserConfig::load()
                .map_err(|e| e.to_string())
                .and_then(|user| {
                    build_llm(&config.llm, &user, config.max_topics).map_err(|e| e.to_string())
                });
            match llm {
                Ok(llm) => engine = engine.with_llm(llm),
                Err(e) => warn!("LLM classification disabled: {}", e),
            }
        }

        let workers = cli
            .workers
            .or(config.defaults.workers)
            .unwrap_or(DEFAULT_WORKERS);
        Ok(Self {
            engine,
            config,
            workers,
        })
    }

    pub fn format(&self, flag: Option<&str>) -> Result<OutputFormat> {
        flag.or(self.config.defaults.format.as_deref())
            .unwrap_or("text")
            .parse()
    }

    pub fn theme(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.config.defaults.theme.clone())
            .unwrap_or_else(|| DEFAULT_THEME.to_string())
    }

    pub fn rule_set(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.config.defaults.rule_set.clone())
            .unwrap_or_else(|| DEFAULT_RULE_SET.to_string())
    }

    pub fn min_score(&self, flag: Option<f64>) -> f64 {
        flag.or(self.config.defaults.min_score)
            .unwrap_or(DEFAULT_MIN_SCORE)
    }
}

/// Global flags, detached from the subcommand
struct CliGlobals {
    config: Option<PathBuf>,
    workers: Option<usize>,
}

pub fn run(cli: Cli) -> Result<()> {
    let globals = CliGlobals {
        config: cli.config,
        workers: cli.workers,
    };

    match cli.command {
        Commands::Init { path, user } => init::run(&path, user),

        Commands::Classify {
            input,
            no_llm,
            theme,
            out,
        } => {
            let session = Session::open(&globals, !no_llm)?;
            assess::run(&session, &input, None, theme, &out)
        }

        Commands::Health {
            input,
            rules,
            min_score,
            only_failed,
            out,
        } => {
            let session = Session::open(&globals, false)?;
            health::run(&session, &input, rules, min_score, only_failed, &out)
        }

        Commands::Assess {
            input,
            rules,
            no_llm,
            theme,
            out,
        } => {
            let session = Session::open(&globals, !no_llm)?;
            let rule_set = session.rule_set(rules);
            assess::run(&session, &input, Some(rule_set), theme, &out)
        }

        Commands::Group {
            input,
            theme,
            no_llm,
            out,
        } => {
            let session = Session::open(&globals, !no_llm)?;
            group::run(&session, &input, theme, &out)
        }

        Commands::Rules { format } => {
            let session = Session::open(&globals, false)?;
            rules::run(&session, format.as_deref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers() {
        assert_eq!(parse_workers("4"), Ok(4));
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("65").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("70"), Ok(70.0));
        assert!(parse_score("101").is_err());
        assert!(parse_score("-1").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "repolens", "--workers", "2", "health", "repos.json", "--rules", "academic", "--min-score", "60",
        ])
        .unwrap();
        assert_eq!(cli.workers, Some(2));
        match cli.command {
            Commands::Health { rules, min_score, .. } => {
                assert_eq!(rules.as_deref(), Some("academic"));
                assert_eq!(min_score, Some(60.0));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["repolens", "classify", "x.json", "--format", "sarif"]).is_err());
    }
}
