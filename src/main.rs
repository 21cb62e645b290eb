use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use mvtgen::{cli, config, shell};

#[derive(Debug, Parser)]
#[command(name = "mvtgen")]
#[command(about = "Generate A/B and multivariate test configurations from plain-language descriptions")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive client: edit the form, generate, explain, copy
    Shell,
    /// Generate a configuration from a description
    Generate {
        /// What the test should do, in plain language
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
        /// Existing configuration to refine (JSON text)
        #[arg(long, conflicts_with = "seed_file")]
        seed: Option<String>,
        /// Load the seed configuration from a .json file
        #[arg(long)]
        seed_file: Option<String>,
        /// Copy the result to the clipboard
        #[arg(long)]
        copy: bool,
        /// Also explain the result
        #[arg(long)]
        explain: bool,
    },
    /// Explain an existing configuration file
    Explain {
        path: PathBuf,
    },
    /// Validate and pretty-print JSON (reads stdin when no path is given)
    Validate {
        path: Option<PathBuf>,
    },
    /// Show example descriptions
    Examples,
    /// Check config files, service reachability and the activity log
    Health,
    /// Show recent activity
    History {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective (merged) configuration
    Show,
    /// Write a default config to ~/.mvtgen/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a single value, e.g. `service.base_url http://host:5000/api`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<ExitCode> {
    let app = App::parse();
    let cfg = config::load();

    if !cfg.ui.color {
        colored::control::set_override(false);
    }

    let done = |result: Result<()>| result.map(|()| ExitCode::SUCCESS);

    match app.command {
        Commands::Shell => done(shell::run(&cfg)),
        Commands::Generate {
            description,
            seed,
            seed_file,
            copy,
            explain,
        } => {
            let opts = cli::GenerateOptions {
                description: description.join(" "),
                seed,
                seed_file,
                copy,
                explain,
            };
            cli::run_generate(&cfg, &opts)
        }
        Commands::Explain { path } => cli::run_explain(&cfg, &path),
        Commands::Validate { path } => cli::run_validate(path.as_deref()),
        Commands::Examples => done(cli::run_examples()),
        Commands::Health => done(cli::run_health()),
        Commands::History { format, days } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            done(cli::run_history(fmt, days))
        }
        Commands::Config { action } => done(match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        }),
    }
}
