//! Command-line entry point.
//!
//! Parse failures and runtime failures both exit with status 1 after a
//! message on stderr; `--help` and `--version` exit 0.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{error::ErrorKind, ArgAction, Parser};
use colored::Colorize;

use crate::{
    config::{self, ImportSettings, OntologySettings, ServerOverlay, ServerSettings},
    import::{self, ImportOutcome},
    logger::{self, LogFormat},
    Error, Result,
};

#[derive(Debug, Parser)]
#[command(
    name = "owl2graph",
    about = "Import a reasoned OWL ontology into a Neo4j property graph",
    version
)]
pub struct Cli {
    /// Path to the ontology document (OWL/RDF-XML, Turtle, N-Triples, ...)
    #[arg(short, long, value_name = "PATH")]
    pub owl: PathBuf,

    /// Ontology name, e.g. "Gene Ontology"
    #[arg(short, long)]
    pub name: String,

    /// Ontology abbreviation, e.g. "go"
    #[arg(short = 'a', long = "abbreviation", value_name = "ACRONYM")]
    pub abbreviation: String,

    /// Graph store root URL [default: http://localhost:7474]
    #[arg(short, long, value_name = "URL")]
    pub server: Option<String>,

    /// Graph store user
    #[arg(short, long)]
    pub user: Option<String>,

    /// Graph store password
    #[arg(short, long)]
    pub password: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbosity: u8,

    /// YAML file with a `server:` section
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Build the graph in memory without contacting the store
    #[arg(long)]
    pub dry_run: bool,

    /// Create uniqueness constraints on `uri` before importing
    #[arg(long)]
    pub constraints: bool,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Resolves the final settings: defaults, then the config file, then flags.
    ///
    /// # Errors
    ///
    /// Fails when the configuration file cannot be read.
    pub fn into_settings(self) -> Result<ImportSettings> {
        let from_file = match &self.config {
            Some(path) => config::load_server_overlay(path)?,
            None => ServerOverlay::default(),
        };
        let server = ServerSettings::default()
            .merge(from_file)
            .merge(ServerOverlay {
                url: self.server,
                user: self.user,
                password: self.password,
            });

        Ok(ImportSettings {
            ontology: OntologySettings {
                path: self.owl,
                name: self.name,
                acronym: self.abbreviation,
            },
            server,
            dry_run: self.dry_run,
            constraints: self.constraints,
        })
    }
}

/// Exit status for a clap error: 0 for help/version output, 1 otherwise.
#[must_use]
pub fn exit_code_for(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
        _ => 1,
    }
}

/// Parses `args`, runs the import and maps the result onto an exit code.
pub async fn run_with<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(exit_code_for(&err));
        }
    };

    if let Err(err) = logger::init(cli.verbosity, cli.log_format) {
        eprintln!("{}", err.to_string().yellow());
    }

    match execute(cli).await {
        Ok(outcome) => {
            print_outcome(&outcome);
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_error(&err);
            ExitCode::from(1)
        }
    }
}

/// Entry point used by the binary.
pub async fn main() -> ExitCode {
    run_with(std::env::args_os()).await
}

async fn execute(cli: Cli) -> Result<ImportOutcome> {
    let settings = cli.into_settings()?;
    import::run(&settings).await
}

fn print_outcome(outcome: &ImportOutcome) {
    println!("{} {}", "imported".green(), outcome.report);
    if let Some(graph) = &outcome.graph {
        println!(
            "dry run graph: {} nodes, {} edges, {} properties",
            graph.node_count(),
            graph.edge_count(),
            graph.property_count()
        );
    }
}

fn report_error(err: &Error) {
    eprintln!("{}", err.category().describe().red());
    eprintln!("{}", err.to_string().red());
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{exit_code_for, Cli};
    use crate::config::DEFAULT_SERVER_URL;
    use crate::logger::LogFormat;

    const REQUIRED: [&str; 7] = ["owl2graph", "-o", "go.owl", "-n", "Gene Ontology", "-a", "go"];

    #[test]
    fn required_flags_are_enough() {
        let cli = Cli::try_parse_from(REQUIRED).expect("parse");
        assert_eq!(cli.owl, PathBuf::from("go.owl"));
        assert_eq!(cli.verbosity, 0);
        assert_eq!(cli.log_format, LogFormat::Compact);

        let settings = cli.into_settings().expect("settings");
        assert_eq!(settings.server.url, DEFAULT_SERVER_URL);
        assert_eq!(settings.ontology.acronym, "go");
        assert!(!settings.dry_run);
    }

    #[test]
    fn long_flags_and_verbosity_count() {
        let cli = Cli::try_parse_from([
            "owl2graph",
            "--owl",
            "go.owl",
            "--name",
            "Gene Ontology",
            "--abbreviation",
            "go",
            "--server",
            "http://neo:7474/",
            "--user",
            "neo4j",
            "--password",
            "secret",
            "-vv",
            "--dry-run",
            "--log-format",
            "json",
        ])
        .expect("parse");
        assert_eq!(cli.verbosity, 2);
        assert_eq!(cli.log_format, LogFormat::Json);

        let settings = cli.into_settings().expect("settings");
        assert_eq!(settings.server.url, "http://neo:7474");
        assert_eq!(settings.server.user.as_deref(), Some("neo4j"));
        assert_eq!(settings.server.password.as_deref(), Some("secret"));
        assert!(settings.dry_run);
    }

    #[test]
    fn missing_required_flag_exits_one() {
        let err = Cli::try_parse_from(["owl2graph", "-o", "go.owl"]).expect_err("missing flags");
        assert_eq!(exit_code_for(&err), 1);
    }

    #[test]
    fn help_and_version_exit_zero() {
        let help = Cli::try_parse_from(["owl2graph", "-h"]).expect_err("help");
        assert_eq!(exit_code_for(&help), 0);

        let version = Cli::try_parse_from(["owl2graph", "--version"]).expect_err("version");
        assert_eq!(exit_code_for(&version), 0);
    }

    #[test]
    fn unknown_flag_exits_one() {
        let mut args = REQUIRED.to_vec();
        args.push("--bogus");
        let err = Cli::try_parse_from(args).expect_err("unknown flag");
        assert_eq!(exit_code_for(&err), 1);
    }
}
