//! `rca`: render, migrate and inspect router configuration

#![allow(missing_docs)]

use std::io;
use std::process::ExitCode;

use clap::{value_parser, Arg, ArgAction, Command};
use rca_core::AdapterError;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Format;

fn cli() -> Command {
    let target = Arg::new("target")
        .long("target")
        .env("RCA_TARGET_VERSION")
        .help("Router major version to render for (v1 or v2)");
    let profile = Arg::new("profile")
        .long("profile")
        .env("RCA_PROFILE")
        .help("Deployment profile (production or development)");
    let format = Arg::new("format")
        .long("format")
        .default_value("yaml")
        .value_parser(value_parser!(Format))
        .help("Output format");
    let output = Arg::new("output")
        .long("output")
        .short('o')
        .help("Write the document here instead of stdout");

    Command::new("rca")
        .version(rca_core::VERSION)
        .about("Version-aware Apollo Router configuration adapter")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("render")
                .about("Render a settings manifest into a router configuration")
                .arg(target.clone())
                .arg(profile.clone())
                .arg(format.clone())
                .arg(output.clone())
                .arg(
                    Arg::new("digest")
                        .long("digest")
                        .action(ArgAction::SetTrue)
                        .help("Print the document digest to stderr"),
                )
                .arg(
                    Arg::new("settings")
                        .required(true)
                        .help("Request manifest (YAML, or JSON by extension)"),
                ),
        )
        .subcommand(
            Command::new("migrate")
                .about("Re-render an existing router configuration for another major")
                .arg(
                    Arg::new("from")
                        .long("from")
                        .required(true)
                        .help("Version the input document is written for"),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .required(true)
                        .help("Version to migrate to"),
                )
                .arg(profile)
                .arg(format)
                .arg(output)
                .arg(
                    Arg::new("config")
                        .required(true)
                        .help("Router configuration file (YAML, or JSON by extension)"),
                ),
        )
        .subcommand(
            Command::new("keys")
                .about("List logical settings and where each version writes them")
                .arg(target),
        )
}

fn init_tracing() {
    // Validation warnings are printed by the commands; the library's own
    // `warn!` events would repeat them.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,rca_core=error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let matches = cli().get_matches();

    let stdout = io::stdout();
    let stderr = io::stderr();
    match commands::run(&matches, &mut stdout.lock(), &mut stderr.lock()) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            if err.downcast_ref::<AdapterError>().is_some() {
                eprintln!("rejected: {err:#}");
            } else {
                eprintln!("error: {err:#}");
            }
            ExitCode::from(commands::EXIT_FATAL)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn render_requires_settings_file() {
        let result = cli().try_get_matches_from(["rca", "render"]);
        assert!(result.is_err());
    }

    #[test]
    fn migrate_requires_versions() {
        let result = cli().try_get_matches_from(["rca", "migrate", "router.yaml"]);
        assert!(result.is_err());
    }

    #[test]
    fn format_rejects_unknown_value() {
        let result = cli().try_get_matches_from(["rca", "render", "--format", "toml", "s.yaml"]);
        assert!(result.is_err());
    }
}
