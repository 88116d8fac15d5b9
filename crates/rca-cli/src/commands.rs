//! Subcommand implementations
//!
//! Commands own all file I/O; `rca-core` only sees parsed values.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgMatches, ValueEnum};
use rca_core::{
    table, ConfigAdapter, ConfigDocument, Profile, RenderResult, RequestManifest, TargetVersion,
};
use tracing::{debug, info};

/// Exit code for any fatal error
pub(crate) const EXIT_FATAL: u8 = 2;

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    Yaml,
    Json,
}

/// How a successful command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Clean,
    Warned,
}

impl Outcome {
    pub(crate) fn exit_code(self) -> ExitCode {
        match self {
            Self::Clean => ExitCode::SUCCESS,
            Self::Warned => ExitCode::from(1),
        }
    }
}

pub(crate) fn run(
    matches: &ArgMatches,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<Outcome> {
    match matches.subcommand() {
        Some(("render", args)) => render(args, out, err),
        Some(("migrate", args)) => migrate(args, out, err),
        Some(("keys", args)) => keys(args, out),
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("no command given"),
    }
}

fn render(args: &ArgMatches, out: &mut dyn Write, err: &mut dyn Write) -> Result<Outcome> {
    let path = Path::new(required(args, "settings")?);
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let manifest: RequestManifest = if is_json(path) {
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))?
    } else {
        serde_yaml::from_str(&text).with_context(|| format!("invalid YAML in {}", path.display()))?
    };

    let request = manifest.into_request(optional(args, "target"), optional(args, "profile"))?;
    info!(
        version = %request.target_version(),
        profile = %request.profile(),
        settings = request.settings().len(),
        "rendering"
    );
    let result = ConfigAdapter::new().render(&request)?;
    let digest = result.digest()?;
    info!(digest = %digest.short(), warnings = result.warnings().len(), "rendered");

    emit(&result, args, out, err)?;
    if args.get_flag("digest") {
        writeln!(err, "digest: {digest}")?;
    }
    Ok(outcome(&result))
}

fn migrate(args: &ArgMatches, out: &mut dyn Write, err: &mut dyn Write) -> Result<Outcome> {
    let from: TargetVersion = required(args, "from")?.parse()?;
    let to: TargetVersion = required(args, "to")?.parse()?;
    let profile = optional(args, "profile")
        .map(str::parse::<Profile>)
        .transpose()?
        .unwrap_or_default();

    let path = Path::new(required(args, "config")?);
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read router config {}", path.display()))?;
    let document = if is_json(path) {
        ConfigDocument::from_json(&text)
    } else {
        ConfigDocument::from_yaml(&text)
    }
    .with_context(|| format!("failed to parse {}", path.display()))?;

    info!(from = %from, to = %to, "migrating {}", path.display());
    let result = ConfigAdapter::new().migrate(&document, from, to, profile)?;

    emit(&result, args, out, err)?;
    Ok(outcome(&result))
}

fn keys(args: &ArgMatches, out: &mut dyn Write) -> Result<Outcome> {
    let only: Option<TargetVersion> = optional(args, "target").map(str::parse).transpose()?;

    for setting in table::table().iter() {
        match only {
            Some(version) => {
                if let Some(shape) = setting.shape(version) {
                    writeln!(out, "{}\t{}", setting.key, shape.path)?;
                }
            }
            None => {
                let column = |version| setting.shape(version).map_or("-", |s| s.path);
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}",
                    setting.key,
                    column(TargetVersion::V1),
                    column(TargetVersion::V2),
                    setting.migration_note.unwrap_or(""),
                )?;
            }
        }
    }
    Ok(Outcome::Clean)
}

/// Write warnings to `err` and the document to `--output` or `out`
fn emit(
    result: &RenderResult,
    args: &ArgMatches,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<()> {
    for warning in result.warnings() {
        writeln!(err, "warning: {warning}")?;
    }

    let format = args.get_one::<Format>("format").copied().unwrap_or(Format::Yaml);
    let rendered = match format {
        Format::Yaml => result.to_yaml()?,
        Format::Json => {
            let mut json = result.to_json()?;
            json.push('\n');
            json
        }
    };

    match optional(args, "output") {
        Some(target) => {
            fs::write(target, &rendered).with_context(|| format!("failed to write {target}"))?;
            debug!(path = target, bytes = rendered.len(), "document written");
        }
        None => out.write_all(rendered.as_bytes())?,
    }
    Ok(())
}

fn outcome(result: &RenderResult) -> Outcome {
    if result.has_warnings() {
        Outcome::Warned
    } else {
        Outcome::Clean
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn optional<'a>(args: &'a ArgMatches, id: &str) -> Option<&'a str> {
    args.get_one::<String>(id).map(String::as_str)
}

fn required<'a>(args: &'a ArgMatches, id: &str) -> Result<&'a str> {
    optional(args, id).ok_or_else(|| anyhow!("missing argument: {id}"))
}
