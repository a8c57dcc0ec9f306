//! `shiftrev run` / `shiftrev validate`: config-driven shift revenue reconciliation.

use std::path::{Path, PathBuf};

use shiftrev_recon::report;
use shiftrev_recon::source::{load_collections_csv, load_staffing_csv};
use shiftrev_recon::{ReconConfig, ReconInput, ReconResult};
use tracing::info;

use crate::exit_codes::{
    recon_exit_code, EXIT_ERROR, EXIT_RECON_RUNTIME, EXIT_RECON_STRICT, EXIT_USAGE,
};
use crate::util::read_text_file;
use crate::CliError;

pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub staffing: Option<PathBuf>,
    pub collections: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub strict: bool,
    pub quiet: bool,
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn engine_err(e: shiftrev_recon::ReconError) -> CliError {
    recon_err(recon_exit_code(&e), e.to_string())
}

/// Load the config file, or the built-in defaults when none is given.
/// Returns the directory relative paths in the config resolve against.
fn load_config(path: Option<&Path>) -> Result<(ReconConfig, PathBuf), CliError> {
    let Some(path) = path else {
        return Ok((ReconConfig::default(), PathBuf::from(".")));
    };
    let text = read_text_file(path).map_err(|e| recon_err(EXIT_RECON_RUNTIME, e))?;
    let config = ReconConfig::from_toml(&text).map_err(engine_err)?;
    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    Ok((config, base))
}

/// A path from the command line wins; otherwise the config's path, relative
/// to the config file.
fn resolve_input(
    flag: Option<PathBuf>,
    configured: Option<&String>,
    base: &Path,
    what: &str,
) -> Result<PathBuf, CliError> {
    match (flag, configured) {
        (Some(p), _) => Ok(p),
        (None, Some(file)) => Ok(base.join(file)),
        (None, None) => Err(recon_err(EXIT_USAGE, format!("no {what} file given"))
            .with_hint(format!("pass --{what} <FILE> or set [{what}] file in the config"))),
    }
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let (config, base) = load_config(args.config.as_deref())?;

    let staffing_path = resolve_input(args.staffing, config.staffing.file.as_ref(), &base, "staffing")?;
    let collections_path = resolve_input(
        args.collections,
        config.collections.file.as_ref(),
        &base,
        "collections",
    )?;
    let out_dir = match (args.out, config.output.dir.as_ref()) {
        (Some(dir), _) => dir,
        (None, Some(dir)) => base.join(dir),
        (None, None) => PathBuf::from("."),
    };

    let staffing_text = read_text_file(&staffing_path).map_err(|e| recon_err(EXIT_RECON_RUNTIME, e))?;
    let collections_text =
        read_text_file(&collections_path).map_err(|e| recon_err(EXIT_RECON_RUNTIME, e))?;

    let input = ReconInput {
        staffing: load_staffing_csv(&staffing_text, &config.staffing.columns).map_err(engine_err)?,
        collections: load_collections_csv(&collections_text, &config.collections.columns)
            .map_err(engine_err)?,
    };
    info!(
        staffing = %staffing_path.display(),
        collections = %collections_path.display(),
        "loaded sources"
    );

    let result = shiftrev_recon::run(&config, &input).map_err(engine_err)?;

    let written = report::write_all(&out_dir, &result).map_err(engine_err)?;
    info!(dir = %out_dir.display(), files = written.len(), "wrote reports");

    if args.json || args.output.is_some() {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| recon_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        if let Some(ref path) = args.output {
            std::fs::write(path, &json_str)
                .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot write output: {e}")))?;
            if !args.quiet {
                eprintln!("wrote {}", path.display());
            }
        }
        if args.json {
            println!("{json_str}");
        }
    }

    if !args.quiet {
        print_summary(&result, &out_dir, written.len());
    }

    if args.strict && result.diagnostics.has_data_quality_issues() {
        return Err(recon_err(EXIT_RECON_STRICT, "data-quality issues found (--strict)")
            .with_hint(format!("see {}", out_dir.join(report::REJECTED_ROWS_FILE).display())));
    }

    Ok(())
}

fn print_summary(result: &ReconResult, out_dir: &Path, files: usize) {
    let d = &result.diagnostics;
    eprintln!(
        "shift revenue recon '{}': {} matched ({} primary, {} fallback), {} unattributed shift(s), {} unattributed revenue row(s)",
        result.meta.config_name,
        d.matched_primary + d.matched_fallback,
        d.matched_primary,
        d.matched_fallback,
        d.unattributed_shifts,
        d.unattributed_revenue,
    );
    eprintln!(
        "rejected: {} staffing, {} collections, {} ambiguous; {} blank row(s) skipped",
        d.malformed_staffing, d.malformed_collections, d.ambiguous_identities, d.blank_rows,
    );
    if d.duplicate_groups > 0 {
        eprintln!(
            "duplicates: {} group(s) covering {} shift(s), policy {}",
            d.duplicate_groups, d.duplicate_rows, result.meta.duplicate_policy,
        );
    }
    if d.unknown_facility > 0 {
        eprintln!("unknown facility: {} matched row(s)", d.unknown_facility);
    }
    eprintln!("wrote {files} report(s) to {}", out_dir.display());
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let (config, _) = load_config(Some(&config_path))?;
    eprintln!(
        "valid: recon '{}' with {} date format(s), {} override(s), {} facility pattern(s), duplicates {}",
        config.name,
        config.date_formats.len(),
        config.identity.overrides.len(),
        config.facilities.len(),
        config.identity.duplicates,
    );
    Ok(())
}
