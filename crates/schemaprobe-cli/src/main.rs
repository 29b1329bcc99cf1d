//! Consistency-probe runner.
//!
//! Drives the fixed query battery through the remote generation adapter,
//! prints the console summary, and persists the full report (including
//! every envelope) as indented JSON. The bearer credential comes from the
//! environment; its absence halts the run before any query is issued.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use schemaprobe_error::Result;
use schemaprobe_harness::adapter::RemoteAdapter;
use schemaprobe_harness::driver::RunDriver;
use schemaprobe_harness::report::RunReport;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ENDPOINT: &str = "http://localhost:8080/api/v1/llm/query";
const RESULTS_PATH: &str = "recipe_consistency_results.json";

/// Fixed battery: short natural-language queries chosen for variety of
/// cuisine, meal type, and dietary profile.
const QUERIES: [&str; 20] = [
    "spicy pasta with vegetables",
    "chocolate chip cookies",
    "healthy green smoothie",
    "chicken stir fry",
    "homemade pizza",
    "banana bread",
    "vegetable soup",
    "beef tacos",
    "asian noodle salad",
    "blueberry pancakes",
    "grilled salmon",
    "quinoa bowl",
    "mushroom risotto",
    "apple pie",
    "curry chicken",
    "avocado toast",
    "seafood paella",
    "chocolate cake",
    "greek salad",
    "breakfast burrito",
];

/// Fields a complete recipe payload is expected to carry.
const CRITICAL_FIELDS: [&str; 8] = [
    "name",
    "description",
    "ingredients",
    "instructions",
    "prep_time",
    "cook_time",
    "servings",
    "difficulty",
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    endpoint: String,
    output: PathBuf,
    show_help: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            output: PathBuf::from(RESULTS_PATH),
            show_help: false,
        }
    }
}

fn main() -> ExitCode {
    init_logging();

    let options = match parse_args(env::args_os()) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("error: {message}");
            let _ = write_usage(&mut io::stderr());
            return ExitCode::from(2);
        }
    };

    if options.show_help {
        let _ = write_usage(&mut io::stdout());
        return ExitCode::SUCCESS;
    }

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            if let Some(suggestion) = error.suggestion() {
                eprintln!("hint: {suggestion}");
            }
            ExitCode::from(u8::try_from(error.exit_code()).unwrap_or(1))
        }
    }
}

fn run(options: &CliOptions) -> Result<()> {
    // Fatal configuration errors surface here, before any query is issued.
    let adapter = RemoteAdapter::from_env(options.endpoint.clone())?;
    info!(endpoint = %options.endpoint, queries = QUERIES.len(), "starting consistency probe");

    let queries = QUERIES.iter().map(|query| (*query).to_owned()).collect();
    let critical_fields = CRITICAL_FIELDS
        .iter()
        .map(|field| (*field).to_owned())
        .collect();
    let report = RunDriver::new(adapter, queries, critical_fields).run();

    print!("{}", report.render_summary());

    // A failed artifact write is a warning, not a run failure: the console
    // summary already happened and the probe itself completed.
    match persist_report(&report, &options.output) {
        Ok(()) => info!(path = %options.output.display(), "detailed results saved"),
        Err(error) => {
            warn!(path = %options.output.display(), error = %error, "failed to save results");
        }
    }

    Ok(())
}

fn persist_report(report: &RunReport, path: &Path) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(report)?;
    fs::write(path, bytes)?;
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse_args<I>(args: I) -> std::result::Result<CliOptions, String>
where
    I: IntoIterator<Item = OsString>,
{
    let mut options = CliOptions::default();
    let mut iter = args.into_iter();
    let _argv0 = iter.next();

    while let Some(argument) = iter.next() {
        let arg = argument.to_string_lossy();
        match arg.as_ref() {
            "--endpoint" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "missing value for --endpoint".to_owned())?;
                options.endpoint = value.to_string_lossy().into_owned();
            }
            "--output" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "missing value for --output".to_owned())?;
                options.output = PathBuf::from(value);
            }
            "-h" | "--help" => {
                options.show_help = true;
            }
            other => {
                return Err(format!("unrecognized argument: {other}"));
            }
        }
    }

    Ok(options)
}

fn write_usage<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Usage: schemaprobe [OPTIONS]")?;
    writeln!(out)?;
    writeln!(
        out,
        "Probes the recipe-generation endpoint with a fixed query battery and"
    )?;
    writeln!(out, "reports schema consistency across the results.")?;
    writeln!(out)?;
    writeln!(out, "Options:")?;
    writeln!(
        out,
        "  --endpoint URL   generation endpoint (default {DEFAULT_ENDPOINT})"
    )?;
    writeln!(
        out,
        "  --output PATH    results artifact path (default {RESULTS_PATH})"
    )?;
    writeln!(out, "  -h, --help       print this help")?;
    writeln!(out)?;
    writeln!(
        out,
        "The bearer token is read from the {} environment variable.",
        schemaprobe_harness::adapter::TOKEN_ENV_VAR
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use schemaprobe_harness::census::FieldCensus;
    use schemaprobe_harness::classify::ErrorClassifier;
    use schemaprobe_types::{FieldValue, Payload, ProbeEnvelope, ProbeOutcome};

    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        std::iter::once("schemaprobe")
            .chain(list.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn defaults_without_arguments() {
        let options = parse_args(args(&[])).expect("empty args should parse");
        assert_eq!(options, CliOptions::default());
    }

    #[test]
    fn endpoint_and_output_overrides() {
        let options = parse_args(args(&[
            "--endpoint",
            "http://probe.internal/api",
            "--output",
            "/tmp/out.json",
        ]))
        .expect("overrides should parse");
        assert_eq!(options.endpoint, "http://probe.internal/api");
        assert_eq!(options.output, PathBuf::from("/tmp/out.json"));
    }

    #[test]
    fn unrecognized_argument_is_rejected() {
        let error = parse_args(args(&["--parallel"])).expect_err("unknown flag must fail");
        assert!(error.contains("--parallel"));
    }

    #[test]
    fn missing_flag_value_is_rejected() {
        let error = parse_args(args(&["--endpoint"])).expect_err("dangling flag must fail");
        assert!(error.contains("--endpoint"));
    }

    #[test]
    fn help_flag_is_recognized() {
        assert!(parse_args(args(&["--help"])).expect("help should parse").show_help);
        assert!(parse_args(args(&["-h"])).expect("help should parse").show_help);
    }

    #[test]
    fn persisted_report_is_indented_json_and_parses_back() {
        let mut census = FieldCensus::new();
        let mut payload = Payload::new();
        payload.insert("name".to_owned(), FieldValue::Text("toast".to_owned()));
        census.record(&payload);

        let report = RunReport::build(
            vec![ProbeEnvelope::new(
                1,
                "avocado toast",
                ProbeOutcome::from_payload(payload),
            )],
            &census,
            &ErrorClassifier::new(),
            &["name".to_owned()],
        );

        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join(RESULTS_PATH);
        persist_report(&report, &path).expect("report should persist");

        let bytes = fs::read(&path).expect("artifact should be readable");
        assert!(bytes.windows(2).any(|window| window == b"\n "), "artifact must be indented");
        let parsed: RunReport =
            serde_json::from_slice(&bytes).expect("artifact should parse back");
        assert_eq!(parsed.total, 1);
        assert_eq!(parsed.successes, 1);
    }

    #[test]
    fn battery_and_critical_fields_match_the_probe_contract() {
        assert_eq!(QUERIES.len(), 20);
        assert_eq!(CRITICAL_FIELDS.len(), 8);
        assert_eq!(CRITICAL_FIELDS[0], "name");
        assert!(CRITICAL_FIELDS.contains(&"ingredients"));
    }
}
