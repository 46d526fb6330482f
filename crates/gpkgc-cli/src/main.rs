#![deny(clippy::all, warnings)]

use atty::Stream;
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser};
use color_eyre::Result;
use gpkgc_core::{consolidate, to_json_response, ConsolidateRequest, ExecutionOutcome};
use serde_json::{json, Value};

mod style;

use style::Style;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = GpkgcCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let request = build_request(&cli);
    let outcome = match consolidate(&request) {
        Ok(outcome) => outcome,
        Err(err) => ExecutionOutcome::failure(format!("{err:#}"), json!({})),
    };
    let code = emit_output(&cli, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("gpkgc={level},gpkgc_core={level},gpkgc_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn build_request(cli: &GpkgcCli) -> ConsolidateRequest {
    ConsolidateRequest {
        input_dir: Utf8PathBuf::from(&cli.input_directory),
        output: Utf8PathBuf::from(&cli.output_geopackage),
        overwrite: cli.overwrite,
        update: cli.update,
        append: cli.append,
        spatial_index: cli.spatial_index,
        keep_separate: cli.keep_separate,
    }
}

fn emit_output(cli: &GpkgcCli, outcome: &ExecutionOutcome) -> Result<i32> {
    let code = outcome.exit_code();
    let style = Style::new(cli.no_color, atty::is(Stream::Stdout));

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&to_json_response(outcome))?);
    } else if !cli.quiet {
        let message = format_status_message(&outcome.message);
        println!("{}", style.status(&outcome.status, &message));
        if let Some(hint) = hint_from_details(&outcome.details) {
            let hint_line = format!("Hint: {hint}");
            println!("{}", style.info(&hint_line));
        }
    }

    Ok(code)
}

fn format_status_message(message: &str) -> String {
    if message.is_empty() {
        "gpkgc".to_string()
    } else if message.starts_with("gpkgc") {
        message.to_string()
    } else {
        format!("gpkgc {message}")
    }
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Consolidate GeoPackage files through GDAL/OGR",
    long_about = "Merges every GeoPackage in a directory into one output container, \
either as a single combined layer or with each input layer kept separate and \
renamed on collision. All geometry work is delegated to ogrinfo/ogr2ogr.",
    after_help = "Examples:\n  gpkgc ./tiles merged.gpkg --append\n  gpkgc ./tiles merged.gpkg --keep-separate --spatial-index\n  gpkgc ./tiles merged.gpkg --overwrite --json"
)]
struct GpkgcCli {
    #[arg(
        value_name = "INPUT_DIRECTORY",
        help = "Directory scanned (non-recursively) for *.gpkg files"
    )]
    input_directory: String,
    #[arg(value_name = "OUTPUT_GEOPACKAGE", help = "Destination GeoPackage")]
    output_geopackage: String,
    #[arg(long, help = "Delete the output first if it already exists")]
    overwrite: bool,
    #[arg(long, help = "Add to an existing output instead of refusing to touch it")]
    update: bool,
    #[arg(
        long,
        help = "Append rows to existing target layers instead of erroring on conflict"
    )]
    append: bool,
    #[arg(long, help = "Create spatial indexes on the output once copying finishes")]
    spatial_index: bool,
    #[arg(
        long,
        help = "Keep input layers separate, renaming on collision (default merges)"
    )]
    keep_separate: bool,
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)"
    )]
    quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q")]
    trace: bool,
    #[arg(long, help = "Emit a {status,message,details} JSON envelope")]
    json: bool,
    #[arg(long, help = "Disable colored human output")]
    no_color: bool,
}
