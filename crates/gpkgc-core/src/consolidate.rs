use std::{collections::BTreeSet, fs};

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::json;
use tracing::{info, warn};

use gpkgc_domain::{copy_layer_args, target_layer_name, CopyRequest};

use crate::{outcome::ExecutionOutcome, toolkit::OgrToolkit};

/// Flags and paths for one consolidation run, resolved once from the CLI.
#[derive(Clone, Debug)]
pub struct ConsolidateRequest {
    pub input_dir: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub overwrite: bool,
    pub update: bool,
    pub append: bool,
    pub spatial_index: bool,
    pub keep_separate: bool,
}

/// Consolidates every GeoPackage in `input_dir` into `output`.
///
/// Runs strictly sequentially: one file at a time, one layer at a time, one
/// toolkit process in flight. Setup problems (no inputs, ambiguous mode on an
/// existing output, missing toolkit) abort before anything is written and
/// come back as user errors. Once past setup, per-layer copy failures are
/// logged and skipped; the run always finishes and reports how much of the
/// input made it across.
///
/// # Errors
///
/// Returns an error only for unexpected I/O trouble, such as an unreadable
/// input directory or a failed delete of the output under `--overwrite`.
pub fn consolidate(request: &ConsolidateRequest) -> Result<ExecutionOutcome> {
    let toolkit = match OgrToolkit::discover() {
        Ok(toolkit) => toolkit,
        Err(err) => {
            return Ok(ExecutionOutcome::user_error(
                err.to_string(),
                json!({ "hint": "GDAL ships ogrinfo and ogr2ogr; both must be runnable" }),
            ))
        }
    };
    let (update, append) = effective_modes(request);

    if !request.input_dir.is_dir() {
        return Ok(ExecutionOutcome::user_error(
            format!("input directory {} does not exist", request.input_dir),
            json!({}),
        ));
    }
    let inputs = scan_inputs(&request.input_dir, &request.output)?;
    if inputs.is_empty() {
        return Ok(ExecutionOutcome::user_error(
            format!("no GeoPackages found in {}", request.input_dir),
            json!({ "hint": "expected *.gpkg files directly inside the input directory" }),
        ));
    }
    let total = inputs.len();
    info!("found {total} GeoPackage(s) to process");

    if request.output.exists() {
        if request.overwrite {
            info!("removing existing output {}", request.output);
            fs::remove_file(request.output.as_std_path())
                .with_context(|| format!("removing {}", request.output))?;
        } else if !update {
            return Ok(ExecutionOutcome::user_error(
                format!("output {} already exists", request.output),
                json!({ "hint": "pass --overwrite to replace it or --update to add to it" }),
            ));
        }
    }

    let mut processed = 0usize;
    let mut layer_failures = 0usize;
    let mut layers = Vec::new();
    for (index, input) in inputs.iter().enumerate() {
        let file_name = input.file_name().unwrap_or(input.as_str());
        if !toolkit.is_valid(input) {
            warn!("skipping invalid GeoPackage: {file_name}");
            continue;
        }
        info!("processing ({}/{total}): {file_name}", index + 1);
        for layer in toolkit.list_layers(input) {
            // Re-queried before every copy: each append changes the universe
            // of names the resolver must avoid.
            let existing: BTreeSet<String> =
                toolkit.list_layers(&request.output).into_iter().collect();
            let copy = CopyRequest {
                keep_separate: request.keep_separate,
                append,
                output: &request.output,
                output_exists: request.output.exists(),
                input,
                layer: &layer,
            };
            let target = target_layer_name(&copy, &existing);
            match toolkit.copy_layer(&copy_layer_args(&copy, &target)) {
                Ok(()) => {
                    if target == layer {
                        info!("added layer: {layer}");
                    } else {
                        info!("added layer as: {target}");
                    }
                    layers.push(json!({
                        "file": file_name,
                        "layer": layer,
                        "target": target,
                        "status": "ok",
                    }));
                }
                Err(err) => {
                    layer_failures += 1;
                    warn!("failed to copy layer '{layer}' from {file_name}: {err:#}");
                    layers.push(json!({
                        "file": file_name,
                        "layer": layer,
                        "status": "error",
                        "error": format!("{err:#}"),
                    }));
                }
            }
        }
        processed += 1;
    }

    if request.spatial_index && request.output.exists() {
        info!("creating spatial indexes for {}", request.output);
        if let Err(err) = toolkit.create_spatial_indexes(&request.output) {
            warn!("spatial index creation failed: {err:#}");
        }
    }

    let message = if processed == total {
        format!("consolidated {processed} GeoPackage(s) into {}", request.output)
    } else {
        format!(
            "processed {processed} of {total} GeoPackage(s) into {}",
            request.output
        )
    };
    Ok(ExecutionOutcome::success(
        message,
        json!({
            "discovered": total,
            "processed": processed,
            "layer_failures": layer_failures,
            "layers": layers,
            "output": request.output.as_str(),
        }),
    ))
}

/// `--overwrite` destroys and recreates; `--update`/`--append` presuppose the
/// existing content survives. When combined, overwrite wins and the others
/// are dropped with a warning.
fn effective_modes(request: &ConsolidateRequest) -> (bool, bool) {
    if request.overwrite && (request.update || request.append) {
        warn!("--overwrite takes precedence; ignoring --update/--append");
        (false, false)
    } else {
        (request.update, request.append)
    }
}

/// Non-recursive scan for `*.gpkg` directly inside `dir`, sorted so output
/// layer naming does not depend on filesystem enumeration order. The output
/// container itself is excluded in case it lives inside the input directory.
fn scan_inputs(dir: &Utf8Path, output: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    let entries =
        fs::read_dir(dir.as_std_path()).with_context(|| format!("reading input directory {dir}"))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("reading input directory {dir}"))?;
        let path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|path| anyhow::anyhow!("non-UTF-8 path: {}", path.display()))?;
        if path.extension() == Some("gpkg") && path.is_file() && path != output {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
