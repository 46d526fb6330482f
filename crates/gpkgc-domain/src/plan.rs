use std::collections::BTreeSet;

use camino::Utf8Path;

use crate::naming::resolve_unique;

/// SQL issued against the output container to build spatial indexes for every
/// geometry column in one pass.
pub const SPATIAL_INDEX_SQL: &str =
    "SELECT CreateSpatialIndex(table_name, column_name) FROM gpkg_geometry_columns";

const FALLBACK_LAYER_NAME: &str = "consolidated";

/// One layer-copy unit of work: a single named layer of one input container
/// bound for the output container.
///
/// `output_exists` is an input, not something this module probes; the builder
/// stays pure so the flag and naming logic is testable without touching disk
/// or spawning anything.
#[derive(Clone, Copy, Debug)]
pub struct CopyRequest<'a> {
    pub keep_separate: bool,
    pub append: bool,
    pub output: &'a Utf8Path,
    pub output_exists: bool,
    pub input: &'a Utf8Path,
    pub layer: &'a str,
}

/// Decides the destination layer name for one copy.
///
/// | keep_separate | append | target                                     |
/// |---------------|--------|--------------------------------------------|
/// | true          | true   | input layer name unchanged                 |
/// | true          | false  | input layer name, de-duplicated            |
/// | false         | true   | output file stem (one shared merge layer)  |
/// | false         | false  | output file stem, de-duplicated            |
///
/// `existing` must reflect the output container's layer names as of right now;
/// each completed copy changes that universe, so callers re-query between
/// layers rather than caching across the run.
pub fn target_layer_name(request: &CopyRequest<'_>, existing: &BTreeSet<String>) -> String {
    match (request.keep_separate, request.append) {
        (true, true) => request.layer.to_string(),
        (true, false) => resolve_unique(request.layer, existing),
        (false, true) => output_stem(request.output),
        (false, false) => resolve_unique(&output_stem(request.output), existing),
    }
}

/// Builds the `ogr2ogr` argument vector copying `request.layer` into the
/// output under `target`.
///
/// The rows are always selected through `-sql` naming the one source layer, so
/// multi-layer inputs are copied a layer at a time under caller-controlled
/// destination names. `-update` is required whenever the output already exists
/// or the toolkit refuses to open it for writing; creation instead pins the
/// GPKG driver with `-f`.
pub fn copy_layer_args(request: &CopyRequest<'_>, target: &str) -> Vec<String> {
    let mut args: Vec<String> = Vec::with_capacity(9);
    if request.output_exists {
        args.push("-update".to_string());
    } else {
        args.push("-f".to_string());
        args.push("GPKG".to_string());
    }
    if request.append {
        args.push("-append".to_string());
    }
    args.push(request.output.to_string());
    args.push(request.input.to_string());
    args.push("-sql".to_string());
    args.push(format!("SELECT * FROM \"{}\"", request.layer));
    args.push("-nln".to_string());
    args.push(target.to_string());
    args
}

fn output_stem(output: &Utf8Path) -> String {
    output.file_stem().unwrap_or(FALLBACK_LAYER_NAME).to_string()
}
