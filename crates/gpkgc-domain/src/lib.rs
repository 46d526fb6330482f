#![deny(clippy::all, warnings)]
#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

pub mod listing;
pub mod naming;
pub mod plan;

pub use listing::parse_layer_summary;
pub use naming::resolve_unique;
pub use plan::{copy_layer_args, target_layer_name, CopyRequest, SPATIAL_INDEX_SQL};
