use std::{env, path::PathBuf};

use anyhow::Result;
use camino::Utf8Path;
use tracing::{debug, warn};

use gpkgc_domain::{parse_layer_summary, SPATIAL_INDEX_SQL};

use crate::process::run_command;

const OGRINFO_ENV: &str = "GPKGC_OGRINFO";
const OGR2OGR_ENV: &str = "GPKGC_OGR2OGR";

/// Failures at the GDAL/OGR boundary.
#[derive(Debug, thiserror::Error)]
pub enum ToolkitError {
    #[error("{tool} not found on PATH (install GDAL or point {env} at it)")]
    MissingTool {
        tool: &'static str,
        env: &'static str,
    },
    #[error("{tool} exited with status {code}{}", stderr_suffix(.stderr))]
    CommandFailed {
        tool: &'static str,
        code: i32,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Facade over the external GDAL/OGR command-line toolkit.
///
/// Every geometry operation is delegated: this type only decides arguments and
/// interprets exit codes. Nothing is cached between calls; the output
/// container's on-disk state is the single source of truth.
pub struct OgrToolkit {
    ogrinfo: PathBuf,
    ogr2ogr: PathBuf,
}

impl OgrToolkit {
    /// Locates `ogrinfo` and `ogr2ogr` on PATH, honoring the `GPKGC_OGRINFO`
    /// and `GPKGC_OGR2OGR` overrides.
    pub fn discover() -> Result<Self, ToolkitError> {
        Ok(Self {
            ogrinfo: locate("ogrinfo", OGRINFO_ENV)?,
            ogr2ogr: locate("ogr2ogr", OGR2OGR_ENV)?,
        })
    }

    /// Whether `path` is a readable GeoPackage.
    ///
    /// Delegates a read-only metadata probe and trusts only the exit code; any
    /// failure, including a spawn failure, reads as invalid.
    pub fn is_valid(&self, path: &Utf8Path) -> bool {
        if !path.exists() {
            return false;
        }
        let args = ["-so".to_string(), "-q".to_string(), path.to_string()];
        match run_command(&self.ogrinfo, &args) {
            Ok(output) => output.success(),
            Err(err) => {
                warn!("validity probe for {path} could not run: {err:#}");
                false
            }
        }
    }

    /// Layer names of `path`, in the toolkit's reported order.
    ///
    /// Missing paths and failed queries yield an empty list with a logged
    /// warning rather than an error; callers treat "no layers" and "could not
    /// list" identically.
    pub fn list_layers(&self, path: &Utf8Path) -> Vec<String> {
        if !path.exists() {
            return Vec::new();
        }
        let args = ["-so".to_string(), path.to_string()];
        match run_command(&self.ogrinfo, &args) {
            Ok(output) if output.success() => {
                let layers = parse_layer_summary(&output.stdout);
                debug!("{path} reports {} layer(s)", layers.len());
                layers
            }
            Ok(output) => {
                warn!(
                    "layer listing for {path} failed with status {}",
                    output.code
                );
                Vec::new()
            }
            Err(err) => {
                warn!("layer listing for {path} could not run: {err:#}");
                Vec::new()
            }
        }
    }

    /// Runs one prepared `ogr2ogr` invocation copying a single layer.
    ///
    /// # Errors
    ///
    /// Returns an error when the process cannot be spawned or exits non-zero;
    /// stderr is carried along for the per-layer log line.
    pub fn copy_layer(&self, args: &[String]) -> Result<()> {
        debug!("ogr2ogr {}", args.join(" "));
        let output = run_command(&self.ogr2ogr, args)?;
        if output.success() {
            Ok(())
        } else {
            Err(ToolkitError::CommandFailed {
                tool: "ogr2ogr",
                code: output.code,
                stderr: output.stderr,
            }
            .into())
        }
    }

    /// Builds spatial indexes for every geometry column of every layer in
    /// `path`, in a single toolkit call.
    ///
    /// # Errors
    ///
    /// Returns an error when the process cannot be spawned or exits non-zero.
    pub fn create_spatial_indexes(&self, path: &Utf8Path) -> Result<()> {
        let args = [
            path.to_string(),
            "-sql".to_string(),
            SPATIAL_INDEX_SQL.to_string(),
        ];
        let output = run_command(&self.ogrinfo, &args)?;
        if output.success() {
            Ok(())
        } else {
            Err(ToolkitError::CommandFailed {
                tool: "ogrinfo",
                code: output.code,
                stderr: output.stderr,
            }
            .into())
        }
    }
}

fn locate(tool: &'static str, env_var: &'static str) -> Result<PathBuf, ToolkitError> {
    if let Some(path) = env::var_os(env_var) {
        return Ok(PathBuf::from(path));
    }
    which::which(tool).map_err(|_| ToolkitError::MissingTool { tool, env: env_var })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failure_message_includes_stderr() {
        let err = ToolkitError::CommandFailed {
            tool: "ogr2ogr",
            code: 1,
            stderr: "ERROR 1: no such layer\n".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("ogr2ogr"));
        assert!(text.contains("no such layer"));
    }

    #[test]
    fn command_failure_message_omits_empty_stderr() {
        let err = ToolkitError::CommandFailed {
            tool: "ogrinfo",
            code: 3,
            stderr: "  \n".to_string(),
        };
        assert_eq!(err.to_string(), "ogrinfo exited with status 3");
    }
}
