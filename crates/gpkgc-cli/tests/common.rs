#![allow(dead_code)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use assert_cmd::Command;
use tempfile::TempDir;

/// A sandbox with fake `ogrinfo`/`ogr2ogr` executables on standby.
///
/// The fake container format is one `name:rows` line per layer. The stubs
/// honor the same contract gpkgc relies on from the real toolkit: validity is
/// an exit code, `-so` prints `N: name (Multi Polygon)` summary lines, and
/// `ogr2ogr` refuses an existing output without `-update`/`-append` and
/// refuses an existing target layer without `-append`.
pub struct Fixture {
    pub temp: TempDir,
    pub input_dir: PathBuf,
    pub output: PathBuf,
    pub log: PathBuf,
    ogrinfo: PathBuf,
    ogr2ogr: PathBuf,
}

const OGRINFO_STUB: &str = r#"#!/bin/sh
log="${GPKGC_STUB_LOG:?}"
if [ "$1" = "-so" ] && [ "$2" = "-q" ]; then
    file="$3"
    [ -f "$file" ] || exit 1
    if head -n 1 "$file" | grep -q '^INVALID'; then
        exit 1
    fi
    exit 0
fi
if [ "$1" = "-so" ]; then
    file="$2"
    [ -f "$file" ] || exit 1
    i=1
    while IFS=: read -r name rows; do
        [ -n "$name" ] || continue
        echo "$i: $name (Multi Polygon)"
        i=$((i+1))
    done < "$file"
    exit 0
fi
echo "ogrinfo $*" >> "$log"
exit 0
"#;

const OGR2OGR_STUB: &str = r#"#!/bin/sh
log="${GPKGC_STUB_LOG:?}"
echo "ogr2ogr $*" >> "$log"
update=0
append=0
while [ $# -gt 0 ]; do
    case "$1" in
        -f) shift 2 ;;
        -update) update=1; shift ;;
        -append) append=1; shift ;;
        *) break ;;
    esac
done
out="$1"
in="$2"
sql="$4"
target="$6"
layer=${sql#SELECT \* FROM \"}
layer=${layer%\"}
if [ -f "$out" ] && [ "$update" = "0" ] && [ "$append" = "0" ]; then
    echo "ERROR: $out exists; -update required" >&2
    exit 1
fi
rows=$(grep "^$layer:" "$in" | head -n 1 | cut -d: -f2)
if [ -z "$rows" ]; then
    echo "ERROR: layer $layer not found in $in" >&2
    exit 1
fi
if [ -f "$out" ] && grep -q "^$target:" "$out"; then
    if [ "$append" = "1" ]; then
        old=$(grep "^$target:" "$out" | head -n 1 | cut -d: -f2)
        new=$((old + rows))
        sed "s/^$target:.*/$target:$new/" "$out" > "$out.tmp" && mv "$out.tmp" "$out"
    else
        echo "ERROR: layer $target already exists in $out" >&2
        exit 1
    fi
else
    echo "$target:$rows" >> "$out"
fi
exit 0
"#;

pub fn fixture(prefix: &str) -> Fixture {
    let temp = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("tempdir");
    let input_dir = temp.path().join("input");
    fs::create_dir(&input_dir).expect("input dir");
    let bin_dir = temp.path().join("bin");
    fs::create_dir(&bin_dir).expect("bin dir");
    let ogrinfo = write_stub(&bin_dir.join("ogrinfo"), OGRINFO_STUB);
    let ogr2ogr = write_stub(&bin_dir.join("ogr2ogr"), OGR2OGR_STUB);
    Fixture {
        output: temp.path().join("merged.gpkg"),
        log: temp.path().join("stub.log"),
        temp,
        input_dir,
        ogrinfo,
        ogr2ogr,
    }
}

fn write_stub(path: &Path, contents: &str) -> PathBuf {
    fs::write(path, contents).expect("write stub");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod stub");
    path.to_path_buf()
}

impl Fixture {
    /// A `gpkgc` invocation wired to the stub toolkit, with the positional
    /// arguments already supplied.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("gpkgc").expect("gpkgc binary");
        cmd.env("GPKGC_OGRINFO", &self.ogrinfo)
            .env("GPKGC_OGR2OGR", &self.ogr2ogr)
            .env("GPKGC_STUB_LOG", &self.log)
            .arg(&self.input_dir)
            .arg(&self.output);
        cmd
    }

    pub fn make_gpkg(&self, name: &str, layers: &[(&str, u64)]) -> PathBuf {
        let path = self.input_dir.join(name);
        let body: String = layers
            .iter()
            .map(|(layer, rows)| format!("{layer}:{rows}\n"))
            .collect();
        fs::write(&path, body).expect("write container");
        path
    }

    pub fn make_invalid_gpkg(&self, name: &str) -> PathBuf {
        let path = self.input_dir.join(name);
        fs::write(&path, "INVALID\n").expect("write container");
        path
    }

    /// Layers of a fake container in file order.
    pub fn read_layers(&self, path: &Path) -> Vec<(String, u64)> {
        let contents = fs::read_to_string(path).expect("read container");
        contents
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| {
                let (name, rows) = line.split_once(':').expect("layer line");
                (name.to_string(), rows.parse().expect("row count"))
            })
            .collect()
    }

    pub fn log_lines(&self) -> Vec<String> {
        if !self.log.exists() {
            return Vec::new();
        }
        fs::read_to_string(&self.log)
            .expect("read stub log")
            .lines()
            .map(str::to_string)
            .collect()
    }
}

pub fn stdout_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).to_string()
}

pub fn stderr_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).to_string()
}
