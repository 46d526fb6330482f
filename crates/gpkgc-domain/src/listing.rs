/// Extracts ordered layer names from `ogrinfo -so` summary output.
///
/// Layer lines carry a fixed `N: ` prefix, for example
/// `1: parcels (Multi Polygon)`. The name is the first whitespace-delimited
/// token after the separator; the trailing geometry-type annotation (which may
/// itself contain spaces) is dropped. Every other line, including the `INFO:`
/// banner ogrinfo prints on open, is ignored. Order is preserved as reported.
pub fn parse_layer_summary(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(layer_name)
        .map(str::to_string)
        .collect()
}

fn layer_name(line: &str) -> Option<&str> {
    let (ordinal, rest) = line.split_once(": ")?;
    if ordinal.is_empty() || !ordinal.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    rest.split_whitespace().next()
}
