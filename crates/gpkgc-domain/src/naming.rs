use std::collections::BTreeSet;

/// Picks a layer name that does not collide with `existing`.
///
/// Returns `desired` untouched when it is free, otherwise probes `desired_2`,
/// `desired_3`, and so on until a free candidate turns up. The caller owns
/// `existing` and must record the returned name itself before resolving the
/// next layer, since every accepted name shrinks the free namespace.
pub fn resolve_unique(desired: &str, existing: &BTreeSet<String>) -> String {
    if !existing.contains(desired) {
        return desired.to_string();
    }
    let mut suffix: u32 = 2;
    loop {
        let candidate = format!("{desired}_{suffix}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
