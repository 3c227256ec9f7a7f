use rustc_hash::FxHashMap;

/// Denormalized parameter values keyed by parameter name.
pub type ParameterValues = FxHashMap<String, f32>;

/// Splits `values` into its finite entries, logging and counting the rest.
///
/// Returns the finite subset and the number of entries dropped. `source`
/// names the writer for the diagnostic.
pub fn finite_only(values: &ParameterValues, source: &str) -> (ParameterValues, usize) {
    let mut kept = ParameterValues::with_capacity_and_hasher(values.len(), Default::default());
    let mut dropped = 0;

    for (name, &value) in values {
        if value.is_finite() {
            kept.insert(name.clone(), value);
        } else {
            log::warn!("Dropping non-finite {source} value for '{name}': {value}");
            dropped += 1;
        }
    }

    (kept, dropped)
}
