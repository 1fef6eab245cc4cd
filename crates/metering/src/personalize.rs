//! Per-caller decoration of a shared base payload.

/// Append a note listing the caller's existing plants to `base`.
///
/// Blank extras are dropped first, then the first `max_items` of the rest
/// are named.  With no extras (or `max_items == 0`) the base is returned
/// unchanged.  The function is pure:
/// the cached base a caller passes in is never modified.
pub fn personalize(base: &str, extras: &[String], max_items: usize) -> String {
    let shown: Vec<&str> = extras
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(max_items)
        .collect();

    if shown.is_empty() {
        return base.to_owned();
    }

    format!(
        "{base}\n\n---\n*You already have {} in your garden. Consider companion planting opportunities!*",
        shown.join(", ")
    )
}
