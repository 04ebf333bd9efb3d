//! Column name sanitization

use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_]+").expect("valid regex"));

/// Turn a document field name into a column name.
///
/// Lower-cases, collapses every run of non-word characters into a single
/// `_`, then strips leading underscores. Idempotent.
///
/// ```
/// use doc2table::schema::sanitize_name;
///
/// assert_eq!(sanitize_name("az:19:AZ"), "az_19_az");
/// assert_eq!(sanitize_name("_id"), "id");
/// ```
pub fn sanitize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let replaced = NON_WORD.replace_all(&lowered, "_");
    replaced.trim_start_matches('_').to_string()
}
