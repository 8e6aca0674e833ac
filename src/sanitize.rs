//! Filesystem-safe names for output files.

use once_cell::sync::Lazy;
use regex::Regex;

const MAX_LEN: usize = 100;
const FALLBACK: &str = "unnamed";

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]").unwrap());
static REPEATED_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").unwrap());

/// Derive a stable file name stem from a display name.
///
/// The result is non-empty, matches `[a-z0-9_-]+`, is at most 100
/// characters long, and `sanitize_name(sanitize_name(x)) == sanitize_name(x)`.
pub fn sanitize_name(name: &str) -> String {
    let spaced = name.replace(['\r', '\n'], " ");
    let separated = spaced.replace(['/', '\\'], "_");
    let safe = UNSAFE_CHARS.replace_all(&separated, "_");
    let collapsed = REPEATED_UNDERSCORES.replace_all(&safe, "_");
    let lowered = trim_edges(&collapsed).to_ascii_lowercase();

    // Only ASCII is left, so byte truncation is safe.
    let mut truncated = lowered;
    truncated.truncate(MAX_LEN);
    let result = trim_edges(&truncated);

    if result.is_empty() {
        FALLBACK.to_string()
    } else {
        result.to_string()
    }
}

fn trim_edges(s: &str) -> &str {
    s.trim_matches(|c: char| c == '_' || c.is_whitespace())
}
