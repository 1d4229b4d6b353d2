//! Parsing of the digest summary's estimated-token marker.
//!
//! Summaries end with a line like `Estimated tokens: 12.3K` or
//! `Estimated tokens: 1.2M`. The size policy reads that marker rather than
//! re-counting the content, matching the format the ingestion side emits.

/// Marker preceding the token estimate in a digest summary.
pub const ESTIMATE_MARKER: &str = "Estimated tokens: ";

/// A parsed token estimate from a digest summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenEstimate {
    /// Thousand-scale estimate, e.g. `12.3K`.
    Kilo(f64),
    /// Million-scale estimate, e.g. `1.2M`.
    Mega(f64),
}

/// Extract the token estimate from a summary, if present and well-formed.
///
/// Returns `None` when the marker is absent or the magnitude does not
/// parse; callers treat that as "no size information" rather than an error.
pub fn parse_token_estimate(summary: &str) -> Option<TokenEstimate> {
    let rest = summary.rsplit(ESTIMATE_MARKER).next()?;
    if rest.len() == summary.len() {
        // Marker not found; rsplit returned the whole input.
        return None;
    }
    let value = rest.lines().next()?.trim();

    if let Some(magnitude) = value.strip_suffix('M') {
        return magnitude.parse().ok().map(TokenEstimate::Mega);
    }
    if let Some(magnitude) = value.strip_suffix('K') {
        return magnitude.parse().ok().map(TokenEstimate::Kilo);
    }
    None
}
