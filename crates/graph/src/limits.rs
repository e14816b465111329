const MAX_EXTRACT_CONCURRENCY: usize = 64;

pub const EXTRACT_CONCURRENCY_ENV: &str = "REFSCOPE_EXTRACT_CONCURRENCY";

/// Available hardware concurrency, never above 64
pub fn hardware_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_EXTRACT_CONCURRENCY)
}

/// Parse a concurrency override, falling back to `default_value` when absent or
/// malformed. The result is always within `1..=max`.
pub fn parse_extract_concurrency(raw: Option<&str>, default_value: usize, max: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(1, max.max(1))
}

/// Worker count for reference extraction: `REFSCOPE_EXTRACT_CONCURRENCY` or the
/// number of available cores, whichever is lower.
pub fn extract_concurrency() -> usize {
    let raw = std::env::var(EXTRACT_CONCURRENCY_ENV).ok();
    let cores = hardware_concurrency();
    parse_extract_concurrency(raw.as_deref(), cores, cores)
}
