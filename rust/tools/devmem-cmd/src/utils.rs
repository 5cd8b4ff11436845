//! Common utilities for the devmem tool

use devmem::WordSize;

/// Parses an unsigned integer with an optional `0x`, `0o` or `0b` radix prefix.
/// Underscores between digits are ignored.
pub fn parse_address(s: &str) -> Result<u64, String> {
    let cleaned = s.trim().replace('_', "");
    let lower = cleaned.to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else {
        (lower.as_str(), 10)
    };
    if digits.is_empty() || digits.starts_with('+') {
        return Err(format!("invalid integer '{s}'"));
    }
    u64::from_str_radix(digits, radix).map_err(|e| format!("invalid integer '{s}': {e}"))
}

/// Parses a possibly negative word count, accepting the same prefixes as
/// [`parse_address`].
pub fn parse_count(s: &str) -> Result<i64, String> {
    let trimmed = s.trim();
    let (negative, magnitude) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let value = parse_address(magnitude)?;
    let value = i64::try_from(value).map_err(|_| format!("count '{s}' is too large"))?;
    Ok(if negative { -value } else { value })
}

pub fn parse_word_size(s: &str) -> Result<WordSize, String> {
    s.parse::<WordSize>()
        .map_err(|_| format!("invalid word size '{s}' (expected 1, 2 or 4)"))
}

/// Initializes `env_logger`. `RUST_LOG` takes precedence over the default filter,
/// which is `debug` when `debug` is set and `warn` otherwise.
pub fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();
}
