//! Subcommand implementations

pub mod events;
pub mod metrics;
pub mod status;
pub mod target;

use anyhow::{bail, Context, Result};
use std::time::Duration;

/// Parse `90`, `90s`, `30m`, `1h` or `7d`
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    let (digits, unit) = match input.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => input.split_at(idx),
        None => (input, "s"),
    };

    let amount: u64 = digits
        .parse()
        .with_context(|| format!("Invalid duration: {input}"))?;

    let multiplier: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => bail!("Invalid duration unit in {input} (expected s, m, h or d)"),
    };

    let secs = amount
        .checked_mul(multiplier)
        .with_context(|| format!("Invalid duration: {input} is too large"))?;

    Ok(Duration::from_secs(secs))
}
