//! Human readable byte counts and transfer rates for status lines.

use std::time::Duration;

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Formats a byte count using binary units, e.g. `1.50 MiB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
	if bytes < 1024 {
		return format!("{bytes} B");
	}

	let mut value = bytes as f64;
	let mut unit = 0;
	while value >= 1024.0 && unit < UNITS.len() - 1 {
		value /= 1024.0;
		unit += 1;
	}

	format!("{value:.2} {}", UNITS[unit])
}

/// Bytes per second over `elapsed`, or `None` when no measurable time has passed.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn throughput(bytes: u64, elapsed: Duration) -> Option<f64> {
	let secs = elapsed.as_secs_f64();
	(secs > 0.0).then(|| bytes as f64 / secs)
}

/// Formats a rate produced by [`throughput`], e.g. `2.00 MiB/s`.
#[must_use]
#[allow(
	clippy::cast_possible_truncation,
	clippy::cast_sign_loss,
	clippy::cast_precision_loss
)]
pub fn format_rate(bytes_per_second: f64) -> String {
	if !bytes_per_second.is_finite() || bytes_per_second <= 0.0 {
		return "0 B/s".to_string();
	}

	format!("{}/s", format_bytes(bytes_per_second.round() as u64))
}
