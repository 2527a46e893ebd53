//! Display refresh-rate probing.
//!
//! The pacer's target rate comes from the receiving display. Detection
//! shells out to the platform's display tool and parses the active mode;
//! any failure — missing tool, unparseable output, headless box —
//! degrades to [`DEFAULT_REFRESH_RATE`]. This function never errors.
//!
//! # Platform
//!
//! Linux (`xrandr`), Windows (`wmic`), macOS (`system_profiler`). On
//! anything else the probe is a no-op and the default applies.

use tracing::{debug, warn};

/// Safe fallback when detection fails.
pub const DEFAULT_REFRESH_RATE: u32 = 60;

/// Detect the primary display's refresh rate in Hz.
///
/// Called once at sender startup.
pub fn detect_refresh_rate() -> u32 {
    match probe() {
        Some(hz) if hz > 0 => {
            debug!(hz, "detected display refresh rate");
            hz
        }
        _ => {
            warn!(
                "could not detect display refresh rate; defaulting to {} Hz",
                DEFAULT_REFRESH_RATE
            );
            DEFAULT_REFRESH_RATE
        }
    }
}

// ── Platform probes ──────────────────────────────────────────────

#[cfg(target_os = "linux")]
fn probe() -> Option<u32> {
    let output = std::process::Command::new("xrandr").output().ok()?;
    parse_xrandr(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(target_os = "windows")]
fn probe() -> Option<u32> {
    let output = std::process::Command::new("wmic")
        .args(["PATH", "Win32_VideoController", "get", "CurrentRefreshRate"])
        .output()
        .ok()?;
    parse_wmic(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(target_os = "macos")]
fn probe() -> Option<u32> {
    let output = std::process::Command::new("system_profiler")
        .arg("SPDisplaysDataType")
        .output()
        .ok()?;
    parse_system_profiler(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
fn probe() -> Option<u32> {
    None
}

// ── Parsers ──────────────────────────────────────────────────────
//
// Kept platform-independent so every platform's parser is unit-tested
// everywhere.

/// xrandr marks the active mode's rate with `*`, e.g. `165.00*+`.
#[allow(dead_code)]
fn parse_xrandr(output: &str) -> Option<u32> {
    for token in output.split_whitespace() {
        if !token.contains('*') {
            continue;
        }
        let cleaned = token.trim_end_matches(['*', '+']);
        if let Ok(rate) = cleaned.parse::<f64>() {
            return Some(rate.round() as u32);
        }
    }
    None
}

/// wmic prints one integer per controller; take the highest on
/// multi-monitor boxes.
#[allow(dead_code)]
fn parse_wmic(output: &str) -> Option<u32> {
    output
        .split_whitespace()
        .filter_map(|token| token.parse::<u32>().ok())
        .max()
}

/// system_profiler prints the active mode as `... @ 120.00Hz` (the
/// space before `Hz` varies by OS release).
#[allow(dead_code)]
fn parse_system_profiler(output: &str) -> Option<u32> {
    for line in output.lines() {
        let Some(at) = line.find("@ ") else { continue };
        let rest = &line[at + 2..];

        let number: String = rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if number.is_empty() {
            continue;
        }
        if !rest[number.len()..].trim_start().starts_with("Hz") {
            continue;
        }
        if let Ok(rate) = number.parse::<f64>() {
            return Some(rate.round() as u32);
        }
    }
    None
}

// ── Tests ────────────────────────────────────────────────────────
