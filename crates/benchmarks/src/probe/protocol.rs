// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Probe result line protocol.
//!
//! A probe prints exactly one tagged line on stdout:
//!
//! ```text
//! BENCHMARK_RESULT:<seconds>
//! BENCHMARK_ERROR:<message>
//! ```
//!
//! Every other line is ignored.

use crate::error::ProbeFailure;

/// Prefix of a successful result line.
pub const RESULT_PREFIX: &str = "BENCHMARK_RESULT:";

/// Prefix of an error line.
pub const ERROR_PREFIX: &str = "BENCHMARK_ERROR:";

/// First `BENCHMARK_ERROR:` message in `stdout`, if any.
pub fn find_error(stdout: &str) -> Option<&str> {
    stdout
        .lines()
        .find_map(|line| line.trim_end().strip_prefix(ERROR_PREFIX))
        .map(str::trim)
}

/// Parse the reported seconds from a probe's stdout.
///
/// The first result line wins. A result must be a finite, non-negative
/// number; an error line without a result is reported as such.
pub fn parse_result(stdout: &str) -> Result<f64, ProbeFailure> {
    let Some(raw) = stdout
        .lines()
        .find_map(|line| line.trim_end().strip_prefix(RESULT_PREFIX))
    else {
        return Err(match find_error(stdout) {
            Some(message) => ProbeFailure::Reported(message.to_string()),
            None => ProbeFailure::MissingResult,
        });
    };

    let raw = raw.trim();
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(ProbeFailure::InvalidResult(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_line_among_noise() {
        let stdout = "Loading checkpoint shards: 100%\nBENCHMARK_RESULT:12.75\ndone\n";
        assert_eq!(parse_result(stdout).unwrap(), 12.75);
    }

    #[test]
    fn test_first_result_wins() {
        let stdout = "BENCHMARK_RESULT:1.0\nBENCHMARK_RESULT:2.0\n";
        assert_eq!(parse_result(stdout).unwrap(), 1.0);
    }

    #[test]
    fn test_missing_result() {
        assert!(matches!(parse_result("hello\n"), Err(ProbeFailure::MissingResult)));
        assert!(matches!(parse_result(""), Err(ProbeFailure::MissingResult)));
    }

    #[test]
    fn test_error_line_is_reported() {
        let stdout = "BENCHMARK_ERROR: CUDA out of memory\n";
        match parse_result(stdout) {
            Err(ProbeFailure::Reported(msg)) => assert_eq!(msg, "CUDA out of memory"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_values() {
        for bad in ["abc", "-1.0", "inf", "NaN", ""] {
            let stdout = format!("BENCHMARK_RESULT:{bad}\n");
            assert!(
                matches!(parse_result(&stdout), Err(ProbeFailure::InvalidResult(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_tag_must_start_the_line() {
        let stdout = "note: BENCHMARK_RESULT:3.0\n";
        assert!(matches!(parse_result(stdout), Err(ProbeFailure::MissingResult)));
    }
}
