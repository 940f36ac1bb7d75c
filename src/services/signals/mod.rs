//! Trading signals service module.
//!
//! Provides technical indicator calculations, chart pattern detection and
//! composite momentum scoring. Nothing in here performs I/O.

pub mod indicators;
pub mod momentum;
pub mod patterns;

pub use momentum::{run_momentum_scan, score_series};
pub use patterns::{detect_patterns, scan_patterns};

/// Round to 2 decimal places, the precision every emitted number uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to 4 decimal places.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(-0.005001), -0.01);
        assert_eq!(round2(2.0), 2.0);
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.123456), 0.1235);
    }
}
