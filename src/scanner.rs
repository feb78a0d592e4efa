//! Scan intake for keyboard-wedge and camera barcode scanners.
//!
//! The hardware collaborator (camera component, wedge scanner, serial
//! reader) delivers decoded text as discrete callback events; this module
//! is the normalising edge in front of the product resolver.
//!
//! Key design goals:
//! - **Toggle is instant**: turning intake off drops further events and
//!   never touches cart data
//! - **Plausibility gate**: empty and implausibly short/long codes are
//!   dropped before they reach the resolver
//! - **Double-read guard**: the same code arriving twice within a short
//!   window is one physical scan, not two items

use std::time::{Duration, Instant};

use tracing::debug;

/// Codes outside this length range are scanner noise, not barcodes.
const MIN_CODE_LEN: usize = 3;
const MAX_CODE_LEN: usize = 50;

/// Same-code reads inside this window are duplicates of one pass. Kept
/// short so deliberately rescanning an item (quantity merge) still works.
const SCAN_DEBOUNCE: Duration = Duration::from_millis(400);

/// Why a scan event was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Intake is toggled off.
    Inactive,
    /// Empty after trimming.
    Empty,
    TooShort,
    TooLong,
    /// Same code within the debounce window.
    DuplicateRead,
}

/// Outcome of feeding one raw scan into the intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Trimmed code, ready for the product resolver.
    Accepted(String),
    Ignored(IgnoreReason),
}

/// Per-session scan intake state.
#[derive(Debug)]
pub struct ScanIntake {
    active: bool,
    last: Option<(String, Instant)>,
    debounce: Duration,
}

impl Default for ScanIntake {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanIntake {
    pub fn new() -> Self {
        Self {
            active: true,
            last: None,
            debounce: SCAN_DEBOUNCE,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Toggle intake. Takes effect immediately; pending cart data is
    /// untouched either way.
    pub fn set_active(&mut self, on: bool) {
        self.active = on;
    }

    /// Feed one raw scan event.
    pub fn submit(&mut self, raw: &str) -> ScanEvent {
        self.submit_at(raw, Instant::now())
    }

    fn submit_at(&mut self, raw: &str, now: Instant) -> ScanEvent {
        if !self.active {
            return ScanEvent::Ignored(IgnoreReason::Inactive);
        }

        let code = raw.trim();
        if code.is_empty() {
            return ScanEvent::Ignored(IgnoreReason::Empty);
        }
        if code.len() < MIN_CODE_LEN {
            debug!(code, "scan dropped: too short");
            return ScanEvent::Ignored(IgnoreReason::TooShort);
        }
        if code.len() > MAX_CODE_LEN {
            debug!(len = code.len(), "scan dropped: too long");
            return ScanEvent::Ignored(IgnoreReason::TooLong);
        }

        if let Some((last_code, last_time)) = &self.last {
            if last_code == code && now.duration_since(*last_time) < self.debounce {
                debug!(code, "scan dropped: duplicate read");
                return ScanEvent::Ignored(IgnoreReason::DuplicateRead);
            }
        }

        self.last = Some((code.to_string(), now));
        ScanEvent::Accepted(code.to_string())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_trimmed_code() {
        let mut intake = ScanIntake::new();
        assert_eq!(
            intake.submit(" 123456 \r\n"),
            ScanEvent::Accepted("123456".to_string())
        );
    }

    #[test]
    fn test_ignores_when_inactive() {
        let mut intake = ScanIntake::new();
        intake.set_active(false);
        assert_eq!(
            intake.submit("123456"),
            ScanEvent::Ignored(IgnoreReason::Inactive)
        );

        // Toggling back on resumes immediately.
        intake.set_active(true);
        assert!(matches!(intake.submit("123456"), ScanEvent::Accepted(_)));
    }

    #[test]
    fn test_empty_and_implausible_codes_dropped() {
        let mut intake = ScanIntake::new();
        assert_eq!(intake.submit("   "), ScanEvent::Ignored(IgnoreReason::Empty));
        assert_eq!(
            intake.submit("99"),
            ScanEvent::Ignored(IgnoreReason::TooShort)
        );
        assert_eq!(
            intake.submit(&"9".repeat(51)),
            ScanEvent::Ignored(IgnoreReason::TooLong)
        );
    }

    #[test]
    fn test_double_read_within_window_dropped() {
        let mut intake = ScanIntake::new();
        let t0 = Instant::now();
        assert!(matches!(
            intake.submit_at("123456", t0),
            ScanEvent::Accepted(_)
        ));
        assert_eq!(
            intake.submit_at("123456", t0 + Duration::from_millis(100)),
            ScanEvent::Ignored(IgnoreReason::DuplicateRead)
        );
    }

    #[test]
    fn test_rescan_after_window_accepted() {
        let mut intake = ScanIntake::new();
        let t0 = Instant::now();
        assert!(matches!(
            intake.submit_at("123456", t0),
            ScanEvent::Accepted(_)
        ));
        assert!(matches!(
            intake.submit_at("123456", t0 + Duration::from_millis(600)),
            ScanEvent::Accepted(_)
        ));
    }

    #[test]
    fn test_different_code_inside_window_accepted() {
        let mut intake = ScanIntake::new();
        let t0 = Instant::now();
        assert!(matches!(
            intake.submit_at("123456", t0),
            ScanEvent::Accepted(_)
        ));
        assert!(matches!(
            intake.submit_at("789012", t0 + Duration::from_millis(50)),
            ScanEvent::Accepted(_)
        ));
    }
}
