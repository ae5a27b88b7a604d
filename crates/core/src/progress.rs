// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

/// Progress feedback for long-running bulk operations.
///
/// Implementations are supplied by the caller (typically a progress dialog).
/// Bulk operations poll `should_abort` between iterations and stop cleanly
/// when it turns true.
pub trait ProgressReporter {
    /// Report completion in the range 0.0..=1.0.
    fn set_progress(&self, fraction: f64);

    fn should_abort(&self) -> bool {
        false
    }
}
