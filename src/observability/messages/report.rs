// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for report output.

use std::fmt::{Display, Formatter};
use std::path::Path;

/// A report file was written.
///
/// # Log Level
/// `debug!` - One per file
pub struct ReportWritten<'a> {
    pub path: &'a Path,
    pub bytes: usize,
}

impl Display for ReportWritten<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Wrote {} ({} bytes)", self.path.display(), self.bytes)
    }
}

/// A report could not be written. The run carries on.
///
/// # Log Level
/// `error!` - Results for this target are only in memory
///
/// # Example
/// ```
/// use wasm_bakeoff::observability::messages::report::ReportFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
/// let msg = ReportFailed {
///     scope: "rust",
///     error: &error,
/// };
///
/// assert_eq!(msg.to_string(), "Failed to write report for rust: denied");
/// ```
pub struct ReportFailed<'a> {
    pub scope: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ReportFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to write report for {}: {}", self.scope, self.error)
    }
}
