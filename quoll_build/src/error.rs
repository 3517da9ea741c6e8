//! Build diagnostics.
//!
//! Two layers: [`BuildError`] aborts a single directive or rule and is
//! caught at the directive boundary; [`Diagnostic`] is what accumulates on
//! the game data. Warnings never block the pipeline; Errors and Fatals stop
//! it at the next phase gate.

use quoll_common::Origin;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
            Severity::Fatal => f.write_str("fatal"),
        }
    }
}

/// One accumulated build message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub origin: Origin,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.origin, self.severity, self.message)
    }
}

/// Abort signal for a single parse rule. The enclosing directive converts
/// it into a [`Diagnostic`] and resynchronizes at the next `;`.
#[derive(Debug, Clone, Error)]
#[error("{origin}: {message}")]
pub struct BuildError {
    pub origin: Origin,
    pub message: String,
}

impl BuildError {
    pub fn new(origin: Origin, message: impl Into<String>) -> Self {
        BuildError {
            origin,
            message: message.into(),
        }
    }
}
