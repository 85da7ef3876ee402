//! Unified error type for the busylight-sync-lib crate.
//!
//! [`BusylightError`] wraps module-specific errors (`DeviceError`, `SourceError`,
//! `ConfigError`, `ReconcileError`, `StartupError`) and the color parse error.
//! `From` impls allow `?` to propagate across module boundaries seamlessly.

use std::fmt;

use crate::config::ConfigError;
use crate::context::StartupError;
use crate::device::DeviceError;
use crate::reconcile::ReconcileError;
use crate::source::SourceError;

/// Unified error type for busylight-sync-lib operations.
#[derive(Debug)]
pub enum BusylightError {
    /// Busylight open/write error.
    Device(DeviceError),
    /// Status source construction or poll error.
    Source(SourceError),
    /// Configuration load or validation error.
    Config(ConfigError),
    /// Reconciliation precondition error (empty source or device set).
    Reconcile(ReconcileError),
    /// Startup produced an empty active set.
    Startup(StartupError),
    /// Standard I/O error.
    Io(std::io::Error),
    /// Color parsing error.
    Color(String),
}

impl fmt::Display for BusylightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusylightError::Device(e) => write!(f, "{e}"),
            BusylightError::Source(e) => write!(f, "{e}"),
            BusylightError::Config(e) => write!(f, "{e}"),
            BusylightError::Reconcile(e) => write!(f, "{e}"),
            BusylightError::Startup(e) => write!(f, "{e}"),
            BusylightError::Io(e) => write!(f, "I/O error: {e}"),
            BusylightError::Color(e) => write!(f, "Color error: {e}"),
        }
    }
}

impl std::error::Error for BusylightError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BusylightError::Device(e) => Some(e),
            BusylightError::Source(e) => Some(e),
            BusylightError::Config(e) => Some(e),
            BusylightError::Reconcile(e) => Some(e),
            BusylightError::Startup(e) => Some(e),
            BusylightError::Io(e) => Some(e),
            BusylightError::Color(_) => None,
        }
    }
}

impl From<DeviceError> for BusylightError {
    fn from(e: DeviceError) -> Self {
        BusylightError::Device(e)
    }
}

impl From<SourceError> for BusylightError {
    fn from(e: SourceError) -> Self {
        BusylightError::Source(e)
    }
}

impl From<ConfigError> for BusylightError {
    fn from(e: ConfigError) -> Self {
        BusylightError::Config(e)
    }
}

impl From<ReconcileError> for BusylightError {
    fn from(e: ReconcileError) -> Self {
        BusylightError::Reconcile(e)
    }
}

impl From<StartupError> for BusylightError {
    fn from(e: StartupError) -> Self {
        BusylightError::Startup(e)
    }
}

impl From<std::io::Error> for BusylightError {
    fn from(e: std::io::Error) -> Self {
        BusylightError::Io(e)
    }
}

/// Crate-level Result alias using [`BusylightError`].
pub type Result<T> = std::result::Result<T, BusylightError>;
