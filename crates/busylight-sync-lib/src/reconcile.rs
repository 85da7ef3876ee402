//! Reconciliation loop: keeps the lights in step with the aggregate busy state.
//!
//! Each tick polls every source, ORs the answers, and compares the result with
//! the state the lights were last told to show. Only a flip writes to the
//! devices. [`Reconciler`] holds that single bit of state; the free functions
//! [`any_source_busy`] and [`change_state`] are the two halves of a tick and are
//! usable on their own by one-shot commands.

use std::fmt;
use std::time::Duration;

use crate::color::Color;
use crate::device::{DeviceError, IndicatorDevice};
use crate::shutdown::Shutdown;
use crate::source::StatusSource;

// ── Error type ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// `change_state` was handed no devices.
    NoBusylightsToChange,
    /// The reconciler has no devices.
    NoBusylights,
    /// The reconciler has no sources.
    NoSources,
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::NoBusylightsToChange => {
                write!(f, "no busylights has been given to change their states")
            }
            ReconcileError::NoBusylights => write!(f, "no busylights on given list"),
            ReconcileError::NoSources => write!(f, "no apps on given list"),
        }
    }
}

impl std::error::Error for ReconcileError {}

pub type Result<T> = std::result::Result<T, ReconcileError>;

// ── Colors ──

/// The two colors the loop switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyColors {
    pub busy: Color,
    pub idle: Color,
}

impl Default for BusyColors {
    fn default() -> Self {
        BusyColors {
            busy: Color::RED,
            idle: Color::GREEN,
        }
    }
}

impl BusyColors {
    pub fn for_state(&self, is_busy: bool) -> Color {
        if is_busy { self.busy } else { self.idle }
    }
}

// ── Outcomes ──

/// What a tick decided to do with the devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    ApplyBusy,
    ApplyIdle,
    /// Aggregate unchanged, nothing written.
    NoChange,
}

/// Result of commanding every device to one color.
#[derive(Debug, Default)]
pub struct ChangeReport {
    /// Names of devices that took the new color.
    pub applied: Vec<String>,
    /// Devices whose write failed, with the error.
    pub failed: Vec<(String, DeviceError)>,
}

impl ChangeReport {
    pub fn all_applied(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub struct TickOutcome {
    pub is_busy: bool,
    pub action: ReconcileAction,
    /// Present iff `action` is not `NoChange`.
    pub report: Option<ChangeReport>,
}

// ── Tick halves ──

/// Poll `sources` in order; `true` at the first busy one.
///
/// A failed poll is logged and counts as not busy.
pub fn any_source_busy(sources: &[Box<dyn StatusSource>]) -> bool {
    sources.iter().any(|source| match source.is_busy() {
        Ok(busy) => {
            log::debug!("[reconcile] {} busy={busy}", source.name());
            busy
        }
        Err(e) => {
            log::warn!("[reconcile] {} poll failed: {e}", source.name());
            false
        }
    })
}

/// Set every device to the color for `is_busy`.
///
/// A failing device is logged and skipped; the rest are still updated.
pub fn change_state(
    is_busy: bool,
    devices: &mut [Box<dyn IndicatorDevice>],
    colors: &BusyColors,
) -> Result<ChangeReport> {
    if devices.is_empty() {
        return Err(ReconcileError::NoBusylightsToChange);
    }

    let color = colors.for_state(is_busy);
    let mut report = ChangeReport::default();
    for device in devices.iter_mut() {
        match device.set_static_color(color) {
            Ok(()) => report.applied.push(device.name().to_string()),
            Err(e) => {
                log::warn!("[reconcile] {}: failed to set {color}: {e}", device.name());
                report.failed.push((device.name().to_string(), e));
            }
        }
    }
    Ok(report)
}

/// Turn every device off, logging failures.
pub fn turn_off_all(devices: &mut [Box<dyn IndicatorDevice>]) {
    for device in devices.iter_mut() {
        if let Err(e) = device.off() {
            log::warn!("[reconcile] {}: failed to turn off: {e}", device.name());
        }
    }
}

// ── Reconciler ──

/// Owns the active sources and devices plus the last applied busy state.
pub struct Reconciler {
    sources: Vec<Box<dyn StatusSource>>,
    devices: Vec<Box<dyn IndicatorDevice>>,
    colors: BusyColors,
    interval: Duration,
    was_busy: bool,
}

impl Reconciler {
    pub fn new(
        sources: Vec<Box<dyn StatusSource>>,
        devices: Vec<Box<dyn IndicatorDevice>>,
        colors: BusyColors,
        interval: Duration,
    ) -> Self {
        Reconciler {
            sources,
            devices,
            colors,
            interval,
            was_busy: false,
        }
    }

    fn check_preconditions(&self) -> Result<()> {
        if self.devices.is_empty() {
            return Err(ReconcileError::NoBusylights);
        }
        if self.sources.is_empty() {
            return Err(ReconcileError::NoSources);
        }
        Ok(())
    }

    /// Force every device to the idle color and reset the state to idle.
    pub fn initialize(&mut self) -> Result<ChangeReport> {
        self.was_busy = false;
        change_state(false, &mut self.devices, &self.colors)
    }

    /// One poll-aggregate-diff-apply cycle.
    ///
    /// Errors (and leaves the state untouched) when either side is empty.
    /// `was_busy` advances even if some devices failed to update.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        self.check_preconditions()?;

        let is_busy = any_source_busy(&self.sources);
        if is_busy == self.was_busy {
            return Ok(TickOutcome {
                is_busy,
                action: ReconcileAction::NoChange,
                report: None,
            });
        }

        log::info!(
            "[reconcile] {} -> {}",
            state_name(self.was_busy),
            state_name(is_busy)
        );
        let report = change_state(is_busy, &mut self.devices, &self.colors)?;
        self.was_busy = is_busy;

        Ok(TickOutcome {
            is_busy,
            action: if is_busy {
                ReconcileAction::ApplyBusy
            } else {
                ReconcileAction::ApplyIdle
            },
            report: Some(report),
        })
    }

    /// Initialize, then tick every interval until `shutdown` fires.
    /// Devices are turned off before returning.
    pub fn run(&mut self, shutdown: &Shutdown) -> Result<()> {
        self.check_preconditions()?;
        self.initialize()?;
        log::info!(
            "[reconcile] watching {} source(s) on {} device(s), every {:?}",
            self.sources.len(),
            self.devices.len(),
            self.interval
        );

        while !shutdown.is_triggered() {
            self.tick()?;
            if shutdown.wait(self.interval) {
                break;
            }
        }

        log::info!("[reconcile] shutting down");
        self.shutdown_devices();
        Ok(())
    }

    pub fn was_busy(&self) -> bool {
        self.was_busy
    }

    pub fn colors(&self) -> &BusyColors {
        &self.colors
    }

    pub fn devices(&self) -> &[Box<dyn IndicatorDevice>] {
        &self.devices
    }

    /// Turn every device off.
    pub fn shutdown_devices(&mut self) {
        turn_off_all(&mut self.devices);
    }
}

fn state_name(is_busy: bool) -> &'static str {
    if is_busy { "busy" } else { "idle" }
}
