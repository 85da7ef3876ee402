//! Application context: turns a validated [`Config`] into live sources and devices.
//!
//! Consolidates the startup sequence shared by the CLI commands: build one
//! authenticated client per configured source, construct the sources and open
//! the devices through the registries, then hand both to a [`Reconciler`].
//! A failing entry is logged and dropped; only an empty result is fatal.

use std::fmt;
use std::time::Duration;

use crate::config::{Config, SourceConfig};
use crate::device::{DeviceRegistry, IndicatorDevice};
use crate::http::HttpClient;
use crate::reconcile::Reconciler;
use crate::source::{SourceError, SourceParams, SourceRegistry, StatusSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupError {
    /// The config lists no device names.
    NoDeviceNames,
    /// Every configured device failed to open.
    NoDeviceOpened,
    /// Every configured source failed to build.
    NoSourceLoaded,
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::NoDeviceNames => write!(f, "no busylights on given list"),
            StartupError::NoDeviceOpened => write!(f, "no busylight found"),
            StartupError::NoSourceLoaded => write!(f, "no app could be loaded from given config"),
        }
    }
}

impl std::error::Error for StartupError {}

/// Authenticated client for one source. Sources without a credential are rejected.
pub fn http_client_for(config: &SourceConfig, timeout: Duration) -> Result<HttpClient, SourceError> {
    let credential = config
        .credential()
        .ok_or_else(|| SourceError::Client("given app config is empty".into()))?;
    HttpClient::new(Some(&credential), timeout)
}

/// Config plus the constructor tables used to realize it.
pub struct AppContext {
    pub config: Config,
    pub sources: SourceRegistry,
    pub devices: DeviceRegistry,
}

impl AppContext {
    /// Context with the built-in registries.
    pub fn new(config: Config) -> Self {
        Self::with_registries(
            config,
            SourceRegistry::with_builtin_sources(),
            DeviceRegistry::with_builtin_devices(),
        )
    }

    pub fn with_registries(
        config: Config,
        sources: SourceRegistry,
        devices: DeviceRegistry,
    ) -> Self {
        AppContext {
            config,
            sources,
            devices,
        }
    }

    /// Build every configured source, in config order.
    pub fn build_sources(&self) -> crate::error::Result<Vec<Box<dyn StatusSource>>> {
        let timeout = self.config.http_timeout();
        let mut built = Vec::new();

        for (name, source_config) in &self.config.sources {
            let client = match http_client_for(source_config, timeout) {
                Ok(client) => client,
                Err(e) => {
                    log::warn!("[startup] {name}: cannot create HTTP client: {e}");
                    continue;
                }
            };
            let params = SourceParams {
                base_url: source_config.base_url.clone(),
            };
            match self.sources.build(name, client, &params) {
                Ok(source) => {
                    log::info!("[startup] source {name} loaded");
                    built.push(source);
                }
                Err(e) => log::warn!("[startup] {name}: cannot load source: {e}"),
            }
        }

        if built.is_empty() {
            return Err(StartupError::NoSourceLoaded.into());
        }
        Ok(built)
    }

    /// Open every configured device, in config order.
    pub fn open_devices(&self) -> crate::error::Result<Vec<Box<dyn IndicatorDevice>>> {
        if self.config.devices.is_empty() {
            return Err(StartupError::NoDeviceNames.into());
        }

        let mut opened = Vec::new();
        for name in &self.config.devices {
            match self.devices.open(name) {
                Ok(device) => {
                    log::info!("[startup] busylight {name} opened");
                    opened.push(device);
                }
                Err(e) => log::warn!("[startup] {name}: cannot open busylight: {e}"),
            }
        }

        if opened.is_empty() {
            return Err(StartupError::NoDeviceOpened.into());
        }
        Ok(opened)
    }

    /// Open devices, build sources, and wire them into a reconciler.
    pub fn reconciler(&self) -> crate::error::Result<Reconciler> {
        let colors = self.config.busy_colors()?;
        let devices = self.open_devices()?;
        let sources = self.build_sources()?;
        Ok(Reconciler::new(
            sources,
            devices,
            colors,
            self.config.poll_interval(),
        ))
    }
}
