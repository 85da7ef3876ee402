//! CLI subcommands: the reconciliation loop plus one-shot polling and light control.

mod config_cmd;
mod devices;
mod light;
mod poll;
mod run;

use std::path::PathBuf;

use clap::Subcommand;
use serde::Serialize;

pub(super) use busylight_sync_lib::BusylightError;
pub(super) use busylight_sync_lib::config::{Config, ConfigError};
pub(super) use busylight_sync_lib::context::AppContext;
pub(super) use busylight_sync_lib::error::Result;
pub(super) use busylight_sync_lib::shutdown::Shutdown;
pub(super) use busylight_sync_lib::usb::DiscoveredDevice;

const PADDING: usize = 2;

/// Flags shared by every subcommand.
pub struct GlobalOpts {
    pub json: bool,
    pub config: Option<PathBuf>,
}

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    println!("{text}");
    Ok(())
}

// ── Config loading ──

/// Load and validate the config; every problem is fatal.
pub(super) fn load_context(opts: &GlobalOpts) -> Result<AppContext> {
    let (config, _) = Config::load(opts.config.as_deref())?;
    Ok(AppContext::new(config))
}

/// Load the config if the file exists, defaults otherwise. Not validated.
pub(super) fn load_config_or_default(opts: &GlobalOpts) -> Result<Config> {
    let path = Config::resolve_path(opts.config.as_deref())?;
    match Config::load_from(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound(_)) => {
            log::debug!("[config] {} not found, using defaults", path.display());
            Ok(Config::default())
        }
        Err(e) => Err(e.into()),
    }
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub valid: bool,
    pub problems: Vec<String>,
    pub settings: Config,
}

#[derive(Serialize)]
pub(super) struct DevicesOutput {
    pub device_types: Vec<String>,
    pub source_types: Vec<String>,
    pub count: usize,
    pub attached: Vec<DiscoveredDevice>,
}

#[derive(Serialize)]
pub(super) struct SourcePollJson {
    pub name: String,
    pub busy: Option<bool>,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub(super) struct PollOutput {
    pub busy: bool,
    pub sources: Vec<SourcePollJson>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Poll the configured apps and keep the busylights in sync until Ctrl+C
    Run,

    /// Poll every configured app once and print the result (no light is touched)
    Poll,

    /// Set every configured busylight to a solid color
    Set {
        /// Color as #RRGGBB or a name (red, green, blue, ...)
        color: String,
    },

    /// Turn every configured busylight off
    Off,

    /// Show the resolved configuration (credentials redacted)
    Config,

    /// List supported busylight and app types, and attached Luxafor Flags
    Devices,
}

impl Command {
    /// Whether the command polls [`Shutdown`] and needs Ctrl+C routed to it.
    pub fn watches_shutdown(&self) -> bool {
        matches!(self, Command::Run)
    }
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, opts: &GlobalOpts, shutdown: &Shutdown) -> Result<()> {
    match cmd {
        Command::Run => {
            if opts.json {
                warn_json_unsupported("run");
            }
            run::cmd_run(opts, shutdown)
        }
        Command::Poll => poll::cmd_poll(opts),
        Command::Set { color } => {
            if opts.json {
                warn_json_unsupported("set");
            }
            light::cmd_set(opts, &color)
        }
        Command::Off => {
            if opts.json {
                warn_json_unsupported("off");
            }
            light::cmd_off(opts)
        }
        Command::Config => config_cmd::cmd_config(opts),
        Command::Devices => devices::cmd_devices(opts),
    }
}


#[cfg(test)]
mod json_output_tests {
    use super::*;

    #[test]
    fn config_output_settings_fields() {
        let output = ConfigOutput {
            config_file: None,
            config_file_exists: false,
            valid: false,
            problems: vec!["no app in configuration file".into()],
            settings: Config::default(),
        };
        let parsed = serde_json::to_value(&output).unwrap();
        assert!(parsed["config_file"].is_null());
        assert_eq!(parsed["valid"], false);
        assert_eq!(parsed["problems"][0], "no app in configuration file");
        assert_eq!(parsed["settings"]["busy_color"], "#FF0000");
        assert_eq!(parsed["settings"]["poll_interval_ms"], 1000);
        assert_eq!(parsed["settings"]["devices"][0], "luxafor-flag");
        assert!(parsed["settings"]["sources"].as_object().unwrap().is_empty());
    }

    #[test]
    fn poll_output_error_and_result() {
        let output = PollOutput {
            busy: true,
            sources: vec![
                SourcePollJson {
                    name: "fake".into(),
                    busy: None,
                    error: Some("timeout".into()),
                },
                SourcePollJson {
                    name: "toggl".into(),
                    busy: Some(true),
                    error: None,
                },
            ],
        };
        let parsed = serde_json::to_value(&output).unwrap();
        assert_eq!(parsed["busy"], true);
        assert!(parsed["sources"][0]["busy"].is_null());
        assert_eq!(parsed["sources"][0]["error"], "timeout");
        assert_eq!(parsed["sources"][1]["busy"], true);
    }

    #[test]
    fn devices_output_with_attached() {
        let output = DevicesOutput {
            device_types: vec!["luxafor-flag".into(), "virtual".into()],
            source_types: vec!["fake".into(), "toggl".into()],
            count: 1,
            attached: vec![DiscoveredDevice {
                path: "usb:001/004 [04d8:f372]".into(),
                serial: None,
            }],
        };
        let parsed = serde_json::to_value(&output).unwrap();
        assert_eq!(parsed["count"], 1);
        assert_eq!(parsed["device_types"][1], "virtual");
        assert!(parsed["attached"][0]["serial"].is_null());
    }
}

#[cfg(test)]
mod command_tests {
    use super::*;

    fn opts_for(path: &std::path::Path) -> GlobalOpts {
        GlobalOpts {
            json: false,
            config: Some(path.to_path_buf()),
        }
    }

    #[test]
    fn only_run_watches_shutdown() {
        assert!(Command::Run.watches_shutdown());
        for cmd in [
            Command::Poll,
            Command::Set {
                color: "red".into(),
            },
            Command::Off,
            Command::Config,
            Command::Devices,
        ] {
            assert!(!cmd.watches_shutdown());
        }
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let opts = opts_for(&dir.path().join("config.toml"));
        assert_eq!(load_config_or_default(&opts).unwrap(), Config::default());
    }

    #[test]
    fn load_context_requires_file() {
        let dir = tempfile::tempdir().unwrap();
        let opts = opts_for(&dir.path().join("config.toml"));
        let err = load_context(&opts).err().unwrap();
        assert!(
            err.to_string()
                .starts_with("no configuration file was found")
        );
    }

    #[test]
    fn set_on_virtual_device_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "devices = [\"virtual\"]\n").unwrap();
        let opts = opts_for(&path);
        assert!(light::cmd_set(&opts, "orange").is_ok());
        assert!(light::cmd_off(&opts).is_ok());
    }

    #[test]
    fn set_rejects_bad_color_before_opening_devices() {
        let dir = tempfile::tempdir().unwrap();
        let opts = opts_for(&dir.path().join("config.toml"));
        let err = light::cmd_set(&opts, "mauve-ish").unwrap_err();
        assert!(matches!(err, BusylightError::Color(_)));
    }

    #[test]
    fn config_cmd_succeeds_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = opts_for(&dir.path().join("config.toml"));
        assert!(config_cmd::cmd_config(&opts).is_ok());
        opts.json = true;
        assert!(config_cmd::cmd_config(&opts).is_ok());
    }
}
