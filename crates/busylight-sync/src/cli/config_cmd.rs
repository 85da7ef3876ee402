//! `config` subcommand: show the resolved configuration and its problems.

use busylight_sync_lib::color::{format_color, parse_color};

use super::{
    Config, ConfigOutput, GlobalOpts, Result, kv, kv_indent, kv_width, load_config_or_default,
    print_json,
};

pub(super) fn cmd_config(opts: &GlobalOpts) -> Result<()> {
    let config_path = Config::resolve_path(opts.config.as_deref()).ok();
    let config_exists = config_path.as_ref().is_some_and(|p| p.is_file());
    let config = if config_path.is_some() {
        load_config_or_default(opts)?
    } else {
        Config::default()
    };
    let problems: Vec<String> = match config.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    };
    let shown = config.redacted();

    if opts.json {
        return print_json(&ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            valid: problems.is_empty(),
            problems,
            settings: shown,
        });
    }

    // Human-readable output
    let w = kv_width(
        &["Config file:"],
        &[
            "busy_color:",
            "idle_color:",
            "poll_interval_ms:",
            "http_timeout_secs:",
            "devices:",
            "base_url:",
        ],
    );

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    let color_display = |value: &str| match parse_color(value) {
        Ok(c) => format!("{value} -> {}", format_color(c)),
        Err(_) => format!("{value} (invalid)"),
    };
    kv_indent("busy_color:", color_display(&shown.busy_color), w);
    kv_indent("idle_color:", color_display(&shown.idle_color), w);
    kv_indent("poll_interval_ms:", shown.poll_interval_ms, w);
    kv_indent("http_timeout_secs:", shown.http_timeout_secs, w);
    kv_indent("devices:", shown.devices.join(", "), w);
    println!();

    println!("Apps:");
    if shown.sources.is_empty() {
        println!("  (none)");
    }
    for (name, source) in &shown.sources {
        let auth = &source.basic_auth;
        let status = if auth.is_empty() {
            "no credentials".to_string()
        } else {
            format!("basic auth as {}", auth.username)
        };
        kv_indent(&format!("{name}:"), status, w);
        if let Some(base_url) = &source.base_url {
            kv_indent("  base_url:", base_url, w);
        }
    }

    if !problems.is_empty() {
        println!();
        println!("Problems:");
        for problem in &problems {
            println!("  - {problem}");
        }
    }
    Ok(())
}
