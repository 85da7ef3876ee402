//! `set` / `off` subcommands: drive the configured lights directly.

use busylight_sync_lib::color::{Color, parse_color};
use busylight_sync_lib::device::{DeviceError, IndicatorDevice};

use super::{AppContext, BusylightError, GlobalOpts, Result, load_config_or_default};

pub(super) fn cmd_set(opts: &GlobalOpts, color: &str) -> Result<()> {
    let color = parse_color(color)?;
    apply(opts, color, |device| device.set_static_color(color))
}

pub(super) fn cmd_off(opts: &GlobalOpts) -> Result<()> {
    apply(opts, Color::OFF, |device| device.off())
}

/// Open every configured light and run `op` on each.
/// Fails only if no light accepted the change.
fn apply(
    opts: &GlobalOpts,
    color: Color,
    op: impl Fn(&mut dyn IndicatorDevice) -> std::result::Result<(), DeviceError>,
) -> Result<()> {
    let ctx = AppContext::new(load_config_or_default(opts)?);
    let mut devices = ctx.open_devices()?;

    let mut last_error = None;
    let mut applied = 0;
    for device in devices.iter_mut() {
        match op(device.as_mut()) {
            Ok(()) => {
                println!("{}: {color}", device.name());
                applied += 1;
            }
            Err(e) => {
                log::warn!("[light] {}: {e}", device.name());
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if applied == 0 => Err(BusylightError::Device(e)),
        _ => Ok(()),
    }
}
