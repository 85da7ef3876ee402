//! `devices` subcommand: supported types and attached Luxafor Flags.

use busylight_sync_lib::device::DeviceRegistry;
use busylight_sync_lib::protocol::{LUXAFOR_FLAG_PID, LUXAFOR_FLAG_VID};
use busylight_sync_lib::source::SourceRegistry;
use busylight_sync_lib::usb::enumerate_devices;

use super::{DevicesOutput, GlobalOpts, Result, print_json};

pub(super) fn cmd_devices(opts: &GlobalOpts) -> Result<()> {
    let device_types: Vec<String> = DeviceRegistry::with_builtin_devices()
        .names()
        .map(String::from)
        .collect();
    let source_types: Vec<String> = SourceRegistry::with_builtin_sources()
        .names()
        .map(String::from)
        .collect();
    let attached = enumerate_devices(LUXAFOR_FLAG_VID, LUXAFOR_FLAG_PID);

    if opts.json {
        return print_json(&DevicesOutput {
            device_types,
            source_types,
            count: attached.len(),
            attached,
        });
    }

    println!("Busylight types: {}", device_types.join(", "));
    println!("App types:       {}", source_types.join(", "));
    println!();

    if attached.is_empty() {
        println!("No Luxafor Flag found.");
        return Ok(());
    }

    println!(
        "Found {} Luxafor Flag{}:",
        attached.len(),
        if attached.len() == 1 { "" } else { "s" }
    );
    println!();

    for (i, dev) in attached.iter().enumerate() {
        println!("  [{}] {}", i + 1, dev.path);
        if let Some(ref serial) = dev.serial {
            println!("      Serial: {serial}");
        }
    }

    Ok(())
}
