//! USB transport: open by VID/PID, claim the default interface, write frames.
//!
//! The handle is an owned value: dropping it releases the claimed interface and
//! the device, so a failure half-way through [`UsbTransport`] setup never leaks
//! the claim.

use serde::Serialize;

use crate::device::{DeviceError, Result};

/// One blocking command channel to a USB device.
pub trait UsbTransport {
    /// Write one command frame. Blocks until the transfer completes.
    fn write_command(&self, frame: &[u8]) -> Result<()>;

    /// Human-readable location of the device, for logging.
    fn path(&self) -> &str;

    /// Release the interface and the device handle.
    fn close(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

// ── Linux implementation ──

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;

    use std::time::Duration;

    use futures::channel::oneshot;
    use futures::future::{Either, select};
    use nusb::transfer::{Direction, EndpointType};

    use crate::protocol::USB_TIMEOUT_MS;

    /// Drive `transfer` to completion, or give up after `timeout`.
    ///
    /// Returns `None` on expiry; the dropped transfer future cancels the
    /// in-flight URB.
    pub(super) fn with_deadline<F: Future>(transfer: F, timeout: Duration) -> Option<F::Output> {
        let (expired_tx, expired_rx) = oneshot::channel::<()>();
        std::thread::spawn(move || {
            std::thread::sleep(timeout);
            let _ = expired_tx.send(());
        });
        let transfer = std::pin::pin!(transfer);
        match futures::executor::block_on(select(transfer, expired_rx)) {
            Either::Left((output, _)) => Some(output),
            Either::Right(_) => None,
        }
    }

    /// nusb-backed transport writing to the first OUT endpoint of the default interface.
    pub struct NusbTransport {
        interface: nusb::Interface,
        endpoint: u8,
        transfer_type: EndpointType,
        path: String,
    }

    impl NusbTransport {
        /// Open the first device matching `vendor_id:product_id`.
        ///
        /// Detaches any kernel driver bound to the default interface (the Flag
        /// is normally grabbed by usbhid) before claiming it.
        pub fn open(vendor_id: u16, product_id: u16) -> Result<Self> {
            let device_info = nusb::list_devices()
                .map_err(|e| DeviceError::OpenFailed(format!("USB enumeration: {e}")))?
                .find(|dev| dev.vendor_id() == vendor_id && dev.product_id() == product_id)
                .ok_or(DeviceError::NotFound)?;

            let path = format!(
                "usb:{:03}/{:03} [{vendor_id:04x}:{product_id:04x}]",
                device_info.bus_number(),
                device_info.device_address(),
            );

            let usb_device = device_info
                .open()
                .map_err(|e| DeviceError::OpenFailed(format!("USB open: {e}")))?;

            let configuration = usb_device
                .active_configuration()
                .map_err(|e| DeviceError::OpenFailed(format!("active configuration: {e}")))?;

            // Default interface = first interface, alternate setting 0.
            let default_iface = configuration
                .interface_alt_settings()
                .find(|alt| alt.alternate_setting() == 0)
                .ok_or_else(|| DeviceError::OpenFailed("device exposes no interface".into()))?;
            let iface_num = default_iface.interface_number();

            let (endpoint, transfer_type) = default_iface
                .endpoints()
                .find(|ep| {
                    ep.direction() == Direction::Out
                        && matches!(
                            ep.transfer_type(),
                            EndpointType::Interrupt | EndpointType::Bulk
                        )
                })
                .map(|ep| (ep.address(), ep.transfer_type()))
                .ok_or_else(|| {
                    DeviceError::OpenFailed(format!("interface {iface_num} has no OUT endpoint"))
                })?;

            let interface = usb_device
                .detach_and_claim_interface(iface_num)
                .map_err(|e| {
                    DeviceError::OpenFailed(format!("claim interface {iface_num}: {e}"))
                })?;

            log::debug!("[usb] opened {path}, interface {iface_num}, endpoint 0x{endpoint:02x}");

            Ok(NusbTransport {
                interface,
                endpoint,
                transfer_type,
                path,
            })
        }
    }

    impl UsbTransport for NusbTransport {
        fn write_command(&self, frame: &[u8]) -> Result<()> {
            let data = frame.to_vec();
            let timeout = Duration::from_millis(USB_TIMEOUT_MS);
            let completion = match self.transfer_type {
                EndpointType::Bulk => {
                    with_deadline(self.interface.bulk_out(self.endpoint, data), timeout)
                }
                _ => with_deadline(self.interface.interrupt_out(self.endpoint, data), timeout),
            }
            .ok_or_else(|| {
                DeviceError::WriteFailed(format!(
                    "endpoint 0x{:02x}: timed out after {USB_TIMEOUT_MS}ms",
                    self.endpoint
                ))
            })?;
            completion.into_result().map_err(|e| {
                DeviceError::WriteFailed(format!("endpoint 0x{:02x}: {e}", self.endpoint))
            })?;
            Ok(())
        }

        fn path(&self) -> &str {
            &self.path
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux_impl::NusbTransport;

// ── Stub transport for unsupported platforms ──

/// Placeholder transport that never finds a device.
/// Enables compilation and `cargo test` on unsupported hosts.
#[cfg(not(target_os = "linux"))]
pub struct StubTransport;

#[cfg(not(target_os = "linux"))]
impl StubTransport {
    pub fn open(_vendor_id: u16, _product_id: u16) -> Result<Self> {
        Err(DeviceError::NotFound)
    }
}

#[cfg(not(target_os = "linux"))]
impl UsbTransport for StubTransport {
    fn write_command(&self, _frame: &[u8]) -> Result<()> {
        unreachable!()
    }
    fn path(&self) -> &str {
        unreachable!()
    }
}

/// Concrete transport type for the current platform.
#[cfg(target_os = "linux")]
pub type PlatformTransport = NusbTransport;
#[cfg(not(target_os = "linux"))]
pub type PlatformTransport = StubTransport;

/// Open the platform transport for `vendor_id:product_id`.
pub fn open(vendor_id: u16, product_id: u16) -> Result<PlatformTransport> {
    PlatformTransport::open(vendor_id, product_id)
}

// ── Device enumeration ──

/// An attached USB device matching a known busylight (not opened).
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredDevice {
    /// Bus location, e.g. `usb:001/004 [04d8:f372]`.
    pub path: String,
    /// USB serial number, if available.
    pub serial: Option<String>,
}

/// List attached devices matching `vendor_id:product_id` without opening them.
///
/// On unsupported platforms, always returns an empty list.
pub fn enumerate_devices(vendor_id: u16, product_id: u16) -> Vec<DiscoveredDevice> {
    #[cfg(target_os = "linux")]
    {
        let Ok(devices) = nusb::list_devices() else {
            return Vec::new();
        };
        devices
            .filter(|dev| dev.vendor_id() == vendor_id && dev.product_id() == product_id)
            .map(|dev| DiscoveredDevice {
                path: format!(
                    "usb:{:03}/{:03} [{vendor_id:04x}:{product_id:04x}]",
                    dev.bus_number(),
                    dev.device_address(),
                ),
                serial: dev.serial_number().map(|s| s.to_string()),
            })
            .collect()
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = (vendor_id, product_id);
        Vec::new()
    }
}

// ── Mock transport for testing ──

/// In-memory transport for unit and integration tests.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Records every frame written; `fail_writes` injects write errors.
    #[derive(Default)]
    pub struct RecordingTransport {
        pub frames: RefCell<Vec<Vec<u8>>>,
        pub fail_writes: Cell<bool>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl UsbTransport for RecordingTransport {
        fn write_command(&self, frame: &[u8]) -> Result<()> {
            if self.fail_writes.get() {
                return Err(DeviceError::WriteFailed(
                    "mock: write failure injected".into(),
                ));
            }
            self.frames.borrow_mut().push(frame.to_vec());
            Ok(())
        }

        fn path(&self) -> &str {
            "mock://luxafor-flag"
        }
    }
}
