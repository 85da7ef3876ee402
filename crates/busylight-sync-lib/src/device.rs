//! Indicator devices: the Luxafor Flag over USB and an in-memory virtual light.

use std::fmt;

use crate::color::Color;
use crate::protocol::{LUXAFOR_FLAG_PID, LUXAFOR_FLAG_VID, encode_static_color};
use crate::registry::Registry;
use crate::usb::{self, PlatformTransport, UsbTransport};

// ── Error type ──

/// Busylight errors.
///
/// String payloads follow the convention **"context: details"** where *context*
/// identifies the step (e.g. `"USB open"`, `"endpoint 0x01"`) and *details*
/// describes what went wrong.
#[derive(Debug)]
pub enum DeviceError {
    NotFound,
    OpenFailed(String),
    WriteFailed(String),
    /// The device cannot perform the requested operation (e.g. color read-back).
    NotSupported(String),
    /// No constructor is registered for this device type name.
    NotImplemented(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotFound => write!(f, "device not found"),
            DeviceError::OpenFailed(e) => write!(f, "Failed to open device: {e}"),
            DeviceError::WriteFailed(e) => write!(f, "Write failed: {e}"),
            DeviceError::NotSupported(op) => write!(f, "{op} is not supported by this device"),
            DeviceError::NotImplemented(name) => write!(f, "{name} busylight is not implemented"),
        }
    }
}

impl std::error::Error for DeviceError {}

pub type Result<T> = std::result::Result<T, DeviceError>;

// ── Trait ──

pub trait IndicatorDevice {
    /// Short name used in log lines, e.g. `"luxafor-flag"`.
    fn name(&self) -> &str;

    fn set_static_color(&mut self, color: Color) -> Result<()>;

    fn off(&mut self) -> Result<()> {
        self.set_static_color(Color::OFF)
    }

    /// Read back the current color.
    /// Default: not supported (write-only hardware).
    fn get_static_color(&self) -> Result<Color> {
        Err(DeviceError::NotSupported("get_static_color".into()))
    }
}

// ── Luxafor Flag ──

pub const LUXAFOR_FLAG: &str = "luxafor-flag";

/// Luxafor Flag busylight. Write-only: every color change is one 8-byte frame.
pub struct LuxaforFlag<T: UsbTransport = PlatformTransport> {
    transport: T,
}

impl LuxaforFlag {
    /// Open the first attached Flag.
    pub fn open() -> Result<Self> {
        let transport = usb::open(LUXAFOR_FLAG_VID, LUXAFOR_FLAG_PID)?;
        log::info!("[device] {LUXAFOR_FLAG} at {}", transport.path());
        Ok(Self::with_transport(transport))
    }
}

impl<T: UsbTransport> LuxaforFlag<T> {
    pub fn with_transport(transport: T) -> Self {
        LuxaforFlag { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Release the USB handle.
    pub fn close(self) {
        self.transport.close();
    }
}

impl<T: UsbTransport> IndicatorDevice for LuxaforFlag<T> {
    fn name(&self) -> &str {
        LUXAFOR_FLAG
    }

    fn set_static_color(&mut self, color: Color) -> Result<()> {
        self.transport.write_command(&encode_static_color(color))
    }
}

// ── Virtual light ──

pub const VIRTUAL: &str = "virtual";

/// In-memory light. Logs every change; supports read-back.
#[derive(Debug, Default)]
pub struct VirtualLight {
    color: Color,
}

impl VirtualLight {
    pub fn new() -> Self {
        Self::default()
    }

    /// A virtual light already showing `color`.
    pub fn with_color(color: Color) -> Self {
        VirtualLight { color }
    }
}

impl IndicatorDevice for VirtualLight {
    fn name(&self) -> &str {
        VIRTUAL
    }

    fn set_static_color(&mut self, color: Color) -> Result<()> {
        log::info!("[{VIRTUAL}] {} -> {}", self.color, color);
        self.color = color;
        Ok(())
    }

    fn get_static_color(&self) -> Result<Color> {
        Ok(self.color)
    }
}

// ── Registry ──

/// Builds one device instance. Opening hardware happens here.
pub type DeviceConstructor = Box<dyn Fn() -> Result<Box<dyn IndicatorDevice>>>;

pub type DeviceRegistry = Registry<DeviceConstructor>;

impl Registry<DeviceConstructor> {
    /// Registry with every built-in device type.
    pub fn with_builtin_devices() -> Self {
        let mut registry = Self::new();
        registry.register_device(LUXAFOR_FLAG, || {
            Ok(Box::new(LuxaforFlag::open()?) as Box<dyn IndicatorDevice>)
        });
        registry.register_device(VIRTUAL, || {
            Ok(Box::new(VirtualLight::new()) as Box<dyn IndicatorDevice>)
        });
        registry
    }

    pub fn register_device(
        &mut self,
        name: &str,
        constructor: impl Fn() -> Result<Box<dyn IndicatorDevice>> + 'static,
    ) -> &mut Self {
        self.register(name, Box::new(constructor))
    }

    /// Construct the device registered under `name`.
    pub fn open(&self, name: &str) -> Result<Box<dyn IndicatorDevice>> {
        let constructor = self
            .get(name)
            .ok_or_else(|| DeviceError::NotImplemented(name.to_string()))?;
        constructor()
    }
}

// ── Mock device for testing ──

/// Recording light for unit and integration tests.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    pub struct MockLightState {
        /// Every color successfully applied, in order (`off()` records `Color::OFF`).
        pub writes: RefCell<Vec<Color>>,
        /// Number of write attempts, failed ones included.
        pub attempts: Cell<usize>,
        /// If true, `set_static_color` returns an error.
        pub fail_writes: Cell<bool>,
    }

    /// Clones share state, so a test can keep one handle and box another.
    #[derive(Clone, Default)]
    pub struct MockLight {
        name: String,
        state: Rc<MockLightState>,
    }

    impl MockLight {
        pub fn new() -> Self {
            Self::named("mock")
        }

        pub fn named(name: &str) -> Self {
            MockLight {
                name: name.to_string(),
                state: Rc::default(),
            }
        }

        pub fn failing(name: &str) -> Self {
            let light = Self::named(name);
            light.state.fail_writes.set(true);
            light
        }

        pub fn boxed(&self) -> Box<dyn IndicatorDevice> {
            Box::new(self.clone())
        }

        pub fn writes(&self) -> Vec<Color> {
            self.state.writes.borrow().clone()
        }

        pub fn attempts(&self) -> usize {
            self.state.attempts.get()
        }

        pub fn set_failing(&self, fail: bool) {
            self.state.fail_writes.set(fail);
        }

        pub fn clear(&self) {
            self.state.writes.borrow_mut().clear();
            self.state.attempts.set(0);
        }
    }

    impl IndicatorDevice for MockLight {
        fn name(&self) -> &str {
            &self.name
        }

        fn set_static_color(&mut self, color: Color) -> Result<()> {
            self.state.attempts.set(self.state.attempts.get() + 1);
            if self.state.fail_writes.get() {
                return Err(DeviceError::WriteFailed(
                    "mock: write failure injected".into(),
                ));
            }
            self.state.writes.borrow_mut().push(color);
            Ok(())
        }

        fn get_static_color(&self) -> Result<Color> {
            Ok(self.state.writes.borrow().last().copied().unwrap_or(Color::OFF))
        }
    }
}
