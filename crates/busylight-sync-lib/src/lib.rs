//! busylight-sync: keep a USB busylight in sync with the busy state of your apps.

pub mod color;
pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod http;
pub mod protocol;
pub mod reconcile;
pub mod registry;
pub mod shutdown;
pub mod source;
pub mod usb;

pub use error::BusylightError;
