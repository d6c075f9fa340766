mod extractors;
mod services;

pub use extractors::{DeviceKeyHeader, DEVICE_KEY_HEADER};
pub use services::{pick_device_key, resolve_device};
