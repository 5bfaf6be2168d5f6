//! Hardware Detection Module
//!
//! Picks the compute device the language model is loaded onto.

pub mod device;

pub use device::{detect_accelerator, select_device, DeviceKind, DeviceSetting};
