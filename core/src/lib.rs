//! # otaflash core
//!
//! The two protocols the tool speaks:
//!
//! * **[`discovery`]**: UDP broadcast probing for devices on the local segment.
//! * **[`transfer`]**: the TCP handshake-then-stream upload, run concurrently
//!   for every selected device.
//!
//! Everything interactive (menus, progress bars, log formatting) lives in the
//! CLI crate; this crate only takes resolved inputs and returns reports.

pub mod discovery;
pub mod error;
pub mod firmware;
pub mod transfer;
