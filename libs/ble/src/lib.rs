//! BLE peripheral receiving keybot commands
//!
//! A single primary service exposes one writable characteristic. Each write is handed as is to a
//! callback, from the Bluetooth task.
#[cfg(target_os = "espidf")]
mod command;

#[cfg(target_os = "espidf")]
pub use command::{BleComm, CommandPeripheral};

/// Command service
pub const SERVICE_COMMAND_UUID: u128 = 0x19b10000_e8f2_537e_4f6c_d104768a1214;
/// Writable command characteristic
pub const CHAR_COMMAND_UUID: u128 = 0x19b10002_e8f2_537e_4f6c_d104768a1214;
