// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Security Recovery Core.
//!
//! Pre-boot supervision of a host board's main firmware image: watch each
//! boot attempt, restore a signed known-good image from USB mass storage
//! when it fails, and periodically snapshot the healthy image back to USB.
//!
//! The crate is `no_std` (with `alloc`) and hardware-free: every platform
//! capability enters through the traits in [`platform`]. The `std` feature
//! adds the in-memory devices in [`sim`] used by host tools and tests.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod backup;
pub mod config;
pub mod error;
pub mod eventlog;
pub mod flashio;
pub mod health;
pub mod layout;
pub mod machine;
pub mod platform;
pub mod recovery;
pub mod removal;
pub mod supervisor;

// Simulated platform devices (requires std feature)
#[cfg(feature = "std")]
pub mod sim;

// Re-export commonly used types
pub use backup::BackupOutcome;
pub use config::{Config, ConfigStore, StoredConfig, BOARD_ID_LEN, CONFIG_MAGIC};
pub use error::{Error, Result};
pub use eventlog::{EventLog, LogEntry, LOG_CAPACITY, LOG_MESSAGE_LEN};
pub use health::HealthReport;
pub use layout::{BoardProfile, SpiInterface};
pub use layout::{
    BACKUP_A_FILE, BACKUP_B_FILE, BACKUP_COOLDOWN_MS, BOOT_TIMEOUT_MS, FIRMWARE_REGION_OFFSET,
    FIRMWARE_REGION_SIZE, FLASH_TOTAL_SIZE, MANIFEST_FILE, MAX_DISABLE_DURATION_MS, METADATA_FILE,
    RECOVERY_ROOTS, SECTOR_SIZE_4K, SECTOR_SIZE_64K, SIGNATURE_FILE, SIGNATURE_MAX_LEN,
    SIGNATURE_MIN_LEN, SRC_REGION_OFFSET, SRC_REGION_SIZE,
};
pub use machine::{RecoveryCore, State};
pub use platform::{Board, BootSensors, CryptoProvider, FlashAccess, SystemCtl, UsbStore};
pub use supervisor::{BootMonitor, BootStatus, BootVerdict, POST_CODE_BOOT_OK};
