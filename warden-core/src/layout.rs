// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash layout, recovery-tree layout, timing knobs, and board profiles.

use core::fmt::Write;

// --- Flash layout defaults ---

pub const FLASH_TOTAL_SIZE: u32 = 16 * 1024 * 1024;
pub const FIRMWARE_REGION_OFFSET: u32 = 0x0000_0000;
pub const FIRMWARE_REGION_SIZE: u32 = 8 * 1024 * 1024;
pub const SRC_REGION_OFFSET: u32 = 0x0010_0000;
pub const SRC_REGION_SIZE: u32 = 512 * 1024;

pub const SECTOR_SIZE_4K: u32 = 4096;
pub const SECTOR_SIZE_64K: u32 = 65536;

// --- Timing knobs ---

pub const BOOT_TIMEOUT_MS: u32 = 30_000;
pub const BACKUP_COOLDOWN_MS: u32 = 10 * 60 * 1000;
pub const MAX_DISABLE_DURATION_MS: u32 = 7 * 24 * 60 * 60 * 1000;

// --- Signature bounds ---

pub const SIGNATURE_MIN_LEN: usize = 64;
pub const SIGNATURE_MAX_LEN: usize = 512;

// --- USB recovery tree ---

pub const BACKUP_A_FILE: &str = "A.bin";
pub const BACKUP_B_FILE: &str = "B.bin";
pub const SIGNATURE_FILE: &str = "signature.sig";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const METADATA_FILE: &str = "metadata.txt";

/// Candidate mount roots, scanned in priority order. The first entry is the
/// canonical location and the only one the backup engine writes to.
pub const RECOVERY_ROOTS: [&str; 3] = [
    "/SECURITY_RECOVERY",
    "/media/SECURITY_RECOVERY",
    "/mnt/SECURITY_RECOVERY",
];

pub const TREE_PATH_LEN: usize = 64;

/// Join a mount root and a tree file name.
pub fn tree_path(root: &str, file: &str) -> heapless::String<TREE_PATH_LEN> {
    let mut path = heapless::String::new();
    let _ = write!(path, "{}/{}", root, file);
    path
}

// --- Board profile ---

/// Flash transport the platform exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpiInterface {
    Standard,
    Lpc,
}

/// Parameters the platform profile overrides. One state machine serves every
/// board; only these numbers differ between modern and legacy hardware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardProfile {
    pub flash_size: u32,
    pub sector_size: u32,
    pub firmware_region_size: u32,
    pub src_region_offset: u32,
    pub src_region_size: u32,
    pub boot_timeout_ms: u32,
    pub spi_interface: SpiInterface,
    pub has_ec: bool,
    pub has_tpm: bool,
    pub supports_write_protect: bool,
}

impl BoardProfile {
    /// Modern 16 MiB board, the defaults from the flash layout above.
    pub fn standard() -> Self {
        Self {
            flash_size: FLASH_TOTAL_SIZE,
            sector_size: SECTOR_SIZE_4K,
            firmware_region_size: FIRMWARE_REGION_SIZE,
            src_region_offset: SRC_REGION_OFFSET,
            src_region_size: SRC_REGION_SIZE,
            boot_timeout_ms: BOOT_TIMEOUT_MS,
            spi_interface: SpiInterface::Standard,
            has_ec: true,
            has_tpm: true,
            supports_write_protect: true,
        }
    }

    /// 4 MiB flash, BIOS-era board. The reserved region moves to the top of
    /// the device and the firmware region ends where it starts.
    pub fn small_flash() -> Self {
        Self {
            flash_size: 4 * 1024 * 1024,
            sector_size: SECTOR_SIZE_4K,
            firmware_region_size: 0x0030_0000,
            src_region_offset: 0x0030_0000,
            src_region_size: 256 * 1024,
            boot_timeout_ms: 50_000,
            spi_interface: SpiInterface::Standard,
            has_ec: false,
            has_tpm: false,
            supports_write_protect: false,
        }
    }

    /// 8 MiB flash, early-UEFI board.
    pub fn mid_flash() -> Self {
        Self {
            flash_size: 8 * 1024 * 1024,
            sector_size: SECTOR_SIZE_4K,
            firmware_region_size: 0x0060_0000,
            src_region_offset: 0x0060_0000,
            src_region_size: 384 * 1024,
            boot_timeout_ms: 40_000,
            spi_interface: SpiInterface::Standard,
            has_ec: true,
            has_tpm: false,
            supports_write_protect: true,
        }
    }

    /// Very old LPC-only board: small flash, slowest boot.
    pub fn lpc_only() -> Self {
        Self {
            boot_timeout_ms: 60_000,
            spi_interface: SpiInterface::Lpc,
            ..Self::small_flash()
        }
    }

    /// Pick a profile from the flash size the platform reports.
    pub fn for_flash_size(flash_size: u32) -> Self {
        if flash_size <= 4 * 1024 * 1024 {
            Self::small_flash()
        } else if flash_size <= 8 * 1024 * 1024 {
            Self::mid_flash()
        } else {
            Self::standard()
        }
    }

    /// Switch the profile to 64 KiB erase sectors where the chip reports them.
    pub fn with_large_sectors(mut self) -> Self {
        self.sector_size = SECTOR_SIZE_64K;
        self
    }
}
