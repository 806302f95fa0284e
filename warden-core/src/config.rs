// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Persistent configuration record and its flash-resident store.
//!
//! The record occupies the first sector of the reserved region, framed as
//! `magic | payload length | postcard payload | CRC-32`. Everything else in
//! the reserved region is off-limits to the rest of the core.

use core::fmt::Write;

use crc::{Crc, CRC_32_ISO_HDLC};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::MAX_DISABLE_DURATION_MS;
use crate::platform::FlashAccess;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

pub const CONFIG_MAGIC: u32 = 0xDA7A_5AFE;

/// Upper bound on the postcard payload.
pub const CONFIG_MAX_LEN: usize = 128;

/// Bytes the store reads when probing for a record: header + payload + CRC.
const RECORD_SPAN: usize = 4 + 2 + CONFIG_MAX_LEN + 4;

// A record must fit the smallest sector with plenty to spare.
const _: () = assert!(RECORD_SPAN <= 4096);

pub const BOARD_ID_LEN: usize = 31;

/// The single source of persistent truth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub enabled: bool,
    /// Monotonic-ms deadline; 0 means not disabled.
    pub disable_until: u32,
    pub last_backup_at: u32,
    pub last_recovery_at: u32,
    /// Set by `schedule_removal`; makes the next boot enter removal.
    pub removal_scheduled: bool,
    pub board_id: heapless::String<BOARD_ID_LEN>,
    /// SHA-256 of the last known-good firmware image; all-zero before the
    /// first successful boot and after a removal.
    pub firmware_hash: [u8; 32],
}

impl Config {
    /// The record a first-time (erased) flash promotes to.
    pub fn default_new() -> Self {
        Self {
            enabled: true,
            disable_until: 0,
            last_backup_at: 0,
            last_recovery_at: 0,
            removal_scheduled: false,
            board_id: heapless::String::new(),
            firmware_hash: [0u8; 32],
        }
    }

    /// Whether the core is currently held off, either permanently or by a
    /// running temporary-disable window. Wrap-safe: the window is live while
    /// the unsigned distance to the deadline is within the maximum duration.
    /// The window ends the instant `now` reaches the deadline.
    pub fn is_disabled(&self, now: u32) -> bool {
        if !self.enabled {
            return true;
        }
        if self.disable_until == 0 {
            return false;
        }
        let remaining = self.disable_until.wrapping_sub(now);
        remaining != 0 && remaining <= MAX_DISABLE_DURATION_MS
    }

    pub fn has_firmware_hash(&self) -> bool {
        self.firmware_hash != [0u8; 32]
    }
}

/// Render a SHA-256 digest as lowercase hex.
pub fn hash_hex(hash: &[u8; 32]) -> heapless::String<64> {
    let mut out = heapless::String::new();
    for byte in hash {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

/// What a read of the reserved region turned up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoredConfig {
    Valid(Config),
    /// Erased flash (all 0xFF): never initialized.
    Blank,
    /// Deliberately zeroed (all 0x00): the core was removed.
    Zeroed,
    /// Present but fails magic/CRC/decode.
    Corrupt,
}

/// Reader/writer for the record at the reserved-region offset. The offset
/// must be sector-aligned; the device's own erase granularity applies.
#[derive(Clone, Copy, Debug)]
pub struct ConfigStore {
    offset: u32,
}

impl ConfigStore {
    pub fn new(offset: u32) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn read<F: FlashAccess>(&self, flash: &mut F) -> Result<StoredConfig> {
        let mut raw = [0u8; RECORD_SPAN];
        flash.read(self.offset, &mut raw)?;

        if raw.iter().all(|&b| b == 0xFF) {
            return Ok(StoredConfig::Blank);
        }
        if raw.iter().all(|&b| b == 0x00) {
            return Ok(StoredConfig::Zeroed);
        }

        let magic = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        if magic != CONFIG_MAGIC {
            return Ok(StoredConfig::Corrupt);
        }

        let len = u16::from_le_bytes([raw[4], raw[5]]) as usize;
        if len == 0 || len > CONFIG_MAX_LEN {
            return Ok(StoredConfig::Corrupt);
        }

        let payload = &raw[6..6 + len];
        let stored_crc = u32::from_le_bytes([
            raw[6 + len],
            raw[6 + len + 1],
            raw[6 + len + 2],
            raw[6 + len + 3],
        ]);
        if CRC32.checksum(payload) != stored_crc {
            return Ok(StoredConfig::Corrupt);
        }

        match postcard::from_bytes::<Config>(payload) {
            Ok(config) => Ok(StoredConfig::Valid(config)),
            Err(_) => Ok(StoredConfig::Corrupt),
        }
    }

    /// Erase the record's sector and write the record back.
    pub fn write<F: FlashAccess>(&self, flash: &mut F, config: &Config) -> Result<()> {
        crate::flashio::check_bounds(flash.size(), self.offset, RECORD_SPAN)?;

        let mut scratch = [0u8; CONFIG_MAX_LEN];
        let payload_len = postcard::to_slice(config, &mut scratch)
            .map_err(|_| Error::InvalidParameter)?
            .len();

        let mut record = [0u8; RECORD_SPAN];
        record[0..4].copy_from_slice(&CONFIG_MAGIC.to_le_bytes());
        record[4..6].copy_from_slice(&(payload_len as u16).to_le_bytes());
        record[6..6 + payload_len].copy_from_slice(&scratch[..payload_len]);
        let crc = CRC32.checksum(&scratch[..payload_len]);
        record[6 + payload_len..6 + payload_len + 4].copy_from_slice(&crc.to_le_bytes());

        let used = 6 + payload_len + 4;
        flash.erase_sector(self.offset)?;
        flash.write(self.offset, &record[..used])
    }
}
