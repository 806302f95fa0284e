// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Platform capability seams.
//!
//! The core never touches hardware directly: every flash, USB, crypto,
//! sensor, and system call goes through one of these traits. Implementations
//! are chosen at construction and injected through [`Board`], which keeps the
//! core testable against in-memory devices.

use crate::error::Result;

/// Raw SPI flash access. Offsets are device-relative; writes assume the
/// caller has erased the sectors they land in.
pub trait FlashAccess {
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()>;
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<()>;
    fn erase_sector(&mut self, offset: u32) -> Result<()>;
    fn lock(&mut self) -> Result<()>;
    fn unlock(&mut self) -> Result<()>;
    fn is_locked(&self) -> bool;
    fn size(&self) -> u32;
}

/// USB mass-storage filesystem shim.
pub trait UsbStore {
    fn is_present(&mut self) -> bool;
    fn file_exists(&mut self, path: &str) -> bool;

    /// Copy up to `buf.len()` bytes of `path` into `buf` and return the
    /// file's total size, which may exceed what was copied.
    fn read_file(&mut self, path: &str, buf: &mut [u8]) -> Result<usize>;

    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<()>;

    /// Deleting a file that does not exist is not an error.
    fn delete_file(&mut self, path: &str) -> Result<()>;

    fn rename_file(&mut self, from: &str, to: &str) -> Result<()>;
}

/// Cryptographic primitives. The verifying key is the platform's embedded
/// public key; the core never sees key material.
pub trait CryptoProvider {
    fn sha256(&mut self, data: &[u8]) -> [u8; 32];

    /// Sign `data`, writing the signature into `signature` and returning its
    /// length.
    fn sign(&mut self, data: &[u8], signature: &mut [u8]) -> Result<usize>;

    fn verify(&mut self, data: &[u8], signature: &[u8]) -> bool;
}

/// The four boot-success sensors. Each read reports the sensor's level at
/// this instant; latching across a boot attempt is the supervisor's job.
pub trait BootSensors {
    fn gpio_signal(&mut self) -> bool;
    fn watchdog_cleared(&mut self) -> bool;
    fn post_code(&mut self) -> u8;
    fn firmware_flag(&mut self) -> bool;
}

/// Timing, reset, and the remaining platform odds and ends.
pub trait SystemCtl {
    /// Monotonic milliseconds, wrapping at 2^32.
    fn now_ms(&mut self) -> u32;

    fn reboot(&mut self);
    fn enter_safe_mode(&mut self);
    fn authenticate(&mut self) -> bool;
    fn debug_log(&mut self, message: &str);
}

/// The injected device set, owned by the core for its lifetime.
pub struct Board<F, U, C, S, Y> {
    pub flash: F,
    pub usb: U,
    pub crypto: C,
    pub sensors: S,
    pub system: Y,
}
