// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! In-memory stand-ins for the platform collaborators.
//!
//! Used by the integration tests and the scenario simulator. `MemFlash`
//! models NOR semantics (erase to 0xFF, programming only clears bits) so a
//! missing erase shows up as corrupted data instead of passing silently.

use std::collections::BTreeMap;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::layout::BoardProfile;
use crate::platform::{Board, BootSensors, CryptoProvider, FlashAccess, SystemCtl, UsbStore};

/// RAM-backed SPI flash with fault injection.
pub struct MemFlash {
    data: Vec<u8>,
    sector_size: u32,
    locked: bool,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub fail_erases: bool,
    /// Flip a bit in every programmed span, so read-back verification fails.
    pub corrupt_writes: bool,
    pub erase_count: u32,
    pub write_count: u32,
}

impl MemFlash {
    pub fn new(size: u32, sector_size: u32) -> Self {
        Self {
            data: vec![0xFF; size as usize],
            sector_size,
            locked: false,
            fail_reads: false,
            fail_writes: false,
            fail_erases: false,
            corrupt_writes: false,
            erase_count: 0,
            write_count: 0,
        }
    }

    /// Test helper: poke bytes in directly, bypassing NOR semantics.
    pub fn load(&mut self, offset: u32, data: &[u8]) {
        let start = offset as usize;
        self.data[start..start + data.len()].copy_from_slice(data);
    }

    pub fn contents(&self, offset: u32, len: usize) -> &[u8] {
        let start = offset as usize;
        &self.data[start..start + len]
    }

    fn span(&self, offset: u32, len: usize) -> Result<core::ops::Range<usize>> {
        let start = offset as usize;
        let end = start.checked_add(len).ok_or(Error::BoundsExceeded)?;
        if end > self.data.len() {
            return Err(Error::BoundsExceeded);
        }
        Ok(start..end)
    }
}

impl FlashAccess for MemFlash {
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()> {
        if self.fail_reads {
            return Err(Error::Io);
        }
        let span = self.span(offset, buf.len())?;
        buf.copy_from_slice(&self.data[span]);
        Ok(())
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        if self.fail_writes || self.locked {
            return Err(Error::Io);
        }
        let span = self.span(offset, data.len())?;
        for (cell, byte) in self.data[span].iter_mut().zip(data) {
            // NOR programming can only clear bits.
            *cell &= *byte;
        }
        if self.corrupt_writes {
            self.data[offset as usize] ^= 0x01;
        }
        self.write_count += 1;
        Ok(())
    }

    fn erase_sector(&mut self, offset: u32) -> Result<()> {
        if self.fail_erases || self.locked {
            return Err(Error::Io);
        }
        if offset % self.sector_size != 0 {
            return Err(Error::InvalidParameter);
        }
        let span = self.span(offset, self.sector_size as usize)?;
        self.data[span].fill(0xFF);
        self.erase_count += 1;
        Ok(())
    }

    fn lock(&mut self) -> Result<()> {
        self.locked = true;
        Ok(())
    }

    fn unlock(&mut self) -> Result<()> {
        self.locked = false;
        Ok(())
    }

    fn is_locked(&self) -> bool {
        self.locked
    }

    fn size(&self) -> u32 {
        self.data.len() as u32
    }
}

/// In-memory USB mass-storage filesystem.
#[derive(Default)]
pub struct MemStore {
    pub present: bool,
    files: BTreeMap<String, Vec<u8>>,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub fail_renames: bool,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            present: true,
            ..Self::default()
        }
    }

    pub fn insert(&mut self, path: &str, data: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), data.into());
    }

    pub fn get(&self, path: &str) -> Option<&Vec<u8>> {
        self.files.get(path)
    }

    pub fn remove(&mut self, path: &str) {
        self.files.remove(path);
    }
}

impl UsbStore for MemStore {
    fn is_present(&mut self) -> bool {
        self.present
    }

    fn file_exists(&mut self, path: &str) -> bool {
        self.present && self.files.contains_key(path)
    }

    fn read_file(&mut self, path: &str, buf: &mut [u8]) -> Result<usize> {
        if !self.present || self.fail_reads {
            return Err(Error::Io);
        }
        let data = self.files.get(path).ok_or(Error::Io)?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(data.len())
    }

    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<()> {
        if !self.present || self.fail_writes {
            return Err(Error::Io);
        }
        self.files.insert(path.into(), data.to_vec());
        Ok(())
    }

    fn delete_file(&mut self, path: &str) -> Result<()> {
        if !self.present {
            return Err(Error::Io);
        }
        self.files.remove(path);
        Ok(())
    }

    fn rename_file(&mut self, from: &str, to: &str) -> Result<()> {
        if !self.present || self.fail_renames {
            return Err(Error::Io);
        }
        let data = self.files.remove(from).ok_or(Error::Io)?;
        self.files.insert(to.into(), data);
        Ok(())
    }
}

/// Ed25519 + SHA-256 crypto for hosts. Verification-only instances model a
/// platform that embeds the public key but cannot sign.
pub struct HostCrypto {
    signing: Option<SigningKey>,
    verifying: VerifyingKey,
}

impl HostCrypto {
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(seed);
        let verifying = signing.verifying_key();
        Self {
            signing: Some(signing),
            verifying,
        }
    }

    pub fn verify_only(verifying: VerifyingKey) -> Self {
        Self {
            signing: None,
            verifying,
        }
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying
    }
}

impl CryptoProvider for HostCrypto {
    fn sha256(&mut self, data: &[u8]) -> [u8; 32] {
        Sha256::digest(data).into()
    }

    fn sign(&mut self, data: &[u8], signature: &mut [u8]) -> Result<usize> {
        let signing = self.signing.as_ref().ok_or(Error::NotInitialized)?;
        let sig = signing.sign(data);
        let bytes = sig.to_bytes();
        if signature.len() < bytes.len() {
            return Err(Error::InvalidParameter);
        }
        signature[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }

    fn verify(&mut self, data: &[u8], signature: &[u8]) -> bool {
        match Signature::try_from(signature) {
            Ok(sig) => self.verifying.verify(data, &sig).is_ok(),
            Err(_) => false,
        }
    }
}

/// Sensors with directly settable levels. Latching is the supervisor's job,
/// so tests can pulse a field high and drop it again.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptedSensors {
    pub gpio: bool,
    pub watchdog: bool,
    pub post_code: u8,
    pub flag: bool,
}

impl BootSensors for ScriptedSensors {
    fn gpio_signal(&mut self) -> bool {
        self.gpio
    }

    fn watchdog_cleared(&mut self) -> bool {
        self.watchdog
    }

    fn post_code(&mut self) -> u8 {
        self.post_code
    }

    fn firmware_flag(&mut self) -> bool {
        self.flag
    }
}

/// Manually advanced clock plus counters for reboot/safe-mode requests.
pub struct SimSystem {
    now: u32,
    pub reboot_requests: u32,
    pub safe_mode_entries: u32,
    pub auth_ok: bool,
    /// Echo debug messages to stdout (for the scenario simulator).
    pub echo: bool,
    pub sink: Vec<String>,
}

impl SimSystem {
    pub fn new() -> Self {
        Self {
            now: 0,
            reboot_requests: 0,
            safe_mode_entries: 0,
            auth_ok: true,
            echo: false,
            sink: Vec::new(),
        }
    }

    pub fn advance(&mut self, ms: u32) {
        self.now = self.now.wrapping_add(ms);
    }

    pub fn set_now(&mut self, now: u32) {
        self.now = now;
    }
}

impl Default for SimSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCtl for SimSystem {
    fn now_ms(&mut self) -> u32 {
        self.now
    }

    fn reboot(&mut self) {
        self.reboot_requests += 1;
    }

    fn enter_safe_mode(&mut self) {
        self.safe_mode_entries += 1;
    }

    fn authenticate(&mut self) -> bool {
        self.auth_ok
    }

    fn debug_log(&mut self, message: &str) {
        if self.echo {
            println!("[warden] {}", message);
        }
        self.sink.push(message.into());
    }
}

pub type SimBoard = Board<MemFlash, MemStore, HostCrypto, ScriptedSensors, SimSystem>;
pub type SimCore = crate::machine::RecoveryCore<MemFlash, MemStore, HostCrypto, ScriptedSensors, SimSystem>;

/// A fully wired simulated board for the given profile.
pub fn sim_board(profile: &BoardProfile) -> SimBoard {
    Board {
        flash: MemFlash::new(profile.flash_size, profile.sector_size),
        usb: MemStore::new(),
        crypto: HostCrypto::from_seed(&[0x42; 32]),
        sensors: ScriptedSensors::default(),
        system: SimSystem::new(),
    }
}
