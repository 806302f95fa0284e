// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Automatic backup of the healthy firmware image to USB.
//!
//! Runs from `Success` (once) and `Active` (every tick); all the gating
//! lives here so the call is idempotent. The on-USB rotation is deliberately
//! not transactional: the recovery engine validates every candidate before
//! use, so a crash mid-rotation leaves at worst one stale generation behind.

use alloc::vec;
use core::fmt::Write;

use crate::config::hash_hex;
use crate::error::Error;
use crate::layout::{
    tree_path, BACKUP_A_FILE, BACKUP_B_FILE, BACKUP_COOLDOWN_MS, FIRMWARE_REGION_OFFSET,
    MANIFEST_FILE, METADATA_FILE, RECOVERY_ROOTS, SIGNATURE_FILE, SIGNATURE_MAX_LEN,
    SIGNATURE_MIN_LEN,
};
use crate::machine::RecoveryCore;
use crate::platform::{BootSensors, CryptoProvider, FlashAccess, SystemCtl, UsbStore};

/// What a backup cycle did, mostly for the log and the tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackupOutcome {
    Done,
    SkippedDisabled,
    SkippedCooldown,
    SkippedNoUsb,
    SkippedUnchanged,
    Failed(Error),
}

impl<F, U, C, S, Y> RecoveryCore<F, U, C, S, Y>
where
    F: FlashAccess,
    U: UsbStore,
    C: CryptoProvider,
    S: BootSensors,
    Y: SystemCtl,
{
    /// Run one backup cycle if the gates allow it.
    pub fn perform_backup(&mut self) -> BackupOutcome {
        let now = self.board.system.now_ms();
        if !self.config.enabled || self.config.is_disabled(now) {
            return BackupOutcome::SkippedDisabled;
        }

        // Unsigned difference so clock wrap cannot stall backups; zero means
        // no backup has ever run, which is exempt from the cooldown.
        if self.config.last_backup_at != 0
            && now.wrapping_sub(self.config.last_backup_at) < BACKUP_COOLDOWN_MS
        {
            return BackupOutcome::SkippedCooldown;
        }

        if !self.board.usb.is_present() {
            return BackupOutcome::SkippedNoUsb;
        }

        let region = self.runtime.profile.firmware_region_size as usize;
        let mut image = vec![0u8; region];
        if self
            .board
            .flash
            .read(FIRMWARE_REGION_OFFSET, &mut image)
            .is_err()
        {
            self.note(format_args!("backup: firmware read failed"));
            return BackupOutcome::Failed(Error::Io);
        }

        let hash = self.board.crypto.sha256(&image);
        if hash == self.config.firmware_hash {
            return BackupOutcome::SkippedUnchanged;
        }

        self.note(format_args!("backup: firmware changed, rotating"));

        // Rotate: drop old B, shift A into B, then write the new A. Stops on
        // the first fatal error; recovery tolerates either file missing.
        let root = RECOVERY_ROOTS[0];
        let path_a = tree_path(root, BACKUP_A_FILE);
        let path_b = tree_path(root, BACKUP_B_FILE);

        let _ = self.board.usb.delete_file(&path_b);
        if self.board.usb.file_exists(&path_a) {
            if self.board.usb.rename_file(&path_a, &path_b).is_err() {
                self.note(format_args!("backup: rotation rename failed"));
                return BackupOutcome::Failed(Error::Io);
            }
        }
        if self.board.usb.write_file(&path_a, &image).is_err() {
            self.note(format_args!("backup: writing new image failed"));
            return BackupOutcome::Failed(Error::Io);
        }

        let mut signature = [0u8; SIGNATURE_MAX_LEN];
        let sig_len = match self.board.crypto.sign(&image, &mut signature) {
            Ok(n) if (SIGNATURE_MIN_LEN..=SIGNATURE_MAX_LEN).contains(&n) => n,
            Ok(_) => {
                self.note(format_args!("backup: signer returned bad length"));
                return BackupOutcome::Failed(Error::InvalidParameter);
            }
            Err(err) => {
                self.note(format_args!("backup: signing failed"));
                return BackupOutcome::Failed(err);
            }
        };
        if self
            .board
            .usb
            .write_file(&tree_path(root, SIGNATURE_FILE), &signature[..sig_len])
            .is_err()
        {
            self.note(format_args!("backup: writing signature failed"));
            return BackupOutcome::Failed(Error::Io);
        }

        // Advisory files; a failure here is logged but does not undo the
        // backup.
        self.write_manifest(root, now);
        self.write_metadata(root, &hash, now);

        // Config records the new generation only after every side effect.
        self.config.firmware_hash = hash;
        self.config.last_backup_at = now;
        let _ = self.persist_config();

        self.note(format_args!("backup complete"));
        BackupOutcome::Done
    }

    fn write_manifest(&mut self, root: &str, now: u32) {
        let mut json: heapless::String<256> = heapless::String::new();
        let _ = write!(
            json,
            "{{\n  \"version\": \"1.0\",\n  \"board_id\": \"{}\",\n  \"backup_a\": \"{}\",\n  \"backup_b\": \"{}\",\n  \"timestamp\": {}\n}}\n",
            self.config.board_id, BACKUP_A_FILE, BACKUP_B_FILE, now
        );
        if self
            .board
            .usb
            .write_file(&tree_path(root, MANIFEST_FILE), json.as_bytes())
            .is_err()
        {
            self.note(format_args!("backup: manifest write failed"));
        }
    }

    fn write_metadata(&mut self, root: &str, hash: &[u8; 32], now: u32) {
        let mut text: heapless::String<192> = heapless::String::new();
        let _ = write!(
            text,
            "Firmware Hash: {}\nBackup Time: {}\n",
            hash_hex(hash),
            now
        );
        if self
            .board
            .usb
            .write_file(&tree_path(root, METADATA_FILE), text.as_bytes())
            .is_err()
        {
            self.note(format_args!("backup: metadata write failed"));
        }
    }
}
