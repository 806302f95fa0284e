// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Signed recovery of the firmware region from USB.
//!
//! Candidates are tried in priority order, newest generation first. The one
//! hard rule: nothing reaches flash without a successful signature
//! verification over exactly the bytes that will be written, and every write
//! is read back before the candidate counts as restored.

use alloc::vec;

use crate::error::Result;
use crate::flashio;
use crate::layout::{
    tree_path, BACKUP_A_FILE, BACKUP_B_FILE, FIRMWARE_REGION_OFFSET, RECOVERY_ROOTS,
    SIGNATURE_FILE, SIGNATURE_MAX_LEN, SIGNATURE_MIN_LEN,
};
use crate::machine::RecoveryCore;
use crate::platform::{BootSensors, CryptoProvider, FlashAccess, SystemCtl, UsbStore};

impl<F, U, C, S, Y> RecoveryCore<F, U, C, S, Y>
where
    F: FlashAccess,
    U: UsbStore,
    C: CryptoProvider,
    S: BootSensors,
    Y: SystemCtl,
{
    /// Attempt to restore the firmware region from the best available
    /// recovery tree. Returns `true` once flash holds a verified image.
    pub fn recover_from_usb(&mut self) -> bool {
        if !self.board.usb.is_present() {
            self.note(format_args!("recovery: usb device not present"));
            return false;
        }

        let Some(root) = self.select_recovery_source() else {
            self.note(format_args!("recovery: no recovery tree found"));
            return false;
        };

        let mut signature = [0u8; SIGNATURE_MAX_LEN];
        let sig_len = match self
            .board
            .usb
            .read_file(&tree_path(root, SIGNATURE_FILE), &mut signature)
        {
            Ok(n) => n,
            Err(_) => {
                self.note(format_args!("recovery: cannot read signature"));
                return false;
            }
        };
        if !(SIGNATURE_MIN_LEN..=SIGNATURE_MAX_LEN).contains(&sig_len) {
            self.note(format_args!("recovery: signature size {} rejected", sig_len));
            return false;
        }

        for name in [BACKUP_A_FILE, BACKUP_B_FILE] {
            let path = tree_path(root, name);
            if !self.board.usb.file_exists(&path) {
                continue;
            }
            self.note(format_args!("recovery: trying {}", name));

            let region = self.runtime.profile.firmware_region_size as usize;
            let mut image = vec![0u8; region];
            let file_size = match self.board.usb.read_file(&path, &mut image) {
                Ok(n) => n,
                Err(_) => {
                    self.note(format_args!("recovery: cannot read {}", name));
                    continue;
                }
            };
            if file_size == 0 || file_size > region {
                self.note(format_args!("recovery: {} has bad size {}", name, file_size));
                continue;
            }
            image.truncate(file_size);

            // The signature gate. Failing it must never reach a flash write.
            if !self.board.crypto.verify(&image, &signature[..sig_len]) {
                self.note(format_args!("recovery: signature invalid for {}", name));
                continue;
            }

            if self.write_firmware(&image).is_err() {
                self.note(format_args!("recovery: flash restore of {} failed", name));
                continue;
            }

            self.config.last_recovery_at = self.board.system.now_ms();
            let _ = self.persist_config();
            self.note(format_args!("recovery: restored from {}", name));
            return true;
        }

        self.note(format_args!("recovery: all candidates exhausted"));
        false
    }

    /// Rewrite the firmware region with a verified image: bounds check,
    /// erase-then-program, then a full read-back comparison.
    pub(crate) fn write_firmware(&mut self, image: &[u8]) -> Result<()> {
        let sector_size = self.runtime.profile.sector_size;
        flashio::check_bounds(self.board.flash.size(), FIRMWARE_REGION_OFFSET, image.len())?;
        flashio::write_region(
            &mut self.board.flash,
            FIRMWARE_REGION_OFFSET,
            image,
            sector_size,
        )?;
        flashio::verify_region(&mut self.board.flash, FIRMWARE_REGION_OFFSET, image)
    }

    /// Scan the candidate mount roots and pick the one with the most backup
    /// generations. A root qualifies once it holds a signature and at least
    /// one backup; ties go to scan order.
    fn select_recovery_source(&mut self) -> Option<&'static str> {
        let mut best: Option<(&'static str, u8)> = None;
        for root in RECOVERY_ROOTS {
            if !self
                .board
                .usb
                .file_exists(&tree_path(root, SIGNATURE_FILE))
            {
                continue;
            }
            let has_a = self.board.usb.file_exists(&tree_path(root, BACKUP_A_FILE));
            let has_b = self.board.usb.file_exists(&tree_path(root, BACKUP_B_FILE));
            let slots = has_a as u8 + has_b as u8;
            if slots == 0 {
                continue;
            }
            match best {
                Some((_, best_slots)) if slots <= best_slots => {}
                _ => best = Some((root, slots)),
            }
        }
        best.map(|(root, _)| root)
    }
}
