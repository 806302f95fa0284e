// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! On-demand health reporting.
//!
//! Nothing here mutates state; both entry points read the current firmware
//! and the USB tree to answer "would a recovery work right now, and does the
//! flash still match what we last blessed".

use alloc::vec;
use core::fmt::Write;

use crate::layout::{
    tree_path, BACKUP_A_FILE, BACKUP_B_FILE, FIRMWARE_REGION_OFFSET, RECOVERY_ROOTS,
    SIGNATURE_FILE,
};
use crate::machine::RecoveryCore;
use crate::platform::{BootSensors, CryptoProvider, FlashAccess, SystemCtl, UsbStore};

const DAY_MS: u32 = 24 * 60 * 60 * 1000;

/// Scored snapshot of the core's ability to do its job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthReport {
    /// The stored firmware hash matches the flash contents (or no hash has
    /// been recorded yet).
    pub integrity_ok: bool,
    pub usb_available: bool,
    /// A signature plus at least one backup generation is reachable.
    pub tree_present: bool,
    pub write_protected: bool,
    /// `None` until the first backup has run.
    pub last_backup_age_ms: Option<u32>,
    /// 0..=100; starts at 100 and loses points per missing capability.
    pub score: u8,
    pub healthy: bool,
}

impl<F, U, C, S, Y> RecoveryCore<F, U, C, S, Y>
where
    F: FlashAccess,
    U: UsbStore,
    C: CryptoProvider,
    S: BootSensors,
    Y: SystemCtl,
{
    pub fn health_check(&mut self) -> HealthReport {
        let now = self.board.system.now_ms();
        let mut score: i32 = 100;

        let integrity_ok = self.firmware_integrity_ok();
        if !integrity_ok {
            score -= 30;
        }

        let usb_available = self.board.usb.is_present();
        if !usb_available {
            score -= 15;
        }

        let tree_present = usb_available && self.any_tree_present();
        if !tree_present {
            score -= 15;
        }

        let last_backup_age_ms = if self.config.last_backup_at != 0 {
            Some(now.wrapping_sub(self.config.last_backup_at))
        } else {
            None
        };
        match last_backup_age_ms {
            None => score -= 20,
            Some(age) if age > DAY_MS => score -= 10,
            Some(_) => {}
        }

        let write_protected = self.board.flash.is_locked();

        let score = score.clamp(0, 100) as u8;
        HealthReport {
            integrity_ok,
            usb_available,
            tree_present,
            write_protected,
            last_backup_age_ms,
            score,
            healthy: score >= 80,
        }
    }

    /// One-line summary for the host's status surface.
    pub fn status_summary(&mut self) -> heapless::String<192> {
        let report = self.health_check();
        let mut line: heapless::String<192> = heapless::String::new();
        let _ = write!(
            line,
            "Security Status: {} | Integrity: {} | Tampering: {} | Write Protect: {}",
            if report.healthy { "OK" } else { "WARNING" },
            if report.integrity_ok { "OK" } else { "FAILED" },
            if report.integrity_ok { "None" } else { "DETECTED" },
            if report.write_protected {
                "Active"
            } else {
                "Inactive"
            },
        );
        match report.last_backup_age_ms {
            Some(age) => {
                let _ = write!(line, " | Last Backup: {} s ago", age / 1000);
            }
            None => {
                let _ = write!(line, " | Last Backup: never");
            }
        }
        line
    }

    /// Compare the firmware region against the stored known-good hash. A
    /// zero hash (pre-first-boot) counts as intact: there is nothing to
    /// tamper with yet.
    fn firmware_integrity_ok(&mut self) -> bool {
        if !self.config.has_firmware_hash() {
            return true;
        }
        let region = self.runtime.profile.firmware_region_size as usize;
        let mut image = vec![0u8; region];
        if self
            .board
            .flash
            .read(FIRMWARE_REGION_OFFSET, &mut image)
            .is_err()
        {
            return false;
        }
        self.board.crypto.sha256(&image) == self.config.firmware_hash
    }

    fn any_tree_present(&mut self) -> bool {
        RECOVERY_ROOTS.iter().any(|root| {
            self.board
                .usb
                .file_exists(&tree_path(root, SIGNATURE_FILE))
                && (self.board.usb.file_exists(&tree_path(root, BACKUP_A_FILE))
                    || self.board.usb.file_exists(&tree_path(root, BACKUP_B_FILE)))
        })
    }
}
