// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Self-removal: retire the core from a healthy system.
//!
//! Removal only proceeds if the current firmware hashes to the stored
//! known-good value; a system we do not recognize keeps its recovery core.

use alloc::vec;

use crate::flashio;
use crate::layout::FIRMWARE_REGION_OFFSET;
use crate::machine::{RecoveryCore, State};
use crate::platform::{BootSensors, CryptoProvider, FlashAccess, SystemCtl, UsbStore};

impl<F, U, C, S, Y> RecoveryCore<F, U, C, S, Y>
where
    F: FlashAccess,
    U: UsbStore,
    C: CryptoProvider,
    S: BootSensors,
    Y: SystemCtl,
{
    /// Run the removal sequence. Aborting (integrity mismatch, read failure)
    /// clears the scheduled flag and returns the machine to normal
    /// supervision.
    pub(crate) fn handle_removal(&mut self) {
        self.note(format_args!("removal: verifying firmware integrity"));

        let region = self.runtime.profile.firmware_region_size as usize;
        let mut image = vec![0u8; region];
        if self
            .board
            .flash
            .read(FIRMWARE_REGION_OFFSET, &mut image)
            .is_err()
        {
            self.note(format_args!("removal: firmware read failed, aborting"));
            self.abort_removal();
            return;
        }

        let hash = self.board.crypto.sha256(&image);
        drop(image);
        if hash != self.config.firmware_hash {
            self.note(format_args!("removal: integrity mismatch, aborting"));
            self.abort_removal();
            return;
        }

        // Zero the reserved region, then persist the disabled record into
        // it. A later boot that finds only zeros treats the core as removed.
        let offset = self.runtime.profile.src_region_offset;
        let size = self.runtime.profile.src_region_size;
        let sector_size = self.runtime.profile.sector_size;
        if flashio::zero_region(&mut self.board.flash, offset, size, sector_size).is_err() {
            self.note(format_args!("removal: zeroing reserved region failed"));
            self.abort_removal();
            return;
        }

        self.config.enabled = false;
        self.config.removal_scheduled = false;
        let _ = self.persist_config();

        if self.board.flash.lock().is_err() {
            self.note(format_args!("removal: flash lock not supported"));
        }

        self.note(format_args!("removal complete, requesting reboot"));
        self.board.system.reboot();
        self.runtime.state = State::Halted;
    }

    fn abort_removal(&mut self) {
        self.config.removal_scheduled = false;
        let _ = self.persist_config();
        self.arm_supervisor();
        self.runtime.state = State::Checking;
    }
}
