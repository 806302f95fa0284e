// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for the backup engine.

use warden_core::backup::BackupOutcome;
use warden_core::config::{ConfigStore, StoredConfig};
use warden_core::layout::{BoardProfile, SpiInterface, BACKUP_COOLDOWN_MS};
use warden_core::sim::{sim_board, SimCore};
use warden_core::{CryptoProvider, RecoveryCore};

const REGION: usize = 64 * 1024;
const SRC_OFFSET: u32 = 0x0002_0000;

fn test_profile() -> BoardProfile {
    BoardProfile {
        flash_size: 256 * 1024,
        sector_size: 4096,
        firmware_region_size: REGION as u32,
        src_region_offset: SRC_OFFSET,
        src_region_size: 32 * 1024,
        boot_timeout_ms: 30_000,
        spi_interface: SpiInterface::Standard,
        has_ec: true,
        has_tpm: false,
        supports_write_protect: true,
    }
}

fn firmware_image(tag: u8) -> Vec<u8> {
    (0..REGION)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(tag))
        .collect()
}

/// Core with `image` in the firmware region and the clock at `now`.
fn core_with_firmware(image: &[u8], now: u32) -> SimCore {
    let profile = test_profile();
    let mut board = sim_board(&profile);
    board.flash.load(0, image);
    board.system.set_now(now);
    RecoveryCore::new(board, profile)
}

// =============================================================================
// First backup
// =============================================================================

#[test]
fn test_first_backup_writes_the_full_tree() {
    let image = firmware_image(1);
    let mut core = core_with_firmware(&image, 5_000);

    assert_eq!(core.perform_backup(), BackupOutcome::Done);

    let usb = &core.board().usb;
    assert_eq!(usb.get("/SECURITY_RECOVERY/A.bin").unwrap(), &image);
    assert!(usb.get("/SECURITY_RECOVERY/B.bin").is_none());
    assert!(usb.get("/SECURITY_RECOVERY/manifest.json").is_some());
    assert!(usb.get("/SECURITY_RECOVERY/metadata.txt").is_some());

    let signature = usb.get("/SECURITY_RECOVERY/signature.sig").unwrap().clone();
    assert!(core.board_mut().crypto.verify(&image, &signature));
}

#[test]
fn test_first_backup_updates_and_persists_config() {
    let image = firmware_image(1);
    let mut core = core_with_firmware(&image, 5_000);

    core.perform_backup();

    let expected_hash = core.board_mut().crypto.sha256(&image);
    assert_eq!(core.config().firmware_hash, expected_hash);
    assert_eq!(core.config().last_backup_at, 5_000);

    // The record made it to flash, not just to RAM.
    let store = ConfigStore::new(SRC_OFFSET);
    let StoredConfig::Valid(stored) = store.read(&mut core.board_mut().flash).unwrap() else {
        panic!("expected a persisted config record");
    };
    assert_eq!(stored.firmware_hash, expected_hash);
}

#[test]
fn test_first_backup_is_exempt_from_cooldown() {
    // last_backup_at == 0 means "never", even though now - 0 < cooldown.
    let image = firmware_image(1);
    let mut core = core_with_firmware(&image, 5_000);
    assert_eq!(core.perform_backup(), BackupOutcome::Done);
}

// =============================================================================
// Gates
// =============================================================================

#[test]
fn test_backup_skipped_while_disabled() {
    let image = firmware_image(1);
    let mut core = core_with_firmware(&image, 5_000);
    core.disable_temporary(60_000).unwrap();

    assert_eq!(core.perform_backup(), BackupOutcome::SkippedDisabled);
}

#[test]
fn test_backup_skipped_without_usb() {
    let image = firmware_image(1);
    let mut core = core_with_firmware(&image, 5_000);
    core.board_mut().usb.present = false;

    assert_eq!(core.perform_backup(), BackupOutcome::SkippedNoUsb);
}

#[test]
fn test_backup_respects_cooldown_then_checks_hash() {
    let image = firmware_image(1);
    let mut core = core_with_firmware(&image, 5_000);
    assert_eq!(core.perform_backup(), BackupOutcome::Done);

    // Inside the cooldown: skipped regardless of content.
    core.board_mut().system.advance(BACKUP_COOLDOWN_MS / 2);
    assert_eq!(core.perform_backup(), BackupOutcome::SkippedCooldown);

    // Past the cooldown with unchanged firmware: still a no-op.
    core.board_mut().system.advance(BACKUP_COOLDOWN_MS);
    assert_eq!(core.perform_backup(), BackupOutcome::SkippedUnchanged);
}

#[test]
fn test_backup_not_stalled_by_clock_wrap() {
    let image = firmware_image(1);
    // Backup stamped just before the wrap; the clock has since wrapped.
    let mut core = core_with_firmware(&image, u32::MAX - 10);
    assert_eq!(core.perform_backup(), BackupOutcome::Done);

    core.board_mut().flash.load(0, &firmware_image(2));
    core.board_mut().system.set_now(BACKUP_COOLDOWN_MS);
    assert_eq!(core.perform_backup(), BackupOutcome::Done);
}

// =============================================================================
// Rotation
// =============================================================================

#[test]
fn test_changed_firmware_rotates_a_to_b() {
    let first = firmware_image(1);
    let second = firmware_image(2);
    let mut core = core_with_firmware(&first, 5_000);
    assert_eq!(core.perform_backup(), BackupOutcome::Done);

    core.board_mut().flash.load(0, &second);
    core.board_mut().system.advance(BACKUP_COOLDOWN_MS + 1);
    assert_eq!(core.perform_backup(), BackupOutcome::Done);

    let usb = &core.board().usb;
    assert_eq!(usb.get("/SECURITY_RECOVERY/A.bin").unwrap(), &second);
    assert_eq!(usb.get("/SECURITY_RECOVERY/B.bin").unwrap(), &first);

    // The one signature covers the new A.
    let signature = usb.get("/SECURITY_RECOVERY/signature.sig").unwrap().clone();
    assert!(core.board_mut().crypto.verify(&second, &signature));
}

#[test]
fn test_third_generation_drops_the_oldest() {
    let mut core = core_with_firmware(&firmware_image(1), 5_000);
    for tag in [1u8, 2, 3] {
        core.board_mut().flash.load(0, &firmware_image(tag));
        core.board_mut().system.advance(BACKUP_COOLDOWN_MS + 1);
        assert_eq!(core.perform_backup(), BackupOutcome::Done);
    }

    let usb = &core.board().usb;
    assert_eq!(usb.get("/SECURITY_RECOVERY/A.bin").unwrap(), &firmware_image(3));
    assert_eq!(usb.get("/SECURITY_RECOVERY/B.bin").unwrap(), &firmware_image(2));
}

#[test]
fn test_failed_image_write_leaves_previous_generation_as_b() {
    let first = firmware_image(1);
    let mut core = core_with_firmware(&first, 5_000);
    assert_eq!(core.perform_backup(), BackupOutcome::Done);

    // Next cycle: rotation succeeds, but writing the new A fails. The tree
    // is left with only the old generation in B, which recovery tolerates.
    core.board_mut().flash.load(0, &firmware_image(2));
    core.board_mut().system.advance(BACKUP_COOLDOWN_MS + 1);
    core.board_mut().usb.fail_writes = true;
    assert!(matches!(core.perform_backup(), BackupOutcome::Failed(_)));

    let usb = &core.board().usb;
    assert!(usb.get("/SECURITY_RECOVERY/A.bin").is_none());
    assert_eq!(usb.get("/SECURITY_RECOVERY/B.bin").unwrap(), &first);

    // Config still points at the previous consistent state.
    let expected_hash = core.board_mut().crypto.sha256(&first);
    assert_eq!(core.config().firmware_hash, expected_hash);
}

#[test]
fn test_backup_without_signer_abandons_cycle() {
    use warden_core::sim::HostCrypto;
    use warden_core::Error;

    let image = firmware_image(1);
    let mut core = core_with_firmware(&image, 5_000);
    // A platform that embeds only the public key cannot produce backups.
    let verifying = *core.board().crypto.verifying_key();
    core.board_mut().crypto = HostCrypto::verify_only(verifying);

    assert_eq!(
        core.perform_backup(),
        BackupOutcome::Failed(Error::NotInitialized)
    );
    assert!(!core.config().has_firmware_hash());
}

#[test]
fn test_metadata_contains_hex_hash() {
    let image = firmware_image(1);
    let mut core = core_with_firmware(&image, 5_000);
    core.perform_backup();

    let hash = core.board_mut().crypto.sha256(&image);
    let hex: String = hash.iter().map(|b| format!("{:02x}", b)).collect();
    let metadata = core.board().usb.get("/SECURITY_RECOVERY/metadata.txt").unwrap().clone();
    let text = String::from_utf8(metadata).unwrap();
    assert!(text.contains(&hex));
}
