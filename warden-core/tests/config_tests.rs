// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for the persistent configuration store.

use warden_core::config::{hash_hex, Config, ConfigStore, StoredConfig};
use warden_core::layout::MAX_DISABLE_DURATION_MS;
use warden_core::sim::MemFlash;

const STORE_OFFSET: u32 = 0x0002_0000;
const SECTOR: u32 = 4096;

fn store() -> ConfigStore {
    ConfigStore::new(STORE_OFFSET)
}

fn sample_config() -> Config {
    let mut config = Config::default_new();
    config.board_id.push_str("BOARD-42").unwrap();
    config.last_backup_at = 123_456;
    config.last_recovery_at = 99;
    config.firmware_hash = [0xAB; 32];
    config
}

// --- Defaults ---

#[test]
fn test_default_config_is_enabled_with_zero_hash() {
    let config = Config::default_new();
    assert!(config.enabled);
    assert_eq!(config.disable_until, 0);
    assert!(!config.removal_scheduled);
    assert!(!config.has_firmware_hash());
    assert!(config.board_id.is_empty());
}

// --- Round trip ---

#[test]
fn test_write_then_read_round_trips() {
    let mut flash = MemFlash::new(256 * 1024, SECTOR);
    let config = sample_config();

    store().write(&mut flash, &config).unwrap();
    let stored = store().read(&mut flash).unwrap();

    assert_eq!(stored, StoredConfig::Valid(config));
}

#[test]
fn test_rewrite_replaces_previous_record() {
    let mut flash = MemFlash::new(256 * 1024, SECTOR);
    let mut config = sample_config();

    store().write(&mut flash, &config).unwrap();
    config.last_backup_at = 777;
    store().write(&mut flash, &config).unwrap();

    let StoredConfig::Valid(read_back) = store().read(&mut flash).unwrap() else {
        panic!("expected a valid record");
    };
    assert_eq!(read_back.last_backup_at, 777);
}

// --- Sentinels ---

#[test]
fn test_erased_flash_reads_blank() {
    let mut flash = MemFlash::new(256 * 1024, SECTOR);
    assert_eq!(store().read(&mut flash).unwrap(), StoredConfig::Blank);
}

#[test]
fn test_zeroed_region_reads_zeroed() {
    let mut flash = MemFlash::new(256 * 1024, SECTOR);
    flash.load(STORE_OFFSET, &[0u8; 4096]);
    assert_eq!(store().read(&mut flash).unwrap(), StoredConfig::Zeroed);
}

#[test]
fn test_bad_magic_reads_corrupt() {
    let mut flash = MemFlash::new(256 * 1024, SECTOR);
    flash.load(STORE_OFFSET, b"not a config record at all......");
    assert_eq!(store().read(&mut flash).unwrap(), StoredConfig::Corrupt);
}

#[test]
fn test_flipped_payload_bit_fails_crc() {
    let mut flash = MemFlash::new(256 * 1024, SECTOR);
    store().write(&mut flash, &sample_config()).unwrap();

    // Corrupt one payload byte behind the store's back.
    let byte = flash.contents(STORE_OFFSET + 8, 1)[0];
    flash.load(STORE_OFFSET + 8, &[byte ^ 0x40]);

    assert_eq!(store().read(&mut flash).unwrap(), StoredConfig::Corrupt);
}

// --- Disable window ---

#[test]
fn test_disable_window_active_and_expired() {
    let mut config = Config::default_new();
    config.disable_until = 61_000;

    assert!(config.is_disabled(30_000));
    assert!(config.is_disabled(60_999));
    // The window ends the instant the deadline is reached.
    assert!(!config.is_disabled(61_000));
    assert!(!config.is_disabled(61_001));
}

#[test]
fn test_disable_window_survives_clock_wrap() {
    let mut config = Config::default_new();
    // Deadline shortly after the wrap, checked from just before it.
    config.disable_until = 500;
    assert!(config.is_disabled(u32::MAX - 1000));
}

#[test]
fn test_disabled_flag_overrides_everything() {
    let mut config = Config::default_new();
    config.enabled = false;
    assert!(config.is_disabled(0));
}

#[test]
fn test_max_disable_duration_is_seven_days() {
    assert_eq!(MAX_DISABLE_DURATION_MS, 7 * 24 * 60 * 60 * 1000);
}

// --- Hex rendering ---

#[test]
fn test_hash_hex_renders_64_lowercase_chars() {
    let mut hash = [0u8; 32];
    hash[0] = 0xAB;
    hash[31] = 0x01;
    let hex = hash_hex(&hash);
    assert_eq!(hex.len(), 64);
    assert!(hex.starts_with("ab"));
    assert!(hex.ends_with("01"));
}
