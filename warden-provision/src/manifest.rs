// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Manifest and metadata rendering for the recovery tree.
//!
//! Both files are advisory: the on-board recovery engine never parses them.
//! This tool round-trips the manifest through JSON so `status` and `verify`
//! can show what a tree claims to contain.

use serde::{Deserialize, Serialize};

use warden_core::{BACKUP_A_FILE, BACKUP_B_FILE};

#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub board_id: String,
    pub backup_a: String,
    pub backup_b: String,
    pub timestamp: u64,
}

impl Manifest {
    pub fn new(board_id: &str, timestamp: u64) -> Self {
        Self {
            version: "1.0".into(),
            board_id: board_id.into(),
            backup_a: BACKUP_A_FILE.into(),
            backup_b: BACKUP_B_FILE.into(),
            timestamp,
        }
    }
}

/// Render `metadata.txt` the way the on-board backup engine does.
pub fn metadata_text(hash_hex: &str, timestamp: u64) -> String {
    format!("Firmware Hash: {}\nBackup Time: {}\n", hash_hex, timestamp)
}

/// Pull the hex hash back out of a `metadata.txt`.
pub fn parse_metadata_hash(text: &str) -> Option<String> {
    text.lines()
        .find_map(|line| line.strip_prefix("Firmware Hash: "))
        .map(|hash| hash.trim().to_string())
}
