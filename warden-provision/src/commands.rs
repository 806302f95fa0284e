// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command implementations for recovery-tree operations.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};

use warden_core::{
    BACKUP_A_FILE, BACKUP_B_FILE, MANIFEST_FILE, METADATA_FILE, SIGNATURE_FILE, SIGNATURE_MAX_LEN,
    SIGNATURE_MIN_LEN,
};

use crate::manifest::{metadata_text, parse_metadata_hash, Manifest};

const HASH_CHUNK: usize = 64 * 1024;

/// Generate a signing keypair: raw 32-byte seed plus `<out>.pub`.
pub fn keygen(out: &Path) -> Result<()> {
    let signing = SigningKey::generate(&mut rand::rngs::OsRng);
    let verifying = signing.verifying_key();

    fs::write(out, signing.to_bytes())
        .with_context(|| format!("Failed to write {}", out.display()))?;

    let mut pub_path = out.as_os_str().to_owned();
    pub_path.push(".pub");
    fs::write(&pub_path, verifying.to_bytes())?;

    println!("Signing key: {}", out.display());
    println!("Public key:  {}", Path::new(&pub_path).display());
    println!("Key id:      {}", hex(&verifying.to_bytes()[..8]));
    Ok(())
}

/// Create a fresh recovery tree from a firmware image.
pub fn init(tree: &Path, image: &Path, key: &Path, board_id: &str, region_size: u32) -> Result<()> {
    let padded = load_and_pad_image(image, region_size)?;
    let signing = load_signing_key(key)?;

    fs::create_dir_all(tree)
        .with_context(|| format!("Failed to create {}", tree.display()))?;

    let hash = hash_with_progress(&padded, "Hashing image");
    let signature = signing.sign(&padded);

    fs::write(tree.join(BACKUP_A_FILE), &padded)?;
    fs::write(tree.join(SIGNATURE_FILE), signature.to_bytes())?;
    write_advisory_files(tree, board_id, &hash)?;

    println!();
    println!("Recovery tree created at {}", tree.display());
    println!("  Image:     {} ({} bytes padded)", image.display(), padded.len());
    println!("  SHA-256:   {}", hex(&hash));
    Ok(())
}

/// Rotate a new image into an existing tree: drop B, move A to B, write the
/// new A, re-sign, refresh the advisory files. The same order the on-board
/// backup engine uses.
pub fn rotate(
    tree: &Path,
    image: &Path,
    key: &Path,
    board_id: &str,
    region_size: u32,
) -> Result<()> {
    let path_a = tree.join(BACKUP_A_FILE);
    if !path_a.exists() {
        bail!(
            "{} has no {} - use init for a fresh tree",
            tree.display(),
            BACKUP_A_FILE
        );
    }

    let padded = load_and_pad_image(image, region_size)?;
    let signing = load_signing_key(key)?;

    let path_b = tree.join(BACKUP_B_FILE);
    if path_b.exists() {
        fs::remove_file(&path_b)?;
    }
    fs::rename(&path_a, &path_b)?;

    let hash = hash_with_progress(&padded, "Hashing image");
    let signature = signing.sign(&padded);

    fs::write(&path_a, &padded)?;
    fs::write(tree.join(SIGNATURE_FILE), signature.to_bytes())?;
    write_advisory_files(tree, board_id, &hash)?;

    println!();
    println!("Rotated {} into {}", image.display(), tree.display());
    println!("  Previous generation kept as {}", BACKUP_B_FILE);
    println!("  SHA-256: {}", hex(&hash));
    Ok(())
}

/// Audit a tree the way the recovery engine will see it.
pub fn verify(tree: &Path, pubkey: &Path, region_size: u32) -> Result<()> {
    let verifying = load_verifying_key(pubkey)?;

    let image = fs::read(tree.join(BACKUP_A_FILE))
        .with_context(|| format!("Failed to read {}", tree.join(BACKUP_A_FILE).display()))?;
    if image.is_empty() || image.len() > region_size as usize {
        bail!(
            "{} is {} bytes; the recovery engine accepts 1..={}",
            BACKUP_A_FILE,
            image.len(),
            region_size
        );
    }

    let sig_bytes = fs::read(tree.join(SIGNATURE_FILE))
        .with_context(|| format!("Failed to read {}", tree.join(SIGNATURE_FILE).display()))?;
    if !(SIGNATURE_MIN_LEN..=SIGNATURE_MAX_LEN).contains(&sig_bytes.len()) {
        bail!(
            "signature is {} bytes; the recovery engine accepts {}..={}",
            sig_bytes.len(),
            SIGNATURE_MIN_LEN,
            SIGNATURE_MAX_LEN
        );
    }

    let signature = Signature::try_from(sig_bytes.as_slice())
        .map_err(|_| anyhow::anyhow!("signature is not a valid ed25519 signature"))?;
    if verifying.verify(&image, &signature).is_err() {
        bail!("signature does NOT verify over {}", BACKUP_A_FILE);
    }
    println!("{}: signature OK ({} bytes)", BACKUP_A_FILE, image.len());

    let hash = hash_with_progress(&image, "Hashing image");
    match fs::read_to_string(tree.join(METADATA_FILE)) {
        Ok(text) => match parse_metadata_hash(&text) {
            Some(recorded) if recorded == hex(&hash) => {
                println!("{}: hash matches image", METADATA_FILE)
            }
            Some(_) => println!("{}: WARNING - recorded hash is stale", METADATA_FILE),
            None => println!("{}: no hash recorded", METADATA_FILE),
        },
        Err(_) => println!("{}: missing (advisory only)", METADATA_FILE),
    }

    // B is a previous generation; the single signature rarely covers it.
    let path_b = tree.join(BACKUP_B_FILE);
    if path_b.exists() {
        let image_b = fs::read(&path_b)?;
        if verifying.verify(&image_b, &signature).is_ok() {
            println!("{}: signature OK", BACKUP_B_FILE);
        } else {
            println!(
                "{}: present, not covered by the current signature (expected for an older generation)",
                BACKUP_B_FILE
            );
        }
    } else {
        println!("{}: absent (first generation)", BACKUP_B_FILE);
    }

    println!();
    println!("Tree is usable for recovery.");
    Ok(())
}

/// Print what a tree claims to contain.
pub fn status(tree: &Path) -> Result<()> {
    let manifest_path = tree.join(MANIFEST_FILE);
    let text = fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
    let manifest: Manifest =
        serde_json::from_str(&text).context("manifest.json is not valid JSON")?;

    println!("Recovery Tree: {}", tree.display());
    println!("  Version:   {}", manifest.version);
    println!("  Board id:  {}", if manifest.board_id.is_empty() {
        "(unset)"
    } else {
        manifest.board_id.as_str()
    });
    println!("  Timestamp: {}", manifest.timestamp);
    for file in [BACKUP_A_FILE, BACKUP_B_FILE, SIGNATURE_FILE, METADATA_FILE] {
        let path = tree.join(file);
        match fs::metadata(&path) {
            Ok(meta) => println!("  {:<14} {} bytes", file, meta.len()),
            Err(_) => println!("  {:<14} absent", file),
        }
    }

    if let Ok(metadata) = fs::read_to_string(tree.join(METADATA_FILE)) {
        println!();
        print!("{}", metadata);
    }
    Ok(())
}

// --- Helpers ---

fn load_and_pad_image(image: &Path, region_size: u32) -> Result<Vec<u8>> {
    let mut data =
        fs::read(image).with_context(|| format!("Failed to read {}", image.display()))?;
    if data.is_empty() {
        bail!("{} is empty", image.display());
    }
    if data.len() > region_size as usize {
        bail!(
            "{} is {} bytes, larger than the {} byte firmware region",
            image.display(),
            data.len(),
            region_size
        );
    }
    // Backups are exact region images; pad the tail with erased-flash bytes.
    data.resize(region_size as usize, 0xFF);
    Ok(data)
}

fn load_signing_key(key: &Path) -> Result<SigningKey> {
    let bytes = fs::read(key).with_context(|| format!("Failed to read {}", key.display()))?;
    let seed: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow::anyhow!("{} must be exactly 32 bytes", key.display()))?;
    Ok(SigningKey::from_bytes(&seed))
}

fn load_verifying_key(pubkey: &Path) -> Result<VerifyingKey> {
    let bytes =
        fs::read(pubkey).with_context(|| format!("Failed to read {}", pubkey.display()))?;
    let raw: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow::anyhow!("{} must be exactly 32 bytes", pubkey.display()))?;
    VerifyingKey::from_bytes(&raw).map_err(|_| anyhow::anyhow!("not a valid ed25519 public key"))
}

fn hash_with_progress(data: &[u8], label: &str) -> [u8; 32] {
    let pb = ProgressBar::new(data.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message(label.to_string());

    let mut hasher = Sha256::new();
    for chunk in data.chunks(HASH_CHUNK) {
        hasher.update(chunk);
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();
    hasher.finalize().into()
}

fn write_advisory_files(tree: &Path, board_id: &str, hash: &[u8; 32]) -> Result<()> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let manifest = Manifest::new(board_id, timestamp);
    fs::write(
        tree.join(MANIFEST_FILE),
        serde_json::to_string_pretty(&manifest)?,
    )?;
    fs::write(tree.join(METADATA_FILE), metadata_text(&hex(hash), timestamp))?;
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
