// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Recovery-tree provisioning tool for the warden recovery core.
//!
//! Usage:
//!   warden-provision keygen --out signing.key
//!   warden-provision init /mnt/usb/SECURITY_RECOVERY firmware.bin --key signing.key
//!   warden-provision verify /mnt/usb/SECURITY_RECOVERY --pubkey signing.key.pub
//!   warden-provision status /mnt/usb/SECURITY_RECOVERY

mod cli;
mod commands;
mod manifest;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args)
}
