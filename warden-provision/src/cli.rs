// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "warden-provision")]
#[command(about = "Prepare and audit USB recovery trees for the warden recovery core")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a signing keypair
    Keygen {
        /// Where to write the 32-byte signing seed (public key lands in
        /// <OUT>.pub)
        #[arg(short, long, default_value = "signing.key")]
        out: PathBuf,
    },

    /// Create a recovery tree from a firmware image
    Init {
        /// Recovery tree directory (the SECURITY_RECOVERY mount point)
        #[arg(value_name = "TREE")]
        tree: PathBuf,

        /// Firmware image file
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Signing seed file
        #[arg(short, long)]
        key: PathBuf,

        /// Board identifier recorded in the manifest
        #[arg(short, long, default_value = "")]
        board_id: String,

        /// Firmware region size the image is padded to
        #[arg(long, default_value_t = warden_core::FIRMWARE_REGION_SIZE)]
        region_size: u32,
    },

    /// Rotate a new firmware image into an existing tree (A -> B, new -> A)
    Rotate {
        #[arg(value_name = "TREE")]
        tree: PathBuf,

        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        #[arg(short, long)]
        key: PathBuf,

        #[arg(short, long, default_value = "")]
        board_id: String,

        #[arg(long, default_value_t = warden_core::FIRMWARE_REGION_SIZE)]
        region_size: u32,
    },

    /// Verify the signature and metadata of an existing tree
    Verify {
        #[arg(value_name = "TREE")]
        tree: PathBuf,

        /// Public key file (32 bytes)
        #[arg(short, long)]
        pubkey: PathBuf,

        #[arg(long, default_value_t = warden_core::FIRMWARE_REGION_SIZE)]
        region_size: u32,
    },

    /// Print the manifest and metadata of a tree
    Status {
        #[arg(value_name = "TREE")]
        tree: PathBuf,
    },
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Keygen { out } => commands::keygen(&out),
        Commands::Init {
            tree,
            image,
            key,
            board_id,
            region_size,
        } => commands::init(&tree, &image, &key, &board_id, region_size),
        Commands::Rotate {
            tree,
            image,
            key,
            board_id,
            region_size,
        } => commands::rotate(&tree, &image, &key, &board_id, region_size),
        Commands::Verify {
            tree,
            pubkey,
            region_size,
        } => commands::verify(&tree, &pubkey, region_size),
        Commands::Status { tree } => commands::status(&tree),
    }
}
