// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Scenario simulator for the warden recovery core.
//!
//! Wires the core to the in-memory devices and drives `tick()` on the same
//! 100 ms cadence a host loop would, with the clock accelerated. Each
//! scenario prints the event stream and a closing summary.
//!
//! Usage:
//!   warden-sim happy
//!   warden-sim fail
//!   warden-sim safe-mode
//!   warden-sim removal
//!   warden-sim disable

use anyhow::Result;
use clap::{Parser, ValueEnum};

use warden_core::layout::{BoardProfile, SpiInterface};
use warden_core::sim::{sim_board, SimBoard, SimCore};
use warden_core::{CryptoProvider, FlashAccess, RecoveryCore, State, SystemCtl};

const TICK_MS: u32 = 100;
const REGION: usize = 64 * 1024;

#[derive(Parser)]
#[command(name = "warden-sim")]
#[command(about = "Drive the recovery core through scripted boot scenarios")]
struct Cli {
    /// Scenario to run
    #[arg(value_enum)]
    scenario: Scenario,

    /// Safety cap on the number of ticks
    #[arg(long, default_value_t = 2000)]
    max_ticks: u32,
}

#[derive(Clone, Copy, ValueEnum)]
enum Scenario {
    /// Boot succeeds via GPIO at t=5s; the core backs up to USB
    Happy,
    /// Boot times out; the core restores a signed image from USB
    Fail,
    /// Boot times out and no candidate verifies; safe mode
    SafeMode,
    /// A healthy system schedules removal and the core retires itself
    Removal,
    /// A 60 s temporary disable suppresses supervision, then re-arms
    Disable,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.scenario {
        Scenario::Happy => run_happy(cli.max_ticks),
        Scenario::Fail => run_fail(cli.max_ticks, true),
        Scenario::SafeMode => run_fail(cli.max_ticks, false),
        Scenario::Removal => run_removal(cli.max_ticks),
        Scenario::Disable => run_disable(cli.max_ticks),
    }
    Ok(())
}

/// A compact profile so the simulated images stay small.
fn sim_profile() -> BoardProfile {
    BoardProfile {
        flash_size: 256 * 1024,
        sector_size: 4096,
        firmware_region_size: REGION as u32,
        src_region_offset: 0x0002_0000,
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

fn new_core(mut configure: impl FnMut(&mut SimBoard)) -> SimCore {
    let profile = sim_profile();
    let mut board = sim_board(&profile);
    board.system.echo = true;
    configure(&mut board);
    RecoveryCore::new(board, profile)
}

fn tick(core: &mut SimCore) {
    core.board_mut().system.advance(TICK_MS);
    core.tick();
}

fn summarize(core: &mut SimCore) {
    let reboots = core.board().system.reboot_requests;
    let safe_modes = core.board().system.safe_mode_entries;
    println!();
    println!("--- summary ---");
    println!("state:            {}", core.state());
    println!("reboot requests:  {}", reboots);
    println!("safe mode:        {}", safe_modes);
    println!("{}", core.status_summary());
}

fn run_happy(max_ticks: u32) {
    let image = firmware_image(1);
    let mut core = new_core(|board| {
        board.flash.load(0, &image);
    });
    core.set_board_id("SIM-BOARD").unwrap();

    for _ in 0..max_ticks {
        if core.board_mut().system.now_ms() >= 5_000 {
            core.board_mut().sensors.gpio = true;
        }
        tick(&mut core);
        if core.state() == State::Active {
            break;
        }
    }
    // A few more ticks in Active to show the cooldown holding.
    for _ in 0..5 {
        tick(&mut core);
    }
    summarize(&mut core);
}

fn run_fail(max_ticks: u32, valid_tree: bool) {
    let good = firmware_image(1);
    let mut core = new_core(|board| {
        // Flash holds a corrupted image that will not boot.
        board.flash.load(0, &firmware_image(9));

        let signed: &[u8] = if valid_tree { &good } else { b"something else" };
        let mut sig = [0u8; 512];
        let n = board.crypto.sign(signed, &mut sig).unwrap();
        board.usb.insert("/SECURITY_RECOVERY/A.bin", good.clone());
        board
            .usb
            .insert("/SECURITY_RECOVERY/signature.sig", sig[..n].to_vec());
    });

    for _ in 0..max_ticks {
        tick(&mut core);
        if core.board().system.reboot_requests > 0 || core.state() == State::Halted {
            break;
        }
    }

    let restored = core.board().flash.contents(0, REGION) == &good[..];
    summarize(&mut core);
    println!("firmware restored: {}", restored);
}

fn run_removal(max_ticks: u32) {
    let image = firmware_image(1);
    let mut core = new_core(|board| {
        board.flash.load(0, &image);
    });

    // First boot: succeed, back up, then schedule removal.
    for _ in 0..max_ticks {
        if core.board_mut().system.now_ms() >= 5_000 {
            core.board_mut().sensors.gpio = true;
        }
        tick(&mut core);
        if core.state() == State::Active {
            break;
        }
    }
    core.schedule_removal().unwrap();

    // Simulated reboot: same board, fresh core.
    println!();
    println!("--- reboot ---");
    let profile = *core.profile();
    let mut core = RecoveryCore::new(core.into_board(), profile);
    for _ in 0..max_ticks {
        tick(&mut core);
        if core.state() == State::Halted {
            break;
        }
    }
    summarize(&mut core);
    println!("flash locked:     {}", core.board().flash.is_locked());
}

fn run_disable(max_ticks: u32) {
    let image = firmware_image(1);
    let mut core = new_core(|board| {
        board.flash.load(0, &image);
    });

    tick(&mut core);
    core.disable_temporary(60_000).unwrap();

    for _ in 0..max_ticks {
        tick(&mut core);
        if core.state() == State::Checking && core.board_mut().system.now_ms() > 60_000 {
            break;
        }
    }
    summarize(&mut core);
}
