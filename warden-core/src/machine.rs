// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! The supervision state machine.
//!
//! [`RecoveryCore`] owns the injected board, the persistent [`Config`], and
//! the volatile [`Runtime`]. The host calls [`RecoveryCore::tick`] on a
//! ~100 ms cadence; each tick advances at most one state. Every state action
//! is idempotent or gated by timestamps, so re-entry after a crash or an
//! ignored reboot request is safe.

use core::fmt;

use crate::config::{Config, ConfigStore, StoredConfig};
use crate::error::{Error, Result};
use crate::eventlog::EventLog;
use crate::layout::{BoardProfile, MAX_DISABLE_DURATION_MS};
use crate::platform::{Board, BootSensors, CryptoProvider, FlashAccess, SystemCtl, UsbStore};
use crate::supervisor::{BootMonitor, BootVerdict};

/// Machine states. `Halted` is the terminal no-progress state entered after
/// safe mode or after a removal's reboot request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Init,
    Checking,
    Success,
    Failed,
    Recovering,
    Active,
    Disabled,
    Removing,
    Halted,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Init => "init",
            State::Checking => "checking",
            State::Success => "success",
            State::Failed => "failed",
            State::Recovering => "recovering",
            State::Active => "active",
            State::Disabled => "disabled",
            State::Removing => "removing",
            State::Halted => "halted",
        };
        f.write_str(name)
    }
}

/// Volatile per-boot state, reconstructable from `Config` at any point.
pub(crate) struct Runtime {
    pub state: State,
    pub monitor: Option<BootMonitor>,
    pub profile: BoardProfile,
}

/// The Security Recovery Core.
pub struct RecoveryCore<F, U, C, S, Y> {
    pub(crate) board: Board<F, U, C, S, Y>,
    pub(crate) store: ConfigStore,
    pub(crate) config: Config,
    pub(crate) runtime: Runtime,
    pub(crate) log: EventLog,
}

impl<F, U, C, S, Y> RecoveryCore<F, U, C, S, Y>
where
    F: FlashAccess,
    U: UsbStore,
    C: CryptoProvider,
    S: BootSensors,
    Y: SystemCtl,
{
    /// Build the core around an injected board. The persistent record is not
    /// touched until the first tick, which performs the `Init` transition.
    pub fn new(board: Board<F, U, C, S, Y>, profile: BoardProfile) -> Self {
        let store = ConfigStore::new(profile.src_region_offset);
        Self {
            board,
            store,
            config: Config::default_new(),
            runtime: Runtime {
                state: State::Init,
                monitor: None,
                profile,
            },
            log: EventLog::new(),
        }
    }

    pub fn state(&self) -> State {
        self.runtime.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn profile(&self) -> &BoardProfile {
        &self.runtime.profile
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    pub fn board(&self) -> &Board<F, U, C, S, Y> {
        &self.board
    }

    /// The host loop owns the device handles; sensor and clock updates from
    /// the platform side come through here.
    pub fn board_mut(&mut self) -> &mut Board<F, U, C, S, Y> {
        &mut self.board
    }

    /// Tear the core down and hand the board back, e.g. across a simulated
    /// reboot.
    pub fn into_board(self) -> Board<F, U, C, S, Y> {
        self.board
    }

    /// Advance the machine by one state. Never blocks on anything but the
    /// synchronous platform calls of the current state's action.
    pub fn tick(&mut self) {
        match self.runtime.state {
            State::Init => self.tick_init(),
            State::Checking => self.tick_checking(),
            State::Success => {
                self.perform_backup();
                self.runtime.state = State::Active;
            }
            State::Failed => self.tick_failed(),
            // Transient while the engine runs inside `tick_failed`.
            State::Recovering => {}
            State::Active => {
                self.perform_backup();
            }
            State::Disabled => self.tick_disabled(),
            State::Removing => self.handle_removal(),
            State::Halted => {}
        }
    }

    fn tick_init(&mut self) {
        let stored = match self.store.read(&mut self.board.flash) {
            Ok(stored) => stored,
            Err(_) => {
                // Refuse to progress on an unreadable device; retried next tick.
                self.note(format_args!("config read failed, staying in init"));
                return;
            }
        };

        self.config = match stored {
            StoredConfig::Valid(config) => config,
            StoredConfig::Blank => {
                // Promote without persisting; the first mutation writes it out.
                self.note(format_args!("no config found, using defaults"));
                Config::default_new()
            }
            StoredConfig::Zeroed => {
                self.note(format_args!("config zeroed, core is removed"));
                let mut config = Config::default_new();
                config.enabled = false;
                config
            }
            StoredConfig::Corrupt => {
                self.note(format_args!("config corrupt, using defaults"));
                Config::default_new()
            }
        };

        // Writes may follow in every active branch; a retired core leaves
        // the device locked.
        if self.config.enabled || self.config.removal_scheduled {
            let _ = self.board.flash.unlock();
        }

        if self.config.removal_scheduled {
            self.note(format_args!("removal scheduled, entering removal"));
            self.runtime.state = State::Removing;
            return;
        }

        let now = self.board.system.now_ms();
        if self.config.is_disabled(now) {
            self.note(format_args!("core disabled, standing by"));
            self.runtime.state = State::Disabled;
            return;
        }

        self.arm_supervisor();
        self.runtime.state = State::Checking;
        let timeout_ms = self.runtime.profile.boot_timeout_ms;
        self.note(format_args!("monitoring boot, timeout {} ms", timeout_ms));
    }

    fn tick_checking(&mut self) {
        let now = self.board.system.now_ms();
        let Some(monitor) = self.runtime.monitor.as_mut() else {
            // Lost the deadline somehow; re-arm rather than guess.
            self.arm_supervisor();
            return;
        };

        match monitor.poll(&mut self.board.sensors, now) {
            BootVerdict::Pending => {}
            BootVerdict::Succeeded => {
                let reason = monitor.success_reason();
                self.note(format_args!("boot success ({})", reason));
                self.runtime.monitor = None;
                self.runtime.state = State::Success;
            }
            BootVerdict::TimedOut => {
                self.note(format_args!("boot timeout exceeded, boot failed"));
                self.runtime.monitor = None;
                self.runtime.state = State::Failed;
            }
        }
    }

    fn tick_failed(&mut self) {
        self.note(format_args!("attempting recovery from usb"));
        self.runtime.state = State::Recovering;

        if self.recover_from_usb() {
            self.note(format_args!("recovery successful, requesting reboot"));
            self.board.system.reboot();
            // A host that defers the reset keeps being supervised.
            self.arm_supervisor();
            self.runtime.state = State::Checking;
        } else {
            self.note(format_args!("recovery failed, entering safe mode"));
            self.board.system.enter_safe_mode();
            self.runtime.state = State::Halted;
        }
    }

    fn tick_disabled(&mut self) {
        if !self.config.enabled {
            return;
        }
        let now = self.board.system.now_ms();
        if self.config.disable_until != 0 && !self.config.is_disabled(now) {
            self.note(format_args!("disable period expired, re-enabling"));
            self.config.disable_until = 0;
            let _ = self.persist_config();
            self.arm_supervisor();
            self.runtime.state = State::Checking;
        }
    }

    /// Hold the core off for `duration_ms` (at most seven days). Takes
    /// effect immediately: the machine parks in `Disabled` until the window
    /// expires.
    pub fn disable_temporary(&mut self, duration_ms: u32) -> Result<()> {
        if duration_ms == 0 || duration_ms > MAX_DISABLE_DURATION_MS {
            return Err(Error::InvalidParameter);
        }
        let now = self.board.system.now_ms();
        self.config.disable_until = now.wrapping_add(duration_ms);
        self.persist_config()?;
        self.note(format_args!("disabled for {} ms", duration_ms));
        if !matches!(self.runtime.state, State::Removing | State::Halted) {
            self.runtime.state = State::Disabled;
        }
        Ok(())
    }

    /// Re-enable the core and clear any disable window.
    pub fn enable(&mut self) -> Result<()> {
        self.config.enabled = true;
        self.config.disable_until = 0;
        self.persist_config()?;
        self.note(format_args!("core enabled"));
        if matches!(self.runtime.state, State::Disabled) {
            self.arm_supervisor();
            self.runtime.state = State::Checking;
        }
        Ok(())
    }

    /// Persist the removal flag; the machine enters `Removing` on the next
    /// boot's init.
    pub fn schedule_removal(&mut self) -> Result<()> {
        self.config.removal_scheduled = true;
        self.persist_config()?;
        self.note(format_args!("removal scheduled for next boot"));
        Ok(())
    }

    /// Record the board identity carried in the config and the manifest.
    /// ASCII only, at most [`crate::config::BOARD_ID_LEN`] bytes.
    pub fn set_board_id(&mut self, board_id: &str) -> Result<()> {
        if !board_id.is_ascii() {
            return Err(Error::InvalidParameter);
        }
        let mut id = heapless::String::new();
        id.push_str(board_id).map_err(|_| Error::InvalidParameter)?;
        self.config.board_id = id;
        self.persist_config()
    }

    /// Clear the event log. Requires platform authentication.
    pub fn clear_event_log(&mut self) -> Result<()> {
        if !self.board.system.authenticate() {
            return Err(Error::InvalidParameter);
        }
        self.log.clear();
        Ok(())
    }

    pub(crate) fn arm_supervisor(&mut self) {
        let now = self.board.system.now_ms();
        self.runtime.monitor = Some(BootMonitor::start(
            now,
            self.runtime.profile.boot_timeout_ms,
        ));
    }

    /// Write the config record, retrying once on a device error.
    pub(crate) fn persist_config(&mut self) -> Result<()> {
        if self.store.write(&mut self.board.flash, &self.config).is_ok() {
            return Ok(());
        }
        match self.store.write(&mut self.board.flash, &self.config) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.note(format_args!("config write failed twice"));
                Err(err)
            }
        }
    }

    /// Record an event and mirror it to the platform debug sink.
    pub(crate) fn note(&mut self, args: fmt::Arguments<'_>) {
        let now = self.board.system.now_ms();
        let message = self.log.record(now, args);
        self.board.system.debug_log(&message);
    }
}
