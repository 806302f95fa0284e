// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Boot supervision - deadline plus four latched boot-success sensors.
//!
//! The decision rule is a logical OR: any one sensor firing within the
//! deadline means the boot succeeded. Sensors are latched per boot attempt,
//! so a signal that asserts between two polls and drops again still counts.
//! The pure [`evaluate`] function carries the decision logic so it can be
//! tested without hardware.

use crate::platform::BootSensors;

/// POST codes at or above this value mean the host firmware reached the
/// boot-device phase.
pub const POST_CODE_BOOT_OK: u8 = 0xA0;

/// Per-boot-attempt sensor snapshot, latched across polls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BootStatus {
    pub gpio_signal_seen: bool,
    pub watchdog_cleared: bool,
    /// Highest POST code observed this attempt.
    pub post_code: u8,
    pub firmware_flag_set: bool,
    pub last_update_at: u32,
}

impl BootStatus {
    pub fn any_fired(&self) -> bool {
        self.gpio_signal_seen
            || self.watchdog_cleared
            || self.post_code >= POST_CODE_BOOT_OK
            || self.firmware_flag_set
    }
}

/// Outcome of a supervisor poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootVerdict {
    Pending,
    Succeeded,
    TimedOut,
}

/// Decide the verdict from a latched snapshot and the elapsed time.
pub fn evaluate(status: &BootStatus, elapsed_ms: u32, timeout_ms: u32) -> BootVerdict {
    if status.any_fired() {
        BootVerdict::Succeeded
    } else if elapsed_ms > timeout_ms {
        BootVerdict::TimedOut
    } else {
        BootVerdict::Pending
    }
}

/// Deadline-armed supervisor for one boot attempt.
#[derive(Clone, Copy, Debug)]
pub struct BootMonitor {
    t0: u32,
    timeout_ms: u32,
    status: BootStatus,
}

impl BootMonitor {
    pub fn start(now: u32, timeout_ms: u32) -> Self {
        Self {
            t0: now,
            timeout_ms,
            status: BootStatus {
                last_update_at: now,
                ..BootStatus::default()
            },
        }
    }

    /// Sample the sensors, fold them into the latched snapshot, and decide.
    pub fn poll<S: BootSensors>(&mut self, sensors: &mut S, now: u32) -> BootVerdict {
        self.status.gpio_signal_seen |= sensors.gpio_signal();
        self.status.watchdog_cleared |= sensors.watchdog_cleared();
        self.status.post_code = self.status.post_code.max(sensors.post_code());
        self.status.firmware_flag_set |= sensors.firmware_flag();
        self.status.last_update_at = now;

        evaluate(&self.status, now.wrapping_sub(self.t0), self.timeout_ms)
    }

    pub fn status(&self) -> &BootStatus {
        &self.status
    }

    /// Short label for the first sensor that fired, for the event log.
    pub fn success_reason(&self) -> &'static str {
        if self.status.gpio_signal_seen {
            "gpio signal"
        } else if self.status.watchdog_cleared {
            "watchdog cleared"
        } else if self.status.post_code >= POST_CODE_BOOT_OK {
            "post code"
        } else {
            "firmware flag"
        }
    }
}
