// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for the boot supervisor.

use warden_core::sim::ScriptedSensors;
use warden_core::supervisor::{evaluate, BootMonitor, BootStatus, BootVerdict, POST_CODE_BOOT_OK};

// =============================================================================
// evaluate (pure decision rule)
// =============================================================================

#[test]
fn test_evaluate_pending_when_nothing_fired() {
    let status = BootStatus::default();
    assert_eq!(evaluate(&status, 0, 30_000), BootVerdict::Pending);
    assert_eq!(evaluate(&status, 29_999, 30_000), BootVerdict::Pending);
}

#[test]
fn test_evaluate_timeout_is_strictly_after_deadline() {
    let status = BootStatus::default();
    assert_eq!(evaluate(&status, 30_000, 30_000), BootVerdict::Pending);
    assert_eq!(evaluate(&status, 30_001, 30_000), BootVerdict::TimedOut);
}

#[test]
fn test_evaluate_any_single_sensor_is_sufficient() {
    let mut status = BootStatus::default();
    status.gpio_signal_seen = true;
    assert_eq!(evaluate(&status, 0, 30_000), BootVerdict::Succeeded);

    let mut status = BootStatus::default();
    status.watchdog_cleared = true;
    assert_eq!(evaluate(&status, 0, 30_000), BootVerdict::Succeeded);

    let mut status = BootStatus::default();
    status.post_code = POST_CODE_BOOT_OK;
    assert_eq!(evaluate(&status, 0, 30_000), BootVerdict::Succeeded);

    let mut status = BootStatus::default();
    status.firmware_flag_set = true;
    assert_eq!(evaluate(&status, 0, 30_000), BootVerdict::Succeeded);
}

#[test]
fn test_evaluate_post_code_below_threshold_does_not_count() {
    let mut status = BootStatus::default();
    status.post_code = POST_CODE_BOOT_OK - 1;
    assert_eq!(evaluate(&status, 0, 30_000), BootVerdict::Pending);
}

#[test]
fn test_evaluate_success_wins_over_elapsed_deadline() {
    // A sensor that fired on the very poll that crosses the deadline still
    // counts as success.
    let mut status = BootStatus::default();
    status.firmware_flag_set = true;
    assert_eq!(evaluate(&status, 40_000, 30_000), BootVerdict::Succeeded);
}

// =============================================================================
// BootMonitor latching
// =============================================================================

#[test]
fn test_monitor_latches_pulsed_gpio() {
    let mut sensors = ScriptedSensors::default();
    let mut monitor = BootMonitor::start(0, 30_000);

    assert_eq!(monitor.poll(&mut sensors, 100), BootVerdict::Pending);

    // Pulse the line high for one poll, then drop it again.
    sensors.gpio = true;
    assert_eq!(monitor.poll(&mut sensors, 200), BootVerdict::Succeeded);
    sensors.gpio = false;
    assert_eq!(monitor.poll(&mut sensors, 300), BootVerdict::Succeeded);
    assert!(monitor.status().gpio_signal_seen);
}

#[test]
fn test_monitor_latches_post_code_maximum() {
    let mut sensors = ScriptedSensors::default();
    let mut monitor = BootMonitor::start(0, 30_000);

    sensors.post_code = 0x55;
    monitor.poll(&mut sensors, 100);
    sensors.post_code = 0xA5;
    monitor.poll(&mut sensors, 200);
    // The port regressed, but the latched maximum stands.
    sensors.post_code = 0x10;
    assert_eq!(monitor.poll(&mut sensors, 300), BootVerdict::Succeeded);
    assert_eq!(monitor.status().post_code, 0xA5);
}

#[test]
fn test_monitor_times_out_without_sensors() {
    let mut sensors = ScriptedSensors::default();
    let mut monitor = BootMonitor::start(1000, 30_000);

    assert_eq!(monitor.poll(&mut sensors, 31_000), BootVerdict::Pending);
    assert_eq!(monitor.poll(&mut sensors, 31_001), BootVerdict::TimedOut);
}

#[test]
fn test_monitor_deadline_is_wrap_safe() {
    let mut sensors = ScriptedSensors::default();
    // Armed just before the clock wraps.
    let mut monitor = BootMonitor::start(u32::MAX - 1000, 30_000);

    assert_eq!(monitor.poll(&mut sensors, u32::MAX), BootVerdict::Pending);
    // 20 s after wrap: still inside the window.
    assert_eq!(monitor.poll(&mut sensors, 20_000), BootVerdict::Pending);
    // Past the window.
    assert_eq!(monitor.poll(&mut sensors, 40_000), BootVerdict::TimedOut);
}

#[test]
fn test_monitor_success_reason_names_first_sensor() {
    let mut sensors = ScriptedSensors::default();
    let mut monitor = BootMonitor::start(0, 30_000);

    sensors.watchdog = true;
    monitor.poll(&mut sensors, 100);
    assert_eq!(monitor.success_reason(), "watchdog cleared");
}
