// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for the bounded event log.

use warden_core::eventlog::{EventLog, LOG_CAPACITY, LOG_MESSAGE_LEN};

#[test]
fn test_log_starts_empty() {
    let log = EventLog::new();
    assert!(log.is_empty());
    assert_eq!(log.len(), 0);
}

#[test]
fn test_record_keeps_timestamp_and_message() {
    let mut log = EventLog::new();
    log.record(1234, format_args!("boot success ({})", "gpio signal"));

    let entry = log.iter().next().unwrap();
    assert_eq!(entry.timestamp, 1234);
    assert_eq!(entry.message.as_str(), "boot success (gpio signal)");
}

#[test]
fn test_entries_iterate_oldest_first() {
    let mut log = EventLog::new();
    for i in 0..10u32 {
        log.record(i, format_args!("event {}", i));
    }

    let timestamps: Vec<u32> = log.iter().map(|e| e.timestamp).collect();
    assert_eq!(timestamps, (0..10).collect::<Vec<u32>>());
}

#[test]
fn test_ring_wraps_and_drops_oldest() {
    let mut log = EventLog::new();
    let total = LOG_CAPACITY as u32 + 5;
    for i in 0..total {
        log.record(i, format_args!("event {}", i));
    }

    assert_eq!(log.len(), LOG_CAPACITY);
    let timestamps: Vec<u32> = log.iter().map(|e| e.timestamp).collect();
    assert_eq!(timestamps.first(), Some(&5));
    assert_eq!(timestamps.last(), Some(&(total - 1)));
    // Still strictly ordered after the wrap.
    assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_overlong_message_is_truncated_not_dropped() {
    let mut log = EventLog::new();
    let long = "x".repeat(LOG_MESSAGE_LEN * 2);
    log.record(1, format_args!("{}", long));

    let entry = log.iter().next().unwrap();
    assert_eq!(entry.message.len(), LOG_MESSAGE_LEN);
}

#[test]
fn test_clear_empties_the_ring() {
    let mut log = EventLog::new();
    for i in 0..5u32 {
        log.record(i, format_args!("event {}", i));
    }
    log.clear();
    assert!(log.is_empty());
    assert!(log.iter().next().is_none());
}
