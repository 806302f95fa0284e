// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Error kinds shared across the core.
//!
//! These are semantic categories, not per-module types: the state machine
//! decides between local retry (next candidate, next cycle) and escalation
//! based on the kind alone.

use core::fmt;

/// Result alias used throughout the core.
pub type Result<T> = core::result::Result<T, Error>;

/// Failure categories surfaced by the core and its platform seams.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Null/zero-length/overflowing input, rejected at the boundary.
    InvalidParameter,
    /// A subsystem was used before its platform init completed.
    NotInitialized,
    /// An offset + size would wrap or exceed the flash device.
    BoundsExceeded,
    /// A device-level read/write/erase/file operation failed.
    Io,
    /// Cryptographic signature verification failed.
    SignatureInvalid,
    /// Read-back after a flash write did not match the intended bytes.
    VerifyMismatch,
    /// The boot-success deadline expired.
    Timeout,
    /// Unrecoverable: no candidate left, safe mode is the only exit.
    Fatal,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Error::InvalidParameter => "invalid parameter",
            Error::NotInitialized => "subsystem not initialized",
            Error::BoundsExceeded => "flash bounds exceeded",
            Error::Io => "device i/o error",
            Error::SignatureInvalid => "signature verification failed",
            Error::VerifyMismatch => "read-back verification mismatch",
            Error::Timeout => "boot deadline expired",
            Error::Fatal => "unrecoverable failure",
        };
        f.write_str(text)
    }
}
