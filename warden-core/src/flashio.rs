// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Sector-level flash plumbing shared by the engines.
//!
//! Every write path in the core funnels through here: bounds are checked
//! with overflow protection before any device call, sectors are erased
//! before they are programmed, and read-back verification runs in fixed
//! chunks so an 8 MiB image never needs a second buffer.

use crate::error::{Error, Result};
use crate::platform::FlashAccess;

/// Granularity for chunked reads during verification and zero-fill.
const IO_CHUNK: usize = 4096;

/// Reject any `offset + len` that could wrap or land past the device end.
pub fn check_bounds(flash_size: u32, offset: u32, len: usize) -> Result<()> {
    if len == 0 {
        return Err(Error::InvalidParameter);
    }
    if len as u64 > u32::MAX as u64 {
        return Err(Error::BoundsExceeded);
    }
    match offset.checked_add(len as u32) {
        Some(end) if end <= flash_size => Ok(()),
        _ => Err(Error::BoundsExceeded),
    }
}

/// Erase-then-program `data` starting at a sector-aligned `offset`.
pub fn write_region<F: FlashAccess>(
    flash: &mut F,
    offset: u32,
    data: &[u8],
    sector_size: u32,
) -> Result<()> {
    check_bounds(flash.size(), offset, data.len())?;
    if offset % sector_size != 0 {
        return Err(Error::InvalidParameter);
    }

    let sector = sector_size as usize;
    let mut pos = 0usize;
    while pos < data.len() {
        let chunk = (data.len() - pos).min(sector);
        let at = offset + pos as u32;
        flash.erase_sector(at)?;
        flash.write(at, &data[pos..pos + chunk])?;
        pos += chunk;
    }
    Ok(())
}

/// Read the written range back and compare against `expected`.
pub fn verify_region<F: FlashAccess>(flash: &mut F, offset: u32, expected: &[u8]) -> Result<()> {
    check_bounds(flash.size(), offset, expected.len())?;

    let mut chunk = [0u8; IO_CHUNK];
    let mut pos = 0usize;
    while pos < expected.len() {
        let n = (expected.len() - pos).min(IO_CHUNK);
        flash.read(offset + pos as u32, &mut chunk[..n])?;
        if chunk[..n] != expected[pos..pos + n] {
            return Err(Error::VerifyMismatch);
        }
        pos += n;
    }
    Ok(())
}

/// Overwrite a whole region with zeros, one sector at a time.
pub fn zero_region<F: FlashAccess>(
    flash: &mut F,
    offset: u32,
    len: u32,
    sector_size: u32,
) -> Result<()> {
    check_bounds(flash.size(), offset, len as usize)?;
    if offset % sector_size != 0 || len % sector_size != 0 {
        return Err(Error::InvalidParameter);
    }

    let zeros = [0u8; IO_CHUNK];
    let mut sector = offset;
    while sector < offset + len {
        flash.erase_sector(sector)?;
        let mut pos = 0u32;
        while pos < sector_size {
            let n = ((sector_size - pos) as usize).min(IO_CHUNK);
            flash.write(sector + pos, &zeros[..n])?;
            pos += n as u32;
        }
        sector += sector_size;
    }
    Ok(())
}
