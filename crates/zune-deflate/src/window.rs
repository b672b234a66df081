/*
 * Copyright (c) 2024.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A ring over the last 32 KiB of uncompressed output.
//!
//! Back-references address this window by backward distance from the
//! write cursor. Matches may overlap their own output, so expansion
//! interleaves a read and a push one byte at a time.

use alloc::vec;
use alloc::vec::Vec;

use crate::constants::DEFLATE_WINDOW_SIZE;
use crate::errors::DecodeErrorStatus;

const WINDOW_MASK: usize = DEFLATE_WINDOW_SIZE - 1;

pub(crate) struct SlidingWindow {
    buf:       Vec<u8>,
    cursor:    usize,
    occupancy: usize
}

impl SlidingWindow {
    pub fn new() -> SlidingWindow {
        SlidingWindow {
            buf:       vec![0; DEFLATE_WINDOW_SIZE],
            cursor:    0,
            occupancy: 0
        }
    }

    /// Append one output byte, evicting the oldest once full.
    #[inline(always)]
    pub fn push(&mut self, byte: u8) {
        self.buf[self.cursor] = byte;
        self.cursor = (self.cursor + 1) & WINDOW_MASK;

        if self.occupancy < DEFLATE_WINDOW_SIZE {
            self.occupancy += 1;
        }
    }

    /// Read the byte `distance` positions behind the write cursor.
    #[inline(always)]
    pub fn read_back(&self, distance: usize) -> Result<u8, DecodeErrorStatus> {
        if distance == 0 || distance > self.occupancy {
            return Err(DecodeErrorStatus::InvalidDistance(distance, self.occupancy));
        }

        let index = (self.cursor + DEFLATE_WINDOW_SIZE - distance) & WINDOW_MASK;

        Ok(self.buf[index])
    }

    /// Expand a `(length, distance)` back-reference into `out`.
    ///
    /// Each byte is pushed into the window before the next read so
    /// that matches with `length > distance` replicate correctly.
    pub fn copy_match(
        &mut self, distance: usize, length: usize, out: &mut Vec<u8>
    ) -> Result<(), DecodeErrorStatus> {
        for _ in 0..length {
            let byte = self.read_back(distance)?;

            out.push(byte);
            self.push(byte);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::SlidingWindow;
    use crate::constants::DEFLATE_WINDOW_SIZE;

    #[test]
    fn read_back_addresses_recent_bytes() {
        let mut window = SlidingWindow::new();

        for byte in b"abcdef" {
            window.push(*byte);
        }
        assert_eq!(window.read_back(1).unwrap(), b'f');
        assert_eq!(window.read_back(6).unwrap(), b'a');
        assert!(window.read_back(7).is_err());
        assert!(window.read_back(0).is_err());
    }

    #[test]
    fn ring_wraps_after_window_size() {
        let mut window = SlidingWindow::new();
        let total = DEFLATE_WINDOW_SIZE + 1000;

        for i in 0..total {
            window.push((i % 251) as u8);
        }

        // s[|s| - d] for a handful of distances
        for distance in [1, 2, 255, 32_767, 32_768] {
            let expected = ((total - distance) % 251) as u8;

            assert_eq!(window.read_back(distance).unwrap(), expected);
        }
        assert!(window.read_back(DEFLATE_WINDOW_SIZE + 1).is_err());
    }

    #[test]
    fn overlapping_match_replicates() {
        let mut window = SlidingWindow::new();
        let mut out = Vec::new();

        window.push(b'a');
        window.copy_match(1, 5, &mut out).unwrap();

        assert_eq!(out, b"aaaaa");
        assert_eq!(window.read_back(1).unwrap(), b'a');
    }
}
