/*
 * Copyright (c) 2024.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use std::io::Write;

/// A carriage-return refreshed stage line on standard error.
///
/// Stays quiet unless the user asked for it, so logs and pipes are
/// never polluted by default.
pub struct Progress {
    enabled: bool
}

impl Progress {
    pub fn new(enabled: bool) -> Progress {
        Progress { enabled }
    }

    pub fn stage(&self, label: &str, percent: u8) {
        if self.enabled {
            eprint!("\r{label}... {percent}%   ");
            let _ = std::io::stderr().flush();
        }
    }

    pub fn done(&self) {
        if self.enabled {
            eprintln!("\rdone. 100%      ");
        }
    }
}
