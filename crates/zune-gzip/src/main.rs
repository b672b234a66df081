/*
 * Copyright (c) 2024.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use std::process::exit;

use clap::error::ErrorKind;
use log::error;

mod cmd_args;
mod file_io;
mod progress;

fn main() {
    let cmd = cmd_args::create_cmd_args();

    let options = match cmd.try_get_matches() {
        Ok(matches) => matches,
        Err(error)
            if matches!(
                error.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            let _ = error.print();
            exit(0);
        }
        Err(error) => {
            // one line naming the condition, the rest is noise here
            let rendered = error.render().to_string();
            let line = rendered.lines().next().unwrap_or("invalid arguments");

            eprintln!("zune-gzip: {line}");
            exit(1);
        }
    };

    cmd_args::setup_logger(&options);

    if let Err(error) = file_io::run(&options) {
        error!("could not complete the operation, reason: {error:?}");
        exit(1);
    }
}
