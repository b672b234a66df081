/*
 * Copyright (c) 2024.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use std::ffi::OsString;

use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use log::{info, Level};

const AFTER_HELP: &str = "\
With no FILE, or when FILE is `-`, data moves between standard input \
and standard output. Compressing FILE writes FILE.gz and removes FILE \
unless --keep or --stdout is given; decompressing reverses that.";

pub fn create_cmd_args() -> Command {
    Command::new("zune-gzip")
        .author("Caleb Etemesi")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compress or decompress files in the gzip format")
        .after_help(AFTER_HELP)
        .next_line_help(false)
        .arg(
            Arg::new("file")
                .help("File to operate on, `-` or absent selects standard input")
                .value_parser(value_parser!(OsString))
        )
        .arg(
            Arg::new("stdout")
                .short('c')
                .long("stdout")
                .help("Write to standard output, do not touch input files")
                .action(ArgAction::SetTrue)
        )
        .arg(
            Arg::new("decompress")
                .short('d')
                .long("decompress")
                .help("Decompress instead of compress")
                .action(ArgAction::SetTrue)
        )
        .arg(
            Arg::new("keep")
                .short('k')
                .long("keep")
                .help("Do not delete the input file on success")
                .action(ArgAction::SetTrue)
        )
        .arg(
            Arg::new("progress")
                .short('p')
                .long("progress")
                .help("Render a progress indicator on standard error")
                .action(ArgAction::SetTrue)
        )
        .args(add_level_options())
        .group(
            ArgGroup::new("level")
                .args(["zero", "fast", "best"])
                .multiple(false)
        )
        .args(add_logging_options())
}

fn add_level_options() -> [Arg; 3] {
    const HELP_HEADING: &str = "Compression level";

    [
        Arg::new("zero")
            .short('0')
            .long("zero")
            .help_heading(HELP_HEADING)
            .help("Store without compressing")
            .action(ArgAction::SetTrue),
        Arg::new("fast")
            .short('1')
            .long("fast")
            .help_heading(HELP_HEADING)
            .help("Compress faster, using the fixed Huffman code")
            .action(ArgAction::SetTrue),
        Arg::new("best")
            .short('9')
            .long("best")
            .help_heading(HELP_HEADING)
            .help("Compress smaller, choosing block encodings by size [default]")
            .action(ArgAction::SetTrue)
    ]
}

fn add_logging_options() -> [Arg; 1] {
    [Arg::new("verbose")
        .short('v')
        .long("verbose")
        .help_heading("Logging")
        .help("Display debug information and higher")
        .action(ArgAction::SetTrue)]
}

/// Set up logging options
pub fn setup_logger(options: &ArgMatches) {
    let log_level = if *options.get_one::<bool>("verbose").unwrap() {
        Level::Debug
    } else {
        Level::Warn
    };

    simple_logger::init_with_level(log_level).unwrap();

    info!("Initialized logger");
    info!("Log level :{}", log_level);
}
