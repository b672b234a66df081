/*
 * Copyright (c) 2024.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use std::ffi::OsString;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use clap::ArgMatches;
use log::{debug, info};
use zune_deflate::errors::{DeflateEncodeErrors, InflateDecodeErrors};
use zune_deflate::{DeflateDecoder, DeflateEncodeOptions, DeflateEncoder, DeflateEncodingStrategy};

use crate::progress::Progress;

/// Anything that stops a run, rendered as one line on stderr.
pub enum CliError {
    Io(std::io::Error),
    Decode(InflateDecodeErrors),
    Encode(DeflateEncodeErrors)
}

impl Debug for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(error) => write!(f, "{error}"),
            CliError::Decode(error) => write!(f, "{}", format!("{error:?}").trim_end()),
            CliError::Encode(error) => write!(f, "{}", format!("{error:?}").trim_end())
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        CliError::Io(error)
    }
}

impl From<InflateDecodeErrors> for CliError {
    fn from(error: InflateDecodeErrors) -> Self {
        CliError::Decode(error)
    }
}

impl From<DeflateEncodeErrors> for CliError {
    fn from(error: DeflateEncodeErrors) -> Self {
        CliError::Encode(error)
    }
}

/// Run one compression or decompression job described by the
/// command line.
pub fn run(options: &ArgMatches) -> Result<(), CliError> {
    let decompress = options.get_flag("decompress");
    let progress = Progress::new(options.get_flag("progress"));

    let file = options
        .get_one::<OsString>("file")
        .filter(|name| name.as_os_str() != "-");

    match file {
        None => run_stdio(options, decompress, &progress),
        Some(file) => run_file(options, decompress, &progress, Path::new(file))
    }
}

fn strategy_from_args(options: &ArgMatches) -> DeflateEncodingStrategy {
    if options.get_flag("zero") {
        DeflateEncodingStrategy::NoCompression
    } else if options.get_flag("fast") {
        DeflateEncodingStrategy::Fast
    } else {
        DeflateEncodingStrategy::Best
    }
}

/// Standard input to standard output, no files touched.
fn run_stdio(
    options: &ArgMatches, decompress: bool, progress: &Progress
) -> Result<(), CliError> {
    let mut input = Vec::new();

    progress.stage("reading", 0);
    std::io::stdin().lock().read_to_end(&mut input)?;

    let output = if decompress {
        decode(&input, progress)?
    } else {
        let encode_options = DeflateEncodeOptions::default().set_strategy(strategy_from_args(options));

        encode(&input, encode_options, progress)?
    };

    progress.stage("writing", 90);

    let stdout = std::io::stdout();
    let mut lock = stdout.lock();

    lock.write_all(&output)?;
    lock.flush()?;
    progress.done();

    Ok(())
}

fn run_file(
    options: &ArgMatches, decompress: bool, progress: &Progress, path: &Path
) -> Result<(), CliError> {
    let to_stdout = options.get_flag("stdout");
    let keep = options.get_flag("keep") || to_stdout;

    progress.stage("reading", 0);

    let input = fs::read(path)?;

    info!("read {} bytes from {}", input.len(), path.display());

    let output = if decompress {
        decode(&input, progress)?
    } else {
        let mut encode_options = DeflateEncodeOptions::default()
            .set_strategy(strategy_from_args(options))
            .set_mtime(file_mtime(path));

        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            encode_options = encode_options.set_filename(name.to_string());
        }
        encode(&input, encode_options, progress)?
    };

    progress.stage("writing", 90);

    let mut replaced_input = false;

    if to_stdout {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();

        lock.write_all(&output)?;
        lock.flush()?;
    } else if decompress {
        replaced_input = write_decompressed(path, &output)?;
    } else {
        let target = compressed_name(path);

        fs::write(&target, &output)?;
        info!("wrote {} bytes to {}", output.len(), target.display());
    }

    if !keep && !replaced_input {
        fs::remove_file(path)?;
        debug!("removed {}", path.display());
    }
    progress.done();

    Ok(())
}

fn encode(
    input: &[u8], options: DeflateEncodeOptions, progress: &Progress
) -> Result<Vec<u8>, CliError> {
    progress.stage("compressing", 30);

    let mut encoder = DeflateEncoder::new_with_options(input, options);

    Ok(encoder.encode_gzip()?)
}

fn decode(input: &[u8], progress: &Progress) -> Result<Vec<u8>, CliError> {
    progress.stage("decompressing", 30);

    let mut decoder = DeflateDecoder::new(input);

    Ok(decoder.decode_gzip()?)
}

/// `<input>.gz`, keeping any existing extension.
fn compressed_name(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();

    name.push(".gz");
    PathBuf::from(name)
}

/// Strip a `.gz` suffix; inputs without one are overwritten in place
/// through a temporary sibling so a failed write never clobbers them.
///
/// Returns whether the input itself was replaced.
fn write_decompressed(path: &Path, output: &[u8]) -> Result<bool, CliError> {
    if path.extension().is_some_and(|ext| ext == "gz") {
        let target = path.with_extension("");

        fs::write(&target, output)?;
        info!("wrote {} bytes to {}", output.len(), target.display());

        return Ok(false);
    }

    let mut temp_name = path.as_os_str().to_owned();

    temp_name.push(".zune-tmp");

    let temp = PathBuf::from(temp_name);

    fs::write(&temp, output)?;
    fs::rename(&temp, path)?;
    info!("wrote {} bytes over {}", output.len(), path.display());

    Ok(true)
}

/// Seconds since the epoch of the file's mtime, 0 when unavailable.
fn file_mtime(path: &Path) -> u32 {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |duration| duration.as_secs() as u32)
}
