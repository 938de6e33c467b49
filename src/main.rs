// main.rs      gif2bmp command
//
// Copyright (c) 2019-2025  Douglas Lau
//
#![forbid(unsafe_code)]

use clap::{App, Arg, ArgMatches};
use gif2bmp::{ConversionStats, Decoder, Termination};
use std::error::Error;
use std::fs::File;
use std::io::{self, Read, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &str = std::env!("CARGO_PKG_VERSION");

/// Main entry point
fn main() {
    env_logger::builder().format_timestamp(None).init();
    let matches = create_app().get_matches();
    if let Err(e) = convert(&matches) {
        let mut err = StandardStream::stderr(ColorChoice::Auto);
        let mut red = ColorSpec::new();
        red.set_fg(Some(Color::Red)).set_intense(true);
        let _ = err.set_color(&red);
        let _ = writeln!(err, "gif2bmp: {}", e);
        let _ = err.reset();
        std::process::exit(1);
    }
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("gif2bmp")
        .version(VERSION)
        .about("Convert a GIF89a image to a 24-bit BMP")
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .takes_value(true)
                .help("input GIF file (default: stdin)"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .help("output BMP file (default: stdout)"),
        )
        .arg(
            Arg::with_name("log")
                .short("l")
                .long("log")
                .takes_value(true)
                .help("log file for input / output sizes"),
        )
        .arg(
            Arg::with_name("strict")
                .long("strict")
                .help("fail on unsupported blocks"),
        )
        .arg(
            Arg::with_name("max-size")
                .long("max-size")
                .takes_value(true)
                .help("maximum image size, in bytes (default: no limit)"),
        )
}

/// Convert input to output, as specified by command-line arguments
fn convert(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let reader: Box<dyn Read> = match matches.value_of_os("input") {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin()),
    };
    let max_image_sz = match matches.value_of("max-size") {
        Some(sz) => Some(sz.parse::<usize>()?).filter(|sz| *sz > 0),
        None => None,
    };
    let dec = Decoder::new(reader)
        .strict(matches.is_present("strict"))
        .max_image_sz(max_image_sz);
    // convert before creating the output file
    let mut bmp = Vec::new();
    let stats = dec.convert(&mut bmp)?;
    match matches.value_of_os("output") {
        Some(path) => File::create(path)?.write_all(&bmp)?,
        None => {
            let mut out = io::stdout();
            out.write_all(&bmp)?;
            out.flush()?;
        }
    }
    if stats.termination() != Termination::Trailer {
        log::warn!("partial image: {:?}", stats.termination());
    }
    if let Some(path) = matches.value_of_os("log") {
        write_log(File::create(path)?, &stats)?;
    }
    Ok(())
}

/// Write conversion sizes to a log
fn write_log<W: Write>(mut w: W, stats: &ConversionStats) -> io::Result<()> {
    writeln!(w, "uncodedSize = {}", stats.decoded_byte_size())?;
    writeln!(w, "codedSize = {}", stats.encoded_byte_size())?;
    w.flush()
}
