//! qrgen - encode text into QR codes from the command line
//!
//! Prints the symbol to the terminal, or writes SVG/PNG files.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use qrsmith::helper::{save_png, to_console_string, to_svg_string};
use qrsmith::planner::make_segments_optimally;
use qrsmith::{EncodeOptions, Mask, QrCode, QrCodeEcc, QrSegment, Version};

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let matches = Command::new("qrgen")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Encode text into QR Code Model 2 symbols")
        .arg_required_else_help(true)
        .arg(Arg::new("text").help("Text to encode").required(true).index(1))
        .arg(
            Arg::new("ecc")
                .short('e')
                .long("ecc")
                .help("Minimum error correction level")
                .value_parser(["low", "medium", "quartile", "high"])
                .default_value("low"),
        )
        .arg(
            Arg::new("min_version")
                .long("min-version")
                .help("Smallest version to consider (1-40)")
                .value_name("VERSION")
                .value_parser(value_parser!(u8))
                .default_value("1"),
        )
        .arg(
            Arg::new("max_version")
                .long("max-version")
                .help("Largest version to consider (1-40)")
                .value_name("VERSION")
                .value_parser(value_parser!(u8))
                .default_value("40"),
        )
        .arg(
            Arg::new("mask")
                .short('m')
                .long("mask")
                .help("Mask pattern 0-7, or -1 for automatic selection")
                .value_parser(value_parser!(i32))
                .allow_negative_numbers(true)
                .default_value("-1"),
        )
        .arg(
            Arg::new("no_boost")
                .long("no-boost")
                .help("Keep the requested error correction level even if a higher one fits")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("optimal")
                .long("optimal")
                .help("Mix numeric, alphanumeric and byte segments for the shortest encoding")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("multi")
                .long("multi")
                .help("Split long text across up to 16 structured append symbols")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("symbol_version")
                .long("symbol-version")
                .help("Fixed version of every symbol with --multi")
                .value_name("VERSION")
                .value_parser(value_parser!(u8))
                .requires("multi"),
        )
        .arg(
            Arg::new("border")
                .short('b')
                .long("border")
                .help("Light border width in modules")
                .value_parser(value_parser!(i32))
                .default_value("4"),
        )
        .arg(
            Arg::new("scale")
                .short('s')
                .long("scale")
                .help("Pixels per module for PNG output")
                .value_parser(value_parser!(i32))
                .default_value("8"),
        )
        .arg(
            Arg::new("svg")
                .long("svg")
                .help("Write an SVG file")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("png")
                .long("png")
                .help("Write a PNG file")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf)),
        )
        .get_matches();

    let text = matches
        .get_one::<String>("text")
        .context("Missing text argument")?;
    let ecl = match matches.get_one::<String>("ecc").map(String::as_str) {
        Some("medium") => QrCodeEcc::Medium,
        Some("quartile") => QrCodeEcc::Quartile,
        Some("high") => QrCodeEcc::High,
        _ => QrCodeEcc::Low,
    };
    let boost = !matches.get_flag("no_boost");
    let border = *matches.get_one::<i32>("border").unwrap_or(&4);
    let scale = *matches.get_one::<i32>("scale").unwrap_or(&8);

    let symbols: Vec<QrCode> = if matches.get_flag("multi") {
        let version = matches
            .get_one::<u8>("symbol_version")
            .map(|&v| Version::new(v))
            .transpose()?;
        QrCode::encode_text_in_multiple_symbols(text, ecl, version, boost)?
    } else {
        let minversion = Version::new(*matches.get_one::<u8>("min_version").unwrap_or(&1))?;
        let maxversion = Version::new(*matches.get_one::<u8>("max_version").unwrap_or(&40))?;
        let mask = Mask::from_index(*matches.get_one::<i32>("mask").unwrap_or(&-1))?;
        let options = EncodeOptions::new()
            .ecl(ecl)
            .version_range(minversion, maxversion)?
            .mask(mask)
            .boost_ecl(boost);
        let segs = if matches.get_flag("optimal") {
            make_segments_optimally(text, ecl, minversion, maxversion)?
        } else {
            QrSegment::make_segments(text)
        };
        vec![QrCode::encode_segments_with(&segs, &options)?]
    };

    let svg_path = matches.get_one::<PathBuf>("svg");
    let png_path = matches.get_one::<PathBuf>("png");
    if symbols.len() > 1 && (svg_path.is_some() || png_path.is_some()) {
        info!("Writing {} symbols with numbered file names", symbols.len());
    }

    for (i, qr) in symbols.iter().enumerate() {
        info!(
            "Symbol {}/{}: version {}, error correction {:?}, mask {}",
            i + 1,
            symbols.len(),
            qr.version().value(),
            qr.error_correction_level(),
            qr.mask().value()
        );
        if let Some(path) = svg_path {
            let path = numbered(path, i, symbols.len());
            let svg = to_svg_string(qr, border, "#000000", "#FFFFFF")?;
            fs::write(&path, svg).with_context(|| format!("Failed to write {}", path.display()))?;
        }
        if let Some(path) = png_path {
            let path = numbered(path, i, symbols.len());
            save_png(qr, &path, border, scale).with_context(|| format!("Failed to write {}", path.display()))?;
        }
        if svg_path.is_none() && png_path.is_none() {
            print!("{}", to_console_string(qr, border)?);
            println!();
        }
    }
    Ok(())
}

/// `out.png` becomes `out-1.png`, `out-2.png`, ... when there is more than one symbol.
fn numbered(path: &Path, index: usize, count: usize) -> PathBuf {
    if count <= 1 {
        return path.to_path_buf();
    }
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}-{}.{}", index + 1, ext.to_string_lossy()),
        None => format!("{stem}-{}", index + 1),
    };
    path.with_file_name(name)
}
