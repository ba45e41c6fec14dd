//! OxiZX0 CLI - Optimal ZX0 compression
//!
//! A Pure Rust compressor and decompressor for the ZX0 format, bit-exact
//! with the v2 and classic (v1) stream variants.

mod utils;

use clap::Parser;
use oxizx0::{Zx0Config, Zx0Decoder, Zx0Encoder};
use std::path::PathBuf;
use utils::{compressed_name, create_progress_bar, decompressed_name};

#[derive(Parser)]
#[command(name = "oxizx0")]
#[command(author, version, about = "Optimal ZX0 compressor - Pure Rust")]
#[command(long_about = "
OxiZX0 compresses files into the ZX0 format using an optimal parser, so the
output is the smallest stream the format can express. Decompression and the
classic (v1), backwards and quick variants are supported.

Examples:
  oxizx0 image.scr
  oxizx0 -d image.scr.zx0
  oxizx0 -b -c loader.bin loader.zx0
  oxizx0 -q -p 8 bigfile.bin
  oxizx0 -s 128 banked.bin
")]
struct Cli {
    /// Decompress instead of compress
    #[arg(short, long)]
    decompress: bool,

    /// Overwrite the output file if it already exists
    #[arg(short, long)]
    force: bool,

    /// Use the classic (v1) file format
    #[arg(short, long)]
    classic: bool,

    /// Compress or decompress backwards
    #[arg(short, long)]
    backwards: bool,

    /// Quick mode: restrict match offsets to the short (ZX7) range
    #[arg(short, long)]
    quick: bool,

    /// Number of parser threads
    #[arg(short = 'p', long, default_value_t = 4)]
    parallel: usize,

    /// Leading bytes copied through uncompressed (compression only)
    #[arg(short, long, default_value_t = 0)]
    skip: usize,

    /// Show a progress bar while parsing
    #[arg(short = 'P', long, default_value = "true")]
    progress: bool,

    /// Input file
    input: PathBuf,

    /// Output file (derived from the input name when omitted)
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let result = if cli.decompress {
        cmd_decompress(&cli)
    } else {
        cmd_compress(&cli)
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn config_from(cli: &Cli) -> Zx0Config {
    Zx0Config {
        backwards_mode: cli.backwards,
        classic_mode: cli.classic,
        quick_mode: cli.quick,
        skip: cli.skip,
        threads: cli.parallel,
    }
}

fn cmd_compress(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.parallel == 0 {
        return Err("thread count must be at least 1".into());
    }

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| compressed_name(&cli.input));
    if output_path.exists() && !cli.force {
        return Err(format!(
            "output file {} already exists (use -f to overwrite)",
            output_path.display()
        )
        .into());
    }

    let mut input = std::fs::read(&cli.input)?;
    let input_size = input.len();

    // Backwards streams are produced over the reversed input; the decoder
    // side mirrors this, so the format flags alone stay format-only.
    if cli.backwards {
        input.reverse();
    }

    let pb = create_progress_bar((input_size.saturating_sub(cli.skip)) as u64, cli.progress);
    pb.set_message("parsing");

    let encoder = Zx0Encoder::new(config_from(cli));
    let mut stream = encoder.encode_with_progress(&input, &mut |done, _| {
        pb.set_position(done as u64);
    })?;
    pb.finish_and_clear();

    if cli.backwards {
        stream.data.reverse();
    }

    std::fs::write(&output_path, &stream.data)?;

    println!(
        "File compressed from {} to {} bytes! (delta {})",
        input_size,
        stream.data.len(),
        stream.delta
    );
    Ok(())
}

fn cmd_decompress(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.skip > 0 {
        return Err("skip cannot be combined with decompression".into());
    }

    let output_path = match cli.output.clone() {
        Some(path) => path,
        None => decompressed_name(&cli.input).ok_or_else(|| {
            format!(
                "cannot derive an output name: {} has no .zx0 extension",
                cli.input.display()
            )
        })?,
    };
    if output_path.exists() && !cli.force {
        return Err(format!(
            "output file {} already exists (use -f to overwrite)",
            output_path.display()
        )
        .into());
    }

    let mut input = std::fs::read(&cli.input)?;
    let input_size = input.len();

    if cli.backwards {
        input.reverse();
    }

    let decoder = Zx0Decoder::new(config_from(cli));
    let mut output = decoder.decode(&input)?;

    if cli.backwards {
        output.reverse();
    }

    std::fs::write(&output_path, &output)?;

    println!(
        "File decompressed from {} to {} bytes!",
        input_size,
        output.len()
    );
    Ok(())
}
