//! PCM conversion plan inspector
//!
//! Prints the stage chain for a source/destination pair and, given raw
//! input, converts it. Specs are written `FORMAT:CHANNELS:RATE`, for
//! example `u8:1:8000` or `s16le:2:44100`.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pcmconv_core::{AudioConverter, AudioSpec, ConversionMode, ConverterConfig};
use tracing_subscriber::EnvFilter;

/// Inspect and run PCM conversions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source spec (FORMAT:CHANNELS:RATE)
    #[arg(short, long)]
    from: AudioSpec,

    /// Destination spec (FORMAT:CHANNELS:RATE)
    #[arg(short, long)]
    to: AudioSpec,

    /// Raw PCM input file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Raw PCM output file
    #[arg(short, long, requires = "input")]
    output: Option<PathBuf>,

    /// Convert the input as a stream of blocks of this many frames
    #[arg(short, long)]
    block: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mode = if args.block.is_some() {
        ConversionMode::Loop
    } else {
        ConversionMode::OneShot
    };
    let mut converter = AudioConverter::new(ConverterConfig::new().with_mode(mode));
    let plan = converter
        .build(&args.from, &args.to)
        .with_context(|| format!("cannot convert {} to {}", args.from, args.to))?;
    print!("{}", plan);
    let min_frames = plan.min_stream_frames();
    if let Some(frames) = args.block {
        if frames < min_frames {
            bail!("block of {} frames is below the minimum of {}", frames, min_frames);
        }
    }

    let Some(input_path) = &args.input else {
        return Ok(());
    };
    let input = fs::read(input_path)
        .with_context(|| format!("failed to read {}", input_path.display()))?;
    let frame = args.from.bytes_per_frame();
    if input.len() % frame != 0 {
        bail!(
            "input length {} is not a whole number of {}-byte frames",
            input.len(),
            frame
        );
    }

    let start = Instant::now();
    let output = match args.block {
        Some(frames) => {
            let frames = frames.max(1);
            let mut output = Vec::new();
            let mut rest = &input[..];
            while !rest.is_empty() {
                // a tail shorter than the minimum joins the current block
                let take = if rest.len() < (frames + min_frames) * frame {
                    rest.len()
                } else {
                    frames * frame
                };
                let (chunk, tail) = rest.split_at(take);
                output.extend_from_slice(&converter.convert_bytes(chunk)?);
                rest = tail;
            }
            output
        }
        None => converter.convert_bytes(&input)?,
    };
    let elapsed = start.elapsed();

    println!();
    println!("Input:  {} bytes ({} frames)", input.len(), input.len() / frame);
    println!(
        "Output: {} bytes ({} frames)",
        output.len(),
        output.len() / args.to.bytes_per_frame()
    );
    println!("Time:   {:?}", elapsed);

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        println!("Wrote {}", output_path.display());
    }

    Ok(())
}
