use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use tensorpack_codecs::frame::default_workers;
use tensorpack_codecs::{codec_by_method, FrameConfig, HalfWidthCodec, LosslessCodec, QuantizedCodec};
use tensorpack_core::{Family, Header, Method, Reader, TensorCodec, Writer};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "tensorpack",
    about = "Compress and restore float32 tensor archives (quantized, half-width, or lossless)",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lossy compression: 8-bit quantization by default
    Compress {
        /// Source tensor archive
        input: PathBuf,
        /// Destination compressed file
        output: PathBuf,
        /// Store float16 values instead of 8-bit codes (less lossy, larger)
        #[arg(long)]
        float16: bool,
    },
    /// Restore an archive written by `compress`
    Decompress {
        /// Source compressed file
        input: PathBuf,
        /// Destination tensor archive
        output: PathBuf,
    },
    /// Bit-exact compression: XOR residuals in one multi-threaded zstd frame
    CompressLossless {
        /// Source tensor archive
        input: PathBuf,
        /// Destination compressed file
        output: PathBuf,
        /// Zstd compression level (1–22)
        #[arg(long, default_value_t = 10)]
        level: i32,
        /// Zstd worker threads (default: available cores)
        #[arg(long)]
        workers: Option<u32>,
        /// Disable long-distance matching
        #[arg(long)]
        no_long_distance: bool,
    },
    /// Restore an archive written by `compress-lossless`
    DecompressLossless {
        /// Source compressed file
        input: PathBuf,
        /// Destination tensor archive
        output: PathBuf,
    },
    /// Print header fields of a compressed file
    Inspect {
        /// Compressed file to inspect
        file: PathBuf,
        /// Treat the file as a `compress-lossless` output
        #[arg(long)]
        lossless: bool,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading input file {:?}", path))
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing output file {:?}", path))
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_compress(input: PathBuf, output: PathBuf, codec: Box<dyn TensorCodec>) -> anyhow::Result<()> {
    let raw = read_input(&input)?;
    let codec_display = codec.name();

    let t0 = Instant::now();
    let packed = Writer::new(codec)
        .compress(&raw)
        .with_context(|| format!("compressing {:?}", input))?;
    let elapsed = t0.elapsed();

    write_output(&output, &packed)?;

    let ratio = raw.len() as f64 / packed.len() as f64;
    eprintln!("  method      : {}", codec_display);
    eprintln!("  raw size    : {}", human_bytes(raw.len() as u64));
    eprintln!("  compressed  : {}", human_bytes(packed.len() as u64));
    eprintln!("  ratio       : {:.2}x", ratio);
    eprintln!(
        "  throughput  : {}/s",
        human_bytes((raw.len() as f64 / elapsed.as_secs_f64()) as u64)
    );
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_decompress(input: PathBuf, output: PathBuf, family: Family) -> anyhow::Result<()> {
    let packed = read_input(&input)?;

    let t0 = Instant::now();
    let method = Reader::peek_method(&packed, family)
        .with_context(|| format!("reading header of {:?}", input))?;
    let codec = codec_by_method(method);
    let reader = Reader::open(&packed, codec.as_ref())
        .with_context(|| format!("opening {:?}", input))?;
    let raw = reader
        .decompress()
        .with_context(|| format!("decompressing {:?}", input))?;
    let elapsed = t0.elapsed();

    write_output(&output, &raw)?;

    eprintln!("  method      : {}", method);
    eprintln!("  raw size    : {}", human_bytes(raw.len() as u64));
    eprintln!(
        "  throughput  : {}/s",
        human_bytes((raw.len() as f64 / elapsed.as_secs_f64()) as u64)
    );
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_inspect(file: PathBuf, lossless: bool) -> anyhow::Result<()> {
    let packed = read_input(&file)?;
    let family = if lossless { Family::Lossless } else { Family::Lossy };
    let codec = codec_by_method(Reader::peek_method(&packed, family)?);
    let reader = Reader::open(&packed, codec.as_ref())?;

    println!("=== tensorpack file: {:?} ===", file);
    println!();
    println!("  method         : {}", reader.method());
    println!("  elements       : {}", reader.header.element_count());
    println!("  metadata block : {}", human_bytes(reader.metadata().len() as u64));
    println!("  payload        : {}", human_bytes(reader.payload().len() as u64));
    println!("  original size  : {}", human_bytes(reader.original_size()));
    println!("  file on disk   : {}", human_bytes(reader.compressed_size()));
    println!("  ratio          : {:.2}x", reader.ratio());

    match &reader.header {
        Header::Lossy(h) if h.method == Method::Quantized => {
            println!("  range          : [{}, {}]", h.range.min, h.range.max);
        }
        Header::Lossy(_) => {}
        Header::Lossless(h) => {
            println!("  blocks         : {}", h.block_count);
        }
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compress {
            input,
            output,
            float16,
        } => {
            let codec: Box<dyn TensorCodec> = if float16 {
                Box::new(HalfWidthCodec)
            } else {
                Box::new(QuantizedCodec)
            };
            run_compress(input, output, codec)
        }
        Commands::Decompress { input, output } => run_decompress(input, output, Family::Lossy),
        Commands::CompressLossless {
            input,
            output,
            level,
            workers,
            no_long_distance,
        } => {
            let config = FrameConfig {
                level,
                workers: workers.unwrap_or_else(default_workers),
                long_distance: !no_long_distance,
                ..FrameConfig::default()
            };
            log::debug!("lossless frame config: {:?}", config);
            run_compress(input, output, Box::new(LosslessCodec::new(config)))
        }
        Commands::DecompressLossless { input, output } => {
            run_decompress(input, output, Family::Lossless)
        }
        Commands::Inspect { file, lossless } => run_inspect(file, lossless),
    }
}
