use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::fs;
use std::path::PathBuf;

use game_codecs::{
    compress_crilayla, compress_lz10, compress_lz11, compress_racjin, decompress_crilayla,
    decompress_lz10, decompress_lz11, decompress_racjin, decompress_rle,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file as a CRILAYLA container
    CompressCrilayla { input: PathBuf, output: PathBuf },
    /// Decompress a CRILAYLA container
    DecompressCrilayla { input: PathBuf, output: PathBuf },
    /// Compress a file as an LZ10 stream
    CompressLz10 {
        input: PathBuf,
        output: PathBuf,
        /// Minimum back-reference displacement to consider
        #[arg(long, default_value_t = 1)]
        min_disp: usize,
    },
    /// Decompress an LZ10 stream
    DecompressLz10 {
        input: PathBuf,
        output: PathBuf,
        /// Declared size of the decompressed output
        decomp_length: usize,
        /// Constant added to every decoded displacement
        #[arg(long, default_value_t = 0)]
        disp_extra: i32,
    },
    /// Compress a file as an LZ11 stream
    CompressLz11 {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value_t = 1)]
        min_disp: usize,
    },
    /// Decompress an LZ11 stream
    DecompressLz11 {
        input: PathBuf,
        output: PathBuf,
        decomp_length: usize,
        #[arg(long, default_value_t = 0)]
        disp_extra: i32,
    },
    /// Decompress an RLE stream
    DecompressRle {
        input: PathBuf,
        output: PathBuf,
        decomp_length: usize,
    },
    /// Compress a file as a RACJIN stream
    CompressRacjin { input: PathBuf, output: PathBuf },
    /// Decompress a RACJIN stream
    DecompressRacjin {
        input: PathBuf,
        output: PathBuf,
        decomp_length: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    println!("game-codecs\n");

    let cli = Cli::parse();

    match &cli.command {
        Commands::CompressCrilayla { input, output } => {
            info!("Compressing {} as CRILAYLA", input.display());
            let src = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
            let out = compress_crilayla(&src)?;
            fs::write(output, out).with_context(|| format!("writing {}", output.display()))?;
        }
        Commands::DecompressCrilayla { input, output } => {
            info!("Decompressing {} as CRILAYLA", input.display());
            let src = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
            let out = decompress_crilayla(&src)?;
            fs::write(output, out).with_context(|| format!("writing {}", output.display()))?;
        }
        Commands::CompressLz10 {
            input,
            output,
            min_disp,
        } => {
            info!("Compressing {} as LZ10 (min_disp={min_disp})", input.display());
            let src = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
            let out = compress_lz10(&src, *min_disp);
            fs::write(output, out).with_context(|| format!("writing {}", output.display()))?;
        }
        Commands::DecompressLz10 {
            input,
            output,
            decomp_length,
            disp_extra,
        } => {
            info!("Decompressing {} as LZ10 (decomp_length={decomp_length})", input.display());
            let src = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
            let out = decompress_lz10(&src, *decomp_length, *disp_extra)?;
            fs::write(output, out).with_context(|| format!("writing {}", output.display()))?;
        }
        Commands::CompressLz11 {
            input,
            output,
            min_disp,
        } => {
            info!("Compressing {} as LZ11 (min_disp={min_disp})", input.display());
            let src = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
            let out = compress_lz11(&src, *min_disp);
            fs::write(output, out).with_context(|| format!("writing {}", output.display()))?;
        }
        Commands::DecompressLz11 {
            input,
            output,
            decomp_length,
            disp_extra,
        } => {
            info!("Decompressing {} as LZ11 (decomp_length={decomp_length})", input.display());
            let src = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
            let out = decompress_lz11(&src, *decomp_length, *disp_extra)?;
            fs::write(output, out).with_context(|| format!("writing {}", output.display()))?;
        }
        Commands::DecompressRle {
            input,
            output,
            decomp_length,
        } => {
            info!("Decompressing {} as RLE (decomp_length={decomp_length})", input.display());
            let src = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
            let out = decompress_rle(&src, *decomp_length)?;
            fs::write(output, out).with_context(|| format!("writing {}", output.display()))?;
        }
        Commands::CompressRacjin { input, output } => {
            info!("Compressing {} as RACJIN", input.display());
            let src = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
            let out = compress_racjin(&src);
            fs::write(output, out).with_context(|| format!("writing {}", output.display()))?;
        }
        Commands::DecompressRacjin {
            input,
            output,
            decomp_length,
        } => {
            info!("Decompressing {} as RACJIN (decomp_length={decomp_length})", input.display());
            let src = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
            let out = decompress_racjin(&src, *decomp_length)?;
            fs::write(output, out).with_context(|| format!("writing {}", output.display()))?;
        }
    }

    Ok(())
}
