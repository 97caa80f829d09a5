use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use codec_harness::{BenchSession, CodecKind, CodecOptions, HarnessConfig, VerificationStatus};

#[derive(Parser)]
#[command(name = "codec-harness", about = "Compare streaming compression codecs across levels")]
struct Cli {
    /// Corpus file compressed by every cell
    #[arg(long, env = "CODEC_HARNESS_CORPUS", default_value = codec_harness::DEFAULT_CORPUS_PATH)]
    corpus: PathBuf,

    /// Codec to include (repeatable; defaults to all)
    #[arg(long = "codec", value_enum)]
    codecs: Vec<CodecKind>,

    /// Compression level to include (repeatable; defaults to 1..=9)
    #[arg(long = "level")]
    levels: Vec<u32>,

    /// Run cells on all cores
    #[arg(long)]
    parallel: bool,

    /// Emit raw deflate instead of zlib-wrapped deflate
    #[arg(long)]
    raw_deflate: bool,

    /// File name to embed in gzip-multi headers
    #[arg(long)]
    gzip_filename: Option<String>,

    /// Bytes compressed output may exceed the corpus by before it is flagged
    #[arg(long, default_value_t = 128)]
    overhead_allowance: usize,

    /// Bytes handed to each compressor write
    #[arg(long, default_value_t = codec_harness::codec::DEFAULT_WRITE_CHUNK)]
    write_chunk: usize,

    /// Bytes requested by each decompressor read
    #[arg(long, default_value_t = codec_harness::codec::DEFAULT_READ_CHUNK)]
    read_chunk: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute every compress and decompress cell once
    Run {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Skip round-trip verification
        #[arg(long)]
        no_verify: bool,

        /// Only measure compression
        #[arg(long, conflicts_with = "decompress_only")]
        compress_only: bool,

        /// Only measure decompression
        #[arg(long)]
        decompress_only: bool,
    },
    /// Compressed size of the corpus per codec and level
    Sizes,
    /// Round-trip the corpus through every codec and level
    Verify,
}

fn harness_config(cli: &Cli) -> HarnessConfig {
    let mut config = HarnessConfig {
        corpus_path: cli.corpus.clone(),
        parallel: cli.parallel,
        size_overhead_allowance: cli.overhead_allowance,
        read_chunk_size: cli.read_chunk,
        write_chunk_size: cli.write_chunk,
        options: CodecOptions {
            deflate_zlib_header: !cli.raw_deflate,
            gzip_filename: cli.gzip_filename.clone(),
        },
        ..Default::default()
    };
    if !cli.codecs.is_empty() {
        config.codecs = cli.codecs.clone();
    }
    if !cli.levels.is_empty() {
        config.levels = cli.levels.clone();
    }
    config
}

fn print_survey(session: &BenchSession) -> bool {
    println!("{:<11} {:>5} {:>10} {:>8} {:>8} {:>8}", "Codec", "Level", "Size", "Length", "Bytes", "Text");
    let mut clean = true;
    for outcome in session.size_survey() {
        match &outcome.status {
            VerificationStatus::Error { cause } => {
                clean = false;
                println!("{:<11} {:>5} ERROR: {cause}", outcome.codec.name(), outcome.level);
            }
            VerificationStatus::Passed { result } | VerificationStatus::Mismatch { result, .. } => {
                clean &= outcome.passed();
                println!(
                    "{:<11} {:>5} {:>10} {:>8} {:>8} {:>8}",
                    outcome.codec.name(),
                    outcome.level,
                    result.compressed_len,
                    result.length_match,
                    result.bytes_match,
                    result.text_match
                );
            }
        }
        if let VerificationStatus::Mismatch { failure, .. } = &outcome.status {
            eprintln!("{failure}");
        }
    }
    clean
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = harness_config(&cli);

    match cli.command {
        Commands::Run {
            json,
            no_verify,
            compress_only,
            decompress_only,
        } => {
            config.verify = !no_verify;
            config.measure_compression = !decompress_only;
            config.measure_decompression = !compress_only;
            let report = BenchSession::setup(config)?.finish();
            report.write_to(std::io::stdout().lock(), json)?;
            Ok(if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Sizes => {
            config.measure_decompression = false;
            let session = BenchSession::setup(config)?;
            println!("Corpus: {} bytes", session.corpus().len());
            print_survey(&session);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify => {
            config.measure_decompression = false;
            let session = BenchSession::setup(config)?;
            let clean = print_survey(&session);
            Ok(if clean { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}
