//! sndshim command line interface
//!
//! Copies the best audio stream of an input to a WAV or raw PCM output as
//! 44.1kHz stereo, or prints what the reader sees in an input.

use clap::{Parser, Subcommand};
use log::info;
use sndshim::core::StreamKind;
use sndshim::core::audio::SAMPLE_RATE;
use sndshim::{AudioResult, Reader, Writer, decoder, processor};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sndshim")]
#[command(about = "Copy audio between containers as 44.1kHz stereo float", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Input audio file
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output file; omitted or `-` writes to stdout
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Output format (wav, s16le, s32le, f32le, f64le); guessed from OUTPUT if omitted
    #[arg(short, long, value_name = "NAME")]
    format: Option<String>,

    /// Frames per read/write chunk
    #[arg(long, value_name = "FRAMES", default_value_t = 1024)]
    chunk: usize,

    /// Start copying from this frame, truncated to whole seconds
    #[arg(long, value_name = "FRAME")]
    seek: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the streams of an input and the one the reader selects
    Probe {
        /// Input audio file
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

fn probe(input: &Path) -> AudioResult<()> {
    let demuxer = decoder::from_file(input)?;
    for stream in demuxer.streams() {
        let kind = match stream.kind {
            StreamKind::Audio => "audio",
            StreamKind::Other => "other",
        };
        println!(
            "stream {}: {} {}{}",
            stream.index,
            kind,
            stream.codec,
            if stream.is_default { " (default)" } else { "" }
        );
    }

    let reader = Reader::from_demuxer(demuxer)?;
    let time_base = reader.time_base();
    println!("selected stream: {}", reader.stream_index());
    println!("frames:          {}", reader.frame_count());
    println!("channels:        {}", reader.channel_count());
    println!("sample rate:     {}", reader.sample_rate());
    println!("time base:       {}/{}", time_base.numer, time_base.denom);
    reader.close();
    Ok(())
}

fn copy(
    input: &Path,
    output: Option<&Path>,
    format: Option<&str>,
    chunk: usize,
    seek: Option<u64>,
) -> AudioResult<()> {
    let mut reader = Reader::open(input)?;
    if let Some(frame) = seek {
        reader.seek(frame)?;
    }

    let mut writer = Writer::open(output, format)?;
    let stats = processor::copy(&mut reader, &mut writer, chunk)?;

    reader.close();
    writer.close()?;

    info!(
        "copied {} frames ({:.2} s)",
        stats.frames_processed,
        stats.frames_processed as f64 / SAMPLE_RATE as f64
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    info!("sndshim {}", sndshim::VERSION);

    let result = match (cli.command, cli.input) {
        (Some(Commands::Probe { input }), _) => probe(&input),
        (None, Some(input)) => copy(
            &input,
            cli.output.as_deref(),
            cli.format.as_deref(),
            cli.chunk,
            cli.seek,
        ),
        (None, None) => {
            eprintln!("Usage: sndshim <INPUT> [OUTPUT]   (see --help)");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sndshim: {}", e);
            ExitCode::FAILURE
        }
    }
}
