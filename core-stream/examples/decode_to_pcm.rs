//! Decode an audio file to raw s16le PCM
//!
//! Run with:
//! ```bash
//! cargo run -p core-stream --example decode_to_pcm -- input.mp3 output.pcm
//!
//! # Smaller chunks and JSON logs
//! cargo run -p core-stream --example decode_to_pcm -- input.flac output.pcm 1024 json
//! ```

use bytes::Bytes;
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use core_stream::{DecoderStream, DecoderStreamOptions};
use futures::{stream, StreamExt};
use std::env;
use std::io;
use std::path::Path;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: decode_to_pcm <input> <output> [chunk-size] [pretty|json|compact]");
        std::process::exit(2);
    }

    let chunk_size = args
        .get(3)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(16 * 1024);

    let format = match args.get(4).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };

    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_level(LogLevel::Debug),
    )
    .expect("Failed to initialize logging");

    if let Err(e) = run(&args[1], &args[2], chunk_size).await {
        error!("Decoding failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(input: &str, output: &str, chunk_size: usize) -> Result<(), Box<dyn std::error::Error>> {
    let encoded = Bytes::from(tokio::fs::read(input).await?);

    // Split at fixed offsets to exercise arbitrary chunk boundaries
    let chunks: Vec<io::Result<Bytes>> = (0..encoded.len())
        .step_by(chunk_size.max(1))
        .map(|start| Ok(encoded.slice(start..(start + chunk_size).min(encoded.len()))))
        .collect();

    let mut options = DecoderStreamOptions::default().with_gapless(true).on_metadata_detected(
        |_, channels, rate| {
            info!(channels, sample_rate = rate, "Metadata detected");
            Ok(())
        },
    );
    if let Some(extension) = Path::new(input).extension().and_then(|e| e.to_str()) {
        options = options.with_file_extension(extension.to_ascii_lowercase());
    }

    let mut decoded = DecoderStream::new(stream::iter(chunks), options)?;
    let mut pcm = Vec::new();

    while let Some(chunk) = decoded.next().await {
        pcm.extend_from_slice(&chunk?);
    }

    tokio::fs::write(output, &pcm).await?;

    info!(
        bytes = pcm.len(),
        channels = ?decoded.channel_count(),
        sample_rate = ?decoded.sample_rate(),
        "Wrote PCM"
    );

    Ok(())
}
