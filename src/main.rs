//! CardScan - command line front-end
//!
//! Replays recorded recognition output through a full scan session, or
//! checks a single card number.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::select;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use card_scan::analysis::extract::{MAX_CARD_DIGITS, MIN_CARD_DIGITS};
use card_scan::analysis::luhn::{format_card_number, is_valid_luhn};
use card_scan::capture::Haptics;
use card_scan::config::{self, AppConfig};
use card_scan::storage;
use card_scan::vision::{ReplayRecognizer, Transcript};
use card_scan::{CardBrand, CardScanner, Frame, FrameDisposition, ScanResult};

/// CardScan - read payment card details from camera OCR output
#[derive(Parser, Debug)]
#[command(name = "card-scan")]
#[command(about = "Extracts and validates payment card details from recognized text")]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scan session over a recorded recognition transcript
    Replay {
        /// Transcript file: one line per recognized line, frames separated by `---`
        transcript: PathBuf,

        /// Simulated milliseconds between delivered frames
        #[arg(long, default_value = "250")]
        frame_ms: u64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a card number
    Check {
        /// Card number, separators allowed
        number: String,
    },
}

/// Haptics stand-in for terminals
struct LogHaptics;

impl Haptics for LogHaptics {
    fn success(&self) {
        info!("Scan succeeded");
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let (config, config_source) = load_or_create_config(args.config.as_deref())?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match config_source {
        Some(path) => info!("Loaded configuration from {:?}", path),
        None => info!("Using default configuration"),
    }

    match args.command {
        Command::Replay {
            transcript,
            frame_ms,
            json,
        } => run_replay(&config, &transcript, frame_ms, json),
        Command::Check { number } => {
            run_check(&number);
            Ok(())
        }
    }
}

/// Load configuration from an explicit path, the default file, or defaults
fn load_or_create_config(explicit: Option<&Path>) -> Result<(AppConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((config::load_config(path)?, Some(path.to_path_buf())));
    }

    if let Ok(path) = storage::default_config_path() {
        if path.exists() {
            if let Ok(config) = config::load_config(&path) {
                return Ok((config, Some(path)));
            }
        }
    }

    Ok((AppConfig::default(), None))
}

/// Replay a transcript through a scan session
fn run_replay(config: &AppConfig, transcript_path: &Path, frame_ms: u64, json: bool) -> Result<()> {
    let transcript = Transcript::load(transcript_path)?;
    let frame_count = transcript.len() as u64;
    info!("Replaying {} frames from {:?}", frame_count, transcript_path);

    let mut scanner = CardScanner::new(config.scanner_config(), ReplayRecognizer::new(transcript));
    if config.feedback.haptics {
        scanner = scanner.with_haptics(LogHaptics);
    }
    let scanner = Arc::new(scanner);
    let feedback = scanner.feedback();

    let pending = scanner
        .start()?
        .ok_or_else(|| anyhow!("A scan session is already running"))?;

    // Frame source thread: delivers frames at the simulated rate
    let source = {
        let scanner = Arc::clone(&scanner);
        std::thread::spawn(move || {
            let base = Instant::now();
            for sequence in 0..frame_count {
                let Some(timestamp) = frame_timestamp(base, frame_ms, sequence) else {
                    warn!("Frame {} is beyond the representable clock range", sequence);
                    break;
                };
                let disposition = scanner.handle_frame(Frame::empty(sequence, timestamp));
                debug!("Frame {} -> {:?}", sequence, disposition);
                if matches!(disposition, FrameDisposition::Accepted | FrameDisposition::TimedOut) {
                    return;
                }
            }
            warn!("Transcript exhausted without a stable card number");
            scanner.cancel();
        })
    };

    let result = loop {
        select! {
            recv(pending.receiver()) -> msg => break msg.unwrap_or(ScanResult::Cancelled),
            recv(feedback) -> msg => {
                if let Ok(message) = msg {
                    info!("{}", message.instruction());
                }
            }
        }
    };

    source
        .join()
        .map_err(|_| anyhow!("Frame source thread panicked"))?;

    let stats = scanner.stats();
    info!(
        "Frames: {} received, {} processed, {} throttled, {} failed",
        stats.frames_received,
        stats.frames_admitted,
        stats.frames_throttled,
        stats.recognition_failures
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match result {
        ScanResult::Accepted {
            number,
            brand,
            expiry,
            name,
        } => {
            println!("Card:   {}", number);
            println!("Brand:  {}", brand);
            let expiry = expiry.map(|e| e.to_string()).unwrap_or_else(|| "-".to_string());
            println!("Expiry: {}", expiry);
            println!("Name:   {}", name.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()));
        }
        ScanResult::Cancelled => {
            println!("Scan cancelled: no card number was read consistently");
        }
    }

    Ok(())
}

/// Simulated delivery time of a replayed frame, `None` past the clock's range
fn frame_timestamp(base: Instant, frame_ms: u64, sequence: u64) -> Option<Instant> {
    base.checked_add(Duration::from_millis(frame_ms.saturating_mul(sequence)))
}

/// Print validation details for a single number
fn run_check(input: &str) {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();

    if !(MIN_CARD_DIGITS..=MAX_CARD_DIGITS).contains(&digits.len()) {
        println!(
            "Not a card number: {} digits (expected {}-{})",
            digits.len(),
            MIN_CARD_DIGITS,
            MAX_CARD_DIGITS
        );
        return;
    }

    println!("Number: {}", format_card_number(&digits));
    println!("Brand:  {}", CardBrand::detect(&digits));
    println!("Luhn:   {}", if is_valid_luhn(&digits) { "valid" } else { "invalid" });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timestamp_spacing() {
        let base = Instant::now();
        assert_eq!(frame_timestamp(base, 250, 0), Some(base));
        assert_eq!(frame_timestamp(base, 250, 4), Some(base + Duration::from_secs(1)));
    }

    #[test]
    fn test_frame_timestamp_huge_spacing() {
        // Whether this fits depends on the platform clock; it must not panic
        let base = Instant::now();
        for sequence in [1, 2, u64::MAX] {
            if let Some(timestamp) = frame_timestamp(base, u64::MAX, sequence) {
                assert!(timestamp > base);
            }
        }
    }
}
