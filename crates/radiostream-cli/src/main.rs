//! Radiostream CLI: command-line internet radio player
//!
//! Plays the given stations one after another and writes the compressed
//! audio to a file or stdout. Logs go to stderr.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::Receiver;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use radiostream::audio::{StreamEvent, StreamPlayer, WriterSink};
use radiostream::config::SessionConfig;
use radiostream::error::RadioError;
use radiostream::presets::PRESETS;
use radiostream::queue::{PlayQueue, QueueItem};
use radiostream::stream::{Credentials, OpenOptions, StreamMetadata};

/// Delay between pump calls while a stream is live
const PUMP_INTERVAL: Duration = Duration::from_millis(2);

#[derive(Parser)]
#[command(name = "radiostream", about = "Command-line internet radio player", version)]
struct Cli {
    /// Stream or playlist URLs to play, in order
    urls: Vec<String>,

    /// Queue a built-in preset by index (repeatable, see --list-presets)
    #[arg(long = "preset", value_name = "N")]
    presets: Vec<usize>,

    /// Basic-auth user
    #[arg(long, requires = "password")]
    user: Option<String>,

    /// Basic-auth password
    #[arg(long, requires = "user")]
    password: Option<String>,

    /// Resume the first item from this byte offset
    #[arg(long, value_name = "BYTES")]
    range_start: Option<u64>,

    /// Audio output file, `-` for stdout
    #[arg(short, long, value_name = "PATH", default_value = "-")]
    output: String,

    /// Output volume, 0-100
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    volume: Option<u8>,

    /// JSON session config
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the preset table and exit
    #[arg(long)]
    list_presets: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("radiostream=info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if cli.list_presets {
        for (i, preset) in PRESETS.iter().enumerate() {
            println!("{i:>3}  {:<40} {}", preset.name, preset.url);
        }
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_queue(cli: &Cli) -> PlayQueue {
    let mut queue = PlayQueue::new();
    for url in &cli.urls {
        if !queue.add(QueueItem::stream(url.as_str(), url.as_str())) {
            warn!(%url, "queue full, ignoring");
        }
    }
    for &index in &cli.presets {
        if index >= PRESETS.len() {
            warn!(index, "no such preset");
            continue;
        }
        if !queue.add(QueueItem::preset(index)) {
            warn!(index, "queue full, ignoring preset");
        }
    }
    queue
}

fn open_output(path: &str) -> io::Result<Box<dyn Write>> {
    if path == "-" {
        Ok(Box::new(io::stdout().lock()))
    } else {
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }
}

fn run(cli: Cli) -> Result<(), RadioError> {
    let config = match &cli.config {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };

    let mut queue = build_queue(&cli);
    if queue.is_empty() {
        return Err(RadioError::Config(
            "nothing to play, give a URL or --preset".to_string(),
        ));
    }
    info!(items = queue.len(), "queue ready");

    let sink = WriterSink::new(open_output(&cli.output)?);
    let mut player = StreamPlayer::with_config(sink, config);
    if let Some(volume) = cli.volume {
        player.set_volume(volume);
    }
    let events = player.subscribe();

    let credentials = match (&cli.user, &cli.password) {
        (Some(user), Some(password)) => Some(Credentials::new(user.as_str(), password.as_str())),
        _ => None,
    };
    let mut range_start = cli.range_start;

    while let Some(index) = queue.advance() {
        let Some(url) = queue.url(index) else {
            continue;
        };
        let name = queue.name(index).unwrap_or(url);
        info!(item = index, %name, "playing");

        let mut options = OpenOptions::default();
        if let Some(credentials) = credentials.clone() {
            options = options.with_credentials(credentials);
        }
        if let Some(offset) = range_start.take() {
            options = options.with_range_start(offset);
        }

        if let Err(e) = player.open_with(url, options) {
            warn!(%url, error = %e, "could not open stream, skipping");
            continue;
        }
        play(&mut player, &events);
    }

    info!(bytes = player.sink().bytes_written(), "queue finished");
    Ok(())
}

/// Pump the live stream until it ends, reporting its events
fn play<W: Write>(player: &mut StreamPlayer<WriterSink<W>>, events: &Receiver<StreamEvent>) {
    while player.is_active() {
        // Failures also arrive as StreamFailed below
        if let Err(e) = player.pump() {
            debug!(error = %e, "pump failed");
        }
        for event in events.try_iter() {
            report(event);
        }
        thread::sleep(PUMP_INTERVAL);
    }
    for event in events.try_iter() {
        report(event);
    }
}

fn report(event: StreamEvent) {
    match event {
        StreamEvent::StationName(name) => info!(station = %name, "connected"),
        StreamEvent::StreamTitle(raw) => {
            let meta = StreamMetadata::from_icy_title(&raw);
            match (meta.artist, meta.title) {
                (Some(artist), Some(title)) => info!(%artist, %title, "now playing"),
                (None, Some(title)) => info!(%title, "now playing"),
                _ => {}
            }
        }
        StreamEvent::EndOfStream { url } => info!(%url, "end of stream"),
        StreamEvent::StreamFailed { url, reason } => warn!(%url, %reason, "stream failed"),
    }
}
