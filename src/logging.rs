//! Diagnostics and chat transcripts
//!
//! `init_tracing` sets up the process-wide `tracing` subscriber used by both
//! binaries. `TranscriptLogger` appends received chat messages to disk:
//! logs/channel/YYYY-MM-DD.log under XDG_DATA_HOME/pubsub-chat/.

use chrono::Local;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` takes precedence.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// A transcript line to be written to disk
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub channel: String,
    pub timestamp: String,
    pub client_id: String,
    pub message: String,
}

/// Writes transcripts on a background thread so the UI never blocks on I/O
pub struct TranscriptLogger {
    tx: Sender<LogEntry>,
    log_dir: PathBuf,
}

impl TranscriptLogger {
    /// Logger rooted at the platform data directory
    pub fn new() -> Result<Self, String> {
        Self::with_dir(get_log_directory()?)
    }

    /// Logger rooted at an explicit directory
    pub fn with_dir(log_dir: PathBuf) -> Result<Self, String> {
        fs::create_dir_all(&log_dir)
            .map_err(|e| format!("Failed to create log directory: {}", e))?;

        let (tx, rx) = unbounded::<LogEntry>();

        let dir = log_dir.clone();
        thread::spawn(move || {
            run_logger_thread(rx, dir);
        });

        Ok(Self { tx, log_dir })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Queue an entry for writing
    pub fn log(&self, entry: LogEntry) {
        // The writer thread only stops when every sender is gone
        let _ = self.tx.send(entry);
    }
}

fn run_logger_thread(rx: Receiver<LogEntry>, log_dir: PathBuf) {
    let mut file_cache: HashMap<String, BufWriter<File>> = HashMap::new();

    while let Ok(entry) = rx.recv() {
        if let Err(e) = write_log_entry(&mut file_cache, &log_dir, &entry) {
            tracing::warn!("Transcript logger error: {}", e);
        }
    }

    for (_, mut writer) in file_cache.drain() {
        let _ = writer.flush();
    }
}

fn write_log_entry(
    file_cache: &mut HashMap<String, BufWriter<File>>,
    log_dir: &Path,
    entry: &LogEntry,
) -> Result<(), String> {
    let date = Local::now().format("%Y-%m-%d").to_string();
    let channel = sanitize_filename(&entry.channel);
    let cache_key = format!("{}/{}", channel, date);

    if !file_cache.contains_key(&cache_key) {
        let channel_dir = log_dir.join(&channel);
        fs::create_dir_all(&channel_dir)
            .map_err(|e| format!("Failed to create channel directory: {}", e))?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(channel_dir.join(format!("{}.log", date)))
            .map_err(|e| format!("Failed to open log file: {}", e))?;

        file_cache.insert(cache_key.clone(), BufWriter::new(file));
    }

    let writer = file_cache
        .get_mut(&cache_key)
        .ok_or_else(|| "Log writer missing after insert".to_string())?;

    // Format: [HH:MM:SS] <client_id> message
    writeln!(writer, "[{}] <{}> {}", entry.timestamp, entry.client_id, entry.message)
        .map_err(|e| format!("Failed to write log entry: {}", e))?;

    writer
        .flush()
        .map_err(|e| format!("Failed to flush log: {}", e))?;

    Ok(())
}

fn get_log_directory() -> Result<PathBuf, String> {
    let base = directories::BaseDirs::new().ok_or("Failed to determine home directory")?;
    Ok(base.data_dir().join("pubsub-chat").join("logs"))
}

/// Make a channel name safe to use as a directory name
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}
