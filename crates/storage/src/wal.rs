//! Append-only, JSON-lines write-ahead log.
//!
//! Every event the job store or durable queue produces is appended here
//! before it is folded into [`crate::state::MaterializedState`]. On
//! startup the daemon replays the WAL from the last processed sequence
//! number to rebuild state; `truncate_before` is how a snapshot discards
//! entries that have already been folded in.
//!
//! Corruption handling: a WAL is a plain file an operator can `tail -f`,
//! which means it can also end up truncated mid-write by a crash. `open`
//! scans the file once, keeps every line up to the first line that fails
//! to parse (or isn't valid UTF-8), and rotates whatever came after that
//! point into a `.bak` file rather than discarding it silently.

use quaero_core::Event;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("wal io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("wal serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One decoded line of the log: the sequence number assigned at append
/// time, and the event it carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

const FLUSH_ENTRY_THRESHOLD: usize = 100;
const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

pub struct Wal {
    path: PathBuf,
    writer: BufWriter<File>,
    write_seq: u64,
    processed_seq: u64,
    /// Byte offset of the next line [`Wal::next_unprocessed`] will read.
    read_offset: u64,
    pending_since_flush: usize,
    last_flush: Instant,
}

/// Result of scanning a WAL file for well-formed lines: the entries
/// found, the byte length of the prefix that parsed cleanly, and whether
/// anything after that prefix failed to parse.
struct Scan {
    entries: Vec<(WalEntry, u64)>,
    clean_len: u64,
    corrupted: bool,
}

fn scan(raw: &[u8]) -> Scan {
    let mut entries = Vec::new();
    let mut clean_len: u64 = 0;
    let mut corrupted = false;
    let mut pos: usize = 0;

    while pos < raw.len() {
        let (line, line_end, terminated) = match raw[pos..].iter().position(|b| *b == b'\n') {
            Some(rel_newline) => (&raw[pos..pos + rel_newline], pos + rel_newline + 1, true),
            // No terminator on the tail: a crash mid-write can leave a
            // dangling partial line, but it can equally be pure garbage —
            // either way it must parse to be accepted.
            None => (&raw[pos..], raw.len(), false),
        };

        if line.is_empty() {
            pos = line_end;
            continue;
        }

        match std::str::from_utf8(line).ok().and_then(|text| serde_json::from_str::<WalEntry>(text).ok()) {
            Some(entry) if terminated => {
                clean_len = line_end as u64;
                entries.push((entry, clean_len));
                pos = line_end;
            }
            _ => {
                corrupted = true;
                break;
            }
        }
    }

    Scan {
        entries,
        clean_len,
        corrupted,
    }
}

fn rotate_backups(path: &Path) -> std::io::Result<()> {
    let bak3 = path.with_extension("bak.3");
    let bak2 = path.with_extension("bak.2");
    let bak1 = path.with_extension("bak");

    if bak3.exists() {
        fs::remove_file(&bak3)?;
    }
    if bak2.exists() {
        fs::rename(&bak2, &bak3)?;
    }
    if bak1.exists() {
        fs::rename(&bak1, &bak2)?;
    }
    Ok(())
}

impl Wal {
    /// Open (creating if absent) the WAL at `path`. `processed_seq` is the
    /// sequence number through which the caller's state is already
    /// durable (e.g. from a snapshot); the read cursor starts just past it.
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();

        let raw = if path.exists() {
            fs::read(&path)?
        } else {
            Vec::new()
        };

        let Scan {
            entries,
            clean_len,
            corrupted,
        } = scan(&raw);

        if corrupted {
            rotate_backups(&path)?;
            fs::write(path.with_extension("bak"), &raw)?;
            let clean = &raw[..clean_len as usize];
            fs::write(&path, clean)?;
        } else if !path.exists() {
            fs::write(&path, [])?;
        }

        let write_seq = entries.last().map(|(e, _)| e.seq).unwrap_or(0);
        let read_offset = entries
            .iter()
            .filter(|(e, _)| e.seq <= processed_seq)
            .map(|(_, end)| *end)
            .last()
            .unwrap_or(0);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            write_seq,
            processed_seq,
            read_offset,
            pending_since_flush: 0,
            last_flush: Instant::now(),
        })
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    /// Append `event`, returning the sequence number assigned to it.
    /// Buffered — call [`Wal::flush`] (or rely on [`Wal::needs_flush`])
    /// for durability.
    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        self.write_seq += 1;
        let entry = WalEntry {
            seq: self.write_seq,
            event: event.clone(),
        };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.writer, "{line}")?;
        self.pending_since_flush += 1;
        Ok(self.write_seq)
    }

    /// Push buffered bytes to the OS and fsync the file. Resets the
    /// flush-threshold bookkeeping used by [`Wal::needs_flush`].
    pub fn flush(&mut self) -> Result<(), WalError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.pending_since_flush = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    /// Whether enough unflushed entries (or enough elapsed time) have
    /// accumulated that the caller should call [`Wal::flush`].
    pub fn needs_flush(&self) -> bool {
        self.pending_since_flush >= FLUSH_ENTRY_THRESHOLD
            || (self.pending_since_flush > 0 && self.last_flush.elapsed() >= FLUSH_INTERVAL)
    }

    pub fn mark_processed(&mut self, seq: u64) {
        if seq > self.processed_seq {
            self.processed_seq = seq;
        }
    }

    /// Read and advance past the next entry after the internal read
    /// cursor. Returns `Ok(None)` at end of file *or* when the next line
    /// fails to parse — in the latter case the cursor still advances past
    /// the bad line so a subsequent call can make progress.
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        self.writer.flush()?;
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.read_offset))?;
        let mut raw = Vec::new();
        file.read_to_end(&mut raw)?;

        let Some(newline_pos) = raw.iter().position(|b| *b == b'\n') else {
            return Ok(None);
        };
        let line = &raw[..newline_pos];
        let consumed = newline_pos as u64 + 1;

        match std::str::from_utf8(line).ok().and_then(|text| serde_json::from_str::<WalEntry>(text).ok()) {
            Some(entry) => {
                self.read_offset += consumed;
                Ok(Some(entry))
            }
            None => {
                self.read_offset += consumed;
                Ok(None)
            }
        }
    }

    /// All well-formed entries with `seq > after_seq`, stopping entirely
    /// at the first line that fails to parse (unlike
    /// [`Wal::next_unprocessed`], this does not skip past corruption).
    pub fn entries_after(&mut self, after_seq: u64) -> Result<Vec<WalEntry>, WalError> {
        self.writer.flush()?;
        let raw = fs::read(&self.path)?;
        let Scan { entries, .. } = scan(&raw);
        Ok(entries
            .into_iter()
            .map(|(entry, _)| entry)
            .filter(|entry| entry.seq > after_seq)
            .collect())
    }

    /// Rewrite the file keeping only entries with `seq >= seq`, for use
    /// after a snapshot has made earlier entries redundant.
    pub fn truncate_before(&mut self, seq: u64) -> Result<(), WalError> {
        self.writer.flush()?;
        let raw = fs::read(&self.path)?;
        let Scan { entries, .. } = scan(&raw);

        let mut kept = String::new();
        for (entry, _) in entries.iter().filter(|(e, _)| e.seq >= seq) {
            kept.push_str(&serde_json::to_string(entry)?);
            kept.push('\n');
        }
        fs::write(&self.path, kept.as_bytes())?;

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.writer = BufWriter::new(file);
        self.read_offset = self.read_offset.min(kept.len() as u64);
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
