//! Append-only JSON-lines journal.
//!
//! Durability contract:
//! - one entry per line, written with a single `write_all`
//! - `sync_data` before `append` returns when `sync` is enabled
//! - a failed append truncates the file back to its previous length
//! - on open, an unterminated final line (crash mid-append) is truncated
//!   away; a terminated line that does not parse is reported as corruption

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Journal<T> {
    path: PathBuf,
    file: File,
    len: u64,
    sync: bool,
    _entry: PhantomData<fn(T)>,
}

impl<T> std::fmt::Debug for Journal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal").field("path", &self.path).field("len", &self.len).field("sync", &self.sync).finish()
    }
}

impl<T: Serialize + DeserializeOwned> Journal<T> {
    /// Open or create the journal at `path` and replay every complete entry.
    pub fn open(path: &Path, sync: bool) -> Result<(Self, Vec<T>)> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| Error::storage(format!("open {}", path.display()), e))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| Error::storage(format!("read {}", path.display()), e))?;

        let (entries, good_len) = replay(path, &bytes)?;
        if good_len < bytes.len() as u64 {
            tracing::warn!(
                path = %path.display(),
                dropped_bytes = bytes.len() as u64 - good_len,
                "truncating torn journal tail"
            );
            file.set_len(good_len).map_err(|e| Error::storage(format!("truncate {}", path.display()), e))?;
            file.sync_all().map_err(|e| Error::storage(format!("sync {}", path.display()), e))?;
        }

        let journal = Self { path: path.to_path_buf(), file, len: good_len, sync, _entry: PhantomData };
        Ok((journal, entries))
    }

    /// Append one entry. On error nothing of the entry remains in the file.
    pub fn append(&mut self, entry: &T) -> Result<()> {
        let mut line = serde_json::to_vec(entry).map_err(|e| Error::storage("encode journal entry", e))?;
        line.push(b'\n');

        if let Err(e) = self.write_line(&line) {
            if let Err(rollback) = self.file.set_len(self.len) {
                tracing::error!(path = %self.path.display(), error = %rollback, "journal rollback failed");
            }
            return Err(Error::storage(format!("append {}", self.path.display()), e));
        }
        self.len += line.len() as u64;
        Ok(())
    }

    /// Drop every entry.
    pub fn reset(&mut self) -> Result<()> {
        self.file.set_len(0).map_err(|e| Error::storage(format!("truncate {}", self.path.display()), e))?;
        self.file.sync_all().map_err(|e| Error::storage(format!("sync {}", self.path.display()), e))?;
        self.len = 0;
        Ok(())
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn len_bytes(&self) -> u64 { self.len }

    fn write_line(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.file.write_all(line)?;
        if self.sync { self.file.sync_data()?; }
        Ok(())
    }
}

fn replay<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<(Vec<T>, u64)> {
    let mut entries = Vec::new();
    let mut offset = 0usize;
    while offset < bytes.len() {
        let Some(rel_end) = bytes[offset..].iter().position(|&b| b == b'\n') else {
            // Unterminated final line: the append never completed.
            break;
        };
        let end = offset + rel_end;
        let line = &bytes[offset..end];
        // A terminated line was written in full, so failing to parse it is corruption.
        if !line.iter().all(u8::is_ascii_whitespace) {
            let entry = serde_json::from_slice::<T>(line)
                .map_err(|e| Error::storage(format!("corrupt entry at byte {offset} of {}", path.display()), e))?;
            entries.push(entry);
        }
        offset = end + 1;
    }
    Ok((entries, offset as u64))
}
