//! URL source and output file: opened once at setup, before any thread is spawned.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::pipeline::error_handler::PipelineError;

/// Lazy line iterator over the URL list. Lines are yielded as read; nothing is buffered beyond
/// the reader's block. Blank lines are left to the producer to skip.
pub type UrlLines = io::Lines<BufReader<File>>;

pub fn open_url_source(path: &Path) -> Result<UrlLines, PipelineError> {
    let file = File::open(path).map_err(|source| PipelineError::Setup {
        what: "open URL list",
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file).lines())
}

/// Append-only output the writer can roll back to the end of its last whole line.
pub trait OutputSink: Write {
    /// Current length in bytes.
    fn end_offset(&mut self) -> io::Result<u64>;
    /// Drop everything past `len`.
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl OutputSink for File {
    fn end_offset(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    // Opened in append mode, so the next write lands at the new end.
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

impl OutputSink for Vec<u8> {
    fn end_offset(&mut self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.truncate(usize::try_from(len).unwrap_or(usize::MAX));
        Ok(())
    }
}

/// Start clean: delete `path` if it exists, then create it empty in append mode.
pub fn prepare_output_file(path: &Path) -> Result<File, PipelineError> {
    let setup_err = |what, source| PipelineError::Setup {
        what,
        path: path.to_path_buf(),
        source,
    };
    match fs::remove_file(path) {
        Ok(()) => log::debug!("removed previous output {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(setup_err("remove previous output", e)),
    }
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| setup_err("create output", e))
}
