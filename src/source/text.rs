//! A source that streams reads from a plain text trace file.
//!
//! Each non-empty line holds one read: the read identifier, a tab, and the samples as a
//! comma-separated list of finite numbers. Lines starting with `#` are comments.
//!
//! ```text
//! # read_id<TAB>samples
//! 0a1b2c3d	91.2,90.8,93.5,88.1
//! 4e5f6a7b	101.0,99.6,100.4
//! ```
//!
//! Lines are read lazily, so only the read being handed out is held in memory.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::error::{Result, SignalError};

use super::{Read, SignalSource};

pub struct TextSource {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl TextSource {
    /// Opens the trace file at `path`.
    ///
    /// # Errors
    ///
    /// * `SourceNotFound` if `path` does not name an existing file.
    /// * `Io` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SignalError::SourceNotFound(path.display().to_string()));
        }
        log::debug!("Opened text trace source {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            lines: open_lines(path)?,
            line_no: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_lines(path: &Path) -> Result<Lines<BufReader<File>>> {
    Ok(BufReader::new(File::open(path)?).lines())
}

fn malformed(line: usize, reason: impl Into<String>) -> SignalError {
    SignalError::MalformedRecord {
        line,
        reason: reason.into(),
    }
}

/// Parses `read_id<TAB>v1,v2,...`. An empty sample list gives a read without signal.
fn parse_record(line: &str, line_no: usize) -> Result<Read> {
    let (read_id, samples) = line
        .split_once('\t')
        .ok_or_else(|| malformed(line_no, "expected `read_id<TAB>samples`"))?;
    let read_id = read_id.trim();
    if read_id.is_empty() {
        return Err(malformed(line_no, "empty read id"));
    }
    let samples = samples.trim();
    let signal = if samples.is_empty() {
        Vec::new()
    } else {
        samples
            .split(',')
            .map(|value| {
                let value = value.trim();
                let sample = value
                    .parse::<f64>()
                    .map_err(|e| malformed(line_no, format!("invalid sample `{}`: {}", value, e)))?;
                if !sample.is_finite() {
                    return Err(malformed(line_no, format!("non-finite sample `{}`", value)));
                }
                Ok(sample)
            })
            .collect::<Result<Vec<f64>>>()?
    };
    Ok(Read::new(read_id, signal))
}

impl SignalSource for TextSource {
    fn identifier(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn next_read(&mut self) -> Result<Option<Read>> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_no += 1;
            let content = line.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }
            return parse_record(line.trim_end_matches('\r'), self.line_no).map(Some);
        }
        Ok(None)
    }

    fn rewind(&mut self) -> Result<()> {
        self.lines = open_lines(&self.path)?;
        self.line_no = 0;
        Ok(())
    }
}
