//! Signal sources supply reads, one ordered sample sequence each, to the pipeline.
//!
//! A source is a lazy, finite and restartable sequence of reads. The `memory` submodule
//! holds reads that are already loaded; the `text` submodule streams reads from a plain
//! text trace file.
pub mod memory;
pub mod text;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};

pub use memory::MemorySource;
pub use text::TextSource;

/// A single read: an identifier and its raw current samples in picoamperes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Read {
    pub read_id: String,
    pub signal: Vec<f64>,
}

impl Read {
    pub fn new(read_id: impl Into<String>, signal: Vec<f64>) -> Self {
        Self {
            read_id: read_id.into(),
            signal,
        }
    }

    pub fn has_signal(&self) -> bool {
        !self.signal.is_empty()
    }
}

/// Interface of a collaborator that hands out reads.
///
/// Implementors only need to produce reads in order and be able to start over.
#[cfg_attr(test, mockall::automock)]
pub trait SignalSource {
    /// Identifier of the opened source, e.g. a file name.
    fn identifier(&self) -> String;

    /// Produces the next read, or `None` once every read has been consumed.
    fn next_read(&mut self) -> Result<Option<Read>>;

    /// Restarts the sequence at the first read.
    fn rewind(&mut self) -> Result<()>;
}

/// Rewinds `source` and returns its first read.
///
/// # Errors
///
/// * `EmptySource` if the source holds no reads.
/// * `NoSignalData` if the first read carries no samples.
pub fn first_read<S: SignalSource + ?Sized>(source: &mut S) -> Result<Read> {
    source.rewind()?;
    let read = source
        .next_read()?
        .ok_or_else(|| SignalError::EmptySource(source.identifier()))?;
    if !read.has_signal() {
        return Err(SignalError::NoSignalData(read.read_id));
    }
    Ok(read)
}

/// Iterator over the remaining reads of a source.
pub struct Reads<'a, S: ?Sized> {
    source: &'a mut S,
}

impl<S: SignalSource + ?Sized> Iterator for Reads<'_, S> {
    type Item = Result<Read>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.next_read().transpose()
    }
}

/// Iterates the reads `source` has not handed out yet. Call [`SignalSource::rewind`] first
/// to start from the beginning.
pub fn reads<S: SignalSource + ?Sized>(source: &mut S) -> Reads<'_, S> {
    Reads { source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_read_of_empty_source() {
        let mut source = MockSignalSource::new();
        source.expect_rewind().times(1).returning(|| Ok(()));
        source.expect_next_read().times(1).returning(|| Ok(None));
        source
            .expect_identifier()
            .returning(|| "empty.tsv".to_string());
        let result = first_read(&mut source);
        assert!(matches!(result, Err(SignalError::EmptySource(id)) if id == "empty.tsv"));
    }

    #[test]
    fn test_first_read_without_samples() {
        let mut source = MockSignalSource::new();
        source.expect_rewind().returning(|| Ok(()));
        source
            .expect_next_read()
            .returning(|| Ok(Some(Read::new("read-0", vec![]))));
        let result = first_read(&mut source);
        assert!(matches!(result, Err(SignalError::NoSignalData(id)) if id == "read-0"));
    }

    #[test]
    fn test_reads_stops_after_last() {
        let mut source = MemorySource::new(
            "mem",
            vec![Read::new("a", vec![1.0]), Read::new("b", vec![2.0])],
        );
        let ids: Vec<String> = reads(&mut source)
            .map(|read| read.unwrap().read_id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(reads(&mut source).next().is_none());
    }

    #[test]
    fn test_reads_propagates_errors() {
        let mut source = MockSignalSource::new();
        source
            .expect_next_read()
            .times(1)
            .returning(|| Err(SignalError::SourceNotFound("gone".into())));
        let first = reads(&mut source).next();
        assert!(matches!(first, Some(Err(SignalError::SourceNotFound(_)))));
    }
}
