//! A source over reads that are already in memory.

use crate::error::Result;

use super::{Read, SignalSource};

/// Hands out a fixed list of reads in order.
#[derive(Debug, Clone)]
pub struct MemorySource {
    identifier: String,
    reads: Vec<Read>,
    cursor: usize,
}

impl MemorySource {
    pub fn new(identifier: impl Into<String>, reads: Vec<Read>) -> Self {
        Self {
            identifier: identifier.into(),
            reads,
            cursor: 0,
        }
    }

    /// A source holding a single read.
    pub fn single(identifier: impl Into<String>, read: Read) -> Self {
        Self::new(identifier, vec![read])
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }
}

impl SignalSource for MemorySource {
    fn identifier(&self) -> String {
        self.identifier.clone()
    }

    fn next_read(&mut self) -> Result<Option<Read>> {
        let read = self.reads.get(self.cursor).cloned();
        if read.is_some() {
            self.cursor += 1;
        }
        Ok(read)
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignalError;
    use crate::source::first_read;

    #[test]
    fn test_rewind_restarts_sequence() {
        let mut source = MemorySource::new(
            "mem",
            vec![Read::new("a", vec![1.0, 2.0]), Read::new("b", vec![3.0])],
        );
        assert_eq!(source.len(), 2);
        assert_eq!(source.next_read().unwrap().unwrap().read_id, "a");
        assert_eq!(source.next_read().unwrap().unwrap().read_id, "b");
        assert!(source.next_read().unwrap().is_none());
        source.rewind().unwrap();
        assert_eq!(source.next_read().unwrap().unwrap().read_id, "a");
    }

    #[test]
    fn test_first_read_rewinds() {
        let mut source = MemorySource::single("mem", Read::new("only", vec![5.0]));
        source.next_read().unwrap();
        let read = first_read(&mut source).unwrap();
        assert_eq!(read.read_id, "only");
        assert_eq!(read.signal, vec![5.0]);
    }

    #[test]
    fn test_empty_source() {
        let mut source = MemorySource::new("nothing", vec![]);
        assert!(source.is_empty());
        assert!(matches!(
            first_read(&mut source),
            Err(SignalError::EmptySource(id)) if id == "nothing"
        ));
    }
}
