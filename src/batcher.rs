use crate::error::{MrError, Result};
use crate::grouper::GroupedIndex;

/// A word and the document of each of its occurrences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedEntry {
    pub word: String,
    pub occurrences: Vec<String>,
}

/// The grouped entries handed to one reduce task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReduceBatch {
    pub entries: Vec<GroupedEntry>,
}

impl ReduceBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.word.as_str())
    }
}

/// Cut the index into contiguous batches of `batch_size` words, in index order.
/// Only the last batch may be smaller.
pub fn make_batches(index: GroupedIndex, batch_size: usize) -> Result<Vec<ReduceBatch>> {
    if batch_size == 0 {
        return Err(MrError::invalid("reduce_batch_size must be greater than 0"));
    }

    let mut batches = Vec::with_capacity(index.len().div_ceil(batch_size));
    let mut current = ReduceBatch::default();
    for (word, occurrences) in index {
        current.entries.push(GroupedEntry { word, occurrences });
        if current.len() == batch_size {
            batches.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }

    Ok(batches)
}
