use crate::collector::{MapCollector, OutputCollector};
use crate::error::Result;
use crate::tokenizer::tokenize;
use crate::{MappedItem, Task};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Turns one chunk of a document into its mapped items
pub type MapFn = fn(document: &str, contents: &str) -> Vec<MappedItem>;

/// Turns the occurrence list of one word into per-document counts
pub type ReduceFn = fn(word: &str, occurrences: &[String]) -> BTreeMap<String, usize>;

/// Executes map and reduce tasks, publishing into the collectors it shares
/// with every other task of the run.
pub struct Worker {
    mapf: MapFn,
    reducef: ReduceFn,
    keep_empty_words: bool,
    map_collector: MapCollector,
    output_collector: OutputCollector,
}

impl Worker {
    pub fn new(mapf: MapFn, reducef: ReduceFn, keep_empty_words: bool) -> Worker {
        Worker {
            mapf,
            reducef,
            keep_empty_words,
            map_collector: MapCollector::new(),
            output_collector: OutputCollector::new(),
        }
    }

    pub fn map_collector(&self) -> &MapCollector {
        &self.map_collector
    }

    pub fn output_collector(&self) -> &OutputCollector {
        &self.output_collector
    }

    /// Run one task to completion
    pub fn start_executor(&self, task: Task) -> Result<()> {
        match task {
            Task::Map(chunk) => {
                let mut items = (self.mapf)(&chunk.document, &chunk.contents);
                if !self.keep_empty_words {
                    items.retain(|item| !item.word().is_empty());
                }
                debug!("chunk of {} mapped to {} items", chunk.document, items.len());
                self.map_collector.map_done(items)
            }
            Task::Reduce(batch) => {
                debug!("reducing batch of {} words", batch.len());
                for entry in batch.entries {
                    let counts = (self.reducef)(&entry.word, &entry.occurrences);
                    trace!("{:?} -> {:?}", entry.word, counts);
                    self.output_collector.reduce_done(entry.word, counts)?;
                }
                Ok(())
            }
        }
    }
}

/// One mapped item per whitespace-separated token, tagged with `document`
pub fn map(document: &str, contents: &str) -> Vec<MappedItem> {
    tokenize(contents)
        .into_iter()
        .map(|word| MappedItem::new(word, document))
        .collect()
}

/// How many times each document appears in `occurrences`
pub fn reduce(_word: &str, occurrences: &[String]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for document in occurrences {
        *counts.entry(document.clone()).or_insert(0) += 1;
    }
    counts
}

/// Create a worker with the word-count map and reduce functions
pub fn make_worker(keep_empty_words: bool) -> Worker {
    Worker::new(map, reduce, keep_empty_words)
}
