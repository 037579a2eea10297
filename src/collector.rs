//! Collectors shared by the concurrent tasks of one phase.
//!
//! Each collector wraps its storage in a single `Mutex`; every append or insert
//! takes the lock for the duration of the call. Results are only taken out by
//! the coordinator once the phase barrier has passed.

use crate::coordinator_node::Phase;
use crate::error::{MrError, Result};
use crate::{MappedItem, OutputRecord};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>, phase: Phase) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| MrError::WorkerTaskFailure {
        phase,
        reason: "collector lock poisoned by a panicking task".to_string(),
    })
}

/// Receives the mapped items of every map task
#[derive(Clone, Default)]
pub struct MapCollector {
    items: Arc<Mutex<Vec<MappedItem>>>,
}

impl MapCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append all items of one chunk. Items of one call stay contiguous and in order.
    pub fn map_done(&self, results: Vec<MappedItem>) -> Result<()> {
        lock(&self.items, Phase::Mapping)?.extend(results);
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(lock(&self.items, Phase::Mapping)?.len())
    }

    /// Move the collected items out, leaving the collector empty
    pub fn take(&self) -> Result<Vec<MappedItem>> {
        Ok(std::mem::take(&mut *lock(&self.items, Phase::Mapping)?))
    }
}

/// Receives the per-document counts of every reduce task, keyed by word
#[derive(Clone, Default)]
pub struct OutputCollector {
    counts: Arc<Mutex<HashMap<String, BTreeMap<String, usize>>>>,
}

impl OutputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the counts for `word`. Batches partition the key set, so a word
    /// arriving twice means the batching was broken.
    pub fn reduce_done(&self, word: String, counts: BTreeMap<String, usize>) -> Result<()> {
        let mut output = lock(&self.counts, Phase::Reducing)?;
        if output.contains_key(&word) {
            return Err(MrError::WorkerTaskFailure {
                phase: Phase::Reducing,
                reason: format!("word {word:?} reduced more than once"),
            });
        }
        output.insert(word, counts);
        Ok(())
    }

    /// Move the collected counts out as the final record
    pub fn take(&self) -> Result<OutputRecord> {
        let counts = std::mem::take(&mut *lock(&self.counts, Phase::Reducing)?);
        Ok(counts.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn map_collector_keeps_each_append_contiguous() {
        let collector = MapCollector::new();
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let collector = collector.clone();
                thread::spawn(move || {
                    let doc = format!("doc{n}");
                    let items = (0..50)
                        .map(|i| MappedItem::new(i.to_string(), doc.clone()))
                        .collect();
                    collector.map_done(items).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let items = collector.take().unwrap();
        assert_eq!(items.len(), 400);
        for run in items.chunks(50) {
            let doc = run[0].document();
            for (i, item) in run.iter().enumerate() {
                assert_eq!(item.document(), doc);
                assert_eq!(item.word(), i.to_string());
            }
        }
        assert_eq!(collector.len().unwrap(), 0);
    }

    #[test]
    fn output_collector_rejects_duplicate_word() {
        let collector = OutputCollector::new();
        collector
            .reduce_done("cat".into(), BTreeMap::from([("a".into(), 1)]))
            .unwrap();
        let err = collector
            .reduce_done("cat".into(), BTreeMap::from([("b".into(), 1)]))
            .unwrap_err();
        assert!(matches!(
            err,
            MrError::WorkerTaskFailure {
                phase: Phase::Reducing,
                ..
            }
        ));
        assert_eq!(collector.take().unwrap().count("cat", "a"), 1);
    }

    #[test]
    fn poisoned_lock_is_a_task_failure() {
        let collector = MapCollector::new();
        let poisoner = collector.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.items.lock().unwrap();
            panic!("worker died holding the lock");
        })
        .join();

        let err = collector.map_done(vec![MappedItem::new("a", "b")]).unwrap_err();
        assert!(matches!(err, MrError::WorkerTaskFailure { .. }));
    }
}
