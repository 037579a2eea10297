pub mod batcher;
pub mod collector;
pub mod config;
pub mod coordinator_node;
pub mod error;
pub mod grouper;
pub mod splitter;
pub mod tokenizer;
pub mod worker_node;
pub mod worker_pool;

use batcher::ReduceBatch;
use error::{MrError, Result};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, warn};

pub use config::Config;
pub use coordinator_node::{make_coordinator, Coordinator, JobReport, Phase, PhaseTimings};
pub use worker_pool::PhaseRun;

/// An input text, identified by its path or name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Document {
        Document {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Read every path into a `Document`, all reads in flight at once.
/// Documents keep argument order. A path given more than once is loaded once.
/// Any failed read aborts the whole load; the first failing path in argument order is reported.
pub async fn load_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(paths.len());
    for path in paths {
        if seen.insert(path.display().to_string()) {
            unique.push(path);
        } else {
            warn!("{} given more than once, loading it once", path.display());
        }
    }

    let reads = unique.into_iter().map(|path| async move {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| MrError::InputRead {
                path: path.clone(),
                source,
            })?;
        let id = path.display().to_string();
        debug!("loaded {} ({} bytes)", id, text.len());
        Ok::<_, MrError>(Document { id, text })
    });

    join_all(reads).await.into_iter().collect()
}

/// A run of consecutive lines from one document; the unit of map work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub document: String,
    pub contents: String,
}

/// One occurrence of a normalized word in a document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappedItem {
    word: String,
    document: String,
}

impl MappedItem {
    pub fn new(word: impl Into<String>, document: impl Into<String>) -> MappedItem {
        MappedItem {
            word: word.into(),
            document: document.into(),
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn into_parts(self) -> (String, String) {
        (self.word, self.document)
    }
}

#[derive(Debug)]
pub enum Task {
    Map(Chunk),
    Reduce(ReduceBatch),
}

/// Final result: word -> (document -> occurrence count)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputRecord(BTreeMap<String, BTreeMap<String, usize>>);

impl OutputRecord {
    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<&BTreeMap<String, usize>> {
        self.0.get(word)
    }

    /// Occurrences of `word` in `document`, zero when either is unknown
    pub fn count(&self, word: &str, document: &str) -> usize {
        self.get(word)
            .and_then(|counts| counts.get(document))
            .copied()
            .unwrap_or(0)
    }

    /// Occurrences of `word` across every document
    pub fn total(&self, word: &str) -> usize {
        self.get(word).map(|counts| counts.values().sum()).unwrap_or(0)
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, usize>)> {
        self.0.iter()
    }
}

/// Renders as `{cat={doc1=1, doc2=2}, dog={doc3=1}}`
impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (word, counts)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{word}={{")?;
            for (j, (document, count)) in counts.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{document}={count}")?;
            }
            write!(f, "}}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, BTreeMap<String, usize>)> for OutputRecord {
    fn from_iter<I: IntoIterator<Item = (String, BTreeMap<String, usize>)>>(iter: I) -> Self {
        OutputRecord(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn output_record_counts() {
        let record: OutputRecord = vec![
            (
                "cat".to_string(),
                BTreeMap::from([("doc1".to_string(), 1), ("doc2".to_string(), 2)]),
            ),
            ("dog".to_string(), BTreeMap::from([("doc3".to_string(), 1)])),
        ]
        .into_iter()
        .collect();

        assert_eq!(record.len(), 2);
        assert_eq!(record.count("cat", "doc2"), 2);
        assert_eq!(record.count("cat", "doc3"), 0);
        assert_eq!(record.count("bird", "doc1"), 0);
        assert_eq!(record.total("cat"), 3);
        assert_eq!(record.words().collect::<Vec<_>>(), vec!["cat", "dog"]);
    }

    #[test]
    fn output_record_serializes_as_nested_map() {
        let record: OutputRecord =
            vec![("cat".to_string(), BTreeMap::from([("a".to_string(), 2)]))]
                .into_iter()
                .collect();
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"cat":{"a":2}}"#);
    }

    #[test]
    fn output_record_displays_as_nested_map() {
        let record: OutputRecord = vec![
            (
                "cat".to_string(),
                BTreeMap::from([("doc1".to_string(), 1), ("doc2".to_string(), 2)]),
            ),
            ("dog".to_string(), BTreeMap::from([("doc3".to_string(), 1)])),
        ]
        .into_iter()
        .collect();
        assert_eq!(record.to_string(), "{cat={doc1=1, doc2=2}, dog={doc3=1}}");
        assert_eq!(OutputRecord::default().to_string(), "{}");
    }

    #[tokio::test]
    async fn load_documents_reads_each_path_once() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        fs::write(&first, "cat dog").unwrap();
        fs::write(&second, "dog").unwrap();

        let documents = load_documents(&[first.clone(), second.clone(), first.clone()])
            .await
            .unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].id, first.display().to_string());
        assert_eq!(documents[0].text, "cat dog");
        assert_eq!(documents[1].text, "dog");
    }

    #[tokio::test]
    async fn load_documents_keeps_argument_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..8)
            .map(|n| {
                let path = dir.path().join(format!("doc{n}.txt"));
                fs::write(&path, "word ".repeat(n + 1)).unwrap();
                path
            })
            .collect();

        let documents = load_documents(&paths).await.unwrap();

        assert_eq!(documents.len(), 8);
        for (n, (document, path)) in documents.iter().zip(&paths).enumerate() {
            assert_eq!(document.id, path.display().to_string());
            assert_eq!(document.text.split_whitespace().count(), n + 1);
        }
    }

    #[tokio::test]
    async fn load_documents_fails_on_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");

        let present = dir.path().join("present.txt");
        fs::write(&present, "cat").unwrap();
        let also_missing = dir.path().join("also-missing.txt");

        let err = load_documents(&[present, missing.clone(), also_missing])
            .await
            .unwrap_err();
        match err {
            MrError::InputRead { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }
}
