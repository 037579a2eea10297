use crate::MappedItem;
use indexmap::IndexMap;

/// Inverted index from word to the document of every occurrence.
/// Keys iterate in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedIndex {
    entries: IndexMap<String, Vec<String>>,
}

impl GroupedIndex {
    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<&[String]> {
        self.entries.get(word).map(Vec::as_slice)
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Total occurrences across all words
    pub fn occurrences(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

impl IntoIterator for GroupedIndex {
    type Item = (String, Vec<String>);
    type IntoIter = indexmap::map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Build the index from every mapped item, in one pass.
/// Duplicate occurrences are kept: a document appears once per occurrence.
pub fn group(items: Vec<MappedItem>) -> GroupedIndex {
    let mut entries: IndexMap<String, Vec<String>> = IndexMap::new();
    for item in items {
        let (word, document) = item.into_parts();
        entries.entry(word).or_default().push(document);
    }
    GroupedIndex { entries }
}
