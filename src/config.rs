use crate::error::{MrError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_LINES_PER_CHUNK: usize = 1000;
pub const DEFAULT_REDUCE_BATCH_SIZE: usize = 3;

/// Tunables for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of lines in each map chunk
    pub lines_per_chunk: usize,
    /// Number of grouped words handed to each reduce task
    pub reduce_batch_size: usize,
    /// Upper bound on concurrently running workers; `None` spawns one task per unit of work
    pub max_workers: Option<usize>,
    /// Emit tokens that normalize to the empty string as empty words
    pub keep_empty_words: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lines_per_chunk: DEFAULT_LINES_PER_CHUNK,
            reduce_batch_size: DEFAULT_REDUCE_BATCH_SIZE,
            max_workers: None,
            keep_empty_words: true,
        }
    }
}

impl Config {
    /// Load a JSON config file. Missing fields fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_file_error = |source: Box<dyn std::error::Error + Send + Sync>| {
            MrError::ConfigFile {
                path: path.to_path_buf(),
                source,
            }
        };

        let contents = fs::read_to_string(path).map_err(|e| config_file_error(e.into()))?;
        let config: Config =
            serde_json::from_str(&contents).map_err(|e| config_file_error(e.into()))?;
        Ok(config)
    }

    pub fn with_lines_per_chunk(mut self, lines_per_chunk: usize) -> Self {
        self.lines_per_chunk = lines_per_chunk;
        self
    }

    pub fn with_reduce_batch_size(mut self, reduce_batch_size: usize) -> Self {
        self.reduce_batch_size = reduce_batch_size;
        self
    }

    pub fn with_max_workers(mut self, max_workers: Option<usize>) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_keep_empty_words(mut self, keep_empty_words: bool) -> Self {
        self.keep_empty_words = keep_empty_words;
        self
    }

    /// Reject values no phase can run with
    pub fn validate(&self) -> Result<()> {
        if self.lines_per_chunk == 0 {
            return Err(MrError::invalid("lines_per_chunk must be greater than 0"));
        }
        if self.reduce_batch_size == 0 {
            return Err(MrError::invalid("reduce_batch_size must be greater than 0"));
        }
        if self.max_workers == Some(0) {
            return Err(MrError::invalid("max_workers must be greater than 0 when set"));
        }
        Ok(())
    }
}
