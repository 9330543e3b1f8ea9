//! JSON Lines output sink
//!
//! Each committed record becomes one line of the output file. The file is
//! opened in append mode so an existing dataset is extended, never
//! truncated.

use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use producer::{ProducerError, ProducerResult, RecordSink};
use shared::{process_debug, ProcessId, QaRecord};

/// Append-only JSONL file sink
pub struct JsonlFileSink {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

impl JsonlFileSink {
    /// Describe a sink at `path`; nothing touches the disk until `prepare` or the first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Arc::new(Mutex::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(path: &Path) -> std::io::Result<File> {
        OpenOptions::new().create(true).append(true).open(path)
    }

    /// Run `op` with the open file handle on a blocking thread
    ///
    /// The blocking closure runs to completion even if the awaiting task is
    /// aborted, so a line that has started being written is always finished.
    async fn with_file<F>(&self, op: F) -> ProducerResult<()>
    where
        F: FnOnce(&mut File) -> std::io::Result<()> + Send + 'static,
    {
        let path = self.path.clone();
        let file = Arc::clone(&self.file);

        tokio::task::spawn_blocking(move || -> ProducerResult<()> {
            let mut guard = file
                .lock()
                .map_err(|_| ProducerError::sink(format!("{} lock poisoned", path.display())))?;
            if guard.is_none() {
                *guard = Some(Self::open(&path)?);
            }
            match guard.as_mut() {
                Some(handle) => op(handle).map_err(ProducerError::from),
                None => Err(ProducerError::sink(format!("{} is not open", path.display()))),
            }
        })
        .await?
    }
}

#[async_trait]
impl RecordSink for JsonlFileSink {
    async fn prepare(&self) -> ProducerResult<()> {
        self.with_file(|_| Ok(())).await?;
        process_debug!(ProcessId::Orchestrator, "📁 Output file ready: {}", self.path.display());
        Ok(())
    }

    async fn append(&self, record: &QaRecord) -> ProducerResult<()> {
        let line = record.to_json_line()?;
        self.with_file(move |file| file.write_all(line.as_bytes())).await
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
