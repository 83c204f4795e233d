use async_trait::async_trait;
use parking_lot::Mutex;
use std::{fmt::Debug, path::PathBuf, sync::Arc};
use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tracing::debug;

use crate::{
    error::{Error, Result},
    model::WeatherObservation,
};

/// Batch append of one poll cycle's observations.
#[async_trait]
pub trait ObservationSink: Send + Sync + Debug {
    async fn add_range(&self, observations: &[WeatherObservation]) -> Result<()>;
}

/// In-process store; clones share the same backing vector.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    rows: Arc<Mutex<Vec<WeatherObservation>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<WeatherObservation> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl ObservationSink for MemorySink {
    async fn add_range(&self, observations: &[WeatherObservation]) -> Result<()> {
        self.rows.lock().extend_from_slice(observations);
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ObservationSink for JsonLinesSink {
    async fn add_range(&self, observations: &[WeatherObservation]) -> Result<()> {
        let mut buf = String::new();
        for obs in observations {
            let line = serde_json::to_string(obs).map_err(|err| Error::Persistence(err.into()))?;
            buf.push_str(&line);
            buf.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(Error::Persistence)?;
        file.write_all(buf.as_bytes()).await.map_err(Error::Persistence)?;
        file.flush().await.map_err(Error::Persistence)?;

        debug!(path = %self.path.display(), count = observations.len(), "appended observations");
        Ok(())
    }
}
