use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{apply_save, AssignerRecord, HistoryStore, StoreError};

/// Stores each assigner as `<dir>/<assigner_id>.json`
///
/// Writes go to a temporary file that is renamed over the record, so a
/// reader never sees a half-written document.
#[derive(Debug)]
pub struct JsonFileHistoryStore {
    dir: PathBuf,
    // Serializes check-and-write within this process
    write_lock: Mutex<()>,
}

impl JsonFileHistoryStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn record_path(&self, assigner_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !assigner_id.is_empty()
            && assigner_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(assigner_id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", assigner_id)))
    }

    async fn read_record(&self, path: &Path) -> Result<Option<AssignerRecord>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_record(&self, path: &Path, record: &AssignerRecord) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let bytes = serde_json::to_vec_pretty(record)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn create(&self, record: AssignerRecord) -> Result<(), StoreError> {
        let path = self.record_path(&record.id)?;
        let _guard = self.write_lock.lock().await;
        if self.read_record(&path).await?.is_some() {
            return Err(StoreError::AlreadyExists(record.id));
        }
        self.write_record(&path, &record).await?;
        tracing::info!(assigner_id = %record.id, kind = %record.kind, "Assigner created");
        Ok(())
    }

    async fn load(&self, assigner_id: &str) -> Result<Option<AssignerRecord>, StoreError> {
        let path = self.record_path(assigner_id)?;
        self.read_record(&path).await
    }

    async fn save(
        &self,
        assigner_id: &str,
        history: serde_json::Value,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let path = self.record_path(assigner_id)?;
        let _guard = self.write_lock.lock().await;
        let mut record = self
            .read_record(&path)
            .await?
            .ok_or_else(|| StoreError::NotFound(assigner_id.to_string()))?;
        let version = apply_save(&mut record, history, expected_version)?;
        self.write_record(&path, &record).await?;
        tracing::debug!(assigner_id, version, "History saved");
        Ok(version)
    }
}
