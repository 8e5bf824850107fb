/// JSON document store holding courses, the departmental timetable and per-user data
mod error;
mod types;

pub use error::StoreError;
pub use types::{
    Course, Lecture, QuietHours, Reminder, ReminderPreferences, ReminderStatus, ReminderType,
    ScheduleSlot, StoreDocument, TimetableEntry,
};

use chrono::Utc;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub struct JsonStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles of this process.
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Opens the store at `path`, writing the seeded document if the file is
    /// absent or unreadable.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };
        {
            let _guard = store.write_lock.lock().await;
            store.load_or_init().await?;
        }
        Ok(store)
    }

    /// Creates (or overwrites) the store at `path` with the given document.
    pub async fn create(
        path: impl Into<PathBuf>,
        document: &StoreDocument,
    ) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };
        store.write(document).await?;
        Ok(store)
    }

    /// Returns a snapshot of the current document.
    ///
    /// Reseeding a missing or corrupt file happens under the write lock.
    pub async fn read(&self) -> Result<StoreDocument, StoreError> {
        if let Some(document) = self.try_load().await? {
            return Ok(document);
        }
        let _guard = self.write_lock.lock().await;
        self.load_or_init().await
    }

    /// Reads the document, applies `f` and writes the result back.
    ///
    /// Nothing is written when `f` returns an error.
    pub async fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut StoreDocument) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load_or_init().await?;
        let output = f(&mut document)?;
        self.write(&document).await?;
        Ok(output)
    }

    /// `None` when the file is missing or does not parse.
    async fn try_load(&self) -> Result<Option<StoreDocument>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw).ok()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    /// Callers must hold `write_lock`.
    async fn load_or_init(&self) -> Result<StoreDocument, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(document) => Ok(document),
                Err(e) => {
                    let backup = self.path.with_extension("json.corrupt");
                    warn!(
                        "Database at {} is not valid JSON ({}), moving it to {} and reseeding",
                        self.path.display(),
                        e,
                        backup.display()
                    );
                    tokio::fs::rename(&self.path, &backup)
                        .await
                        .map_err(|e| StoreError::io(&backup, e))?;
                    self.init().await
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.init().await,
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    async fn init(&self) -> Result<StoreDocument, StoreError> {
        info!("Initializing database at {}", self.path.display());
        let document = StoreDocument::seeded();
        self.write(&document).await?;
        Ok(document)
    }

    async fn write(&self, document: &StoreDocument) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| StoreError::io(dir, e))?;
        }

        let json = serde_json::to_string_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))
    }
}

/// Generates a millisecond-timestamp id that `taken` does not report as used.
pub fn fresh_id(taken: impl Fn(&str) -> bool) -> String {
    let mut millis = Utc::now().timestamp_millis();
    loop {
        let id = millis.to_string();
        if !taken(&id) {
            return id;
        }
        millis += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir()
            .join(format!("{prefix}-{nanos}"))
            .join("db.json")
    }

    #[tokio::test]
    async fn test_open_seeds_missing_file() {
        let path = temp_path("store-seed");
        let store = JsonStore::open(&path).await.unwrap();

        assert!(path.exists());
        let doc = store.read().await.unwrap();
        assert_eq!(doc.courses.len(), 2);
        assert_eq!(doc.departmental_timetable.len(), 2);
    }

    #[tokio::test]
    async fn test_update_persists_and_error_skips_write() {
        let path = temp_path("store-update");
        let store = JsonStore::create(&path, &StoreDocument::empty()).await.unwrap();

        store
            .update(|doc| {
                doc.user_lectures.insert("u1".to_string(), Vec::new());
                Ok::<_, StoreError>(())
            })
            .await
            .unwrap();

        let failed: Result<(), StoreError> = store
            .update(|doc| {
                doc.user_lectures.clear();
                Err(StoreError::Json(
                    serde_json::from_str::<u8>("x").unwrap_err(),
                ))
            })
            .await;
        assert!(failed.is_err());

        let reopened = JsonStore::open(&path).await.unwrap();
        assert!(reopened.read().await.unwrap().user_lectures.contains_key("u1"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reseeded() {
        let path = temp_path("store-corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonStore::open(&path).await.unwrap();
        assert_eq!(store.read().await.unwrap().courses.len(), 2);
        assert!(path.with_extension("json.corrupt").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reads_and_updates_on_corrupt_file() {
        let path = temp_path("store-race");
        let store = Arc::new(JsonStore::create(&path, &StoreDocument::empty()).await.unwrap());
        std::fs::write(&path, "{not json").unwrap();

        let mut tasks = Vec::new();
        for i in 0..8 {
            let reader = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                reader.read().await.map(|_| ())
            }));
            let writer = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                writer
                    .update(|doc| {
                        doc.user_lectures.insert(format!("user-{i}"), Vec::new());
                        Ok::<_, StoreError>(())
                    })
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let doc = store.read().await.unwrap();
        assert_eq!(doc.user_lectures.len(), 8);
        assert_eq!(doc.courses.len(), 2);
        assert!(path.with_extension("json.corrupt").exists());
    }

    #[test]
    fn test_fresh_id_skips_taken() {
        let first = fresh_id(|_| false);
        let second = fresh_id(|id| id == first || id < first.as_str());
        assert_ne!(first, second);
    }
}
