//! Saved-story operations shared by the coordinator and the command line.

use crate::error::GenerationError;
use crate::traits::StoryLibrary;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use storyweaver_core::library::{SaveOutcome, SavedStoryRecord, insert_unique, next_record_id, remove_by_id};
use storyweaver_core::types::Genre;

pub const LIBRARY_READ_FAILED: &str = "Could not read your saved stories.";
pub const LIBRARY_WRITE_FAILED: &str = "Failed to save your story library.";

/// Read-modify-write access to a [`StoryLibrary`], run on the blocking pool.
///
/// Writers only store a list they could read in full. An unreadable list is
/// left untouched and reported as a `Persistence` error.
#[derive(Clone)]
pub struct SavedStories {
    backend: Arc<dyn StoryLibrary>,
}

impl SavedStories {
    pub fn new(backend: Arc<dyn StoryLibrary>) -> Self {
        Self { backend }
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, GenerationError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn StoryLibrary) -> Result<T, GenerationError> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || f(backend.as_ref()))
            .await
            .map_err(|e| GenerationError::persistence(LIBRARY_READ_FAILED, anyhow::Error::new(e)))?
    }

    /// Newest first. Read failures degrade to an empty list.
    pub async fn list(&self) -> Vec<SavedStoryRecord> {
        let result = self
            .blocking(|lib| {
                lib.load()
                    .map_err(|e| GenerationError::persistence(LIBRARY_READ_FAILED, e))
            })
            .await;
        match result {
            Ok(records) => records,
            Err(e) => {
                log::warn!("failed to read saved stories: {}", e.log_detail());
                Vec::new()
            }
        }
    }

    pub async fn find(&self, id: i64) -> Option<SavedStoryRecord> {
        self.list().await.into_iter().find(|r| r.id == id)
    }

    pub async fn save(
        &self,
        idea: String,
        genre: Genre,
        story: String,
    ) -> Result<SaveOutcome, GenerationError> {
        let result = self
            .blocking(move |lib| {
                let mut records = lib
                    .load()
                    .map_err(|e| GenerationError::persistence(LIBRARY_READ_FAILED, e))?;
                let record = SavedStoryRecord {
                    id: next_record_id(now_unix_ms(), &records),
                    idea,
                    genre: genre.label().to_string(),
                    story,
                };
                let outcome = insert_unique(&mut records, record);
                if matches!(outcome, SaveOutcome::Saved(_)) {
                    lib.store(&records)
                        .map_err(|e| GenerationError::persistence(LIBRARY_WRITE_FAILED, e))?;
                }
                Ok((outcome, records.len()))
            })
            .await;

        match result {
            Ok((outcome, total)) => {
                if let SaveOutcome::Saved(saved) = &outcome {
                    log::info!("saved story {} ({total} in library)", saved.id);
                }
                Ok(outcome)
            }
            Err(e) => {
                log::warn!("save failed: {}", e.log_detail());
                Err(e)
            }
        }
    }

    /// Returns whether a record was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, GenerationError> {
        self.blocking(move |lib| {
            let mut records = lib
                .load()
                .map_err(|e| GenerationError::persistence(LIBRARY_READ_FAILED, e))?;
            if !remove_by_id(&mut records, id) {
                return Ok(false);
            }
            lib.store(&records)
                .map_err(|e| GenerationError::persistence(LIBRARY_WRITE_FAILED, e))?;
            Ok(true)
        })
        .await
        .inspect_err(|e| log::warn!("delete of saved story {id} failed: {}", e.log_detail()))
    }
}

fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Reads fail until `records` is set, like a library file that does not parse.
    #[derive(Default)]
    struct FlakyLibrary {
        records: Mutex<Option<Vec<SavedStoryRecord>>>,
        fail_writes: bool,
        writes: AtomicUsize,
    }

    impl StoryLibrary for FlakyLibrary {
        fn load(&self) -> anyhow::Result<Vec<SavedStoryRecord>> {
            self.records
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| anyhow::anyhow!("expected value at line 1 column 2"))
        }

        fn store(&self, records: &[SavedStoryRecord]) -> anyhow::Result<()> {
            if self.fail_writes {
                anyhow::bail!("disk full");
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            *self.records.lock().unwrap() = Some(records.to_vec());
            Ok(())
        }
    }

    fn kept() -> SavedStoryRecord {
        SavedStoryRecord {
            id: 1,
            idea: "old idea".into(),
            genre: "General".into(),
            story: "a story worth keeping".into(),
        }
    }

    #[tokio::test]
    async fn unreadable_list_is_never_overwritten() {
        let lib = Arc::new(FlakyLibrary::default());
        let stories = SavedStories::new(lib.clone());

        let err = stories
            .save("new".into(), Genre::Gothic, "new story".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(err.user_message(), LIBRARY_READ_FAILED);

        let err = stories.delete(1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);

        assert_eq!(lib.writes.load(Ordering::SeqCst), 0);
        assert!(stories.list().await.is_empty());
    }

    #[tokio::test]
    async fn failed_write_is_reported() {
        let lib = Arc::new(FlakyLibrary {
            records: Mutex::new(Some(vec![kept()])),
            fail_writes: true,
            ..FlakyLibrary::default()
        });
        let stories = SavedStories::new(lib.clone());

        let err = stories
            .save("new".into(), Genre::Mystery, "new story".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(err.user_message(), LIBRARY_WRITE_FAILED);
        assert_eq!(stories.list().await, vec![kept()]);
    }

    #[tokio::test]
    async fn find_looks_up_by_id() {
        let lib = Arc::new(FlakyLibrary {
            records: Mutex::new(Some(vec![kept()])),
            ..FlakyLibrary::default()
        });
        let stories = SavedStories::new(lib);

        assert_eq!(stories.find(1).await, Some(kept()));
        assert_eq!(stories.find(2).await, None);
    }
}
