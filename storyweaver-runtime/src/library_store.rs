use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use storyweaver_core::library::{SAVED_STORIES_KEY, SavedStoryRecord, encode_records, parse_records};
use storyweaver_engine::traits::StoryLibrary;

use crate::files::write_atomic;

/// String values keyed by name, one `{key}.json` file each under a data directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn at_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(anyhow::anyhow!("invalid storage key: {key:?}"));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context(format!("failed to read: {}", path.display()))),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        write_atomic(&path, value.as_bytes())
            .with_context(|| format!("failed to store key {key}"))
    }

}

/// The saved-story list, stored as one JSON array under a fixed key.
#[derive(Debug, Clone)]
pub struct StoryLibraryStore {
    kv: FileKeyValueStore,
}

impl StoryLibraryStore {
    pub fn new(kv: FileKeyValueStore) -> Self {
        Self { kv }
    }

    pub fn at_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileKeyValueStore::at_dir(dir))
    }
}

impl StoryLibrary for StoryLibraryStore {
    fn load(&self) -> anyhow::Result<Vec<SavedStoryRecord>> {
        let Some(raw) = self.kv.get(SAVED_STORIES_KEY)? else {
            return Ok(vec![]);
        };
        parse_records(&raw).context("saved story list is malformed")
    }

    fn store(&self, records: &[SavedStoryRecord]) -> anyhow::Result<()> {
        let json = encode_records(records).context("encode saved stories")?;
        self.kv.set(SAVED_STORIES_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use storyweaver_core::library::SaveOutcome;
    use storyweaver_core::types::Genre;
    use storyweaver_engine::{ErrorKind, SavedStories};

    fn record(id: i64, idea: &str) -> SavedStoryRecord {
        SavedStoryRecord {
            id,
            idea: idea.into(),
            genre: "Mystery".into(),
            story: format!("{idea}, told."),
        }
    }

    #[test]
    fn missing_key_reads_as_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoryLibraryStore::at_dir(dir.path());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn stores_under_the_fixed_key_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoryLibraryStore::at_dir(dir.path());
        store.store(&[record(2, "b"), record(1, "a")]).unwrap();

        let raw = fs::read_to_string(dir.path().join("storyWeaver-savedStories.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["id"], 2);
        assert_eq!(value[1]["idea"], "a");

        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![record(2, "b"), record(1, "a")]);
    }

    #[test]
    fn malformed_content_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKeyValueStore::at_dir(dir.path());
        kv.set(SAVED_STORIES_KEY, "{not json").unwrap();

        let store = StoryLibraryStore::new(kv);
        let err = store.load().unwrap_err();
        assert!(format!("{err:#}").contains("malformed"));
    }

    #[tokio::test]
    async fn saving_over_an_unreadable_list_leaves_the_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storyWeaver-savedStories.json");
        let original = r#"[{"id":1,"idea":"old idea","genre":"General","story":"a story worth keeping"},{"id":1.5,"idea":"odd","genre":"General","story":"x"}]"#;
        fs::write(&path, original).unwrap();

        let stories = SavedStories::new(Arc::new(StoryLibraryStore::at_dir(dir.path())));
        let err = stories
            .save("new".into(), Genre::Gothic, "new story".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(stories.delete(1).await.is_err());

        assert_eq!(fs::read_to_string(&path).unwrap(), original);
        assert!(stories.list().await.is_empty());
    }

    #[tokio::test]
    async fn save_then_delete_round_trips_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoryLibraryStore::at_dir(dir.path());
        store.store(&[record(1, "a")]).unwrap();

        let stories = SavedStories::new(Arc::new(store.clone()));
        let saved = match stories
            .save("b".into(), Genre::Mystery, "b, told.".into())
            .await
            .unwrap()
        {
            SaveOutcome::Saved(r) => r,
            SaveOutcome::AlreadySaved => panic!("expected a new record"),
        };
        assert_eq!(store.load().unwrap().len(), 2);
        assert_eq!(store.load().unwrap()[0], saved);

        assert!(stories.delete(saved.id).await.unwrap());
        assert_eq!(store.load().unwrap(), vec![record(1, "a")]);
    }

    #[test]
    fn rejects_keys_that_escape_the_directory() {
        let kv = FileKeyValueStore::at_dir("/tmp/unused");
        assert!(kv.get("../etc/passwd").is_err());
        assert!(kv.set("", "x").is_err());
    }
}
