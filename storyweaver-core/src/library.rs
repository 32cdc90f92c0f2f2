//! Rules for the saved-story list. Storage lives elsewhere; these functions only
//! compute the next list value from the current one.

use serde::{Deserialize, Serialize};

/// Key under which the list is persisted.
pub const SAVED_STORIES_KEY: &str = "storyWeaver-savedStories";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedStoryRecord {
    pub id: i64,
    pub idea: String,
    pub genre: String,
    pub story: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(SavedStoryRecord),
    AlreadySaved,
}

pub fn is_duplicate(records: &[SavedStoryRecord], idea: &str, story: &str) -> bool {
    records.iter().any(|r| r.idea == idea && r.story == story)
}

/// Prepends `record` (newest first) unless an identical (idea, story) pair exists.
pub fn insert_unique(records: &mut Vec<SavedStoryRecord>, record: SavedStoryRecord) -> SaveOutcome {
    if is_duplicate(records, &record.idea, &record.story) {
        return SaveOutcome::AlreadySaved;
    }
    records.insert(0, record.clone());
    SaveOutcome::Saved(record)
}

/// Removes the record with `id`. Returns whether anything was removed.
pub fn remove_by_id(records: &mut Vec<SavedStoryRecord>, id: i64) -> bool {
    let before = records.len();
    records.retain(|r| r.id != id);
    records.len() != before
}

/// Timestamp-derived id, strictly greater than every existing id.
pub fn next_record_id(now_unix_ms: i64, records: &[SavedStoryRecord]) -> i64 {
    match records.iter().map(|r| r.id).max() {
        Some(max) if max >= now_unix_ms => max.saturating_add(1),
        _ => now_unix_ms,
    }
}

/// Blank content is an empty list. Anything else must be a well-formed array.
pub fn parse_records(raw: &str) -> serde_json::Result<Vec<SavedStoryRecord>> {
    if raw.trim().is_empty() {
        return Ok(vec![]);
    }
    serde_json::from_str(raw)
}

pub fn encode_records(records: &[SavedStoryRecord]) -> serde_json::Result<String> {
    serde_json::to_string(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, idea: &str, story: &str) -> SavedStoryRecord {
        SavedStoryRecord {
            id,
            idea: idea.into(),
            genre: "General".into(),
            story: story.into(),
        }
    }

    #[test]
    fn saving_same_pair_twice_is_a_noop() {
        let mut list = vec![];
        assert!(matches!(
            insert_unique(&mut list, record(1, "idea", "story")),
            SaveOutcome::Saved(_)
        ));
        let snapshot = list.clone();
        assert_eq!(
            insert_unique(&mut list, record(2, "idea", "story")),
            SaveOutcome::AlreadySaved
        );
        assert_eq!(list, snapshot);
    }

    #[test]
    fn newest_record_goes_first() {
        let mut list = vec![record(1, "a", "x")];
        insert_unique(&mut list, record(2, "b", "y"));
        assert_eq!(list.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn remove_preserves_order_of_the_rest() {
        let mut list = vec![record(4, "d", ""), record(3, "c", ""), record(2, "b", ""), record(1, "a", "")];
        assert!(remove_by_id(&mut list, 3));
        assert_eq!(list.iter().map(|r| r.id).collect::<Vec<_>>(), vec![4, 2, 1]);
        assert!(!remove_by_id(&mut list, 99));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let list = vec![record(1_000, "a", "x")];
        assert_eq!(next_record_id(1_000, &list), 1_001);
        assert_eq!(next_record_id(2_000, &list), 2_000);
        assert_eq!(next_record_id(5, &[]), 5);
    }

    #[test]
    fn parse_accepts_blank_and_arrays() {
        assert!(parse_records("").unwrap().is_empty());
        assert!(parse_records("  \n").unwrap().is_empty());
        assert!(parse_records("[]").unwrap().is_empty());

        let raw = r#"[{"id":1700000000000,"idea":"i","genre":"Gothic","story":"s"}]"#;
        let list = parse_records(raw).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].genre, "Gothic");
    }

    #[test]
    fn parse_rejects_anything_it_cannot_read_fully() {
        assert!(parse_records("{not json").is_err());
        assert!(parse_records("{\"id\":1}").is_err());

        // One fractional id poisons the whole list.
        let raw = r#"[{"id":1,"idea":"old","genre":"General","story":"keep"},
                      {"id":1.5,"idea":"odd","genre":"General","story":"x"}]"#;
        assert!(parse_records(raw).is_err());
    }
}
