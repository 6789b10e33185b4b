use std::collections::HashSet;

use common::utils::text::content_hash;
use tracing::info;

use crate::loader::Record;

/// Deterministic quality pass over freshly loaded records, applied in a
/// fixed order so the per-step counts in the logs stay comparable between
/// runs:
///
/// 1. drop records whose trimmed text is empty;
/// 2. drop records repeating an already-seen `id` (first occurrence wins);
/// 3. drop records repeating an already-seen raw-text digest;
/// 4. drop records shorter than `min_text_length` (equal length is kept).
///
/// Operates on the raw text; the post-normalization duplicate pass is a
/// separate step in the pipeline.
pub fn quality_filter(records: Vec<Record>, min_text_length: usize) -> Vec<Record> {
    let initial = records.len();

    let records: Vec<Record> = records
        .into_iter()
        .filter(|r| !r.text.trim().is_empty())
        .collect();
    let after_empty = records.len();
    info!(
        kept = after_empty,
        dropped = initial - after_empty,
        "removed empty texts"
    );

    let mut seen_ids = HashSet::new();
    let records: Vec<Record> = records
        .into_iter()
        .filter(|r| match &r.id {
            Some(id) => seen_ids.insert(id.clone()),
            None => true,
        })
        .collect();
    let after_id_dedup = records.len();
    info!(
        kept = after_id_dedup,
        dropped = after_empty - after_id_dedup,
        "removed duplicate ids"
    );

    let mut seen_hashes = HashSet::new();
    let records: Vec<Record> = records
        .into_iter()
        .filter(|r| seen_hashes.insert(content_hash(&r.text)))
        .collect();
    let after_text_dedup = records.len();
    info!(
        kept = after_text_dedup,
        dropped = after_id_dedup - after_text_dedup,
        "removed duplicate texts"
    );

    let records: Vec<Record> = records
        .into_iter()
        .filter(|r| r.text_length >= min_text_length)
        .collect();
    info!(
        kept = records.len(),
        dropped = after_text_dedup - records.len(),
        min_text_length,
        "removed short texts"
    );

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: Option<&str>, text: &str) -> Record {
        Record::new(id.map(str::to_string), text.to_string())
    }

    #[test]
    fn test_scenario_duplicate_ids_and_short_texts() {
        let records = vec![
            record(Some("1"), "тест1"),
            record(Some("1"), "тест1"),
            record(Some("2"), "достаточно длинный текст"),
        ];

        let filtered = quality_filter(records, 10);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].text, "достаточно длинный текст");
    }

    #[test]
    fn test_empty_texts_dropped() {
        let records = vec![record(None, "   "), record(None, "kept text here")];
        let filtered = quality_filter(records, 0);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].text, "kept text here");
    }

    #[test]
    fn test_first_id_occurrence_wins() {
        let records = vec![
            record(Some("a"), "the first version"),
            record(Some("a"), "the second version"),
        ];
        let filtered = quality_filter(records, 0);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].text, "the first version");
    }

    #[test]
    fn test_records_without_id_are_not_deduplicated_by_id() {
        let records = vec![
            record(None, "first anonymous row"),
            record(None, "second anonymous row"),
        ];
        let filtered = quality_filter(records, 0);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_exact_text_duplicates_dropped() {
        let records = vec![
            record(Some("1"), "same text content"),
            record(Some("2"), "same text content"),
        ];
        let filtered = quality_filter(records, 0);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id.as_deref(), Some("1"));
    }

    #[test]
    fn test_length_threshold_is_inclusive() {
        let records = vec![record(None, "1234567890"), record(None, "123456789")];
        let filtered = quality_filter(records, 10);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].text, "1234567890");
    }

    #[test]
    fn test_filtering_is_monotonic() {
        let inputs = vec![
            vec![],
            vec![record(None, "abc")],
            vec![
                record(Some("1"), "some reasonably long text"),
                record(Some("1"), "another text with same id"),
                record(None, ""),
            ],
        ];
        for records in inputs {
            let len = records.len();
            assert!(quality_filter(records, 5).len() <= len);
        }
    }

    #[test]
    fn test_empty_input_is_valid() {
        assert!(quality_filter(Vec::new(), 10).is_empty());
    }
}
