use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

/// Models fence their output in markdown despite instructions often enough
/// that stripping is cheaper than re-prompting.
static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```(?:json)?\s*|\s*```$").expect("static regex is valid"));

/// Extract the ranked id list from raw completion text.
///
/// Total function: malformed model output is an expected condition, so any
/// input that is not a JSON array of non-negative integers yields an empty
/// list instead of an error. Duplicate ids keep their first occurrence.
pub fn matched_ids(raw: &str) -> Vec<u64> {
    let cleaned = CODE_FENCE.replace_all(raw.trim(), "");

    let value: Value = match serde_json::from_str(cleaned.trim()) {
        Ok(value) => value,
        Err(_) => {
            log::warn!("failed to parse completion as JSON: {raw:?}");
            return Vec::new();
        }
    };

    let Some(items) = value.as_array() else {
        log::warn!("completion parsed but is not an array: {raw:?}");
        return Vec::new();
    };

    let mut seen = HashSet::with_capacity(items.len());
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let Some(id) = item.as_u64() else {
            log::warn!("completion array has a non-integer element: {raw:?}");
            return Vec::new();
        };
        if seen.insert(id) {
            ids.push(id);
        }
    }

    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_array() {
        assert_eq!(matched_ids("[1, 5, 12, 3]"), vec![1, 5, 12, 3]);
        assert_eq!(matched_ids("  [1,2]  "), vec![1, 2]);
        assert_eq!(matched_ids("[]"), Vec::<u64>::new());
    }

    #[test]
    fn test_fenced_array() {
        assert_eq!(matched_ids("```json\n[1,2]\n```"), vec![1, 2]);
        assert_eq!(matched_ids("```\n[3]\n```"), vec![3]);
        assert_eq!(matched_ids("```json[4, 5]```"), vec![4, 5]);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        assert_eq!(matched_ids("[2, 1, 2, 3, 1]"), vec![2, 1, 3]);
    }

    #[test]
    fn test_garbage_yields_empty() {
        assert_eq!(matched_ids("no matches"), Vec::<u64>::new());
        assert_eq!(matched_ids(""), Vec::<u64>::new());
        assert_eq!(matched_ids("[1, 2"), Vec::<u64>::new());
        assert_eq!(matched_ids("Sure! Here you go: [1, 2]"), Vec::<u64>::new());
    }

    #[test]
    fn test_wrong_shapes_yield_empty() {
        // object instead of array
        assert_eq!(matched_ids(r#"{"ids": [1, 2]}"#), Vec::<u64>::new());
        // non-integer elements poison the whole list
        assert_eq!(matched_ids(r#"[1, "2", 3]"#), Vec::<u64>::new());
        assert_eq!(matched_ids("[1.5, 2]"), Vec::<u64>::new());
        assert_eq!(matched_ids("[-1, 2]"), Vec::<u64>::new());
        assert_eq!(matched_ids("[null]"), Vec::<u64>::new());
    }
}
