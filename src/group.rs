//! Dimension grouping.
//!
//! Records are partitioned into buckets keyed by a dimension value. Buckets
//! live in an [`IndexMap`], so iteration follows the order in which each key
//! was first seen in the input. A record whose key cannot be resolved lands
//! in the [`UNKNOWN`] bucket; nothing is ever dropped.

use indexmap::{IndexMap, IndexSet};

use crate::models::{AttendanceRecord, GradeRecord, HasJoined, TeachingRecord};
use crate::stats::Category;

pub const UNKNOWN: &str = "Unknown";

/// ASCII unit separator. Never present in ids or user-entered names.
pub const KEY_SEPARATOR: char = '\u{1f}';

pub type Buckets<'a, T> = IndexMap<String, Vec<&'a T>>;

pub fn group<'a, T, I, F>(records: I, key_fn: F) -> Buckets<'a, T>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> Option<String>,
{
    records
        .into_iter()
        .fold(IndexMap::new(), |mut buckets, record| {
            buckets
                .entry(resolve_key(key_fn(record)))
                .or_insert_with(Vec::new)
                .push(record);
            buckets
        })
}

fn resolve_key(key: Option<String>) -> String {
    match key {
        Some(key) if !key.trim().is_empty() => key,
        _ => UNKNOWN.to_string(),
    }
}

/// Joins identifier parts into a single key. Missing parts become
/// [`UNKNOWN`] so the number of segments is always `parts.len()`.
pub fn composite_key(parts: &[Option<String>]) -> String {
    parts
        .iter()
        .map(|part| match part {
            Some(part) if !part.trim().is_empty() => part.as_str(),
            _ => UNKNOWN,
        })
        .collect::<Vec<_>>()
        .join(&KEY_SEPARATOR.to_string())
}

/// Number of distinct resolved keys; unresolved values are not counted.
pub fn distinct_count<I>(keys: I) -> usize
where
    I: IntoIterator<Item = Option<String>>,
{
    keys.into_iter().flatten().collect::<IndexSet<_>>().len()
}

pub fn unknown_count<T>(buckets: &Buckets<'_, T>) -> usize {
    buckets.get(UNKNOWN).map_or(0, Vec::len)
}

/// Key functions for the fixed set of report dimensions.
pub mod keys {
    use super::*;

    /// Student id, falling back to the display name when only the name
    /// survived the join.
    pub fn student<T: HasJoined>(record: &T) -> Option<String> {
        let joined = record.joined();
        joined
            .student_id
            .map(|id| id.to_string())
            .or_else(|| joined.student_name.clone())
    }

    pub fn subject<T: HasJoined>(record: &T) -> Option<String> {
        record.joined().subject_name.clone()
    }

    pub fn class<T: HasJoined>(record: &T) -> Option<String> {
        record.joined().class_name.clone()
    }

    /// Student within class, built from ids only. Unresolved students have
    /// no key.
    pub fn class_student<T: HasJoined>(record: &T) -> Option<String> {
        let joined = record.joined();
        let student_id = joined.student_id?;
        Some(composite_key(&[
            joined.class_id.map(|id| id.to_string()),
            Some(student_id.to_string()),
        ]))
    }

    pub fn grade_type(record: &GradeRecord) -> Option<String> {
        record.grade_type.map(|grade_type| grade_type.label().to_string())
    }

    pub fn status(record: &AttendanceRecord) -> Option<String> {
        Some(record.status.label().to_string())
    }

    pub fn date(record: &AttendanceRecord) -> Option<String> {
        Some(record.date.format("%Y-%m-%d").to_string())
    }

    pub fn teacher(record: &TeachingRecord) -> Option<String> {
        record
            .teacher_id
            .map(|id| id.to_string())
            .or_else(|| record.teacher_name.clone())
    }

    /// Class and subject taught together, built from ids only.
    pub fn teaching_load(record: &TeachingRecord) -> Option<String> {
        if record.class_id.is_none() && record.subject_id.is_none() {
            return None;
        }
        Some(composite_key(&[
            record.class_id.map(|id| id.to_string()),
            record.subject_id.map(|id| id.to_string()),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, Joined};
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn split_composite(key: &str) -> Vec<&str> {
        key.split(KEY_SEPARATOR).collect()
    }

    fn mark(student: Option<(Uuid, &str)>, day: u32) -> AttendanceRecord {
        AttendanceRecord {
            joined: Joined {
                student_id: student.map(|(id, _)| id),
                student_name: student.map(|(_, name)| name.to_string()),
                ..Joined::default()
            },
            status: AttendanceStatus::Present,
            date: NaiveDate::from_ymd_opt(2026, 2, day).expect("valid date"),
        }
    }

    #[test]
    fn buckets_follow_first_occurrence_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let records = vec![
            mark(Some((b, "Beatriz Ortega")), 3),
            mark(Some((a, "Ade Okafor")), 3),
            mark(Some((b, "Beatriz Ortega")), 4),
            mark(None, 4),
            mark(Some((a, "Ade Okafor")), 5),
        ];

        let buckets = group(&records, keys::student);
        let order: Vec<_> = buckets.keys().cloned().collect();
        assert_eq!(order, vec![b.to_string(), a.to_string(), UNKNOWN.to_string()]);
        assert_eq!(buckets[&b.to_string()].len(), 2);
        assert_eq!(unknown_count(&buckets), 1);

        let again: Vec<_> = group(&records, keys::student).keys().cloned().collect();
        assert_eq!(order, again);
    }

    #[test]
    fn blank_keys_fall_into_unknown() {
        let mut record = mark(None, 2);
        record.joined.subject_name = Some("   ".to_string());
        let records = vec![record, mark(None, 3)];

        let buckets = group(&records, keys::subject);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[UNKNOWN].len(), 2);
    }

    #[test]
    fn same_display_name_does_not_merge_students() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let records = vec![
            mark(Some((first, "Sam Lee")), 2),
            mark(Some((second, "Sam Lee")), 2),
        ];
        assert_eq!(group(&records, keys::student).len(), 2);
    }

    #[test]
    fn composite_keys_keep_segments_apart() {
        let key = composite_key(&[Some("ab".to_string()), Some("c".to_string())]);
        let other = composite_key(&[Some("a".to_string()), Some("bc".to_string())]);
        assert_ne!(key, other);
        assert_eq!(split_composite(&key), vec!["ab", "c"]);

        let partial = composite_key(&[None, Some("c".to_string())]);
        assert_eq!(split_composite(&partial), vec![UNKNOWN, "c"]);
    }

    #[test]
    fn blank_composite_parts_resolve_to_unknown() {
        let key = composite_key(&[Some("  ".to_string()), Some(String::new())]);
        assert_eq!(split_composite(&key), vec![UNKNOWN, UNKNOWN]);
    }

    #[test]
    fn distinct_count_ignores_unresolved_values() {
        let values = vec![
            Some("x".to_string()),
            None,
            Some("y".to_string()),
            Some("x".to_string()),
        ];
        assert_eq!(distinct_count(values), 2);
    }

    #[test]
    fn empty_input_yields_no_buckets() {
        let records: Vec<AttendanceRecord> = Vec::new();
        assert!(group(&records, keys::date).is_empty());
    }

    proptest! {
        #[test]
        fn every_record_lands_in_exactly_one_bucket(
            keys in proptest::collection::vec(proptest::option::of("[a-d]{0,2}"), 0..64)
        ) {
            let buckets = group(&keys, |key: &Option<String>| key.clone());
            let total: usize = buckets.values().map(Vec::len).sum();
            prop_assert_eq!(total, keys.len());

            let mut expected: Vec<String> = Vec::new();
            for key in &keys {
                let resolved = resolve_key(key.clone());
                if !expected.contains(&resolved) {
                    expected.push(resolved);
                }
            }
            let order: Vec<String> = buckets.keys().cloned().collect();
            prop_assert_eq!(order, expected);
        }
    }
}
