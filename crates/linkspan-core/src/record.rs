//! Extraction output: per-file ordered lists of named line ranges.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// One extracted definition.
///
/// `name` is empty when the link name could not be resolved; the range is
/// still reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub start: u32,
    pub end: u32,
}

impl Record {
    /// Build a record, checking `1 <= start <= end`.
    pub fn new(name: impl Into<String>, start: u32, end: u32) -> Result<Self, CoreError> {
        let name = name.into();
        if start == 0 || start > end {
            return Err(CoreError::InvalidRange { name, start, end });
        }
        Ok(Self { name, start, end })
    }
}

/// Records grouped by defining file path.
///
/// A path is present only once a record has been pushed for it. Records keep
/// the order they were pushed in; nothing is sorted or deduplicated. Keys
/// iterate in sorted order so serialized output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRecordSet {
    files: BTreeMap<String, Vec<Record>>,
}

impl FileRecordSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` to the sequence for `file`.
    pub fn push(&mut self, file: &str, record: Record) {
        if let Some(records) = self.files.get_mut(file) {
            records.push(record);
        } else {
            self.files.insert(file.to_string(), vec![record]);
        }
    }

    /// Append every record of `other`, file by file, after the existing ones.
    pub fn merge(&mut self, other: Self) {
        for (file, records) in other.files {
            self.files.entry(file).or_default().extend(records);
        }
    }

    #[must_use]
    pub fn get(&self, file: &str) -> Option<&[Record]> {
        self.files.get(file).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.files
            .iter()
            .map(|(file, records)| (file.as_str(), records.as_slice()))
    }

    /// Number of files with at least one record.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Total number of records across all files.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Serialize with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rec(name: &str, start: u32, end: u32) -> Record {
        Record::new(name, start, end).expect("valid range")
    }

    #[test]
    fn record_rejects_inverted_range() {
        assert!(Record::new("f", 5, 4).is_err());
        assert!(Record::new("f", 0, 4).is_err());
        assert!(Record::new("", 4, 4).is_ok());
    }

    #[test]
    fn push_keeps_order_and_duplicates() {
        let mut set = FileRecordSet::new();
        set.push("/a.cpp", rec("_Z1fv", 3, 5));
        set.push("/a.cpp", rec("_Z1fv", 3, 5));
        set.push("/a.cpp", rec("_Z1gv", 1, 2));

        let records = set.get("/a.cpp").expect("file present");
        assert_eq!(
            records,
            &[rec("_Z1fv", 3, 5), rec("_Z1fv", 3, 5), rec("_Z1gv", 1, 2)]
        );
        assert_eq!(set.file_count(), 1);
        assert_eq!(set.record_count(), 3);
    }

    #[test]
    fn merge_appends_after_existing_records() {
        let mut first = FileRecordSet::new();
        first.push("/a.cpp", rec("one", 1, 1));
        let mut second = FileRecordSet::new();
        second.push("/a.cpp", rec("two", 2, 2));
        second.push("/b.cpp", rec("three", 3, 3));

        first.merge(second);
        assert_eq!(first.get("/a.cpp"), Some(&[rec("one", 1, 1), rec("two", 2, 2)][..]));
        assert_eq!(first.get("/b.cpp"), Some(&[rec("three", 3, 3)][..]));
    }

    #[test]
    fn json_shape_uses_two_space_indent() {
        let mut set = FileRecordSet::new();
        set.push("/a.cpp", rec("_Z3foov", 1, 3));
        let json = set.to_json_pretty().expect("serializes");
        assert_eq!(
            json,
            "{\n  \"/a.cpp\": [\n    {\n      \"name\": \"_Z3foov\",\n      \"start\": 1,\n      \"end\": 3\n    }\n  ]\n}"
        );
    }

    #[test]
    fn empty_set_serializes_to_empty_object() {
        assert_eq!(FileRecordSet::new().to_json_pretty().expect("serializes"), "{}");
    }
}
