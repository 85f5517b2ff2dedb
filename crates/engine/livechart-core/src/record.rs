//! Records, field values and the keyed snapshot.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ChangeError, LayoutError};
use crate::ids::Key;

/// A single named field value.
///
/// Untagged on the wire: numbers, RFC 3339 strings (dates) and other strings
/// deserialize to `Number`, `Date` and `Text` respectively.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Number(f64),
    Date(DateTime<Utc>),
    Text(String),
}

impl FieldValue {
    /// Numeric view. Numeric text is coerced, like the `+value` of form input.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Timestamp view. Accepts dates, epoch milliseconds and several textual forms.
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            FieldValue::Number(ms) => Utc.timestamp_millis_opt(*ms as i64).single(),
            FieldValue::Text(s) => parse_date_text(s),
            FieldValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

fn parse_date_text(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = DateTime::parse_from_rfc2822(s) {
        return Some(d.with_timezone(&Utc));
    }
    // Browser `Date.toString()`: "Tue Mar 05 2024 14:03:00 GMT+0100 (...)".
    let head = s.split(" (").next().unwrap_or(s).trim_end();
    if let Ok(d) = DateTime::parse_from_str(head, "%a %b %d %Y %H:%M:%S GMT%z") {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(n) = NaiveDateTime::parse_from_str(head, "%a %b %d %Y %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&n));
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
    }
    None
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Date(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Application entity with a stable key and named fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: Key,
    #[serde(default)]
    pub fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn date(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get(field).and_then(FieldValue::as_date)
    }

    /// Numeric field or a layout error naming what is wrong with it.
    pub fn require_number(&self, field: &str) -> Result<f64, LayoutError> {
        let v = self.require(field)?;
        v.as_number().ok_or_else(|| self.type_error(field, "number"))
    }

    pub fn require_text(&self, field: &str) -> Result<&str, LayoutError> {
        let v = self.require(field)?;
        v.as_text().ok_or_else(|| self.type_error(field, "string"))
    }

    pub fn require_date(&self, field: &str) -> Result<DateTime<Utc>, LayoutError> {
        let v = self.require(field)?;
        v.as_date().ok_or_else(|| self.type_error(field, "date"))
    }

    fn require(&self, field: &str) -> Result<&FieldValue, LayoutError> {
        self.get(field).ok_or_else(|| LayoutError::MissingField {
            key: self.key.clone(),
            field: field.to_string(),
        })
    }

    fn type_error(&self, field: &str, expected: &'static str) -> LayoutError {
        LayoutError::FieldType {
            key: self.key.clone(),
            field: field.to_string(),
            expected,
        }
    }
}

/// Current keyed collection of records, in arrival order. Keys are unique.
///
/// Only the change log mutates a snapshot; everyone else reads it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    records: IndexMap<Key, Record>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from records, rejecting the first duplicate key.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Result<Self, ChangeError> {
        let mut snap = Snapshot::new();
        for r in records {
            if snap.records.contains_key(&r.key) {
                return Err(ChangeError::DuplicateKey(r.key));
            }
            snap.records.insert(r.key.clone(), r);
        }
        Ok(snap)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &Key) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.records.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.records.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Records for which `keep` holds, preserving order.
    pub fn filtered(&self, mut keep: impl FnMut(&Record) -> bool) -> Snapshot {
        Snapshot {
            records: self
                .records
                .iter()
                .filter(|(_, r)| keep(r))
                .map(|(k, r)| (k.clone(), r.clone()))
                .collect(),
        }
    }

    pub(crate) fn insert_new(&mut self, record: Record) -> Result<(), ChangeError> {
        if self.records.contains_key(&record.key) {
            return Err(ChangeError::DuplicateKey(record.key));
        }
        self.records.insert(record.key.clone(), record);
        Ok(())
    }

    /// Replace in place; returns false if the key was absent (nothing written).
    pub(crate) fn replace(&mut self, record: Record) -> bool {
        match self.records.get_mut(&record.key) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, key: &Key) -> Option<Record> {
        self.records.shift_remove(key)
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Record;
    type IntoIter = indexmap::map::Values<'a, Key, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}
