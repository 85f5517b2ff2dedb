//! ChangeLog accumulator: folds ordered change events into the current snapshot.
//!
//! Events are applied strictly in arrival order. Rejected events never abort a
//! batch; they are logged and reported back in the [`BatchReport`]. Subscribers
//! hear about a batch once, after all of its events are applied, and only if the
//! batch changed something.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::ChangeError;
use crate::ids::Key;
use crate::record::{FieldValue, Record, Snapshot};

/// One event from the data feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    Added(Record),
    Modified(Record),
    Removed { key: Key },
}

impl ChangeEvent {
    pub fn added(record: Record) -> Self {
        ChangeEvent::Added(record)
    }

    pub fn modified(record: Record) -> Self {
        ChangeEvent::Modified(record)
    }

    pub fn removed(key: impl Into<Key>) -> Self {
        ChangeEvent::Removed { key: key.into() }
    }

    pub fn key(&self) -> &Key {
        match self {
            ChangeEvent::Added(r) | ChangeEvent::Modified(r) => &r.key,
            ChangeEvent::Removed { key } => key,
        }
    }
}

/// What to do with a `Modified` event for a key the snapshot does not hold.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifyPolicy {
    /// Insert the record (lenient upsert).
    #[default]
    Upsert,
    /// Leave the snapshot alone and report `UnknownKey`.
    Ignore,
}

/// Outcome of applying a batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    /// Whether any event in the batch changed the snapshot.
    pub changed: bool,
    /// Snapshot version after the batch.
    pub version: u64,
    /// Events that were not applied, with the reason.
    pub rejected: Vec<(ChangeEvent, ChangeError)>,
}

/// Identifies a registered snapshot listener.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

type Listener = Box<dyn FnMut(&Snapshot, u64)>;

/// Owns the snapshot and the only code path that mutates it.
pub struct ChangeLog {
    snapshot: Snapshot,
    version: u64,
    policy: ModifyPolicy,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_sub: u32,
}

impl std::fmt::Debug for ChangeLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeLog")
            .field("snapshot", &self.snapshot)
            .field("version", &self.version)
            .field("policy", &self.policy)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new(ModifyPolicy::default())
    }
}

impl ChangeLog {
    pub fn new(policy: ModifyPolicy) -> Self {
        Self {
            snapshot: Snapshot::new(),
            version: 0,
            policy,
            listeners: Vec::new(),
            next_sub: 0,
        }
    }

    #[inline]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Register a listener called with the snapshot after every changing batch.
    pub fn subscribe(&mut self, listener: impl FnMut(&Snapshot, u64) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_sub);
        self.next_sub = self.next_sub.wrapping_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Apply a single event (a batch of one) and return the resulting snapshot.
    pub fn apply(&mut self, event: ChangeEvent) -> Result<&Snapshot, ChangeError> {
        let mut report = self.apply_batch(std::iter::once(event));
        match report.rejected.pop() {
            Some((_, err)) => Err(err),
            None => Ok(&self.snapshot),
        }
    }

    /// Apply events in order, then notify subscribers once if anything changed.
    pub fn apply_batch(&mut self, events: impl IntoIterator<Item = ChangeEvent>) -> BatchReport {
        let mut report = BatchReport::default();
        for event in events {
            match self.fold(&event) {
                Ok(()) => report.changed = true,
                Err(err) => {
                    match &err {
                        ChangeError::DuplicateKey(_) => warn!("changelog: {err}"),
                        ChangeError::UnknownKey(_) => debug!("changelog: ignoring event, {err}"),
                    }
                    report.rejected.push((event, err));
                }
            }
        }
        if report.changed {
            self.version = self.version.wrapping_add(1);
            for (_, listener) in self.listeners.iter_mut() {
                listener(&self.snapshot, self.version);
            }
        }
        report.version = self.version;
        report
    }

    fn fold(&mut self, event: &ChangeEvent) -> Result<(), ChangeError> {
        match event {
            ChangeEvent::Added(record) => self.snapshot.insert_new(record.clone()),
            ChangeEvent::Modified(record) => {
                if self.snapshot.replace(record.clone()) {
                    return Ok(());
                }
                match self.policy {
                    ModifyPolicy::Upsert => {
                        debug!("changelog: modified unknown '{}', inserting", record.key);
                        self.snapshot.insert_new(record.clone())
                    }
                    ModifyPolicy::Ignore => Err(ChangeError::UnknownKey(record.key.clone())),
                }
            }
            ChangeEvent::Removed { key } => match self.snapshot.remove(key) {
                Some(_) => Ok(()),
                None => Err(ChangeError::UnknownKey(key.clone())),
            },
        }
    }
}

/// Convenience constructor used by feeds and tests: `record("k", [("cost", 10.0.into())])`.
pub fn record<I, F>(key: impl Into<Key>, fields: I) -> Record
where
    I: IntoIterator<Item = (F, FieldValue)>,
    F: Into<String>,
{
    let mut r = Record::new(key);
    for (name, value) in fields {
        r.fields.insert(name.into(), value);
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn expense(key: &str, cost: f64) -> Record {
        Record::new(key).with("name", key).with("cost", cost)
    }

    #[test]
    fn added_duplicate_keeps_prior_record() {
        let mut log = ChangeLog::default();
        log.apply(ChangeEvent::added(expense("a", 1.0))).unwrap();
        let err = log.apply(ChangeEvent::added(expense("a", 99.0))).unwrap_err();
        assert_eq!(err, ChangeError::DuplicateKey(Key::from("a")));
        assert_eq!(log.snapshot().len(), 1);
        assert_eq!(log.snapshot().get(&Key::from("a")).unwrap().number("cost"), Some(1.0));
    }

    #[test]
    fn modified_replaces_in_place_and_upserts_unknown() {
        let mut log = ChangeLog::default();
        log.apply_batch(vec![
            ChangeEvent::added(expense("a", 1.0)),
            ChangeEvent::added(expense("b", 2.0)),
        ]);
        log.apply(ChangeEvent::modified(expense("a", 5.0))).unwrap();
        let keys: Vec<_> = log.snapshot().keys().map(|k| k.as_str().to_string()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(log.snapshot().get(&Key::from("a")).unwrap().number("cost"), Some(5.0));

        log.apply(ChangeEvent::modified(expense("c", 3.0))).unwrap();
        assert!(log.snapshot().contains_key(&Key::from("c")));
    }

    #[test]
    fn ignore_policy_reports_unknown_modified() {
        let mut log = ChangeLog::new(ModifyPolicy::Ignore);
        let err = log.apply(ChangeEvent::modified(expense("zz", 3.0))).unwrap_err();
        assert_eq!(err, ChangeError::UnknownKey(Key::from("zz")));
        assert!(log.snapshot().is_empty());
        assert_eq!(log.version(), 0);
    }

    #[test]
    fn removed_unknown_is_a_noop() {
        let mut log = ChangeLog::default();
        log.apply(ChangeEvent::added(expense("a", 1.0))).unwrap();
        let report = log.apply_batch(vec![ChangeEvent::removed("nope")]);
        assert!(!report.changed);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(log.snapshot().len(), 1);
    }

    #[test]
    fn subscribers_notified_once_per_changing_batch() {
        let mut log = ChangeLog::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = log.subscribe(move |snap, version| sink.borrow_mut().push((snap.len(), version)));

        log.apply_batch(vec![
            ChangeEvent::added(expense("a", 1.0)),
            ChangeEvent::added(expense("b", 2.0)),
            ChangeEvent::added(expense("c", 3.0)),
        ]);
        log.apply_batch(vec![ChangeEvent::removed("missing")]);
        log.apply_batch(vec![ChangeEvent::removed("a")]);
        assert_eq!(*seen.borrow(), vec![(3, 1), (2, 2)]);

        assert!(log.unsubscribe(id));
        log.apply_batch(vec![ChangeEvent::removed("b")]);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn wire_format_round_trips_through_serde() {
        let ev: ChangeEvent = serde_json::from_value(serde_json::json!({
            "kind": "added", "key": "doc1", "fields": { "name": "rent", "cost": 500 }
        }))
        .unwrap();
        assert_eq!(ev.key(), &Key::from("doc1"));
        let ev: ChangeEvent =
            serde_json::from_value(serde_json::json!({ "kind": "removed", "key": "doc1" })).unwrap();
        assert_eq!(ev, ChangeEvent::removed("doc1"));
    }
}
