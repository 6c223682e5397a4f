//! Diagnostic log of authoring changes
//!
//! Records are informational only; reverting edits is the job of
//! [`super::UndoHistory`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use void_core::{IdGenerator, Timestamp};
use void_scene::{NodeId, PlainValue};

void_core::sequence_id!(
    /// Identifier of a change record
    ChangeId,
    "change"
);

/// Category of a recorded change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Property,
    Hierarchy,
    Component,
    Script,
}

/// One recorded change
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeRecord {
    pub id: ChangeId,
    pub kind: ChangeKind,
    pub target: NodeId,
    pub description: String,
    pub old_value: Option<PlainValue>,
    pub new_value: Option<PlainValue>,
    pub timestamp: Timestamp,
    pub undoable: bool,
}

/// Bounded, append-only change log; the oldest records are trimmed first
#[derive(Debug)]
pub struct ChangeLog {
    records: VecDeque<ChangeRecord>,
    max_records: usize,
    ids: IdGenerator,
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RECORDS)
    }
}

impl ChangeLog {
    pub const DEFAULT_MAX_RECORDS: usize = 1000;

    pub fn new(max_records: usize) -> Self {
        Self {
            records: VecDeque::new(),
            max_records: max_records.max(1),
            ids: IdGenerator::new(),
        }
    }

    /// Append a record
    pub fn record(
        &mut self,
        kind: ChangeKind,
        target: NodeId,
        description: impl Into<String>,
        old_value: Option<PlainValue>,
        new_value: Option<PlainValue>,
        undoable: bool,
    ) -> ChangeId {
        let id = ChangeId(self.ids.next());
        let record = ChangeRecord {
            id,
            kind,
            target,
            description: description.into(),
            old_value,
            new_value,
            timestamp: Timestamp::now(),
            undoable,
        };
        log::trace!("{} {:?} on {}: {}", id, kind, record.target, record.description);

        self.records.push_back(record);
        while self.records.len() > self.max_records {
            self.records.pop_front();
        }
        id
    }

    /// All retained records, oldest first
    pub fn records(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter()
    }

    pub fn latest(&self) -> Option<&ChangeRecord> {
        self.records.back()
    }

    /// Records touching one node, oldest first
    pub fn for_target<'a>(&'a self, target: &'a NodeId) -> impl Iterator<Item = &'a ChangeRecord> + 'a {
        self.records.iter().filter(move |r| r.target == *target)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_and_query() {
        let mut log = ChangeLog::default();
        let a = NodeId::from("a");
        let b = NodeId::from("b");

        log.record(ChangeKind::Property, a.clone(), "move", Some(json!(1)), Some(json!(2)), true);
        log.record(ChangeKind::Hierarchy, b.clone(), "reparent", None, None, true);
        let last = log.record(ChangeKind::Script, a.clone(), "attach", None, None, false);

        assert_eq!(log.len(), 3);
        assert_eq!(log.latest().map(|r| r.id), Some(last));
        assert_eq!(log.for_target(&a).count(), 2);
        assert_eq!(log.for_target(&b).next().unwrap().kind, ChangeKind::Hierarchy);
    }

    #[test]
    fn test_oldest_trimmed() {
        let mut log = ChangeLog::new(2);
        for i in 0..5 {
            log.record(ChangeKind::Property, NodeId::from("n"), format!("edit {}", i), None, None, true);
        }
        let descriptions: Vec<&str> = log.records().map(|r| r.description.as_str()).collect();
        assert_eq!(descriptions, vec!["edit 3", "edit 4"]);

        log.clear();
        assert!(log.is_empty());
    }
}
