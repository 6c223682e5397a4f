//! Undo/Redo history with transaction support.
//!
//! Every authoring edit is applied first and then pushed as an
//! [`UndoOperation`] carrying closures that re-apply and revert it.
//! Operations can be grouped into transactions for atomic multi-step edits.
//!
//! A failed undo or redo leaves both stacks exactly as they were.

use std::sync::Arc;

use parking_lot::Mutex;
use void_core::{IdGenerator, Timestamp};

use crate::error::{EditorError, Result};

void_core::sequence_id!(
    /// Identifier of an undo operation
    OperationId,
    "op"
);

/// An edit action or its inverse; an `Err` means nothing was changed
pub type UndoFn = Box<dyn FnMut() -> std::result::Result<(), String> + Send>;

/// A reversible edit
pub struct UndoOperation {
    id: OperationId,
    name: String,
    execute: UndoFn,
    undo: UndoFn,
    timestamp: Timestamp,
}

impl UndoOperation {
    fn new(id: OperationId, name: String, execute: UndoFn, undo: UndoFn) -> Self {
        Self {
            id,
            name,
            execute,
            undo,
            timestamp: Timestamp::now(),
        }
    }

    #[inline]
    pub fn id(&self) -> OperationId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl std::fmt::Debug for UndoOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoOperation")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// A group of operations recorded as a single undoable unit.
pub struct Transaction {
    pub name: String,
    pub operations: Vec<UndoOperation>,
}

impl Transaction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: Vec::new(),
        }
    }

    pub fn push(&mut self, op: UndoOperation) {
        self.operations.push(op);
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Fold the members into one operation. Execute runs them in order,
    /// undo in reverse; a member failure reverts the members already run.
    fn into_closures(self) -> (String, UndoFn, UndoFn) {
        let members = Arc::new(Mutex::new(self.operations));

        let forward = Arc::clone(&members);
        let execute: UndoFn = Box::new(move || {
            let mut ops = forward.lock();
            for i in 0..ops.len() {
                if let Err(e) = (ops[i].execute)() {
                    for done in ops[..i].iter_mut().rev() {
                        if let Err(revert) = (done.undo)() {
                            log::error!("Failed to revert '{}': {}", done.name, revert);
                        }
                    }
                    return Err(e);
                }
            }
            Ok(())
        });

        let backward = members;
        let undo: UndoFn = Box::new(move || {
            let mut ops = backward.lock();
            let len = ops.len();
            for i in (0..len).rev() {
                if let Err(e) = (ops[i].undo)() {
                    for done in ops[i + 1..].iter_mut() {
                        if let Err(revert) = (done.execute)() {
                            log::error!("Failed to re-apply '{}': {}", done.name, revert);
                        }
                    }
                    return Err(e);
                }
            }
            Ok(())
        });

        (self.name, execute, undo)
    }
}

/// Undo/redo history stacks.
pub struct UndoHistory {
    /// Operations that can be undone
    undo_stack: Vec<UndoOperation>,
    /// Operations that can be redone
    redo_stack: Vec<UndoOperation>,
    /// Maximum history size
    max_size: usize,
    /// Current open transaction
    current_transaction: Option<Transaction>,
    /// Whether history has been modified since last save
    dirty: bool,
    ids: IdGenerator,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoHistory {
    /// Default maximum history size.
    pub const DEFAULT_MAX_SIZE: usize = 100;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_MAX_SIZE)
    }

    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size: max_size.max(1),
            current_transaction: None,
            dirty: false,
            ids: IdGenerator::new(),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Check if there are operations to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if there are operations to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the name of the next undo operation.
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(UndoOperation::name)
    }

    /// Get the name of the next redo operation.
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(UndoOperation::name)
    }

    /// Whether anything changed since the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark as saved (clears dirty flag).
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Begin a new transaction.
    /// Operations pushed during a transaction are grouped as one undo unit.
    pub fn begin_transaction(&mut self, name: impl Into<String>) {
        if let Some(open) = self.current_transaction.take() {
            log::warn!("Beginning transaction while '{}' is still open; committing it", open.name);
            self.commit(open);
        }
        self.current_transaction = Some(Transaction::new(name));
    }

    /// Commit the current transaction.
    pub fn commit_transaction(&mut self) -> Option<OperationId> {
        let transaction = self.current_transaction.take()?;
        self.commit(transaction)
    }

    /// Drop the current transaction without recording it.
    ///
    /// The grouped edits have already been applied; they are reverted in
    /// reverse order before the transaction is discarded.
    pub fn rollback_transaction(&mut self) -> Result<()> {
        let Some(transaction) = self.current_transaction.take() else {
            return Ok(());
        };
        let name = transaction.name.clone();
        let (_, _, mut undo) = transaction.into_closures();
        undo().map_err(|message| EditorError::UndoRedoExecution {
            action: "rollback",
            name,
            message,
        })
    }

    /// Check if a transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.current_transaction.is_some()
    }

    /// Record an edit that has already been applied.
    pub fn push<E, U>(&mut self, name: impl Into<String>, execute: E, undo: U) -> OperationId
    where
        E: FnMut() -> std::result::Result<(), String> + Send + 'static,
        U: FnMut() -> std::result::Result<(), String> + Send + 'static,
    {
        let op = UndoOperation::new(self.next_id(), name.into(), Box::new(execute), Box::new(undo));
        let id = op.id;
        if let Some(ref mut transaction) = self.current_transaction {
            transaction.push(op);
        } else {
            self.push_operation(op);
        }
        id
    }

    fn commit(&mut self, transaction: Transaction) -> Option<OperationId> {
        if transaction.is_empty() {
            return None;
        }
        let (name, execute, undo) = transaction.into_closures();
        let op = UndoOperation::new(self.next_id(), name, execute, undo);
        let id = op.id;
        self.push_operation(op);
        Some(id)
    }

    fn push_operation(&mut self, op: UndoOperation) {
        self.undo_stack.push(op);
        self.redo_stack.clear(); // Clear redo on new action
        self.dirty = true;

        // Trim if over limit
        while self.undo_stack.len() > self.max_size {
            let dropped = self.undo_stack.remove(0);
            log::debug!("History full; dropped '{}'", dropped.name);
        }
    }

    /// Revert the most recent operation. Returns its name.
    pub fn undo(&mut self) -> Result<String> {
        let mut op = self.undo_stack.pop().ok_or(EditorError::NothingToUndo)?;
        match (op.undo)() {
            Ok(()) => {
                let name = op.name.clone();
                self.redo_stack.push(op);
                self.dirty = true;
                log::debug!("Undo: {}", name);
                Ok(name)
            }
            Err(message) => {
                let name = op.name.clone();
                // Put operation back on undo stack
                self.undo_stack.push(op);
                log::error!("Undo of '{}' failed: {}", name, message);
                Err(EditorError::UndoRedoExecution {
                    action: "undo",
                    name,
                    message,
                })
            }
        }
    }

    /// Re-apply the most recently undone operation. Returns its name.
    pub fn redo(&mut self) -> Result<String> {
        let mut op = self.redo_stack.pop().ok_or(EditorError::NothingToRedo)?;
        match (op.execute)() {
            Ok(()) => {
                let name = op.name.clone();
                self.undo_stack.push(op);
                self.dirty = true;
                log::debug!("Redo: {}", name);
                Ok(name)
            }
            Err(message) => {
                let name = op.name.clone();
                self.redo_stack.push(op);
                log::error!("Redo of '{}' failed: {}", name, message);
                Err(EditorError::UndoRedoExecution {
                    action: "redo",
                    name,
                    message,
                })
            }
        }
    }

    /// Clear all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_transaction = None;
        self.dirty = false;
    }

    /// Get the number of operations in the undo stack.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of operations in the redo stack.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Names on the undo stack, most recent first
    pub fn undo_names(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().rev().map(UndoOperation::name)
    }

    fn next_id(&self) -> OperationId {
        OperationId(self.ids.next())
    }
}

impl std::fmt::Debug for UndoHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoHistory")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("max_size", &self.max_size)
            .field("in_transaction", &self.current_transaction.is_some())
            .field("dirty", &self.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A shared counter with push helpers that add `n` and undo by subtracting
    fn counter() -> Arc<Mutex<i32>> {
        Arc::new(Mutex::new(0))
    }

    fn push_add(history: &mut UndoHistory, value: &Arc<Mutex<i32>>, n: i32) {
        *value.lock() += n;
        let (a, b) = (Arc::clone(value), Arc::clone(value));
        history.push(
            format!("add {}", n),
            move || {
                *a.lock() += n;
                Ok(())
            },
            move || {
                *b.lock() -= n;
                Ok(())
            },
        );
    }

    #[test]
    fn test_history_basic() {
        let mut history = UndoHistory::new();
        let value = counter();

        assert!(!history.can_undo());
        assert!(!history.can_redo());

        push_add(&mut history, &value, 1);

        assert!(history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.undo_description(), Some("add 1"));
        assert!(history.is_dirty());
    }

    #[test]
    fn test_history_undo_redo() {
        let mut history = UndoHistory::new();
        let value = counter();

        push_add(&mut history, &value, 1);
        push_add(&mut history, &value, 2);
        assert_eq!(*value.lock(), 3);
        assert_eq!(history.undo_count(), 2);

        assert_eq!(history.undo().unwrap(), "add 2");
        assert_eq!(*value.lock(), 1);
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 1);

        history.redo().unwrap();
        assert_eq!(*value.lock(), 3);
        assert_eq!(history.undo_count(), 2);
        assert_eq!(history.redo_count(), 0);
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = UndoHistory::new();
        let value = counter();
        push_add(&mut history, &value, 1);
        history.undo().unwrap();
        assert!(history.can_redo());

        push_add(&mut history, &value, 5);
        assert!(!history.can_redo());
        assert!(matches!(history.redo(), Err(EditorError::NothingToRedo)));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = UndoHistory::with_capacity(3);
        let value = counter();
        for n in 1..=5 {
            push_add(&mut history, &value, n);
        }
        assert_eq!(history.undo_count(), 3);
        let names: Vec<&str> = history.undo_names().collect();
        assert_eq!(names, vec!["add 5", "add 4", "add 3"]);
    }

    #[test]
    fn test_failed_undo_keeps_stacks() {
        let mut history = UndoHistory::new();
        history.push("broken", || Ok(()), || Err("disk on fire".to_string()));

        let err = history.undo().unwrap_err();
        assert!(matches!(err, EditorError::UndoRedoExecution { action: "undo", .. }));
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 0);
        assert!(matches!(UndoHistory::new().undo(), Err(EditorError::NothingToUndo)));
    }

    #[test]
    fn test_transaction_is_one_unit() {
        let mut history = UndoHistory::new();
        let value = counter();

        history.begin_transaction("batch");
        push_add(&mut history, &value, 1);
        push_add(&mut history, &value, 10);
        assert_eq!(history.undo_count(), 0);
        history.commit_transaction().unwrap();

        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.undo_description(), Some("batch"));
        history.undo().unwrap();
        assert_eq!(*value.lock(), 0);
        history.redo().unwrap();
        assert_eq!(*value.lock(), 11);
    }

    #[test]
    fn test_rollback_reverts_members() {
        let mut history = UndoHistory::new();
        let value = counter();

        history.begin_transaction("discarded");
        push_add(&mut history, &value, 4);
        push_add(&mut history, &value, 6);
        history.rollback_transaction().unwrap();

        assert_eq!(*value.lock(), 0);
        assert!(!history.can_undo());
        assert!(!history.in_transaction());
    }
}
