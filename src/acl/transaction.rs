//! Deferred transaction buffer.
//!
//! A [`Transaction`] is an ordered list of [`Step`]s. Appending a step does
//! no I/O; [`Transaction::execute`] runs the steps one after another,
//! awaiting each before starting the next, and stops at the first failure.
//! There is no rollback: steps that already ran stay applied.
//!
//! ```text
//! Open ──execute()──→ Executing ──→ Closed
//! ```

use crate::error::{Error, Result};
use crate::store::{DocumentStore, Filter, Update};
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle of a transaction buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Accepting steps
    Open,
    /// Steps are running
    Executing,
    /// Finished, successfully or not. Terminal.
    Closed,
}

/// One deferred store operation.
///
/// Each step owns every argument it needs; nothing is read from the caller
/// at execution time.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    UpdateMany {
        collection: String,
        filter: Filter,
        update: Update,
        upsert: bool,
    },
    DeleteMany {
        collection: String,
        filter: Filter,
    },
    EnsureIndex {
        collection: String,
        fields: Vec<String>,
    },
}

impl Step {
    pub fn collection(&self) -> &str {
        match self {
            Step::UpdateMany { collection, .. }
            | Step::DeleteMany { collection, .. }
            | Step::EnsureIndex { collection, .. } => collection,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Step::UpdateMany { .. } => "update_many",
            Step::DeleteMany { .. } => "delete_many",
            Step::EnsureIndex { .. } => "ensure_index",
        }
    }

    /// Run the step against `store`
    pub async fn execute(&self, store: &dyn DocumentStore) -> Result<()> {
        match self {
            Step::UpdateMany {
                collection,
                filter,
                update,
                upsert,
            } => {
                store.update_many(collection, filter, update, *upsert).await?;
            }
            Step::DeleteMany { collection, filter } => {
                store.delete_many(collection, filter).await?;
            }
            Step::EnsureIndex { collection, fields } => {
                store.create_index(collection, fields).await?;
            }
        }
        Ok(())
    }
}

/// Ordered buffer of deferred mutations
#[derive(Debug)]
pub struct Transaction {
    id: Uuid,
    state: TransactionState,
    steps: Vec<Step>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx:{} ({} steps, {:?})", self.id, self.steps.len(), self.state)
    }
}

impl Transaction {
    /// Creates an empty, open transaction.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: TransactionState::Open,
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps appended so far, in execution order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Append steps. All of them or none: a transaction that is not open
    /// rejects the whole batch.
    pub fn append<I>(&mut self, steps: I) -> Result<()>
    where
        I: IntoIterator<Item = Step>,
    {
        if self.state != TransactionState::Open {
            return Err(Error::InvalidArgument(format!(
                "transaction {} is {:?}; steps can only be added while open",
                self.id, self.state
            )));
        }

        let before = self.steps.len();
        self.steps.extend(steps);
        debug!(tx = %self.id, added = self.steps.len() - before, "Appended steps");
        Ok(())
    }

    /// Run every step in order against `store`.
    ///
    /// Returns the error of the first failing step unchanged; later steps are
    /// not run. The transaction is closed afterwards either way and cannot be
    /// executed again.
    pub async fn execute(&mut self, store: &dyn DocumentStore) -> Result<()> {
        if self.state != TransactionState::Open {
            return Err(Error::InvalidArgument(format!(
                "transaction {} already ended",
                self.id
            )));
        }

        self.state = TransactionState::Executing;
        let steps = std::mem::take(&mut self.steps);
        let total = steps.len();

        let mut outcome = Ok(());
        for (index, step) in steps.iter().enumerate() {
            debug!(
                tx = %self.id,
                step = index + 1,
                total,
                kind = step.kind(),
                collection = step.collection(),
                "Executing step"
            );

            if let Err(e) = step.execute(store).await {
                warn!(
                    tx = %self.id,
                    step = index + 1,
                    total,
                    kind = step.kind(),
                    error = %e,
                    "Step failed; skipping remaining steps"
                );
                outcome = Err(e);
                break;
            }
        }

        self.state = TransactionState::Closed;
        if outcome.is_ok() {
            info!(tx = %self.id, steps = total, "Transaction committed");
        }
        outcome
    }
}
