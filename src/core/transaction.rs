use std::fmt;
use thiserror::Error;

use crate::core::store::Storable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("transaction already started")]
    AlreadyStarted,
    #[error("no transaction started")]
    NotStarted,
    #[error("invalid commit token {token} (history length {len})")]
    InvalidToken { token: usize, len: usize },
}

/// Index of a commit in a transaction's history.
pub type Token = usize;

/// A history of commits, each an ordered list of records, with at most
/// one uncommitted buffer open.
pub struct Transaction<R> {
    history: Vec<Option<Vec<R>>>,
    current: Option<Vec<R>>,
}

impl<R> Default for Transaction<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for Transaction<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("commits", &self.history.len())
            .field("open", &self.current.as_ref().map(Vec::len))
            .finish()
    }
}

impl<R> Transaction<R> {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            current: None,
        }
    }

    /// Open a buffer. An already open buffer is kept as is.
    pub fn start_transaction(&mut self) -> Result<(), TransactionError> {
        if self.current.is_some() {
            return Err(TransactionError::AlreadyStarted);
        }
        self.current = Some(Vec::new());
        Ok(())
    }

    pub fn push(&mut self, record: R) -> Result<(), TransactionError> {
        self.current
            .as_mut()
            .ok_or(TransactionError::NotStarted)?
            .push(record);
        Ok(())
    }

    pub fn commit(&mut self) -> Result<Token, TransactionError> {
        let records = self.current.take().ok_or(TransactionError::NotStarted)?;
        self.history.push(Some(records));
        Ok(self.history.len() - 1)
    }

    /// Start, push one record and commit.
    pub fn commit_with(&mut self, record: R) -> Result<Token, TransactionError> {
        self.start_transaction()?;
        self.push(record)?;
        self.commit()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Number of commits, including undone ones.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// The most recent commit that has not been undone.
    pub fn latest(&self) -> Option<Token> {
        self.history.iter().rposition(Option::is_some)
    }

    /// Remove a commit's records for replay. Defaults to the latest commit.
    pub fn take(&mut self, token: Option<Token>) -> Result<Vec<R>, TransactionError> {
        let len = self.history.len();
        let token = match token {
            Some(token) => token,
            None => self.latest().ok_or(TransactionError::InvalidToken { token: 0, len })?,
        };
        self.history
            .get_mut(token)
            .and_then(Option::take)
            .ok_or(TransactionError::InvalidToken { token, len })
    }
}

/// State that knows how to compensate for one of its own records.
pub trait Rollback {
    type Record;

    fn rollback(&mut self, record: Self::Record, store: &mut Storable);
}

/// Element state paired with its transaction log.
pub struct Stateful<S: Rollback> {
    pub state: S,
    transaction: Transaction<S::Record>,
}

impl<S: Rollback + fmt::Debug> fmt::Debug for Stateful<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stateful")
            .field("state", &self.state)
            .field("transaction", &self.transaction)
            .finish()
    }
}

impl<S: Rollback> Stateful<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            transaction: Transaction::new(),
        }
    }

    pub fn transaction(&self) -> &Transaction<S::Record> {
        &self.transaction
    }

    pub fn transaction_mut(&mut self) -> &mut Transaction<S::Record> {
        &mut self.transaction
    }

    /// Commit a single record. Misuse is logged and swallowed.
    pub fn record(&mut self, record: S::Record) -> Option<Token> {
        match self.transaction.commit_with(record) {
            Ok(token) => Some(token),
            Err(err) => {
                tracing::warn!(error = %err, "failed to record transaction");
                None
            }
        }
    }

    /// Commit whatever the open buffer holds. Misuse is logged and swallowed.
    pub fn commit_records(&mut self) -> Option<Token> {
        match self.transaction.commit() {
            Ok(token) => Some(token),
            Err(err) => {
                tracing::warn!(error = %err, "failed to commit transaction");
                None
            }
        }
    }

    /// Replay a commit in reverse push order. Returns how many records
    /// were rolled back.
    pub fn undo(&mut self, token: Option<Token>, store: &mut Storable) -> Result<usize, TransactionError> {
        let records = self.transaction.take(token)?;
        let count = records.len();
        for record in records.into_iter().rev() {
            self.state.rollback(record, store);
        }
        Ok(count)
    }
}
