use thiserror::Error;

use crate::core::awaitable::AwaitError;
use crate::core::graph::GraphError;
use crate::core::persist::PersistError;
use crate::core::store::StoreError;
use crate::core::transaction::TransactionError;
use crate::elements::ElementError;
use crate::schema::id::NodeId;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),
    #[error("await error: {0}")]
    Await(#[from] AwaitError),
    #[error("element error: {0}")]
    Element(#[from] ElementError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),
    #[error("no action at node {0}")]
    MissingAction(NodeId),
    #[error("no story loaded")]
    NoStory,
}

/// Coarse classification of every error the engine can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed graph operation. Aborts the operation.
    Structural,
    /// Transaction misuse. Recoverable; element code logs and continues.
    TransactionMisuse,
    /// A future resolved twice. Recoverable.
    Resolution,
    /// Missing element, wrong element kind or missing action.
    Lookup,
    Persistence,
    /// Stepping a game with nothing to play.
    Lifecycle,
}

impl ErrorKind {
    /// Whether the caller may log the error and carry on.
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::TransactionMisuse | Self::Resolution)
    }
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Graph(_) => ErrorKind::Structural,
            Self::Transaction(_) => ErrorKind::TransactionMisuse,
            Self::Await(_) => ErrorKind::Resolution,
            Self::Element(ElementError::InvalidConfig(_)) => ErrorKind::Structural,
            Self::Element(_) | Self::Store(_) | Self::MissingAction(_) => ErrorKind::Lookup,
            Self::Persist(_) => ErrorKind::Persistence,
            Self::NoStory => ErrorKind::Lifecycle,
        }
    }
}
