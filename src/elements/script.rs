use std::fmt;

use super::Cleaner;
use crate::core::store::Storable;
use crate::core::transaction::{Rollback, Stateful};
use crate::schema::id::{ElementId, NodeId};

/// What a script handler can touch while it runs.
pub struct ScriptCtx<'a> {
    pub store: &'a mut Storable,
    /// The action node being executed.
    pub node: NodeId,
}

pub type ScriptHandler = Box<dyn FnMut(&mut ScriptCtx<'_>) -> Option<Cleaner>>;

#[derive(Debug, Default)]
pub struct ScriptState {
    pub runs: usize,
}

pub enum ScriptRecord {
    Run { cleaner: Option<Cleaner> },
}

impl Rollback for ScriptState {
    type Record = ScriptRecord;

    fn rollback(&mut self, record: ScriptRecord, store: &mut Storable) {
        match record {
            ScriptRecord::Run { cleaner } => {
                self.runs = self.runs.saturating_sub(1);
                if let Some(cleaner) = cleaner {
                    cleaner(store);
                }
            }
        }
    }
}

/// Host code run as a step of the story.
pub struct Script {
    pub(crate) id: ElementId,
    handler: ScriptHandler,
    pub(crate) stateful: Stateful<ScriptState>,
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("id", &self.id)
            .field("stateful", &self.stateful)
            .finish_non_exhaustive()
    }
}

impl Script {
    pub fn new(
        id: ElementId,
        handler: impl FnMut(&mut ScriptCtx<'_>) -> Option<Cleaner> + 'static,
    ) -> Self {
        Self {
            id,
            handler: Box::new(handler),
            stateful: Stateful::new(ScriptState::default()),
        }
    }

    pub fn runs(&self) -> usize {
        self.stateful.state.runs
    }

    /// Run the handler and record its cleanup.
    pub(crate) fn run(&mut self, store: &mut Storable, node: NodeId) {
        let mut ctx = ScriptCtx { store, node };
        let cleaner = (self.handler)(&mut ctx);
        self.stateful.state.runs += 1;
        self.stateful.record(ScriptRecord::Run { cleaner });
    }
}
