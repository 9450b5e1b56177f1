//! Flag-driven branching.
//!
//! Each branch's actions are linked into a detached chain when the branch is
//! declared. At run time the first truthy predicate picks the chain that the
//! condition action splices in front of its continuation.

use std::fmt;

use super::{Cleaner, ElementError};
use crate::core::graph::Chain;
use crate::core::store::Storable;
use crate::core::transaction::{Rollback, Stateful};
use crate::schema::id::{ElementId, NodeId};
use crate::schema::value::Value;

/// Context handed to a predicate.
pub struct LambdaCtx<'a> {
    pub store: &'a mut Storable,
    resolved: Option<bool>,
}

impl<'a> LambdaCtx<'a> {
    pub fn new(store: &'a mut Storable) -> Self {
        Self {
            store,
            resolved: None,
        }
    }

    /// Settle the predicate. Only the first call counts.
    pub fn resolve(&mut self, value: bool) {
        if self.resolved.is_none() {
            self.resolved = Some(value);
        }
    }

    pub fn resolved(&self) -> Option<bool> {
        self.resolved
    }
}

type Predicate = Box<dyn Fn(&mut LambdaCtx<'_>) -> Option<Cleaner>>;

/// A branch predicate. It may return a cleanup that is run if the
/// evaluation is undone.
pub struct Lambda {
    predicate: Predicate,
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Lambda")
    }
}

impl Lambda {
    pub fn new(predicate: impl Fn(&mut LambdaCtx<'_>) -> Option<Cleaner> + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }

    pub fn constant(value: bool) -> Self {
        Self::new(move |ctx| {
            ctx.resolve(value);
            None
        })
    }

    /// True when `namespace.key` holds a truthy value.
    pub fn flag(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let key = key.into();
        Self::new(move |ctx| {
            let value = ctx
                .store
                .get(&namespace, &key)
                .is_some_and(Value::is_truthy);
            ctx.resolve(value);
            None
        })
    }

    /// Run the predicate. An unresolved predicate counts as false.
    pub fn evaluate(&self, store: &mut Storable) -> (bool, Option<Cleaner>) {
        let mut ctx = LambdaCtx::new(store);
        let cleaner = (self.predicate)(&mut ctx);
        match ctx.resolved() {
            Some(value) => (value, cleaner),
            None => {
                tracing::debug!("predicate did not resolve, treating as false");
                (false, cleaner)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    If,
    ElseIf(usize),
    Else,
}

#[derive(Debug)]
struct Branch {
    predicate: Lambda,
    actions: Vec<NodeId>,
    chain: Option<Chain>,
}

/// Outcome of [`Condition::evaluate`].
pub struct Chosen {
    pub branch: BranchKind,
    pub actions: Vec<NodeId>,
    pub chain: Option<Chain>,
    pub cleaner: Option<Cleaner>,
}

impl fmt::Debug for Chosen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chosen")
            .field("branch", &self.branch)
            .field("actions", &self.actions)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct ConditionState {
    pub last: Option<BranchKind>,
}

pub enum ConditionRecord {
    Cleanup {
        cleaner: Option<Cleaner>,
        previous: Option<BranchKind>,
    },
}

impl Rollback for ConditionState {
    type Record = ConditionRecord;

    fn rollback(&mut self, record: ConditionRecord, store: &mut Storable) {
        match record {
            ConditionRecord::Cleanup { cleaner, previous } => {
                self.last = previous;
                if let Some(cleaner) = cleaner {
                    cleaner(store);
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct Condition {
    pub(crate) id: ElementId,
    /// `If` first, then every `ElseIf` in declaration order.
    branches: Vec<Branch>,
    otherwise: Option<(Vec<NodeId>, Option<Chain>)>,
    pub(crate) stateful: Stateful<ConditionState>,
}

impl Condition {
    pub fn new(id: ElementId) -> Self {
        Self {
            id,
            branches: Vec::new(),
            otherwise: None,
            stateful: Stateful::new(ConditionState::default()),
        }
    }

    pub(crate) fn set_if(&mut self, predicate: Lambda, actions: Vec<NodeId>, chain: Option<Chain>) -> Result<(), ElementError> {
        if !self.branches.is_empty() {
            return Err(ElementError::InvalidConfig(
                "condition already has an If branch".to_string(),
            ));
        }
        self.branches.push(Branch {
            predicate,
            actions,
            chain,
        });
        Ok(())
    }

    pub(crate) fn push_else_if(&mut self, predicate: Lambda, actions: Vec<NodeId>, chain: Option<Chain>) -> Result<(), ElementError> {
        if self.branches.is_empty() {
            return Err(ElementError::InvalidConfig(
                "ElseIf declared before If".to_string(),
            ));
        }
        self.branches.push(Branch {
            predicate,
            actions,
            chain,
        });
        Ok(())
    }

    pub(crate) fn set_else(&mut self, actions: Vec<NodeId>, chain: Option<Chain>) -> Result<(), ElementError> {
        if self.otherwise.is_some() {
            return Err(ElementError::InvalidConfig(
                "condition already has an Else branch".to_string(),
            ));
        }
        self.otherwise = Some((actions, chain));
        Ok(())
    }

    pub fn last_branch(&self) -> Option<BranchKind> {
        self.stateful.state.last
    }

    /// Pick a branch: the first truthy predicate, else `Else`, else none.
    pub fn evaluate(&self, store: &mut Storable) -> Option<Chosen> {
        for (index, branch) in self.branches.iter().enumerate() {
            let (value, cleaner) = branch.predicate.evaluate(store);
            if value {
                let kind = match index {
                    0 => BranchKind::If,
                    n => BranchKind::ElseIf(n - 1),
                };
                return Some(Chosen {
                    branch: kind,
                    actions: branch.actions.clone(),
                    chain: branch.chain,
                    cleaner,
                });
            }
        }
        self.otherwise.as_ref().map(|(actions, chain)| Chosen {
            branch: BranchKind::Else,
            actions: actions.clone(),
            chain: *chain,
            cleaner: None,
        })
    }

    /// Evaluate and record the outcome. Returns the chain to splice in.
    pub(crate) fn run(&mut self, store: &mut Storable) -> Option<Chain> {
        let chosen = self.evaluate(store);
        let previous = self.stateful.state.last;
        let (branch, chain, cleaner) = match chosen {
            Some(chosen) => (Some(chosen.branch), chosen.chain, chosen.cleaner),
            None => (None, None, None),
        };
        tracing::debug!(condition = %self.id, ?branch, "condition evaluated");
        self.stateful.state.last = branch;
        self.stateful.record(ConditionRecord::Cleanup { cleaner, previous });
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::Namespace;

    fn branch_ids(base: u64) -> (Vec<NodeId>, Option<Chain>) {
        let actions = vec![NodeId(base)];
        let chain = Chain::from_nodes(&actions);
        (actions, chain)
    }

    #[test]
    fn first_truthy_else_if_wins() {
        let mut condition = Condition::new(ElementId(1));
        let (a, ca) = branch_ids(10);
        condition.set_if(Lambda::constant(false), a, ca).unwrap();
        for (n, value) in [false, true, false].into_iter().enumerate() {
            let (b, cb) = branch_ids(20 + n as u64);
            condition.push_else_if(Lambda::constant(value), b, cb).unwrap();
        }

        let mut store = Storable::new();
        let chosen = condition.evaluate(&mut store).unwrap();
        assert_eq!(chosen.branch, BranchKind::ElseIf(1));
        assert_eq!(chosen.actions, vec![NodeId(21)]);
    }

    #[test]
    fn all_false_without_else_is_none() {
        let mut condition = Condition::new(ElementId(1));
        let (a, ca) = branch_ids(10);
        condition.set_if(Lambda::constant(false), a, ca).unwrap();
        let (b, cb) = branch_ids(11);
        condition.push_else_if(Lambda::constant(false), b, cb).unwrap();
        assert!(condition.evaluate(&mut Storable::new()).is_none());

        let (c, cc) = branch_ids(12);
        condition.set_else(c, cc).unwrap();
        let chosen = condition.evaluate(&mut Storable::new()).unwrap();
        assert_eq!(chosen.branch, BranchKind::Else);
        assert_eq!(chosen.chain, Some(Chain::single(NodeId(12))));
    }

    #[test]
    fn unresolved_predicate_is_false() {
        let mut condition = Condition::new(ElementId(1));
        let (a, ca) = branch_ids(10);
        condition.set_if(Lambda::new(|_| None), a, ca).unwrap();
        assert!(condition.evaluate(&mut Storable::new()).is_none());
    }

    #[test]
    fn flag_reads_the_store() {
        let mut store = Storable::new();
        store.add_namespace(Namespace::new("Flags", "flags"));
        let lambda = Lambda::flag("flags", "has_key");
        assert!(!lambda.evaluate(&mut store).0);
        store.set("flags", "has_key", true).unwrap();
        assert!(lambda.evaluate(&mut store).0);
    }

    #[test]
    fn branch_order_is_enforced() {
        let mut condition = Condition::new(ElementId(1));
        assert!(condition
            .push_else_if(Lambda::constant(true), Vec::new(), None)
            .is_err());
        condition.set_if(Lambda::constant(true), Vec::new(), None).unwrap();
        assert!(condition.set_if(Lambda::constant(true), Vec::new(), None).is_err());
        condition.set_else(Vec::new(), None).unwrap();
        assert!(condition.set_else(Vec::new(), None).is_err());
    }

    #[test]
    fn run_commits_the_predicate_cleanup() {
        let mut store = Storable::new();
        store.add_namespace(Namespace::new("Flags", "flags"));
        let mut condition = Condition::new(ElementId(1));
        let predicate = Lambda::new(|ctx| {
            let _ = ctx.store.set("flags", "visited", true);
            ctx.resolve(true);
            Some(Box::new(|store: &mut Storable| {
                let _ = store.set("flags", "visited", false);
            }) as Cleaner)
        });
        let (a, ca) = branch_ids(10);
        condition.set_if(predicate, a, ca).unwrap();

        assert_eq!(condition.run(&mut store), ca);
        assert_eq!(condition.last_branch(), Some(BranchKind::If));
        condition.stateful.undo(None, &mut store).unwrap();
        assert_eq!(store.get("flags", "visited"), Some(&Value::Bool(false)));
        assert_eq!(condition.last_branch(), None);
    }
}
