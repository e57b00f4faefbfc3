//! registry.rs
//! Named nodes and their ordered candidate strategies.

use super::compliance::{Compliance, ComplianceTag};
use super::timeframe::Timeframe;
use super::types::{NodeId, Value};
use crate::compute::inputs::{Inputs, StrategyError};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A calculation body, bound at registration time.
pub type ComputeFn = Arc<dyn Fn(&Inputs<'_>, &Timeframe) -> Result<Value, StrategyError> + Send + Sync>;

/// One candidate way to compute a node's value.
#[derive(Clone)]
pub struct Strategy {
    node: String,
    label: String,
    needs: SmallVec<[String; 4]>,
    compliance: Compliance,
    compute: ComputeFn,
}

impl Strategy {
    /// A strategy with no needs and no compliance claims.
    pub fn new<F>(label: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&Inputs<'_>, &Timeframe) -> Result<Value, StrategyError> + Send + Sync + 'static,
    {
        Self {
            node: String::new(),
            label: label.into(),
            needs: SmallVec::new(),
            compliance: Compliance::none(),
            compute: Arc::new(compute),
        }
    }

    pub fn needs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.needs = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn complies(mut self, tags: impl IntoIterator<Item = ComplianceTag>) -> Self {
        self.compliance = Compliance::tags(tags);
        self
    }

    pub fn universal(mut self) -> Self {
        self.compliance = Compliance::Universal;
        self
    }

    pub fn node(&self) -> &str { &self.node }
    pub fn label(&self) -> &str { &self.label }
    pub fn need_names(&self) -> &[String] { &self.needs }
    pub fn compliance(&self) -> &Compliance { &self.compliance }

    #[inline]
    pub(crate) fn invoke(&self, inputs: &Inputs<'_>, timeframe: &Timeframe) -> Result<Value, StrategyError> {
        (self.compute)(inputs, timeframe)
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("node", &self.node)
            .field("label", &self.label)
            .field("needs", &self.needs)
            .field("compliance", &self.compliance)
            .finish_non_exhaustive()
    }
}

/// A named output. Strategy order encodes preference, most specific first.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    strategies: Vec<Strategy>,
}

impl Node {
    pub fn name(&self) -> &str { &self.name }
    pub fn strategies(&self) -> &[Strategy] { &self.strategies }

    /// True if some strategy needs nothing, so the node can always fall back to it.
    pub fn has_default(&self) -> bool {
        self.strategies.iter().any(|s| s.needs.is_empty())
    }
}

/// Static mapping from node name to node. Built at startup, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }
    pub fn count(&self) -> usize { self.nodes.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Adds a node, or replaces the strategy list of an existing one (keeping its id).
    pub fn register(&mut self, name: impl Into<String>, strategies: Vec<Strategy>) -> NodeId {
        let name = name.into();
        let strategies: Vec<Strategy> = strategies
            .into_iter()
            .map(|mut s| {
                s.node = name.clone();
                s
            })
            .collect();

        if let Some(&id) = self.index.get(&name) {
            tracing::debug!(node = %name, strategies = strategies.len(), "replacing node");
            self.nodes[id.index()].strategies = strategies;
            return id;
        }

        let id = NodeId::new(self.nodes.len());
        self.index.insert(name.clone(), id);
        self.nodes.push(Node { name, strategies });
        id
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|id| &self.nodes[id.index()])
    }

    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    #[inline(always)]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn contains(&self, name: &str) -> bool { self.index.contains_key(name) }

    /// Nodes in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
}
