use std::collections::VecDeque;

use indexmap::IndexMap;
use indexmap::map::Entry;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::coverability::{AncestorPolicy, accelerate};
use crate::net::{FireError, Marking, MarkingKey, Net, PlaceId, Tokens, TransitionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenChange {
    pub place: PlaceId,
    pub name: String,
    pub before: Tokens,
    pub after: Tokens,
}

impl TokenChange {
    fn between(net: &Net, before: &Marking, after: &Marking) -> Vec<Self> {
        net.places
            .iter_enumerated()
            .filter_map(|(place, data)| {
                let (old, new) = (before.get(place), after.get(place));
                (old != new).then(|| Self {
                    place,
                    name: data.name.clone(),
                    before: old,
                    after: new,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionSummary {
    pub id: TransitionId,
    pub name: String,
}

impl TransitionSummary {
    fn new(net: &Net, id: TransitionId) -> Self {
        Self {
            id,
            name: net.transition_name(id).to_owned(),
        }
    }
}

/// 探索过程中的状态节点。`parent`/`via` 记录首次发现该节点的边。
#[derive(Debug, Clone)]
pub struct StateNode {
    pub index: usize,
    pub marking: Marking,
    pub key: MarkingKey,
    pub label: String,
    pub parent: Option<NodeIndex>,
    pub via: Option<TransitionId>,
    pub enabled: Vec<TransitionSummary>,
}

impl StateNode {
    fn new(
        index: usize,
        marking: Marking,
        net: &Net,
        parent: Option<NodeIndex>,
        via: Option<TransitionId>,
    ) -> Self {
        Self {
            index,
            key: marking.canonical_key(),
            label: marking.describe(net),
            marking,
            parent,
            via,
            enabled: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateEdge {
    pub transition: TransitionSummary,
    pub changes: Vec<TokenChange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplorationMode {
    /// Exact reachability graph. Does not terminate on unbounded nets unless a
    /// state limit is set.
    Bounded,
    /// Karp–Miller coverability graph with ω acceleration.
    #[default]
    Coverability,
}

impl ExplorationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExplorationMode::Bounded => "bounded",
            ExplorationMode::Coverability => "coverability",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateGraphConfig {
    pub mode: ExplorationMode,
    /// 仅在覆盖模式下生效。
    pub policy: AncestorPolicy,
    /// 最多保留的状态数量。None 表示不设上限；初始状态总会被保留。
    pub state_limit: Option<usize>,
}

impl StateGraphConfig {
    pub fn bounded() -> Self {
        Self {
            mode: ExplorationMode::Bounded,
            ..Self::default()
        }
    }

    pub fn coverability(policy: AncestorPolicy) -> Self {
        Self {
            mode: ExplorationMode::Coverability,
            policy,
            state_limit: None,
        }
    }

    pub fn with_state_limit(mut self, limit: usize) -> Self {
        self.state_limit = Some(limit);
        self
    }
}

/// Renderer-facing node: the canonical key plus its human-readable label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplorationNode {
    pub index: usize,
    pub key: MarkingKey,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplorationEdge {
    pub source: MarkingKey,
    pub target: MarkingKey,
    pub transition: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExplorationGraph {
    pub mode: ExplorationMode,
    pub nodes: Vec<ExplorationNode>,
    pub edges: Vec<ExplorationEdge>,
    pub deadlocks: Vec<usize>,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateGraphStats {
    pub state_count: usize,
    pub edge_count: usize,
    pub deadlock_count: usize,
    pub omega_state_count: usize,
    pub truncated: bool,
}

#[derive(Debug)]
pub struct StateGraph {
    pub graph: StableGraph<StateNode, StateEdge>,
    pub initial: NodeIndex,
    pub mode: ExplorationMode,
    /// Nodes without any enabled transition, in discovery order.
    pub deadlocks: Vec<NodeIndex>,
    pub truncated: bool,
    /// Accepted markings in discovery order.
    pub markings: IndexMap<MarkingKey, NodeIndex>,
}

impl StateGraph {
    pub fn from_net(net: &Net, config: StateGraphConfig) -> Result<Self, FireError> {
        Self::from_marking(net, net.initial_marking(), config)
    }

    /// 广度优先探索。每个出队节点按迁移顺序发生其全部可发生迁移；
    /// 覆盖模式下后继在生成键之前先按祖先策略做 ω 加速，
    /// 因此节点一旦加入便不再改变，每条边都指向已存在的节点。
    pub fn from_marking(
        net: &Net,
        initial_marking: Marking,
        config: StateGraphConfig,
    ) -> Result<Self, FireError> {
        net.check_marking(&initial_marking)?;
        let mut graph = StableGraph::new();
        let mut markings: IndexMap<MarkingKey, NodeIndex> = IndexMap::new();
        let mut queue = VecDeque::new();
        let mut deadlocks = Vec::new();
        let mut truncated = false;

        let initial_node = StateNode::new(0, initial_marking, net, None, None);
        let initial_key = initial_node.key.clone();
        let initial = graph.add_node(initial_node);
        markings.insert(initial_key, initial);
        queue.push_back(initial);

        while let Some(state_index) = queue.pop_front() {
            let current_marking = graph[state_index].marking.clone();
            let enabled = net.enabled_transitions(&current_marking);
            graph[state_index].enabled = enabled
                .iter()
                .map(|&id| TransitionSummary::new(net, id))
                .collect();
            log::debug!(
                "expanding s{} {} with {} enabled transitions",
                graph[state_index].index,
                current_marking,
                enabled.len()
            );

            if enabled.is_empty() {
                deadlocks.push(state_index);
                continue;
            }

            let lineage = match (config.mode, config.policy) {
                (ExplorationMode::Coverability, AncestorPolicy::Path) => {
                    Self::lineage(&graph, state_index)
                }
                _ => Vec::new(),
            };

            for transition_id in enabled {
                let fired = net.fire_transition(&current_marking, transition_id)?;
                let next_marking = match (config.mode, config.policy) {
                    (ExplorationMode::Bounded, _) => fired,
                    (ExplorationMode::Coverability, AncestorPolicy::Path) => {
                        accelerate(&fired, lineage.iter().map(|&idx| &graph[idx].marking)).0
                    }
                    (ExplorationMode::Coverability, AncestorPolicy::Visited) => {
                        accelerate(&fired, markings.values().map(|&idx| &graph[idx].marking)).0
                    }
                };

                let target_index = match markings.entry(next_marking.canonical_key()) {
                    Entry::Occupied(entry) => *entry.get(),
                    Entry::Vacant(entry) => {
                        if let Some(limit) = config.state_limit {
                            if graph.node_count() >= limit {
                                truncated = true;
                                continue;
                            }
                        }
                        let index = graph.add_node(StateNode::new(
                            graph.node_count(),
                            next_marking.clone(),
                            net,
                            Some(state_index),
                            Some(transition_id),
                        ));
                        entry.insert(index);
                        queue.push_back(index);
                        index
                    }
                };

                let edge = StateEdge {
                    transition: TransitionSummary::new(net, transition_id),
                    changes: TokenChange::between(net, &current_marking, &next_marking),
                };
                graph.add_edge(state_index, target_index, edge);
            }
        }

        if truncated {
            log::warn!(
                "state limit {:?} reached, graph truncated at {} states",
                config.state_limit,
                graph.node_count()
            );
        }
        log::info!(
            "{} exploration finished: {} states, {} edges, {} deadlocks",
            config.mode.as_str(),
            graph.node_count(),
            graph.edge_count(),
            deadlocks.len()
        );

        Ok(Self {
            graph,
            initial,
            mode: config.mode,
            deadlocks,
            truncated,
            markings,
        })
    }

    /// Nodes from the root down to `index`, following discovery parents.
    fn lineage(graph: &StableGraph<StateNode, StateEdge>, index: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = vec![index];
        let mut cursor = graph[index].parent;
        while let Some(parent) = cursor {
            chain.push(parent);
            cursor = graph[parent].parent;
        }
        chain.reverse();
        chain
    }

    pub fn nodes(&self) -> Vec<ExplorationNode> {
        self.markings
            .values()
            .map(|&idx| {
                let node = &self.graph[idx];
                ExplorationNode {
                    index: node.index,
                    key: node.key.clone(),
                    label: node.label.clone(),
                }
            })
            .collect()
    }

    pub fn edges(&self) -> Vec<ExplorationEdge> {
        self.graph
            .edge_indices()
            .filter_map(|edge| {
                let (source, target) = self.graph.edge_endpoints(edge)?;
                Some(ExplorationEdge {
                    source: self.graph[source].key.clone(),
                    target: self.graph[target].key.clone(),
                    transition: self.graph[edge].transition.name.clone(),
                })
            })
            .collect()
    }

    pub fn export(&self) -> ExplorationGraph {
        ExplorationGraph {
            mode: self.mode,
            nodes: self.nodes(),
            edges: self.edges(),
            deadlocks: self
                .deadlocks
                .iter()
                .map(|&idx| self.graph[idx].index)
                .collect(),
            truncated: self.truncated,
        }
    }

    pub fn stats(&self) -> StateGraphStats {
        StateGraphStats {
            state_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            deadlock_count: self.deadlocks.len(),
            omega_state_count: self
                .graph
                .node_weights()
                .filter(|node| node.marking.has_omega())
                .count(),
            truncated: self.truncated,
        }
    }

    pub fn node(&self, index: NodeIndex) -> &StateNode {
        &self.graph[index]
    }

    pub fn node_for(&self, marking: &Marking) -> Option<NodeIndex> {
        self.markings.get(&marking.canonical_key()).copied()
    }

    pub fn contains_marking(&self, marking: &Marking) -> bool {
        self.node_for(marking).is_some()
    }

    /// Transition sequence along discovery edges from the initial state.
    pub fn path_to(&self, index: NodeIndex) -> Vec<TransitionId> {
        Self::lineage(&self.graph, index)
            .into_iter()
            .filter_map(|idx| self.graph[idx].via)
            .collect()
    }

    /// Transitions that label at least one edge.
    pub fn fired_transitions(&self) -> Vec<TransitionId> {
        let mut fired: Vec<TransitionId> = self
            .graph
            .edge_weights()
            .map(|edge| edge.transition.id)
            .collect();
        fired.sort();
        fired.dedup();
        fired
    }
}

/// Runs independent explorations in parallel; results keep the input order.
pub fn explore_all(jobs: &[(&Net, StateGraphConfig)]) -> Vec<Result<StateGraph, FireError>> {
    jobs.par_iter()
        .map(|(net, config)| StateGraph::from_net(net, *config))
        .collect()
}
