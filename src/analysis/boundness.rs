//! Petri网有界性与行为分析
//!
//! 基于覆盖图判断：
//! 1. 某个节点含 ω 的库所无界，见证序列为到达首个 ω 节点的发现路径；
//! 2. 完整且无 ω 的覆盖图给出每个库所的上界；
//! 3. 被截断且无 ω 的覆盖图无法下结论。

use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::analysis::coverability::AncestorPolicy;
use crate::analysis::reachability::{StateGraph, StateGraphConfig};
use crate::net::{FireError, IndexVec, Net, PlaceId, Tokens, TransitionId, Weight};

/// 有界性检查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BoundnessResult {
    /// 网是有界的，`bounds` 为每个库所的最大令牌数
    Bounded { bounds: IndexVec<PlaceId, Weight> },
    /// 网是无界的
    Unbounded {
        unbounded_places: Vec<PlaceId>,
        /// 从初始标识到首个含 ω 节点的变迁序列
        witness_sequence: Vec<TransitionId>,
    },
    /// 无法确定有界性（例如状态数超过上限）
    Unknown { reason: String },
}

impl BoundnessResult {
    pub fn is_bounded(&self) -> bool {
        matches!(self, BoundnessResult::Bounded { .. })
    }

    /// Same as `Display`, with place and transition names resolved in `net`.
    pub fn describe(&self, net: &Net) -> String {
        match self {
            BoundnessResult::Bounded { bounds } => format!(
                "bounded: {}",
                bounds
                    .iter_enumerated()
                    .map(|(place, bound)| format!("{}≤{}", net.places[place].name, bound))
                    .join(", ")
            ),
            BoundnessResult::Unbounded {
                unbounded_places,
                witness_sequence,
            } => format!(
                "unbounded in {{{}}}, witness [{}]",
                unbounded_places
                    .iter()
                    .map(|&place| net.places[place].name.as_str())
                    .join(", "),
                witness_sequence
                    .iter()
                    .map(|&transition| net.transition_name(transition))
                    .join(", ")
            ),
            BoundnessResult::Unknown { reason } => format!("unknown: {}", reason),
        }
    }
}

impl fmt::Display for BoundnessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundnessResult::Bounded { bounds } => {
                write!(f, "bounded: {:?}", bounds)
            }
            BoundnessResult::Unbounded {
                unbounded_places,
                witness_sequence,
            } => write!(
                f,
                "unbounded in {:?}, witness {:?}",
                unbounded_places, witness_sequence
            ),
            BoundnessResult::Unknown { reason } => write!(f, "unknown: {}", reason),
        }
    }
}

/// 覆盖图上的行为性质汇总
#[derive(Debug, Clone, Serialize)]
pub struct BehaviourReport {
    pub boundness: BoundnessResult,
    pub boundness_summary: String,
    /// 死锁节点的标识，按发现顺序
    pub deadlocks: Vec<String>,
    /// 不标记任何边的变迁
    pub dead_transitions: Vec<String>,
    /// 有界且每个库所至多 1 个令牌
    pub safe: bool,
    /// 图未被截断时以上结论才是完整的
    pub complete: bool,
}

impl fmt::Display for BehaviourReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "boundness: {}", self.boundness_summary)?;
        writeln!(f, "safe: {}", self.safe)?;
        if self.deadlocks.is_empty() {
            writeln!(f, "deadlocks: none")?;
        } else {
            writeln!(f, "deadlocks: {}", self.deadlocks.join(" "))?;
        }
        if self.dead_transitions.is_empty() {
            write!(f, "dead transitions: none")?;
        } else {
            write!(f, "dead transitions: {}", self.dead_transitions.join(", "))?;
        }
        if !self.complete {
            write!(f, "\n(state limit reached, results are partial)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BoundnessAnalyzer {
    state_limit: Option<usize>,
    policy: AncestorPolicy,
}

impl Default for BoundnessAnalyzer {
    fn default() -> Self {
        Self {
            state_limit: Some(10000),
            policy: AncestorPolicy::Path,
        }
    }
}

impl BoundnessAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state_limit(mut self, limit: Option<usize>) -> Self {
        self.state_limit = limit;
        self
    }

    pub fn with_policy(mut self, policy: AncestorPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn config(&self) -> StateGraphConfig {
        StateGraphConfig {
            state_limit: self.state_limit,
            ..StateGraphConfig::coverability(self.policy)
        }
    }

    /// 构建覆盖图并检查有界性
    pub fn check(&self, net: &Net) -> Result<BoundnessResult, FireError> {
        let graph = StateGraph::from_net(net, self.config())?;
        Ok(Self::from_graph(&graph))
    }

    /// 从已构建的覆盖图读出有界性。也适用于 bounded 模式得到的可达图。
    pub fn from_graph(graph: &StateGraph) -> BoundnessResult {
        let first_omega = graph
            .markings
            .values()
            .copied()
            .find(|&idx| graph.node(idx).marking.has_omega());

        if let Some(witness_node) = first_omega {
            let unbounded_places = graph
                .graph
                .node_weights()
                .flat_map(|node| node.marking.omega_places())
                .sorted()
                .dedup()
                .collect();
            return BoundnessResult::Unbounded {
                unbounded_places,
                witness_sequence: graph.path_to(witness_node),
            };
        }

        if graph.truncated {
            return BoundnessResult::Unknown {
                reason: format!(
                    "state limit reached after {} states without an ω marking",
                    graph.graph.node_count()
                ),
            };
        }

        let places = graph.node(graph.initial).marking.len();
        let mut bounds: IndexVec<PlaceId, Weight> = IndexVec::from_elem(0, places);
        for node in graph.graph.node_weights() {
            for (place, tokens) in node.marking.iter() {
                if let (Tokens::Finite(count), Some(bound)) = (tokens, bounds.get_mut(place)) {
                    *bound = (*bound).max(count);
                }
            }
        }
        BoundnessResult::Bounded { bounds }
    }

    /// 有界性、死锁、死变迁与安全性
    pub fn analyze(&self, net: &Net) -> Result<BehaviourReport, FireError> {
        let graph = StateGraph::from_net(net, self.config())?;
        Ok(Self::report(net, &graph))
    }

    pub fn report(net: &Net, graph: &StateGraph) -> BehaviourReport {
        let boundness = Self::from_graph(graph);
        let fired = graph.fired_transitions();
        let dead_transitions = net
            .transitions
            .iter_enumerated()
            .filter(|(id, _)| fired.binary_search(id).is_err())
            .map(|(_, transition)| transition.name.clone())
            .collect();
        let deadlocks = graph
            .deadlocks
            .iter()
            .map(|&idx| graph.node(idx).label.clone())
            .collect();
        let safe = match &boundness {
            BoundnessResult::Bounded { bounds } => bounds.iter().all(|&bound| bound <= 1),
            _ => false,
        };

        BehaviourReport {
            boundness_summary: boundness.describe(net),
            boundness,
            deadlocks,
            dead_transitions,
            safe,
            complete: !graph.truncated,
        }
    }
}

/// 检查Petri网是否有界的便捷函数
pub fn check_boundness(net: &Net) -> Result<BoundnessResult, FireError> {
    BoundnessAnalyzer::new().check(net)
}

/// 检查特定库所是否有界。覆盖图中从未取 ω 的库所是有界的，即使其他库所无界。
pub fn check_place_boundness(net: &Net, place: PlaceId) -> Result<BoundnessResult, FireError> {
    let graph = StateGraph::from_net(net, BoundnessAnalyzer::new().config())?;

    let first_omega = graph
        .markings
        .values()
        .copied()
        .find(|&idx| graph.node(idx).marking.get(place).is_omega());
    if let Some(witness_node) = first_omega {
        return Ok(BoundnessResult::Unbounded {
            unbounded_places: vec![place],
            witness_sequence: graph.path_to(witness_node),
        });
    }
    if graph.truncated {
        return Ok(BoundnessResult::Unknown {
            reason: format!("state limit reached before {:?} was settled", place),
        });
    }

    let bound = graph
        .graph
        .node_weights()
        .filter_map(|node| node.marking.get(place).finite())
        .max()
        .unwrap_or(0);
    Ok(BoundnessResult::Bounded {
        bounds: IndexVec::from(vec![bound]),
    })
}

/// 对外的便捷入口，使用默认分析器
pub fn analyze(net: &Net) -> Result<BehaviourReport, FireError> {
    BoundnessAnalyzer::new().analyze(net)
}
