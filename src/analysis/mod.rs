pub mod boundness;
pub mod coverability;
pub mod reachability;
pub mod simulation;

pub use boundness::{BehaviourReport, BoundnessAnalyzer, BoundnessResult, analyze};
pub use coverability::{AncestorPolicy, accelerate, gt_strict, le};
pub use reachability::{ExplorationGraph, ExplorationMode, StateGraph, StateGraphConfig, explore_all};
pub use simulation::{FiringStrategy, SimulationTrace, Simulator};
