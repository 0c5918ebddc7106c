//! 令牌博弈模拟：从初始标识出发，每步发生一个可发生迁移，
//! 直到没有可发生迁移或达到步数上限。
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::net::{FireError, Marking, Net, TransitionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum FiringStrategy {
    /// Lowest-numbered enabled transition.
    #[default]
    First,
    /// Uniform choice among the enabled transitions; equal seeds replay the same run.
    Random { seed: u64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationStep {
    pub transition: TransitionId,
    pub name: String,
    pub marking: Marking,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationTrace {
    pub initial_marking: Marking,
    pub steps: Vec<SimulationStep>,
    pub final_marking: Marking,
    /// No transition was enabled when the run stopped.
    pub deadlocked: bool,
}

impl SimulationTrace {
    pub fn transitions(&self) -> Vec<TransitionId> {
        self.steps.iter().map(|step| step.transition).collect()
    }
}

pub struct Simulator<'net> {
    net: &'net Net,
    strategy: FiringStrategy,
    max_steps: usize,
}

impl<'net> Simulator<'net> {
    pub fn new(net: &'net Net) -> Self {
        Self {
            net,
            strategy: FiringStrategy::First,
            max_steps: 100,
        }
    }

    pub fn with_strategy(mut self, strategy: FiringStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn run(&self) -> Result<SimulationTrace, FireError> {
        self.run_from(self.net.initial_marking())
    }

    pub fn run_from(&self, initial_marking: Marking) -> Result<SimulationTrace, FireError> {
        self.net.check_marking(&initial_marking)?;
        let mut rng = match self.strategy {
            FiringStrategy::First => None,
            FiringStrategy::Random { seed } => Some(StdRng::seed_from_u64(seed)),
        };
        let mut marking = initial_marking.clone();
        let mut steps = Vec::new();
        let mut deadlocked = false;

        while steps.len() < self.max_steps {
            let enabled = self.net.enabled_transitions(&marking);
            let chosen = match (&mut rng, enabled.as_slice()) {
                (_, []) => None,
                (None, [first, ..]) => Some(*first),
                (Some(rng), candidates) => Some(candidates[rng.random_range(0..candidates.len())]),
            };
            let Some(transition) = chosen else {
                deadlocked = true;
                break;
            };

            marking = self.net.fire_transition(&marking, transition)?;
            log::debug!(
                "step {}: fired {} -> {}",
                steps.len() + 1,
                self.net.transition_name(transition),
                marking.describe(self.net)
            );
            steps.push(SimulationStep {
                transition,
                name: self.net.transition_name(transition).to_owned(),
                marking: marking.clone(),
            });
        }

        if !deadlocked && self.net.enabled_transitions(&marking).is_empty() {
            deadlocked = true;
        }
        log::info!(
            "simulation stopped after {} steps{}",
            steps.len(),
            if deadlocked { " in a deadlock" } else { "" }
        );

        Ok(SimulationTrace {
            initial_marking,
            steps,
            final_marking: marking,
            deadlocked,
        })
    }
}
