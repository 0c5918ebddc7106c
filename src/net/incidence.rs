//! 按迁移索引的稀疏弧表。
//!
//! 每个迁移在构网时建立一份 `consumes`（前集）与 `produces`（后集），
//! 发生与使能判断只需访问该迁移自身的弧，不再扫描整张弧关系。
use smallvec::SmallVec;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::IndexVec;
use crate::net::structure::{Arc, ArcDirection, Weight};

pub type ArcSet = SmallVec<[(PlaceId, Weight); 4]>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionArcs {
    consumes: ArcSet,
    produces: ArcSet,
}

impl TransitionArcs {
    pub fn consumes(&self) -> &[(PlaceId, Weight)] {
        &self.consumes
    }

    pub fn produces(&self) -> &[(PlaceId, Weight)] {
        &self.produces
    }

    pub fn consumed(&self, place: PlaceId) -> Weight {
        lookup(&self.consumes, place)
    }

    pub fn produced(&self, place: PlaceId) -> Weight {
        lookup(&self.produces, place)
    }

    fn add(&mut self, place: PlaceId, weight: Weight, direction: ArcDirection) {
        let set = match direction {
            ArcDirection::PlaceToTransition => &mut self.consumes,
            ArcDirection::TransitionToPlace => &mut self.produces,
        };
        match set.iter_mut().find(|(existing, _)| *existing == place) {
            Some((_, total)) => *total = total.saturating_add(weight),
            None => set.push((place, weight)),
        }
    }
}

fn lookup(set: &[(PlaceId, Weight)], place: PlaceId) -> Weight {
    set.iter()
        .find(|(candidate, _)| *candidate == place)
        .map(|(_, weight)| *weight)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArcIndex {
    by_transition: IndexVec<TransitionId, TransitionArcs>,
}

impl ArcIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_transition(&mut self) -> TransitionId {
        self.by_transition.push(TransitionArcs::default())
    }

    /// 重复添加同一条弧时权重累加。调用方负责保证索引合法且权重为正。
    pub fn add(
        &mut self,
        place: PlaceId,
        transition: TransitionId,
        weight: Weight,
        direction: ArcDirection,
    ) {
        self.by_transition[transition].add(place, weight, direction);
    }

    pub fn get(&self, transition: TransitionId) -> Option<&TransitionArcs> {
        self.by_transition.get(transition)
    }

    pub fn iter_enumerated(&self) -> impl Iterator<Item = (TransitionId, &TransitionArcs)> {
        self.by_transition.iter_enumerated()
    }

    pub fn has_input_arc(&self, place: PlaceId) -> bool {
        self.by_transition
            .iter()
            .any(|arcs| arcs.consumed(place) > 0)
    }

    pub fn has_output_arc(&self, place: PlaceId) -> bool {
        self.by_transition
            .iter()
            .any(|arcs| arcs.produced(place) > 0)
    }

    pub fn arcs(&self) -> impl Iterator<Item = Arc> + '_ {
        self.by_transition
            .iter_enumerated()
            .flat_map(|(transition, arcs)| {
                let inputs = arcs.consumes.iter().map(move |&(place, weight)| {
                    Arc::new(place, transition, weight, ArcDirection::PlaceToTransition)
                });
                let outputs = arcs.produces.iter().map(move |&(place, weight)| {
                    Arc::new(place, transition, weight, ArcDirection::TransitionToPlace)
                });
                inputs.chain(outputs)
            })
    }
}
