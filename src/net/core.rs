//! 运行时: 可发生集、发生语义与构网校验.
use std::fmt;

use thiserror::Error;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::incidence::{ArcIndex, TransitionArcs};
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::marking::Marking;
#[cfg(test)]
use crate::net::marking::Tokens;
use crate::net::structure::{Arc, ArcDirection, Place, Transition, Weight};

/// Firing a transition that is not declared or not enabled, or firing under a
/// marking of the wrong width, is a caller bug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FireError {
    #[error("transition {0:?} is out of bounds")]
    OutOfBounds(TransitionId),
    #[error("transition {0:?} is not enabled under the supplied marking")]
    NotEnabled(TransitionId),
    #[error("marking covers {found} places but the net declares {expected}")]
    MarkingSize { expected: usize, found: usize },
    #[error("firing sequence failed at step {step}")]
    SequenceStep {
        step: usize,
        #[source]
        source: Box<FireError>,
    },
}

/// Errors raised while building a net: arcs must reference declared nodes and
/// carry positive weights, names must be unique.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetError {
    #[error("place {0:?} is out of bounds")]
    PlaceOutOfBounds(PlaceId),
    #[error("transition {0:?} is out of bounds")]
    TransitionOutOfBounds(TransitionId),
    #[error("unknown place `{0}`")]
    UnknownPlace(String),
    #[error("unknown transition `{0}`")]
    UnknownTransition(String),
    #[error("arc between place `{place}` and transition `{transition}` has zero weight")]
    ZeroWeight { place: String, transition: String },
    #[error("place `{0}` is declared twice")]
    DuplicatePlace(String),
    #[error("transition `{0}` is declared twice")]
    DuplicateTransition(String),
}

/// Petri 网连通性诊断报告
#[derive(Debug, Clone, Default)]
pub struct DiagnosticReport {
    /// 孤立库所（无任何连接的弧）
    pub isolated_places: Vec<(PlaceId, String)>,
    /// 孤立变迁（无任何连接的弧）
    pub isolated_transitions: Vec<(TransitionId, String)>,
    pub warnings: Vec<String>,
    pub total_places: usize,
    pub total_transitions: usize,
}

impl DiagnosticReport {
    pub fn has_issues(&self) -> bool {
        !self.isolated_places.is_empty()
            || !self.isolated_transitions.is_empty()
            || !self.warnings.is_empty()
    }
}

#[derive(Clone, Default)]
pub struct Net {
    pub places: IndexVec<PlaceId, Place>,
    pub transitions: IndexVec<TransitionId, Transition>,
    arcs: ArcIndex,
}

impl fmt::Debug for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Net")
            .field("places", &self.places)
            .field("transitions", &self.transitions)
            .field("arcs", &self.arcs.arcs().collect::<Vec<_>>())
            .finish()
    }
}

impl Net {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add_place(&mut self, place: Place) -> Result<PlaceId, NetError> {
        if self.place_by_name(&place.name).is_some() {
            return Err(NetError::DuplicatePlace(place.name));
        }
        Ok(self.places.push(place))
    }

    pub fn add_transition(&mut self, transition: Transition) -> Result<TransitionId, NetError> {
        if self.transition_by_name(&transition.name).is_some() {
            return Err(NetError::DuplicateTransition(transition.name));
        }
        let transition_id = self.transitions.push(transition);
        let arc_id = self.arcs.push_transition();
        debug_assert_eq!(transition_id, arc_id);
        Ok(transition_id)
    }

    /// 输入弧: place -> transition
    pub fn add_input_arc(
        &mut self,
        place: PlaceId,
        transition: TransitionId,
        weight: Weight,
    ) -> Result<(), NetError> {
        self.add_arc(Arc::new(
            place,
            transition,
            weight,
            ArcDirection::PlaceToTransition,
        ))
    }

    /// 输出弧: transition -> place
    pub fn add_output_arc(
        &mut self,
        place: PlaceId,
        transition: TransitionId,
        weight: Weight,
    ) -> Result<(), NetError> {
        self.add_arc(Arc::new(
            place,
            transition,
            weight,
            ArcDirection::TransitionToPlace,
        ))
    }

    pub fn add_arc(&mut self, arc: Arc) -> Result<(), NetError> {
        let place = self
            .places
            .get(arc.place)
            .ok_or(NetError::PlaceOutOfBounds(arc.place))?;
        let transition = self
            .transitions
            .get(arc.transition)
            .ok_or(NetError::TransitionOutOfBounds(arc.transition))?;
        if arc.weight == 0 {
            return Err(NetError::ZeroWeight {
                place: place.name.clone(),
                transition: transition.name.clone(),
            });
        }
        self.arcs
            .add(arc.place, arc.transition, arc.weight, arc.direction);
        Ok(())
    }

    pub fn place_by_name(&self, name: &str) -> Option<PlaceId> {
        self.places.position(|place| place.name == name)
    }

    pub fn transition_by_name(&self, name: &str) -> Option<TransitionId> {
        self.transitions
            .position(|transition| transition.name == name)
    }

    pub fn get_place(&self, place: PlaceId) -> Option<&Place> {
        self.places.get(place)
    }

    pub fn get_transition(&self, transition: TransitionId) -> Option<&Transition> {
        self.transitions.get(transition)
    }

    pub fn transition_name(&self, transition: TransitionId) -> &str {
        self.transitions
            .get(transition)
            .map(|t| t.name.as_str())
            .unwrap_or("?")
    }

    pub fn arcs_of(&self, transition: TransitionId) -> Option<&TransitionArcs> {
        self.arcs.get(transition)
    }

    pub fn arcs(&self) -> impl Iterator<Item = Arc> + '_ {
        self.arcs.arcs()
    }

    pub fn input_weight(&self, place: PlaceId, transition: TransitionId) -> Weight {
        self.arcs
            .get(transition)
            .map(|arcs| arcs.consumed(place))
            .unwrap_or(0)
    }

    pub fn output_weight(&self, place: PlaceId, transition: TransitionId) -> Weight {
        self.arcs
            .get(transition)
            .map(|arcs| arcs.produced(place))
            .unwrap_or(0)
    }

    pub fn places_len(&self) -> usize {
        self.places.len()
    }

    pub fn transitions_len(&self) -> usize {
        self.transitions.len()
    }

    pub fn initial_marking(&self) -> Marking {
        Marking::from_counts(self.places.iter().map(|p| p.tokens))
    }

    /// 诊断信息：检测 Petri 网中的孤立节点与无前集的迁移
    pub fn diagnose_connectivity(&self) -> DiagnosticReport {
        let mut isolated_places = Vec::new();
        let mut isolated_transitions = Vec::new();
        let mut warnings = Vec::new();

        for (place_id, place) in self.places.iter_enumerated() {
            let has_input = self.arcs.has_output_arc(place_id);
            let has_output = self.arcs.has_input_arc(place_id);

            if !has_input && !has_output {
                isolated_places.push((place_id, place.name.clone()));
            } else if !has_input && place.tokens == 0 {
                warnings.push(format!(
                    "place `{}` has no producing transition and starts empty",
                    place.name
                ));
            }
        }

        for (trans_id, arcs) in self.arcs.iter_enumerated() {
            let name = self.transition_name(trans_id).to_owned();
            match (arcs.consumes().is_empty(), arcs.produces().is_empty()) {
                (true, true) => isolated_transitions.push((trans_id, name)),
                (true, false) => warnings.push(format!(
                    "transition `{}` has no input place and is always enabled",
                    name
                )),
                _ => {}
            }
        }

        DiagnosticReport {
            isolated_places,
            isolated_transitions,
            warnings,
            total_places: self.places_len(),
            total_transitions: self.transitions_len(),
        }
    }

    pub fn log_diagnostics(&self) {
        let report = self.diagnose_connectivity();

        if !report.has_issues() {
            log::info!(
                "net connectivity ok: {} places, {} transitions",
                report.total_places,
                report.total_transitions
            );
            return;
        }

        for (id, name) in &report.isolated_places {
            log::warn!("isolated place [{}] {}", id.index(), name);
        }
        for (id, name) in &report.isolated_transitions {
            log::warn!("isolated transition [{}] {}", id.index(), name);
        }
        for warning in &report.warnings {
            log::warn!("{}", warning);
        }
    }

    pub fn enabled_transitions(&self, marking: &Marking) -> Vec<TransitionId> {
        self.transitions
            .indices()
            .filter(|&transition| self.is_enabled(marking, transition))
            .collect()
    }

    /// 迁移可发生当且仅当其前集中每个库所持有 `ω` 或不少于弧权重的令牌。
    /// 前集为空的迁移总是可发生；未声明的迁移不可发生。
    pub fn is_enabled(&self, marking: &Marking, transition: TransitionId) -> bool {
        match self.arcs.get(transition) {
            Some(arcs) => arcs
                .consumes()
                .iter()
                .all(|&(place, weight)| marking.get(place).covers(weight)),
            None => false,
        }
    }

    /// 标识必须恰好覆盖网中声明的全部库所。
    pub fn check_marking(&self, marking: &Marking) -> Result<(), FireError> {
        if marking.len() != self.places_len() {
            return Err(FireError::MarkingSize {
                expected: self.places_len(),
                found: marking.len(),
            });
        }
        Ok(())
    }

    pub fn fire_transition(
        &self,
        marking: &Marking,
        transition: TransitionId,
    ) -> Result<Marking, FireError> {
        self.check_marking(marking)?;
        let arcs = self
            .arcs
            .get(transition)
            .ok_or(FireError::OutOfBounds(transition))?;
        if !self.is_enabled(marking, transition) {
            return Err(FireError::NotEnabled(transition));
        }
        Ok(marking.with_effect(arcs.consumes(), arcs.produces()))
    }

    pub fn fire_sequence(
        &self,
        marking: &Marking,
        sequence: &[TransitionId],
    ) -> Result<Marking, FireError> {
        sequence
            .iter()
            .enumerate()
            .try_fold(marking.clone(), |current, (step, &transition)| {
                self.fire_transition(&current, transition)
                    .map_err(|source| FireError::SequenceStep {
                        step,
                        source: Box::new(source),
                    })
            })
    }
}
