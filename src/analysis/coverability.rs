//! 覆盖关系与 ω 加速（Karp–Miller）。
//!
//! `le(m1, m2)` 为逐库所的 `m1 ≤ m2`，`gt_strict(m1, m2)` 为逐库所 `≥` 且至少一处严格。
//! 若新标识严格覆盖某个已知标识，导致增长的发生序列可以无限重复，
//! 于是把所有严格增长的库所提升为 `ω`。
use serde::{Deserialize, Serialize};

use crate::net::{Idx, Marking, PlaceId, Tokens};

/// Which earlier markings a freshly fired successor is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AncestorPolicy {
    /// Only the markings on the discovery path from the root to the node being
    /// expanded, the node itself included (classical Karp–Miller).
    #[default]
    Path,
    /// Every marking accepted so far, regardless of lineage. Prunes harder and
    /// may merge markings that the path policy keeps apart.
    Visited,
}

impl AncestorPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            AncestorPolicy::Path => "path",
            AncestorPolicy::Visited => "visited",
        }
    }
}

fn span(m1: &Marking, m2: &Marking) -> usize {
    m1.len().max(m2.len())
}

/// `m1 ≤ m2`: `ω` in `m1` needs `ω` in `m2`; a finite count needs `ω` or a
/// count at least as large.
pub fn le(m1: &Marking, m2: &Marking) -> bool {
    (0..span(m1, m2)).map(PlaceId::from_usize).all(|place| match (m1.get(place), m2.get(place)) {
        (Tokens::Omega, right) => right.is_omega(),
        (Tokens::Finite(_), Tokens::Omega) => true,
        (Tokens::Finite(left), Tokens::Finite(right)) => left <= right,
    })
}

/// `m1 > m2`: componentwise `≥` with at least one strict place. A finite count
/// never dominates `ω`.
pub fn gt_strict(m1: &Marking, m2: &Marking) -> bool {
    let mut strict = false;
    for place in (0..span(m1, m2)).map(PlaceId::from_usize) {
        match (m1.get(place), m2.get(place)) {
            (Tokens::Omega, Tokens::Omega) => {}
            (Tokens::Omega, Tokens::Finite(_)) => strict = true,
            (Tokens::Finite(_), Tokens::Omega) => return false,
            (Tokens::Finite(left), Tokens::Finite(right)) => {
                if left < right {
                    return false;
                }
                if left > right {
                    strict = true;
                }
            }
        }
    }
    strict
}

/// Promotes to `ω` every place on which `candidate` strictly grew over some
/// marking in `known` that it dominates. Sweeps the known set until a full
/// pass changes nothing, so the result is a fixpoint: accelerating it again
/// against the same set reports no change.
pub fn accelerate<'a, I>(candidate: &Marking, known: I) -> (Marking, bool)
where
    I: IntoIterator<Item = &'a Marking>,
    I::IntoIter: Clone,
{
    let known = known.into_iter();
    let mut current = candidate.clone();
    let mut changed = false;

    loop {
        let mut swept = false;
        for old in known.clone() {
            if !(le(old, &current) && gt_strict(&current, old)) {
                continue;
            }
            for place in (0..span(&current, old)).map(PlaceId::from_usize) {
                let grew = match (current.get(place), old.get(place)) {
                    (Tokens::Omega, _) => false,
                    (Tokens::Finite(_), Tokens::Omega) => true,
                    (Tokens::Finite(new), Tokens::Finite(before)) => new > before,
                };
                if grew {
                    current.set(place, Tokens::Omega);
                    swept = true;
                }
            }
        }
        if !swept {
            break;
        }
        changed = true;
    }

    if changed {
        log::debug!("accelerated {} to {}", candidate, current);
    }
    (current, changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(counts: &[u64]) -> Marking {
        Marking::from_counts(counts.iter().copied())
    }

    fn omega(marking: Marking, idx: usize) -> Marking {
        marking.with_place(PlaceId::from_usize(idx), Tokens::Omega)
    }

    #[test]
    fn le_is_reflexive_and_gt_is_irreflexive() {
        let samples = [m(&[0, 0]), m(&[3, 1]), omega(m(&[2, 0]), 1), omega(omega(m(&[0, 0]), 0), 1)];
        for sample in &samples {
            assert!(le(sample, sample));
            assert!(!gt_strict(sample, sample));
        }
    }

    #[test]
    fn le_is_transitive() {
        let a = m(&[1, 0, 2]);
        let b = m(&[1, 3, 2]);
        let c = omega(m(&[4, 3, 2]), 1);
        assert!(le(&a, &b));
        assert!(le(&b, &c));
        assert!(le(&a, &c));
    }

    #[test]
    fn omega_is_not_dominated_by_finite_counts() {
        let finite = m(&[u64::MAX]);
        let unbounded = omega(m(&[0]), 0);
        assert!(le(&finite, &unbounded));
        assert!(!le(&unbounded, &finite));
        assert!(gt_strict(&unbounded, &finite));
        assert!(!gt_strict(&finite, &unbounded));
    }

    #[test]
    fn incomparable_markings_are_neither_le_nor_gt() {
        let a = m(&[1, 0]);
        let b = m(&[0, 1]);
        assert!(!le(&a, &b));
        assert!(!le(&b, &a));
        assert!(!gt_strict(&a, &b));
        assert!(!gt_strict(&b, &a));
    }

    #[test]
    fn predicates_agree_with_partial_order() {
        let a = m(&[1, 2]);
        let b = omega(m(&[1, 5]), 0);
        assert_eq!(le(&a, &b), a <= b);
        assert_eq!(gt_strict(&b, &a), b > a);
    }

    #[test]
    fn accelerate_promotes_strictly_grown_places() {
        let root = m(&[1, 0]);
        let grown = m(&[1, 1]);
        let (result, changed) = accelerate(&grown, [&root]);
        assert!(changed);
        assert_eq!(result, omega(m(&[1, 0]), 1));
    }

    #[test]
    fn accelerate_ignores_incomparable_and_equal_markings() {
        let known = [m(&[2, 0]), m(&[1, 1])];
        let (result, changed) = accelerate(&m(&[1, 1]), known.iter());
        assert!(!changed);
        assert_eq!(result, m(&[1, 1]));
    }

    #[test]
    fn accelerate_reaches_a_fixpoint_across_known_markings() {
        // Promoting p1 against `first` makes the candidate dominate `second`,
        // which then promotes p0.
        let first = m(&[3, 0]);
        let second = omega(m(&[1, 0]), 1);
        let candidate = m(&[3, 1]);
        let known = [second.clone(), first.clone()];

        let (result, changed) = accelerate(&candidate, known.iter());
        assert!(changed);
        assert_eq!(result, omega(omega(m(&[0, 0]), 0), 1));
    }

    #[test]
    fn accelerate_is_idempotent() {
        let known = [m(&[0, 1, 0]), m(&[1, 1, 0]), omega(m(&[0, 0, 0]), 2)];
        let (once, _) = accelerate(&m(&[1, 2, 5]), known.iter());
        let (twice, changed) = accelerate(&once, known.iter());
        assert!(!changed);
        assert_eq!(once, twice);
    }

    #[test]
    fn policy_parses_from_lowercase_names() {
        let policy: AncestorPolicy = serde_json::from_str("\"visited\"").unwrap();
        assert_eq!(policy, AncestorPolicy::Visited);
        assert_eq!(AncestorPolicy::default().as_str(), "path");
    }
}
