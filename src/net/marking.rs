//! 标识（marking）与 `ℕ ∪ {ω}` 上的令牌计数。
//!
//! `ω` 表示“可任意增长”，满足 `ω + n = ω`、`ω - n = ω`，且大于任意有限值。
//! 有限计数的减法在 0 处截断。标识是值类型：所有派生操作返回新的标识。
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

use itertools::Itertools;
use serde::{Serialize, Serializer};

use crate::net::core::Net;
use crate::net::ids::PlaceId;
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::Weight;

pub const OMEGA_GLYPH: &str = "ω";

/// Token count of a single place. Variant order gives `Finite(_) < Omega`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tokens {
    Finite(Weight),
    Omega,
}

impl Tokens {
    pub const ZERO: Tokens = Tokens::Finite(0);

    pub fn is_omega(self) -> bool {
        matches!(self, Tokens::Omega)
    }

    pub fn finite(self) -> Option<Weight> {
        match self {
            Tokens::Finite(n) => Some(n),
            Tokens::Omega => None,
        }
    }

    /// 是否足以满足权重为 `weight` 的输入弧。
    pub fn covers(self, weight: Weight) -> bool {
        match self {
            Tokens::Omega => true,
            Tokens::Finite(n) => n >= weight,
        }
    }
}

impl Default for Tokens {
    fn default() -> Self {
        Tokens::ZERO
    }
}

impl From<Weight> for Tokens {
    fn from(value: Weight) -> Self {
        Tokens::Finite(value)
    }
}

impl Add<Weight> for Tokens {
    type Output = Tokens;

    fn add(self, rhs: Weight) -> Tokens {
        match self {
            Tokens::Omega => Tokens::Omega,
            Tokens::Finite(n) => Tokens::Finite(n.saturating_add(rhs)),
        }
    }
}

impl Sub<Weight> for Tokens {
    type Output = Tokens;

    fn sub(self, rhs: Weight) -> Tokens {
        match self {
            Tokens::Omega => Tokens::Omega,
            Tokens::Finite(n) => Tokens::Finite(n.saturating_sub(rhs)),
        }
    }
}

impl fmt::Display for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tokens::Finite(n) => write!(f, "{}", n),
            Tokens::Omega => f.write_str(OMEGA_GLYPH),
        }
    }
}

impl fmt::Debug for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for Tokens {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Tokens::Finite(n) => serializer.serialize_u64(*n),
            Tokens::Omega => serializer.serialize_str(OMEGA_GLYPH),
        }
    }
}

/// Canonical identity of a marking: the token counts in place order.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MarkingKey(Box<[Tokens]>);

impl MarkingKey {
    pub fn to_marking(&self) -> Marking {
        Marking(self.0.iter().copied().collect())
    }
}

impl fmt::Display for MarkingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.iter().join(", "))
    }
}

impl fmt::Debug for MarkingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Marking(IndexVec<PlaceId, Tokens>);

impl Marking {
    pub fn new(tokens: IndexVec<PlaceId, Tokens>) -> Self {
        Self(tokens)
    }

    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = Weight>,
    {
        Self(counts.into_iter().map(Tokens::Finite).collect())
    }

    pub fn zeros(places: usize) -> Self {
        Self(IndexVec::from_elem(Tokens::ZERO, places))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlaceId, Tokens)> + '_ {
        self.0.iter_enumerated().map(|(place, tokens)| (place, *tokens))
    }

    /// 未出现在标识中的库所视为 0。
    pub fn get(&self, place: PlaceId) -> Tokens {
        self.0.get(place).copied().unwrap_or(Tokens::ZERO)
    }

    /// Returns a copy with `place` set to `tokens`, growing with zeros if needed.
    pub fn with_place(&self, place: PlaceId, tokens: Tokens) -> Marking {
        let mut next = self.clone();
        next.set(place, tokens);
        next
    }

    /// 发生效应：对每个库所，`ω` 保持 `ω`，否则为
    /// `max(0, current - consumed + produced)`。标识范围外的库所按 0 处理，
    /// 标识会补零增长到所涉及的库所。
    pub fn with_effect(
        &self,
        consumes: &[(PlaceId, Weight)],
        produces: &[(PlaceId, Weight)],
    ) -> Marking {
        let mut next = self.clone();
        // Produce before consume so the clamp applies to the net change only.
        for &(place, weight) in produces {
            next.set(place, next.get(place) + weight);
        }
        for &(place, weight) in consumes {
            next.set(place, next.get(place) - weight);
        }
        next
    }

    pub fn canonical_key(&self) -> MarkingKey {
        MarkingKey(self.0.iter().copied().collect())
    }

    /// `(p1:1, p2:ω)`，按网中库所的顺序列出全部库所。
    pub fn describe(&self, net: &Net) -> String {
        let body = net
            .places
            .iter_enumerated()
            .map(|(place, data)| format!("{}:{}", data.name, self.get(place)))
            .join(", ");
        format!("({})", body)
    }

    pub fn has_omega(&self) -> bool {
        self.0.iter().any(|tokens| tokens.is_omega())
    }

    pub fn is_finite(&self) -> bool {
        !self.has_omega()
    }

    pub fn omega_places(&self) -> Vec<PlaceId> {
        self.iter()
            .filter(|(_, tokens)| tokens.is_omega())
            .map(|(place, _)| place)
            .collect()
    }

    /// Sum of the finite counts; ω places contribute nothing.
    pub fn total_finite(&self) -> Weight {
        self.0
            .iter()
            .filter_map(|tokens| tokens.finite())
            .fold(0, Weight::saturating_add)
    }

    pub(crate) fn set(&mut self, place: PlaceId, tokens: Tokens) {
        if place.index() >= self.0.len() {
            self.0 = self
                .0
                .iter()
                .copied()
                .chain(std::iter::repeat(Tokens::ZERO))
                .take(place.index() + 1)
                .collect();
        }
        self.0[place] = tokens;
    }
}

impl fmt::Display for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.iter().join(", "))
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (place, tokens) in self.iter() {
            map.entry(&place, &tokens);
        }
        map.finish()
    }
}

impl Serialize for Marking {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

/// 覆盖序：逐库所比较，`ω` 大于任何有限值且等于自身。
/// 长度不同的标识属于不同的网，不可比较，与 `==` 保持一致。
impl PartialOrd for Marking {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.len() != other.len() {
            return None;
        }
        let mut less = false;
        let mut greater = false;
        for (left, right) in self.0.iter().zip(other.0.iter()) {
            match left.cmp(right) {
                Ordering::Less => less = true,
                Ordering::Greater => greater = true,
                Ordering::Equal => {}
            }
        }
        match (less, greater) {
            (true, true) => None,
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => Some(Ordering::Equal),
        }
    }
}
