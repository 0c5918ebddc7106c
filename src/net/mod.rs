//! # Petri 网核心定义（Place/Transition Net）
//!
//! 设库所集合 `P` 与迁移集合 `T`，每个迁移 `t` 带有输入映射
//! `consumes(t): P → ℕ⁺` 与输出映射 `produces(t): P → ℕ⁺`。
//! 标识 `M` 取值于 `(ℕ ∪ {ω})^{|P|}`：
//!
//! * 迁移 `t` **可发生** 当且仅当 `∀p ∈ consumes(t): M[p] = ω ∨ M[p] ≥ consumes(t)[p]`；
//! * 迁移 **发生** 后 `M'[p] = ω`（若 `M[p] = ω`），否则
//!   `M'[p] = max(0, M[p] - consumes(t)[p] + produces(t)[p])`。
//!
//! 名称在构网时解析为稠密索引 [`PlaceId`] / [`TransitionId`]，弧按迁移建立索引，
//! 网构造完成后只读。
//!
//! ## 示例
//!
//! ```rust
//! use pn_cover::net::{Net, Place, Tokens, Transition};
//!
//! let mut net = Net::empty();
//! let p0 = net.add_place(Place::new_with_tokens("p0", 1)).unwrap();
//! let p1 = net.add_place(Place::new("p1")).unwrap();
//! let t0 = net.add_transition(Transition::new("t0")).unwrap();
//!
//! net.add_input_arc(p0, t0, 1).unwrap();
//! net.add_output_arc(p1, t0, 1).unwrap();
//!
//! let marking = net.initial_marking();
//! assert_eq!(net.enabled_transitions(&marking), vec![t0]);
//! let next = net.fire_transition(&marking, t0).unwrap();
//! assert_eq!(next.get(p0), Tokens::Finite(0));
//! assert_eq!(next.describe(&net), "(p0:0, p1:1)");
//! ```

pub mod core;
pub mod ids;
pub mod incidence;
pub mod index_vec;
pub mod io;
pub mod marking;
pub mod structure;

pub use self::core::{DiagnosticReport, FireError, Net, NetError};
pub use ids::{PlaceId, TransitionId};
pub use incidence::{ArcIndex, ArcSet, TransitionArcs};
pub use index_vec::{Idx, IndexVec};
pub use io::{IoError, NetSpec, read_net};
pub use marking::{Marking, MarkingKey, OMEGA_GLYPH, Tokens};
pub use structure::{Arc, ArcDirection, Place, Transition, Weight};
