//! The standard library of gates (§4.5): the hand-written table-driven
//! primitives and function-wrappers every higher-level circuit is built
//! from.

pub mod arithmetic;
pub mod bottleneck;
pub mod constant;
pub mod distribute;
pub mod either_once;
pub mod explode;
pub mod if_then_else;
pub mod join;
pub mod noop;
pub mod sequence;

pub use arithmetic::*;
pub use bottleneck::bottleneck_gate;
pub use constant::constant_gate;
pub use distribute::distribute_gate;
pub use either_once::either_once_gate;
pub use explode::explode_gate;
pub use if_then_else::if_then_else_gate;
pub use join::join_gate;
pub use noop::noop_gate;
pub use sequence::sequence_gate;
