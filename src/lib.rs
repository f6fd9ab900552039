//! `gateflow` — a demand-driven dataflow virtual machine.
//!
//! Programs are networks of *gates* wired together through *ports*; values
//! flow only where they are requested, and each gate decides lazily which of
//! its inputs it needs to satisfy each output request. This crate is the
//! gate runtime itself: the propagate/trigger/produce cycle, the tag
//! lattice that governs demand flow, the composition of gates into
//! hierarchical circuits ([`circuit`]), and the standard library of gates
//! ([`stdlib`]) built on top of the table-driven primitive ([`gate::common`]).
//!
//! A front-end that parses source syntax into a gate network, or an
//! evaluator that drives the VM with real input streams, are applications
//! of this core; neither lives here. [`driver`] provides the two reference
//! drivers (`run_once`, `run_stream`) that such an application would use.

pub mod circuit;
pub mod data_structures;
pub mod driver;
pub mod error;
pub mod gate;
pub mod stdlib;
pub mod tag;
pub mod value;

pub use circuit::{new_circuit, CircuitSpec, Endpoint};
pub use driver::{run_once, run_stream, InputStream};
pub use error::MpvmError;
pub use gate::{new_function_gate, Behavior, GateInstance, GateListener, GateSpec};
pub use tag::Tag;
pub use value::PortValue;
