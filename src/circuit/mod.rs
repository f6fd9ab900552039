//! Composite gates: wiring sub-gates together into a circuit that exposes
//! the same propagate/trigger/produce contract as a primitive (§4.4).

pub mod instance;
pub mod spec;

pub use instance::CircuitRuntime;
pub use spec::{new_circuit, CircuitSpec, Endpoint};
