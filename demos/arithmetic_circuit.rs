//! Wires two `Add` gates into a small circuit — `(a + b) + c` — and runs it
//! once through [`gateflow::run_once`]. Mirrors spec scenario S3: inputs
//! `{a: 1, b: 2, c: 3}`, request `{out}` ⇒ `{out: 6}`.
//!
//! `add1`'s `error` port is left dangling: `Add` never fails, so nothing
//! needs to observe it, and a circuit may leave external-looking ports
//! unwired internally as long as `allow_dangling` says so.
//!
//! Run with `RUST_LOG=trace cargo run --example arithmetic_circuit` to see
//! the propagate/trigger/produce cycles logged.

use gateflow::{new_circuit, run_once, Endpoint, GateSpec, PortValue};
use std::sync::Arc;

fn build_circuit() -> GateSpec {
    let add1 = Arc::new(gateflow::stdlib::add_gate());
    let add2 = Arc::new(gateflow::stdlib::add_gate());

    new_circuit(
        "(a + b) + c",
        vec!["a".into(), "b".into(), "c".into(), "out".into(), "error".into()],
        vec![("add1".into(), add1), ("add2".into(), add2)],
        vec![
            (Endpoint::external("a"), Endpoint::sub("add1", "a")),
            (Endpoint::external("b"), Endpoint::sub("add1", "b")),
            (Endpoint::sub("add1", "out"), Endpoint::sub("add2", "a")),
            (Endpoint::external("c"), Endpoint::sub("add2", "b")),
            (Endpoint::sub("add2", "out"), Endpoint::external("out")),
            (Endpoint::sub("add2", "error"), Endpoint::external("error")),
        ],
        true,
    )
}

fn main() {
    env_logger::init();

    let circuit = build_circuit();

    let result = run_once(
        &circuit,
        &[
            ("a", PortValue::Int(1)),
            ("b", PortValue::Int(2)),
            ("c", PortValue::Int(3)),
        ],
        &["out", "error"],
    )
    .expect("port lookups in this demo are all valid");

    println!("out = {:?}", result["out"]);
    println!("error = {:?}", result["error"]);
    assert_eq!(result["out"].as_int(), Some(6));
    assert!(result["error"].is_void());
}
