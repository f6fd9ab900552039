//! A minimal command/response circuit built from `EitherOnce`, in the shape
//! of the original implementation's `make_agent`/`Environment` layer (itself
//! an application of the runtime, not part of it — see SPEC_FULL.md §4.7).
//!
//! `EitherOnce(2)` forwards whichever of its two branches answers first.
//! Here only one branch — a `Constant` — is ever wired up; the other
//! (`i1`/`o1`) is left dangling, which is enough to show that `EitherOnce`
//! demands both branches unconditionally but only ever forwards the one
//! that actually arrives.
//!
//! Run with `RUST_LOG=debug cargo run --example either_once_agent`.

use gateflow::stdlib::{constant_gate, either_once_gate};
use gateflow::{new_circuit, run_once, Endpoint, GateSpec, PortValue};
use std::sync::Arc;

fn build_circuit() -> GateSpec {
    let success = Arc::new(constant_gate(42i64));
    let race = Arc::new(either_once_gate(2));

    new_circuit(
        "first_response_wins",
        vec!["response".into()],
        vec![("success".into(), success), ("race".into(), race)],
        vec![
            (Endpoint::sub("success", "out"), Endpoint::sub("race", "i0")),
            (Endpoint::sub("race", "o0"), Endpoint::external("response")),
        ],
        // `race`'s i1/o1 (the never-fed branch) are left dangling.
        true,
    )
}

fn main() {
    env_logger::init();

    let circuit = build_circuit();
    let result = run_once(&circuit, &[], &["response"]).expect("port lookups in this demo are all valid");

    println!("response = {:?}", result["response"]);
    assert_eq!(result["response"].as_int(), Some(42));
}
