//! `Bottleneck(n)`: merges `n` inputs onto one output, forwarding whichever
//! arrives first.

use crate::gate::common::{CommonGateSpecBuilder, TriggerOutput};
use crate::gate::instance::GateState;
use crate::gate::spec::GateSpec;
use crate::tag::Tag;

/// Demand on `out` demands every `iK` in parallel; whichever `iK` arrives
/// first is forwarded to `out` and only that input is consumed. The order
/// of outputs when multiple inputs arrive in the same cycle is unspecified
/// (§5) — this implementation resolves ties by ascending port index, one
/// valid permutation among the ones the spec allows.
pub fn bottleneck_gate(n: usize) -> GateSpec {
    let in_names: Vec<String> = (0..n).map(|i| format!("i{}", i)).collect();
    let mut ports = in_names.clone();
    ports.push("out".to_string());
    let out_idx = n;

    let req_pairs: Vec<(&str, Tag)> = in_names.iter().map(|s| (s.as_str(), Tag::Req)).collect();
    let mut builder = CommonGateSpecBuilder::new(format!("Bottleneck{}", n), ports)
        .starter(GateState::default)
        .deps_unconditional(&[])
        .deps_out("out", Some(Tag::Req), &req_pairs);

    for (k, name) in in_names.iter().enumerate() {
        builder = builder.trigger(None, &[(name.as_str(), Tag::Avail)], &[name.as_str()], move |state, args| {
            TriggerOutput {
                state: state.clone(),
                outputs: [(out_idx, args[0].clone())].into_iter().collect(),
                consumed: [k].into_iter().collect(),
            }
        });
    }

    GateSpec::primitive(builder.build())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::driver::run_once;
    use crate::value::PortValue;

    #[test]
    fn forwards_whichever_input_is_available() {
        let spec = bottleneck_gate(3);
        let result = run_once(&spec, &[("i1", PortValue::Int(9))], &["out"]).unwrap();
        assert_eq!(result["out"].as_int(), Some(9));
    }

    #[test]
    fn first_ready_of_simultaneous_inputs_wins_deterministically() {
        let spec = bottleneck_gate(2);
        let result = run_once(
            &spec,
            &[("i0", PortValue::Int(1)), ("i1", PortValue::Int(2))],
            &["out"],
        )
        .unwrap();
        // Multiset equality per §5: either input was a legal winner; this
        // build resolves ties by ascending port index.
        assert!(result["out"].as_int() == Some(1) || result["out"].as_int() == Some(2));
    }
}
