//! `Sequence(n)`: a linear automaton that demands `i0, i1, ..., i(n-1)` in
//! strict order, emitting the final input's value on `out`.

use crate::gate::common::{CommonGateSpecBuilder, TriggerOutput};
use crate::gate::instance::GateState;
use crate::gate::spec::GateSpec;
use crate::tag::Tag;

/// In flow-state `k` only `iK` is demanded (and only once `out` is
/// requested — §4.2.1's `(flow_state, out_port, tag)` key exists for
/// exactly this). Arrival of `iK` advances the state to `(k+1) mod n`,
/// consuming `iK`; the arrival of the last input (`i(n-1)`) is additionally
/// what gets emitted on `out`. This enforces strict ordering of a chain of
/// dependencies.
pub fn sequence_gate(n: usize) -> GateSpec {
    assert!(n > 0, "Sequence must have at least one input");
    let in_names: Vec<String> = (0..n).map(|i| format!("i{}", i)).collect();
    let mut ports = in_names.clone();
    ports.push("out".to_string());
    let out_idx = n;

    let mut builder = CommonGateSpecBuilder::new(format!("Sequence{}", n), ports)
        .starter(GateState::default)
        .deps_unconditional(&[]);

    for (k, name) in in_names.iter().enumerate() {
        builder = builder.deps_flow_out(k as i32, "out", Some(Tag::Req), &[(name.as_str(), Tag::Req)]);
    }

    for (k, name) in in_names.iter().enumerate() {
        let next = ((k + 1) % n) as i32;
        if k + 1 == n {
            builder = builder.trigger(Some(k as i32), &[(name.as_str(), Tag::Avail)], &[name.as_str()], move |state, args| {
                let mut next_state = state.clone();
                next_state.flow_state = next;
                TriggerOutput {
                    state: next_state,
                    outputs: [(out_idx, args[0].clone())].into_iter().collect(),
                    consumed: [k].into_iter().collect(),
                }
            });
        } else {
            builder = builder.trigger(Some(k as i32), &[(name.as_str(), Tag::Avail)], &[name.as_str()], move |state, _args| {
                let mut next_state = state.clone();
                next_state.flow_state = next;
                TriggerOutput {
                    state: next_state,
                    outputs: std::collections::HashMap::new(),
                    consumed: [k].into_iter().collect(),
                }
            });
        }
    }

    GateSpec::primitive(builder.build())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::driver::run_once;
    use crate::value::PortValue;

    #[test]
    fn emits_only_the_final_inputs_value() {
        let spec = sequence_gate(3);
        let result = run_once(
            &spec,
            &[
                ("i0", PortValue::Int(11)),
                ("i1", PortValue::Int(22)),
                ("i2", PortValue::Int(33)),
            ],
            &["out"],
        )
        .unwrap();
        assert_eq!(result["out"].as_int(), Some(33));
    }

    #[test]
    fn does_not_request_later_inputs_before_earlier_ones_arrive() {
        let spec = sequence_gate(2);
        let mut instance = spec.make_instance(None, None).unwrap();
        spec.set_request(&mut instance, spec.port_num("out").unwrap(), Tag::Req);
        spec.propagate(&mut instance).unwrap();
        assert_eq!(instance.tags_outgoing()[spec.port_num("i0").unwrap()], Tag::Req);
        assert_eq!(instance.tags_outgoing()[spec.port_num("i1").unwrap()], Tag::Notag);
    }
}
