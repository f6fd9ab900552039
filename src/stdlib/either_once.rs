//! `EitherOnce(n)`: races `n` inputs, forwarding whichever arrives first to
//! the correspondingly-indexed output, then going permanently quiet.

use crate::gate::common::{CommonGateSpecBuilder, TriggerOutput};
use crate::gate::instance::GateState;
use crate::gate::spec::GateSpec;
use crate::tag::Tag;

const ACTIVE: i32 = 0;
const DONE: i32 = 1;

/// In the initial (`ACTIVE`) state every `iK` is demanded; the first to
/// arrive is forwarded to `oK` and the gate moves to `DONE`, where no
/// dependency entry exists, so propagate's unconditional lookup simply
/// yields nothing further — no further requests are ever issued. Order
/// among simultaneously-available inputs is unspecified (§5); this build
/// resolves ties by ascending port index.
pub fn either_once_gate(n: usize) -> GateSpec {
    let in_names: Vec<String> = (0..n).map(|i| format!("i{}", i)).collect();
    let out_names: Vec<String> = (0..n).map(|i| format!("o{}", i)).collect();
    let mut ports = in_names.clone();
    ports.extend(out_names.iter().cloned());

    let req_pairs: Vec<(&str, Tag)> = in_names.iter().map(|s| (s.as_str(), Tag::Req)).collect();
    let mut builder = CommonGateSpecBuilder::new(format!("EitherOnce{}", n), ports)
        .starter(|| GateState { flow_state: ACTIVE, ..GateState::default() })
        .deps_unconditional(&[])
        .deps_flow_state(ACTIVE, &req_pairs);

    for (k, name) in in_names.iter().enumerate() {
        let out_idx = n + k;
        builder = builder.trigger(Some(ACTIVE), &[(name.as_str(), Tag::Avail)], &[name.as_str()], move |state, args| {
            let mut next_state = state.clone();
            next_state.flow_state = DONE;
            TriggerOutput {
                state: next_state,
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
    fn forwards_the_available_input_to_its_matching_output() {
        let spec = either_once_gate(3);
        let result = run_once(&spec, &[("i1", PortValue::Int(7))], &["o0", "o1", "o2"]).unwrap();
        assert!(result["o0"].is_void());
        assert_eq!(result["o1"].as_int(), Some(7));
        assert!(result["o2"].is_void());
    }

    #[test]
    fn exactly_one_output_ever_carries_a_value() {
        let spec = either_once_gate(2);
        let mut instance = spec.make_instance(None, None).unwrap();
        spec.set_request(&mut instance, spec.port_num("o0").unwrap(), Tag::Req);
        spec.set_request(&mut instance, spec.port_num("o1").unwrap(), Tag::Req);
        spec.set_input(&mut instance, spec.port_num("i0").unwrap(), PortValue::Int(1));
        spec.set_input(&mut instance, spec.port_num("i1").unwrap(), PortValue::Int(2));
        loop {
            spec.propagate(&mut instance).unwrap();
            if !spec.trigger(&mut instance) {
                break;
            }
            spec.produce(&mut instance).unwrap();
        }
        let non_void = instance
            .outgoing_values()
            .iter()
            .filter(|v| !v.is_void())
            .count();
        assert_eq!(non_void, 1);
    }
}
