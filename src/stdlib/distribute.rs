//! `Distribute(n)`: fans one input out to `n` outputs, all carrying the same
//! value.

use crate::gate::common::{CommonGateSpecBuilder, TriggerOutput};
use crate::gate::instance::GateState;
use crate::gate::spec::GateSpec;
use crate::tag::Tag;
use std::collections::HashMap;

/// Any requested `oK` demands `input`; once `input` arrives, every `oK`
/// emits the same value and `input` is consumed.
pub fn distribute_gate(n: usize) -> GateSpec {
    let out_names: Vec<String> = (0..n).map(|i| format!("o{}", i)).collect();
    let mut ports = vec!["input".to_string()];
    ports.extend(out_names.iter().cloned());

    let mut builder = CommonGateSpecBuilder::new(format!("Distribute{}", n), ports)
        .starter(GateState::default)
        .deps_unconditional(&[]);
    for out in &out_names {
        builder = builder.deps_out(out, Some(Tag::Req), &[("input", Tag::Req)]);
    }
    builder = builder.trigger(None, &[("input", Tag::Avail)], &["input"], move |state, args| {
        let value = args[0].clone();
        let outputs = (0..n).map(|i| (i + 1, value.clone())).collect::<HashMap<_, _>>();
        TriggerOutput {
            state: state.clone(),
            outputs,
            consumed: [0usize].into_iter().collect(),
        }
    });

    GateSpec::primitive(builder.build())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::driver::run_once;
    use crate::value::PortValue;

    #[test]
    fn fans_one_value_out_to_every_output() {
        let spec = distribute_gate(3);
        let result = run_once(&spec, &[("input", PortValue::Int(5))], &["o0", "o1", "o2"]).unwrap();
        assert_eq!(result["o0"].as_int(), Some(5));
        assert_eq!(result["o1"].as_int(), Some(5));
        assert_eq!(result["o2"].as_int(), Some(5));
    }

    #[test]
    fn does_not_demand_input_unless_an_output_is_requested() {
        let spec = distribute_gate(2);
        let result = run_once(&spec, &[("input", PortValue::Int(1))], &[]).unwrap();
        assert!(result.is_empty());
    }
}
