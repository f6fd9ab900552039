//! `Explode(n)`: the inverse of `Join` — splits a fixed-length list input
//! into `n` separate outputs.

use crate::error::mpvm_error;
use crate::gate::common::{CommonGateSpecBuilder, TriggerOutput};
use crate::gate::instance::GateState;
use crate::gate::spec::GateSpec;
use crate::tag::Tag;
use crate::value::PortValue;
use std::collections::HashMap;
use std::sync::Arc;

/// Any requested `oK` or `error` demands `input`. Once `input` arrives, a
/// list of exactly `n` elements is scattered one-per-port onto `o0..o(n-1)`;
/// any other length emits `explode.wrong_input_length` on `error` instead.
pub fn explode_gate(n: usize) -> GateSpec {
    let out_names: Vec<String> = (0..n).map(|i| format!("o{}", i)).collect();
    let mut ports = vec!["input".to_string(), "error".to_string()];
    ports.extend(out_names.iter().cloned());
    let error_idx = 1usize;

    let mut builder = CommonGateSpecBuilder::new(format!("Explode{}", n), ports)
        .starter(GateState::default)
        .deps_unconditional(&[])
        .deps_out("error", Some(Tag::Req), &[("input", Tag::Req)]);
    for out in &out_names {
        builder = builder.deps_out(out, Some(Tag::Req), &[("input", Tag::Req)]);
    }

    builder = builder.trigger(None, &[("input", Tag::Avail)], &["input"], move |state, args| {
        let mut outputs: HashMap<usize, PortValue> = HashMap::new();
        match args[0].as_list() {
            Some(list) if list.len() == n => {
                for (k, value) in list.iter().enumerate() {
                    outputs.insert(2 + k, value.clone());
                }
            }
            other => {
                let got = other.map(|l| l.len()).unwrap_or(0);
                let err = mpvm_error!(
                    "explode.wrong_input_length",
                    "Explode{n} expected a list of length {n}, got {got}.",
                    n = n,
                    got = got,
                );
                outputs.insert(error_idx, PortValue::Error(Arc::new(err)));
            }
        }
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

    #[test]
    fn scatters_a_correctly_sized_list() {
        let spec = explode_gate(3);
        let result = run_once(
            &spec,
            &[("input", PortValue::List(vec![PortValue::Int(1), PortValue::Int(2), PortValue::Int(3)]))],
            &["o0", "o1", "o2", "error"],
        )
        .unwrap();
        assert_eq!(result["o0"].as_int(), Some(1));
        assert_eq!(result["o2"].as_int(), Some(3));
        assert!(result["error"].is_void());
    }

    #[test]
    fn wrong_length_reports_a_structured_error() {
        let spec = explode_gate(3);
        let result = run_once(
            &spec,
            &[("input", PortValue::List(vec![PortValue::Int(1)]))],
            &["o0", "error"],
        )
        .unwrap();
        assert!(result["o0"].is_void());
        let err = result["error"].as_error().unwrap();
        assert!(err.is_kind("explode.wrong_input_length"));
    }
}
