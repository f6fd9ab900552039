//! §4.3: lifts a pure function into a gate with one port per argument plus
//! `out` and (unless disabled) `error`.
//!
//! The original exception-boundary design ("success emits on `out`, failure
//! emits the caught error on `error`") is expressed here as `f` returning a
//! `Result` rather than by catching a panic — idiomatic for Rust, and it
//! lets a gate like `Div` hand back a structured `arithmetic.division_by_zero`
//! error instead of the wrapper needing to unwind a runtime panic.

use crate::error::{mpvm_error, MpvmError};
use crate::gate::common::{CommonGateSpecBuilder, TriggerOutput};
use crate::gate::instance::GateState;
use crate::gate::spec::GateSpec;
use crate::tag::Tag;
use crate::value::PortValue;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Builds a `FunctionWrapper` gate: ports are `arg_names` (in order) plus
/// `out`, plus `error` unless `include_error` is false. Construction fails
/// if any argument is named `out` or `error`. The wrapped function runs at
/// most once per fire; exactly one of `out`/`error` is emitted.
pub fn new_function_gate(
    name: impl Into<String>,
    arg_names: Vec<String>,
    f: impl Fn(&[PortValue]) -> Result<PortValue, MpvmError> + Send + Sync + 'static,
    include_error: bool,
) -> Result<GateSpec, MpvmError> {
    for arg in &arg_names {
        if arg == "out" || arg == "error" {
            return Err(mpvm_error!(
                "functiongate.illegal_port_names",
                "Argument name '{name}' collides with a reserved FunctionGate port.",
                name = arg,
            ));
        }
    }

    let name = name.into();
    let mut ports = arg_names.clone();
    ports.push("out".to_string());
    if include_error {
        ports.push("error".to_string());
    }

    let nargs = arg_names.len();
    let req_pairs: Vec<(&str, Tag)> = arg_names.iter().map(|a| (a.as_str(), Tag::Req)).collect();

    let mut builder = CommonGateSpecBuilder::new(name, ports)
        .starter(GateState::default)
        .deps_unconditional(&[])
        .deps_out("out", Some(Tag::Req), &req_pairs);
    if include_error {
        // The error port is "free": demanding it alone requests nothing.
        builder = builder.deps_out("error", Some(Tag::Req), &[]);
    }

    let arg_pattern: Vec<(&str, Tag)> = arg_names.iter().map(|a| (a.as_str(), Tag::Avail)).collect();
    let arg_refs: Vec<&str> = arg_names.iter().map(String::as_str).collect();
    let f = Arc::new(f);
    builder = builder.trigger(None, &arg_pattern, &arg_refs, move |state, args| {
        let consumed: HashSet<usize> = (0..nargs).collect();
        match f(args) {
            Ok(value) => TriggerOutput {
                state: state.clone(),
                outputs: [(nargs, value)].into_iter().collect(),
                consumed,
            },
            Err(e) => {
                let mut outputs: HashMap<usize, PortValue> = HashMap::new();
                if include_error {
                    outputs.insert(nargs + 1, PortValue::Error(Arc::new(e)));
                }
                TriggerOutput {
                    state: state.clone(),
                    outputs,
                    consumed,
                }
            }
        }
    });

    Ok(GateSpec::function_wrapper(builder.build()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_argument_named_out_or_error() {
        let err = new_function_gate(
            "bad",
            vec!["out".to_string()],
            |_| Ok(PortValue::Void),
            true,
        )
        .unwrap_err();
        assert!(err.is_kind("functiongate.illegal_port_names"));
    }

    #[test]
    fn builds_add_with_two_named_arguments() {
        let spec = new_function_gate(
            "add",
            vec!["a".into(), "b".into()],
            |args| Ok(PortValue::Int(args[0].as_int().unwrap() + args[1].as_int().unwrap())),
            true,
        )
        .unwrap();
        assert_eq!(spec.nports(), 4);
        assert_eq!(spec.port_num("out").unwrap(), 2);
        assert_eq!(spec.port_num("error").unwrap(), 3);
    }
}
