//! `Constant(x)`: emits a fixed value on every demand; has no inputs and
//! never consumes anything.

use crate::gate::common::{CommonGateSpecBuilder, TriggerOutput};
use crate::gate::instance::GateState;
use crate::gate::spec::GateSpec;
use crate::tag::Tag;
use crate::value::PortValue;

/// Triggers on demand itself (`out == Req`), not on availability — there is
/// nothing to become available, since `Constant` has no inputs.
pub fn constant_gate(x: impl Into<PortValue>) -> GateSpec {
    let x = x.into();
    let common = CommonGateSpecBuilder::new(format!("Constant({:?})", x), vec!["out".to_string()])
        .starter(GateState::default)
        .deps_unconditional(&[])
        .deps_out("out", Some(Tag::Req), &[])
        .trigger(None, &[("out", Tag::Req)], &[], move |state, _args| TriggerOutput {
            state: state.clone(),
            outputs: [(0usize, x.clone())].into_iter().collect(),
            consumed: Default::default(),
        })
        .build();
    GateSpec::primitive(common)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::driver::run_once;

    #[test]
    fn emits_the_same_value_every_time_it_is_requested() {
        let spec = constant_gate(9i64);
        for _ in 0..3 {
            let result = run_once(&spec, &[], &["out"]).unwrap();
            assert_eq!(result["out"].as_int(), Some(9));
        }
    }
}
