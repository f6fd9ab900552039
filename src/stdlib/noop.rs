//! `NOOP`: a gate that never triggers — `out` stays VOID forever. Useful as
//! a placeholder sub-gate wherever a circuit needs a port filled but
//! unimplemented.

use crate::gate::common::CommonGateSpecBuilder;
use crate::gate::instance::GateState;
use crate::gate::spec::GateSpec;

/// No dependency entries and no trigger rules: `propagate` always yields
/// `Notag`, and `trigger` never finds a match.
pub fn noop_gate() -> GateSpec {
    let common = CommonGateSpecBuilder::new("NOOP", vec!["out".to_string()])
        .starter(GateState::default)
        .deps_unconditional(&[])
        .build();
    GateSpec::primitive(common)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tag::Tag;

    #[test]
    fn never_triggers_even_when_requested() {
        let spec = noop_gate();
        let mut instance = spec.make_instance(None, None).unwrap();
        spec.set_request(&mut instance, 0, Tag::Req);
        spec.propagate(&mut instance).unwrap();
        assert!(!spec.trigger(&mut instance));
        assert!(instance.get_outgoing_index(0).is_void());
    }
}
