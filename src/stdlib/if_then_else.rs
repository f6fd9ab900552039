//! `IfThenElse`: evaluates `cond` exactly once, then demands and forwards
//! only the selected branch — the other branch is never triggered.

use crate::error::mpvm_error;
use crate::gate::common::CommonGateSpecBuilder;
use crate::gate::common::TriggerOutput;
use crate::gate::instance::GateState;
use crate::gate::spec::GateSpec;
use crate::tag::Tag;

const AWAIT_COND: i32 = 0;
const AWAIT_TRUE: i32 = 1;
const AWAIT_FALSE: i32 = 2;

/// State 0 demands `cond` only while `out` is requested; on `cond` arriving
/// it transitions to state 1 (truthy) or state 2 (falsy), consuming `cond`.
/// States 1/2 demand `iftrue`/`iffalse` the same way — gated on `out` still
/// being requested, not unconditionally — so withdrawing the `out` request
/// mid-branch drops the branch's demand tag back to `Notag` instead of
/// leaving it stuck on `Req` forever. Once the branch value arrives it's
/// forwarded to `out` and the gate returns to state 0, ready for the next
/// evaluation.
pub fn if_then_else_gate() -> GateSpec {
    let ports = vec![
        "cond".to_string(),
        "iftrue".to_string(),
        "iffalse".to_string(),
        "out".to_string(),
        "error".to_string(),
    ];

    let common = CommonGateSpecBuilder::new("IfThenElse", ports)
        .starter(GateState::default)
        .deps_unconditional(&[])
        .deps_flow_out(AWAIT_COND, "out", Some(Tag::Req), &[("cond", Tag::Req)])
        .deps_flow_out(AWAIT_TRUE, "out", Some(Tag::Req), &[("iftrue", Tag::Req)])
        .deps_flow_out(AWAIT_FALSE, "out", Some(Tag::Req), &[("iffalse", Tag::Req)])
        .trigger(Some(AWAIT_COND), &[("cond", Tag::Avail)], &["cond"], |state, args| {
            let mut next_state = state.clone();
            next_state.flow_state = if args[0].is_truthy() { AWAIT_TRUE } else { AWAIT_FALSE };
            TriggerOutput {
                state: next_state,
                outputs: std::collections::HashMap::new(),
                consumed: [0usize].into_iter().collect(),
            }
        })
        .trigger(Some(AWAIT_TRUE), &[("iftrue", Tag::Avail)], &["iftrue"], |state, args| {
            let mut next_state = state.clone();
            next_state.flow_state = AWAIT_COND;
            TriggerOutput {
                state: next_state,
                outputs: [(3usize, args[0].clone())].into_iter().collect(),
                consumed: [1usize].into_iter().collect(),
            }
        })
        .trigger(Some(AWAIT_FALSE), &[("iffalse", Tag::Avail)], &["iffalse"], |state, args| {
            let mut next_state = state.clone();
            next_state.flow_state = AWAIT_COND;
            TriggerOutput {
                state: next_state,
                outputs: [(3usize, args[0].clone())].into_iter().collect(),
                consumed: [2usize].into_iter().collect(),
            }
        })
        .build();

    GateSpec::primitive(common)
}

/// `if.badstate`: raised by a caller that manually drives an `IfThenElse`
/// instance's flow-state outside {AWAIT_COND, AWAIT_TRUE, AWAIT_FALSE}. Not
/// reachable through this gate's own trigger table — kept for parity with
/// the error taxonomy's invariant-violation entries (§7).
pub fn bad_state_error(flow_state: i32) -> crate::error::MpvmError {
    mpvm_error!(
        "if.badstate",
        "IfThenElse instance has an impossible flow-state {flow_state}.",
        flow_state = flow_state,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::driver::run_once;
    use crate::value::PortValue;

    #[test]
    fn picks_the_true_branch_when_cond_is_truthy() {
        let spec = if_then_else_gate();
        let result = run_once(
            &spec,
            &[
                ("cond", PortValue::Int(1)),
                ("iftrue", PortValue::Int(33)),
                ("iffalse", PortValue::Int(44)),
            ],
            &["out"],
        )
        .unwrap();
        assert_eq!(result["out"].as_int(), Some(33));
    }

    #[test]
    fn picks_the_false_branch_when_cond_is_falsy_and_never_requests_iftrue() {
        let spec = if_then_else_gate();
        let mut instance = spec.make_instance(None, None).unwrap();
        spec.set_input(&mut instance, spec.port_num("cond").unwrap(), PortValue::Int(0));
        spec.set_input(&mut instance, spec.port_num("iftrue").unwrap(), PortValue::Int(33));
        spec.set_input(&mut instance, spec.port_num("iffalse").unwrap(), PortValue::Int(44));
        spec.set_request(&mut instance, spec.port_num("out").unwrap(), Tag::Req);
        loop {
            spec.propagate(&mut instance).unwrap();
            assert_eq!(instance.tags_outgoing()[spec.port_num("iftrue").unwrap()], Tag::Notag);
            if !spec.trigger(&mut instance) {
                break;
            }
            spec.produce(&mut instance).unwrap();
        }
        assert_eq!(
            instance.get_outgoing_index(spec.port_num("out").unwrap()).as_int(),
            Some(44)
        );
    }

    /// Withdrawing the `out` request while the gate is mid-branch (waiting
    /// on `iftrue` or `iffalse`) must drop that branch's demand tag back to
    /// `Notag` — the gated `deps_flow_out` entries for states 1/2 must not
    /// degrade into an unconditional demand.
    #[test]
    fn withdrawing_out_mid_branch_drops_the_branch_demand() {
        let spec = if_then_else_gate();
        let mut instance = spec.make_instance(None, None).unwrap();
        spec.set_input(&mut instance, spec.port_num("cond").unwrap(), PortValue::Int(1));
        spec.set_request(&mut instance, spec.port_num("out").unwrap(), Tag::Req);

        // Drive through state 0 -> state 1, where `iftrue` becomes demanded.
        spec.propagate(&mut instance).unwrap();
        assert!(spec.trigger(&mut instance));
        spec.produce(&mut instance).unwrap();
        spec.propagate(&mut instance).unwrap();
        assert_eq!(instance.tags_outgoing()[spec.port_num("iftrue").unwrap()], Tag::Req);

        // Withdraw the request on `out`; `iftrue`'s demand must follow it
        // back down to `Notag` rather than staying pinned at `Req`.
        spec.set_request(&mut instance, spec.port_num("out").unwrap(), Tag::Notag);
        spec.propagate(&mut instance).unwrap();
        assert_eq!(instance.tags_outgoing()[spec.port_num("iftrue").unwrap()], Tag::Notag);
    }
}
