//! Per-instantiation runtime state: the mutable half of a gate, as opposed
//! to its immutable [`crate::gate::spec::GateSpec`].

use crate::circuit::instance::CircuitRuntime;
use crate::gate::common::TriggerOutput;
use crate::gate::listener::GateListener;
use crate::tag::Tag;
use crate::value::PortValue;
use std::collections::HashSet;

/// `(flow_state, user_state)` — the private mutable state of a
/// [`crate::gate::common::CommonGateSpec`] instance. `flow_state` directs
/// the gate's internal state machine; `user_state` is opaque to the
/// runtime.
#[derive(Clone, Debug, Default)]
pub struct GateState {
    pub flow_state: i32,
    pub user_state: PortValue,
}

/// Which of the two runtime shapes a [`GateInstance`] has: a flat
/// flow-state machine (primitives and function-wrappers), or a nested
/// arena of sub-instances (circuits).
pub enum InstanceKind {
    Simple(GateState),
    Composite(CircuitRuntime),
}

/// The mutable runtime state of one gate instantiation: incoming/outgoing
/// port values and tags, a display qualifier/id, an observer list, and
/// either a flow-state or a nested circuit runtime.
pub struct GateInstance {
    incoming: Vec<PortValue>,
    outgoing: Vec<PortValue>,
    tags_incoming: Vec<Tag>,
    tags_outgoing: Vec<Tag>,
    /// Display qualifier/id, kept only when the `debug_gates` feature is on
    /// (enabled by default). Disable the feature for a small perf/memory
    /// win on builds that never need readable diagnostics.
    #[cfg(feature = "debug_gates")]
    qual: Option<String>,
    #[cfg(feature = "debug_gates")]
    id: Option<String>,
    listeners: Vec<Box<dyn GateListener>>,
    pub(crate) kind: InstanceKind,
}

impl GateInstance {
    pub fn new(nports: usize, qual: Option<String>, id: Option<String>, kind: InstanceKind) -> Self {
        #[cfg(not(feature = "debug_gates"))]
        let (_, _) = (&qual, &id);
        GateInstance {
            incoming: vec![PortValue::Void; nports],
            outgoing: vec![PortValue::Void; nports],
            tags_incoming: vec![Tag::Notag; nports],
            tags_outgoing: vec![Tag::Notag; nports],
            #[cfg(feature = "debug_gates")]
            qual,
            #[cfg(feature = "debug_gates")]
            id,
            listeners: Vec::new(),
            kind,
        }
    }

    pub fn nports(&self) -> usize {
        self.incoming.len()
    }

    pub fn add_listener(&mut self, listener: Box<dyn GateListener>) {
        self.listeners.push(listener);
    }

    /// Builds a human-readable name for diagnostics and listener output.
    /// With the `debug_gates` feature disabled, falls back to the bare gate
    /// name — the qualifier/id are not stored at all in that configuration.
    #[cfg(feature = "debug_gates")]
    pub fn display_name(&self, gate_name: &str) -> String {
        match (&self.qual, &self.id) {
            (Some(q), Some(i)) => format!("{}.{}#{}", q, gate_name, i),
            (Some(q), None) => format!("{}.{}", q, gate_name),
            (None, Some(i)) => format!("{}#{}", gate_name, i),
            (None, None) => gate_name.to_string(),
        }
    }
    #[cfg(not(feature = "debug_gates"))]
    pub fn display_name(&self, gate_name: &str) -> String {
        gate_name.to_string()
    }

    pub fn incoming(&self) -> &[PortValue] {
        &self.incoming
    }
    pub fn outgoing_values(&self) -> &[PortValue] {
        &self.outgoing
    }
    pub fn tags_incoming(&self) -> &[Tag] {
        &self.tags_incoming
    }
    pub fn tags_outgoing(&self) -> &[Tag] {
        &self.tags_outgoing
    }

    pub fn get_incoming_index(&self, port: usize) -> &PortValue {
        &self.incoming[port]
    }
    pub fn get_outgoing_index(&self, port: usize) -> &PortValue {
        &self.outgoing[port]
    }

    /// Flow-state of a [`InstanceKind::Simple`] instance.
    ///
    /// # Panics
    /// Panics if this instance is a [`InstanceKind::Composite`] circuit —
    /// only `CommonGateSpec`-backed instances have a flow-state.
    pub fn flow_state(&self) -> i32 {
        match &self.kind {
            InstanceKind::Simple(state) => state.flow_state,
            InstanceKind::Composite(_) => panic!("circuit instances have no flow-state"),
        }
    }

    pub fn state(&self) -> &GateState {
        match &self.kind {
            InstanceKind::Simple(state) => state,
            InstanceKind::Composite(_) => panic!("circuit instances have no flow-state"),
        }
    }

    /// I1: writing a non-VOID value sets the tag to AVAIL; VOID sets NOTAG.
    /// Returns whether the tag actually changed, so callers (the circuit
    /// wiring loop) know whether the receiver needs to be re-examined for
    /// readiness.
    pub fn set_incoming(&mut self, port: usize, value: PortValue) -> bool {
        self.incoming[port] = value.clone();
        let tag = if value.is_void() { Tag::Notag } else { Tag::Avail };
        let changed = self.set_tag(port, tag);
        for l in &mut self.listeners {
            l.set_incoming(port, &value);
        }
        changed
    }

    pub fn set_outgoing(&mut self, port: usize, value: PortValue) {
        self.outgoing[port] = value.clone();
        for l in &mut self.listeners {
            l.set_outgoing(port, &value);
        }
    }

    /// Returns whether the tag actually changed, mirroring the original's
    /// `Gate.set_tag` (used by the circuit wiring loop to decide whether to
    /// keep propagating).
    pub fn set_tag(&mut self, port: usize, tag: Tag) -> bool {
        if self.tags_incoming[port] == tag {
            return false;
        }
        self.tags_incoming[port] = tag;
        for l in &mut self.listeners {
            l.set_tag(port, tag);
        }
        true
    }

    pub fn set_outgoing_tag(&mut self, port: usize, tag: Tag) -> bool {
        if self.tags_outgoing[port] == tag {
            return false;
        }
        self.tags_outgoing[port] = tag;
        for l in &mut self.listeners {
            l.set_outgoing_tag(port, tag);
        }
        true
    }

    /// Local half of I5's symmetric clearing: VOIDs this instance's own
    /// incoming value. Clearing the peer's outgoing value is the
    /// responsibility of whichever layer knows about the wiring (the
    /// circuit arena, for sub-instances; a no-op for a standalone
    /// instance driven directly by [`crate::driver`]).
    pub fn consume_port(&mut self, port: usize) {
        self.set_incoming(port, PortValue::Void);
    }

    /// Applies a freshly computed `tags_outgoing` vector, notifying
    /// listeners and returning the set of ports whose tag changed (used by
    /// circuits to decide which neighbors need re-propagation).
    pub fn apply_propagate(&mut self, tags_outgoing: Vec<Tag>) -> HashSet<usize> {
        let mut changes = HashSet::new();
        for (i, (&old, &new)) in self.tags_outgoing.iter().zip(tags_outgoing.iter()).enumerate() {
            if old != new {
                changes.insert(i);
            }
        }
        self.tags_outgoing = tags_outgoing;
        for l in &mut self.listeners {
            for (i, &t) in self.tags_outgoing.iter().enumerate() {
                l.set_outgoing_tag(i, t);
            }
        }
        changes
    }

    /// Applies a fired trigger's result: writes the new state, emits
    /// outputs (clearing the corresponding incoming demand tag), and
    /// consumes absorbed input ports. Returns the set of ports that now
    /// carry a non-VOID outgoing value.
    pub fn apply_produce(&mut self, result: TriggerOutput) -> HashSet<usize> {
        if let InstanceKind::Simple(state) = &mut self.kind {
            *state = result.state;
        }
        let mut emitted = HashSet::new();
        for (port, value) in result.outputs {
            let is_void = value.is_void();
            self.set_outgoing(port, value);
            if !is_void {
                emitted.insert(port);
            }
        }
        for port in result.consumed {
            self.consume_port(port);
        }
        for &port in &emitted {
            self.set_tag(port, Tag::Notag);
        }
        emitted
    }

    pub fn notify_trigger(&mut self, ready: bool) {
        for l in &mut self.listeners {
            l.trigger(ready);
        }
    }
    pub fn notify_send_tags(&mut self) {
        for l in &mut self.listeners {
            l.send_tags();
        }
    }
    pub fn notify_send(&mut self) {
        for l in &mut self.listeners {
            l.send();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn simple(nports: usize) -> GateInstance {
        GateInstance::new(nports, None, None, InstanceKind::Simple(GateState::default()))
    }

    #[test]
    fn set_incoming_keeps_tag_in_sync_with_value() {
        let mut inst = simple(1);
        assert_eq!(inst.tags_incoming()[0], Tag::Notag);
        inst.set_incoming(0, PortValue::Int(5));
        assert_eq!(inst.tags_incoming()[0], Tag::Avail);
        inst.consume_port(0);
        assert!(inst.incoming()[0].is_void());
        assert_eq!(inst.tags_incoming()[0], Tag::Notag);
    }

    #[test]
    fn set_tag_reports_whether_it_changed() {
        let mut inst = simple(1);
        assert!(inst.set_tag(0, Tag::Req));
        assert!(!inst.set_tag(0, Tag::Req));
        assert!(inst.set_tag(0, Tag::Notag));
    }

    #[test]
    fn apply_produce_clears_demand_on_emitted_ports() {
        let mut inst = simple(1);
        inst.set_tag(0, Tag::Req);
        let result = TriggerOutput {
            state: GateState::default(),
            outputs: [(0usize, PortValue::Int(9))].into_iter().collect(),
            consumed: HashSet::new(),
        };
        let emitted = inst.apply_produce(result);
        assert_eq!(emitted, [0usize].into_iter().collect());
        assert_eq!(inst.tags_incoming()[0], Tag::Notag);
        assert_eq!(inst.outgoing_values()[0].as_int(), Some(9));
    }
}
