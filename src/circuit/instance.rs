//! Runtime state of an instantiated circuit: an arena of sub-instances,
//! their wiring, and the propagate/trigger/produce cycle that drives them
//! (§4.4 of the specification this crate implements).

use crate::data_structures::Slab;
use crate::error::{mpvm_error, MpvmError};
use crate::gate::instance::{GateInstance, InstanceKind};
use crate::gate::spec::GateSpec;
use crate::circuit::spec::{CircuitSpec, Endpoint};
use crate::tag::Tag;
use crate::value::PortValue;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

type SubId = usize;

/// What a sub-gate port is wired to: another sub-gate's port, or one of the
/// circuit's own external ports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Neighbor {
    Sub(SubId, usize),
    External(usize),
}

/// Outputs collected at a circuit's outlets during one produce cycle.
pub struct CircuitProduceResult {
    pub outputs: HashMap<usize, PortValue>,
}

/// The mutable runtime of a composite gate: a [`Slab`] of sub-instances
/// (paired with their specs so `propagate`/`trigger`/`produce` can be
/// dispatched), the resolved wiring table, and the outlet lookup used to
/// read/write the circuit's own external ports.
pub struct CircuitRuntime {
    instances: Slab<(Arc<GateSpec>, GateInstance)>,
    /// Per sub-instance, per port: what it's wired to (if anything).
    connections: Vec<HashMap<usize, Neighbor>>,
    /// Per external port: the (sub-instance, sub-port) it's wired to, or
    /// `None` if dangling.
    outlets: Vec<Option<(SubId, usize)>>,
    ext_nports: usize,
    prop_sources: HashSet<SubId>,
    triggerable: HashSet<SubId>,
    triggered: HashSet<SubId>,
}

impl CircuitRuntime {
    /// Instantiates every sub-gate, resolves and validates the wiring, and
    /// seeds `prop_sources` with every sub-instance (§4.4.1: "initially all
    /// sub-instances").
    pub fn new(spec: &CircuitSpec) -> Result<Self, MpvmError> {
        log::debug!(
            "instantiating circuit '{}' ({} sub-gates, {} wires)",
            spec.name(),
            spec.subgates.len(),
            spec.connections.len()
        );
        let mut instances: Slab<(Arc<GateSpec>, GateInstance)> = Slab::new();
        let mut name_to_id: HashMap<String, SubId> = HashMap::new();
        let mut all_ids = Vec::new();

        for (name, gate_spec) in &spec.subgates {
            let instance = gate_spec.make_instance(None, Some(name.clone()))?;
            let id = instances.insert((gate_spec.clone(), instance));
            name_to_id.insert(name.clone(), id);
            all_ids.push(id);
        }

        let mut connections: Vec<HashMap<usize, Neighbor>> = all_ids.iter().map(|_| HashMap::new()).collect();
        let mut outlets: Vec<Option<(SubId, usize)>> = vec![None; spec.nports()];

        let resolve = |ep: &Endpoint| -> Result<Neighbor, MpvmError> {
            match ep {
                Endpoint::Sub(gate, port) => {
                    let id = *name_to_id.get(gate).ok_or_else(|| {
                        mpvm_error!(
                            "circuit.unknown_subgate",
                            "Circuit {circuit} has no sub-gate named {gate}.",
                            circuit = spec.name(),
                            gate = gate,
                        )
                    })?;
                    let (gate_spec, _) = instances.get(id).unwrap();
                    let port_idx = gate_spec.port_num(port.as_str())?;
                    Ok(Neighbor::Sub(id, port_idx))
                }
                Endpoint::External(port) => {
                    let idx = spec.port_index(port).ok_or_else(|| {
                        mpvm_error!(
                            "key.invalid_port_name",
                            "Port '{port_name}' of gate {gate} does not exist.",
                            port_name = port,
                            gate = spec.name(),
                        )
                    })?;
                    Ok(Neighbor::External(idx))
                }
            }
        };

        for (a, b) in &spec.connections {
            let na = resolve(a)?;
            let nb = resolve(b)?;
            if let (Neighbor::External(_), Neighbor::External(_)) = (na, nb) {
                return Err(mpvm_error!(
                    "circuit.short_circuit",
                    "Circuit {circuit} wires two external ports directly together.",
                    circuit = spec.name(),
                ));
            }
            Self::claim(&mut connections, &mut outlets, spec.name(), na, nb)?;
            Self::claim(&mut connections, &mut outlets, spec.name(), nb, na)?;
        }

        if !spec.allow_dangling {
            for (i, name) in spec.port_names().iter().enumerate() {
                if outlets[i].is_none() {
                    return Err(mpvm_error!(
                        "circuit.missing_connection",
                        "External port '{port_name}' of circuit {circuit} is not wired to anything.",
                        port_name = name,
                        circuit = spec.name(),
                    ));
                }
            }
        }

        Ok(CircuitRuntime {
            instances,
            connections,
            outlets,
            ext_nports: spec.nports(),
            prop_sources: all_ids.into_iter().collect(),
            triggerable: HashSet::new(),
            triggered: HashSet::new(),
        })
    }

    /// Records that `from` is wired to `to`, raising `multiple_connections`
    /// if `from`'s port already carries a wire.
    fn claim(
        connections: &mut [HashMap<usize, Neighbor>],
        outlets: &mut [Option<(SubId, usize)>],
        circuit_name: &str,
        from: Neighbor,
        to: Neighbor,
    ) -> Result<(), MpvmError> {
        match from {
            Neighbor::Sub(id, port) => {
                if connections[id].contains_key(&port) {
                    return Err(mpvm_error!(
                        "circuit.multiple_connections",
                        "A sub-gate port of circuit {circuit} is wired more than once.",
                        circuit = circuit_name,
                    ));
                }
                connections[id].insert(port, to);
                if let Neighbor::External(ext) = to {
                    outlets[ext] = Some((id, port));
                }
            }
            Neighbor::External(ext) => {
                if outlets[ext].is_some() {
                    return Err(mpvm_error!(
                        "circuit.multiple_connections",
                        "External port #{port_num} of circuit {circuit} is wired more than once.",
                        port_num = ext,
                        circuit = circuit_name,
                    ));
                }
                if let Neighbor::Sub(id, port) = to {
                    outlets[ext] = Some((id, port));
                }
            }
        }
        Ok(())
    }

    fn neighbor_of(&self, id: SubId, port: usize) -> Option<Neighbor> {
        self.connections.get(id).and_then(|m| m.get(&port)).copied()
    }

    /// §4.4.1: drains `prop_sources`, propagating each and pushing any
    /// changed outgoing tag along its wire, until no source remains. Returns
    /// the circuit's own `tags_outgoing` (read off the outlets).
    ///
    /// A sub-instance's `propagate` can fail with a protocol-violation
    /// error (§7); that aborts this circuit's propagation and surfaces as
    /// `Err`, same as any other sub-instance error bubbling up through a
    /// composite gate.
    pub fn propagate(&mut self) -> Result<Vec<Tag>, MpvmError> {
        while let Some(&id) = self.prop_sources.iter().next() {
            self.prop_sources.remove(&id);
            let spec = self.instances.get(id).unwrap().0.clone();
            log::trace!("propagate: sub-gate '{}' (slot {})", spec.name(), id);
            let changed_ports = {
                let (_, inst) = self.instances.get_mut(id).unwrap();
                spec.propagate(inst)?
            };
            if changed_ports.is_empty() {
                continue;
            }
            {
                let (_, inst) = self.instances.get_mut(id).unwrap();
                inst.notify_send_tags();
            }
            for port in changed_ports {
                let tag = self.instances.get(id).unwrap().1.tags_outgoing()[port];
                if let Some(Neighbor::Sub(other_id, other_port)) = self.neighbor_of(id, port) {
                    let (_, other_inst) = self.instances.get_mut(other_id).unwrap();
                    if other_inst.set_tag(other_port, tag) {
                        // If the neighbor is itself a circuit, the demand has
                        // to keep flowing down to its outlet sub-port too —
                        // mirrors GateSpec::set_request's forwarding step.
                        if let InstanceKind::Composite(runtime) = &mut other_inst.kind {
                            runtime.forward_tag(other_port, tag);
                        }
                        self.prop_sources.insert(other_id);
                        self.triggerable.insert(other_id);
                    }
                }
            }
        }

        (0..self.ext_nports)
            .map(|ext| match self.outlets[ext] {
                Some((id, port)) => self.instances.get(id).unwrap().1.tags_outgoing()[port],
                None => Tag::Void,
            })
            .collect()
    }

    /// §4.4.2: evaluates every currently-triggerable sub-instance, draining
    /// the set as it goes (an instance found not-ready is re-queued only
    /// once its incoming tags change again).
    pub fn trigger(&mut self) -> bool {
        self.triggered.clear();
        let ids: Vec<SubId> = self.triggerable.drain().collect();
        for id in ids {
            let spec = self.instances.get(id).unwrap().0.clone();
            let (_, inst) = self.instances.get_mut(id).unwrap();
            if spec.trigger(inst) {
                self.triggered.insert(id);
            }
        }
        log::trace!("trigger: {} sub-gate(s) fired this cycle", self.triggered.len());
        !self.triggered.is_empty()
    }

    /// §4.4.3: produces every triggered sub-instance, sends the resulting
    /// outgoing values along wires, and collects the non-VOID outlet
    /// values as this circuit's own outputs.
    pub fn produce(&mut self) -> Result<CircuitProduceResult, MpvmError> {
        let triggered: Vec<SubId> = self.triggered.drain().collect();
        for &id in &triggered {
            let spec = self.instances.get(id).unwrap().0.clone();
            let (_, inst) = self.instances.get_mut(id).unwrap();
            spec.produce(inst)?;
        }

        let mut new_sources = HashSet::new();
        for &id in &triggered {
            let nports = self.instances.get(id).unwrap().1.nports();
            for port in 0..nports {
                let neighbor = self.neighbor_of(id, port);
                let value = self.instances.get(id).unwrap().1.outgoing_values()[port].clone();
                if value.is_void() {
                    continue;
                }
                if let Some(Neighbor::Sub(other_id, other_port)) = neighbor {
                    let (_, other_inst) = self.instances.get_mut(other_id).unwrap();
                    if other_inst.set_incoming(other_port, value.clone()) {
                        // Same reasoning as the tag push above: a value
                        // landing on a circuit sub-gate's external port must
                        // reach its internal outlet sub-port.
                        if let InstanceKind::Composite(runtime) = &mut other_inst.kind {
                            runtime.forward_incoming(other_port, value);
                        }
                        new_sources.insert(other_id);
                        self.triggerable.insert(other_id);
                    }
                }
            }
            let (_, inst) = self.instances.get_mut(id).unwrap();
            inst.notify_send();
        }

        let mut outputs = HashMap::new();
        for ext in 0..self.ext_nports {
            if let Some((id, port)) = self.outlets[ext] {
                let value = self.instances.get(id).unwrap().1.outgoing_values()[port].clone();
                if !value.is_void() {
                    outputs.insert(ext, value);
                }
            }
        }

        self.prop_sources = new_sources;
        Ok(CircuitProduceResult { outputs })
    }

    /// §4.4.4: forwards a direct external-input write to the outlet
    /// sub-port and marks it as a propagation source. If that outlet is
    /// itself a circuit, the write keeps recursing into its own outlet —
    /// demand/values cross as many nested-circuit boundaries as the wiring
    /// has.
    pub fn forward_incoming(&mut self, ext_port: usize, value: PortValue) {
        if let Some((id, port)) = self.outlets[ext_port] {
            let (_, inst) = self.instances.get_mut(id).unwrap();
            if inst.set_incoming(port, value.clone()) {
                if let InstanceKind::Composite(runtime) = &mut inst.kind {
                    runtime.forward_incoming(port, value);
                }
                self.prop_sources.insert(id);
                self.triggerable.insert(id);
            }
        }
    }

    /// §4.4.4: forwards a direct external demand-tag write to the outlet
    /// sub-port, recursing into a nested circuit's own outlet the same way
    /// [`Self::forward_incoming`] does.
    pub fn forward_tag(&mut self, ext_port: usize, tag: Tag) {
        if let Some((id, port)) = self.outlets[ext_port] {
            let (_, inst) = self.instances.get_mut(id).unwrap();
            if inst.set_tag(port, tag) {
                if let InstanceKind::Composite(runtime) = &mut inst.kind {
                    runtime.forward_tag(port, tag);
                }
                self.prop_sources.insert(id);
                self.triggerable.insert(id);
            }
        }
    }

    /// Whether the sub-port wired to `ext_port` currently holds VOID —
    /// used by [`GateSpec::produce`]'s circuit branch to mirror a sub's
    /// consumption of a forwarded value back onto the circuit's own
    /// external input (§4.4.3, consumption note). Dangling ports read as
    /// VOID, same as any unconnected port would.
    pub fn outlet_incoming_is_void(&self, ext_port: usize) -> bool {
        match self.outlets.get(ext_port).copied().flatten() {
            Some((id, port)) => self
                .instances
                .get(id)
                .map(|(_, inst)| inst.get_incoming_index(port).is_void())
                .unwrap_or(true),
            None => true,
        }
    }

    pub fn sub_instance(&self, name_id: SubId) -> Option<&GateInstance> {
        self.instances.get(name_id).map(|(_, inst)| inst)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gate::common::{CommonGateSpecBuilder, TriggerOutput};
    use crate::gate::instance::GateState;
    use crate::circuit::spec::CircuitSpec;
    use std::collections::HashSet as StdHashSet;

    fn constant_spec(x: i64) -> Arc<GateSpec> {
        let common = CommonGateSpecBuilder::new(format!("const{}", x), vec!["out".into()])
            .starter(GateState::default)
            .deps_unconditional(&[])
            .deps_out("out", Some(Tag::Req), &[])
            .trigger(None, &[("out", Tag::Req)], &[], move |state, _| TriggerOutput {
                state: state.clone(),
                outputs: [(0usize, PortValue::Int(x))].into_iter().collect(),
                consumed: StdHashSet::new(),
            })
            .build();
        Arc::new(GateSpec::primitive(common))
    }

    #[test]
    fn single_subgate_wired_straight_through_an_external_port() {
        let spec = CircuitSpec::new(
            "wrap",
            vec!["out".into()],
            vec![("k".into(), constant_spec(42))],
            vec![(Endpoint::sub("k", "out"), Endpoint::external("out"))],
            false,
        );
        let mut runtime = CircuitRuntime::new(&spec).unwrap();
        runtime.forward_tag(0, Tag::Req);
        // `k`'s dependency table maps `('out', REQ)` to an empty set of
        // further requests, so the demand stops here rather than echoing
        // back out as REQ; `trigger` still fires off `tags_incoming` alone.
        let tags = runtime.propagate().unwrap();
        assert_eq!(tags[0], Tag::Notag);
        assert!(runtime.trigger());
        let result = runtime.produce().unwrap();
        assert_eq!(result.outputs.get(&0).and_then(|v| v.as_int()), Some(42));
    }

    #[test]
    fn missing_connection_is_rejected_unless_dangling_allowed() {
        let spec = CircuitSpec::new("bad", vec!["out".into()], vec![], vec![], false);
        let err = CircuitRuntime::new(&spec).unwrap_err();
        assert!(err.is_kind("circuit.missing_connection"));
    }

    #[test]
    fn allow_dangling_tolerates_an_unwired_external_port() {
        let spec = CircuitSpec::new("ok", vec!["out".into()], vec![], vec![], true);
        let runtime = CircuitRuntime::new(&spec).unwrap();
        assert!(runtime.outlet_incoming_is_void(0));
    }

    /// A circuit wired as a sub-gate of another circuit must still see
    /// demand reach its internals, and its produced value must climb back
    /// out — two full levels of propagate/trigger/produce, not one.
    #[test]
    fn demand_and_values_cross_a_nested_circuit_boundary() {
        let inner = CircuitSpec::new(
            "wrap",
            vec!["out".into()],
            vec![("k".into(), constant_spec(99))],
            vec![(Endpoint::sub("k", "out"), Endpoint::external("out"))],
            false,
        );
        let inner_spec = Arc::new(GateSpec::circuit(inner));

        let outer = CircuitSpec::new(
            "outer",
            vec!["out".into()],
            vec![("inner".into(), inner_spec)],
            vec![(Endpoint::sub("inner", "out"), Endpoint::external("out"))],
            false,
        );
        let outer_spec = GateSpec::circuit(outer);

        let result = crate::driver::run_once(&outer_spec, &[], &["out"]).unwrap();
        assert_eq!(result["out"].as_int(), Some(99));
    }

    #[test]
    fn short_circuit_between_two_external_ports_is_rejected() {
        let spec = CircuitSpec::new(
            "sc",
            vec!["a".into(), "b".into()],
            vec![],
            vec![(Endpoint::external("a"), Endpoint::external("b"))],
            true,
        );
        let err = CircuitRuntime::new(&spec).unwrap_err();
        assert!(err.is_kind("circuit.short_circuit"));
    }
}
