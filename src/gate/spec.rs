//! Static gate description: port table plus a behavior contract.

use crate::circuit::CircuitSpec;
use crate::error::mpvm_error;
use crate::gate::common::CommonGateSpec;
use crate::gate::instance::{GateInstance, GateState, InstanceKind};
use crate::error::MpvmError;
use crate::value::PortValue;
use std::collections::HashMap;

/// A port reference as given by a caller: either its name or its index.
/// Mirrors the original's overloaded `port_num`/`port_name`, which accept
/// either and resolve to the other.
#[derive(Clone, Debug)]
pub enum PortRef {
    Name(String),
    Index(usize),
}

impl From<&str> for PortRef {
    fn from(s: &str) -> Self {
        PortRef::Name(s.to_string())
    }
}
impl From<String> for PortRef {
    fn from(s: String) -> Self {
        PortRef::Name(s)
    }
}
impl From<usize> for PortRef {
    fn from(i: usize) -> Self {
        PortRef::Index(i)
    }
}
impl From<&PortRef> for PortRef {
    fn from(p: &PortRef) -> Self {
        p.clone()
    }
}

/// The three ways a gate can be implemented.
pub enum Behavior {
    /// A hand-written or library table-driven primitive.
    Primitive(CommonGateSpec),
    /// A pure function lifted into a gate (still a `CommonGateSpec` under
    /// the hood — see [`crate::gate::function_gate`]).
    FunctionWrapper(CommonGateSpec),
    /// A composite gate built from wired-together sub-gates.
    Circuit(CircuitSpec),
}

/// The static, shareable description of a gate: its ports and its behavior.
/// Created once, instantiated as many times as needed via [`GateSpec::make_instance`].
pub struct GateSpec {
    name: String,
    port_names: Vec<String>,
    port_index: HashMap<String, usize>,
    pub(crate) behavior: Behavior,
}

impl GateSpec {
    pub fn new(name: impl Into<String>, ports: Vec<String>, behavior: Behavior) -> Self {
        let port_index = ports
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();
        GateSpec {
            name: name.into(),
            port_names: ports,
            port_index,
            behavior,
        }
    }

    /// Builds a spec from a table-driven primitive, deriving the port list
    /// from the common spec itself.
    pub fn primitive(common: CommonGateSpec) -> Self {
        let ports = common.port_names().to_vec();
        let name = common.name().to_string();
        GateSpec::new(name, ports, Behavior::Primitive(common))
    }

    /// Builds a spec from a function-wrapper (still a `CommonGateSpec`
    /// under the hood — see [`crate::gate::function_gate`]).
    pub fn function_wrapper(common: CommonGateSpec) -> Self {
        let ports = common.port_names().to_vec();
        let name = common.name().to_string();
        GateSpec::new(name, ports, Behavior::FunctionWrapper(common))
    }

    /// Builds a spec from a circuit description.
    pub fn circuit(spec: CircuitSpec) -> Self {
        let ports = spec.port_names().to_vec();
        let name = spec.name().to_string();
        GateSpec::new(name, ports, Behavior::Circuit(spec))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nports(&self) -> usize {
        self.port_names.len()
    }

    pub fn port_names(&self) -> &[String] {
        &self.port_names
    }

    /// Resolves a port reference to its stable index.
    pub fn port_num(&self, port: impl Into<PortRef>) -> Result<usize, MpvmError> {
        match port.into() {
            PortRef::Index(i) => {
                if i >= self.port_names.len() {
                    return Err(mpvm_error!(
                        "index.invalid_port_number",
                        "Port #{port_num} of gate {gate} does not exist.",
                        port_num = i,
                        gate = self.name,
                    ));
                }
                Ok(i)
            }
            PortRef::Name(name) => self.port_index.get(&name).copied().ok_or_else(|| {
                mpvm_error!(
                    "key.invalid_port_name",
                    "Port '{port_name}' of gate {gate} does not exist.",
                    port_name = name,
                    gate = self.name,
                )
            }),
        }
    }

    /// Resolves a port reference to its canonical name.
    pub fn port_name(&self, port: impl Into<PortRef>) -> Result<&str, MpvmError> {
        match port.into() {
            PortRef::Name(name) => {
                if self.port_index.contains_key(&name) {
                    Ok(self.port_names.iter().find(|p| **p == name).unwrap())
                } else {
                    Err(mpvm_error!(
                        "key.invalid_port_name",
                        "Port '{port_name}' of gate {gate} does not exist.",
                        port_name = name,
                        gate = self.name,
                    ))
                }
            }
            PortRef::Index(i) => self.port_names.get(i).map(String::as_str).ok_or_else(|| {
                mpvm_error!(
                    "index.invalid_port_number",
                    "Port #{port_num} of gate {gate} does not exist.",
                    port_num = i,
                    gate = self.name,
                )
            }),
        }
    }

    /// True iff `self` and `other` have the same ports, in the same order —
    /// equivalent in terms of connectivity.
    pub fn same_signature(&self, other: &GateSpec) -> bool {
        self.port_names == other.port_names
    }

    /// Instantiates this spec into a fresh, unwired [`GateInstance`].
    pub fn make_instance(
        &self,
        qual: Option<String>,
        id: Option<String>,
    ) -> Result<GateInstance, MpvmError> {
        let nports = self.nports();
        let kind = match &self.behavior {
            Behavior::Primitive(common) | Behavior::FunctionWrapper(common) => {
                InstanceKind::Simple(common.start())
            }
            Behavior::Circuit(circuit_spec) => {
                InstanceKind::Composite(crate::circuit::instance::CircuitRuntime::new(
                    circuit_spec,
                )?)
            }
        };
        Ok(GateInstance::new(nports, qual, id, kind))
    }

    /// Dispatches §4.2.1 (primitive) or §4.4.1 (circuit) propagate and
    /// applies the result to `instance`.
    ///
    /// A primitive's `propagate` can itself detect a protocol violation
    /// (§7: `network.commongate.no_deps_for_nil`, `network.bad_out_req`) —
    /// routed through `handle_vm_error` exactly like `produce`'s errors are,
    /// via the shared [`Self::route_or_fatal`].
    pub fn propagate(&self, instance: &mut GateInstance) -> Result<std::collections::HashSet<usize>, MpvmError> {
        match &self.behavior {
            Behavior::Primitive(common) | Behavior::FunctionWrapper(common) => {
                match common.propagate(instance.tags_incoming(), instance) {
                    Ok(tags_outgoing) => Ok(instance.apply_propagate(tags_outgoing)),
                    Err(e) => {
                        self.route_or_fatal(common, instance, e, "propagate")?;
                        Ok(std::collections::HashSet::new())
                    }
                }
            }
            Behavior::Circuit(_) => {
                let tags_outgoing = match &mut instance.kind {
                    InstanceKind::Composite(runtime) => runtime.propagate()?,
                    InstanceKind::Simple(_) => unreachable!("circuit spec without composite instance"),
                };
                Ok(instance.apply_propagate(tags_outgoing))
            }
        }
    }

    /// Dispatches §4.2.2 (primitive) or §4.4.2 (circuit) trigger.
    pub fn trigger(&self, instance: &mut GateInstance) -> bool {
        let ready = match &self.behavior {
            Behavior::Primitive(common) | Behavior::FunctionWrapper(common) => common.trigger(instance),
            Behavior::Circuit(_) => match &mut instance.kind {
                InstanceKind::Composite(runtime) => runtime.trigger(),
                InstanceKind::Simple(_) => unreachable!("circuit spec without composite instance"),
            },
        };
        instance.notify_trigger(ready);
        ready
    }

    /// Routes a table-driven primitive's protocol error (raised by either
    /// `propagate` or `produce`) through its `error` port if one is
    /// currently requested, or signals fatal by returning `Err`. Shared so
    /// both call sites apply the same `handle_vm_error` policy (§7:
    /// "runtime protocol violations go through `handle_vm_error`").
    fn route_or_fatal(
        &self,
        common: &CommonGateSpec,
        instance: &mut GateInstance,
        e: MpvmError,
        phase: &str,
    ) -> Result<(), MpvmError> {
        if let Some(outputs) = common.handle_vm_error(e.clone(), instance) {
            log::debug!(
                "gate '{}': protocol error {} during {} routed through its error port",
                self.name,
                e.kind,
                phase,
            );
            instance.apply_produce(crate::gate::common::TriggerOutput {
                state: instance.state().clone(),
                outputs,
                consumed: std::collections::HashSet::new(),
            });
            Ok(())
        } else {
            log::warn!(
                "gate '{}': fatal protocol error {} during {} with no error port to route it through",
                self.name,
                e.kind,
                phase,
            );
            Err(e)
        }
    }

    /// Dispatches §4.2.3 (primitive) or §4.4.3 (circuit) produce, routing a
    /// primitive's protocol error through `handle_vm_error` before giving up.
    pub fn produce(&self, instance: &mut GateInstance) -> Result<(), MpvmError> {
        match &self.behavior {
            Behavior::Primitive(common) | Behavior::FunctionWrapper(common) => {
                match common.produce(instance) {
                    Ok(result) => {
                        instance.apply_produce(result);
                        Ok(())
                    }
                    Err(e) => self.route_or_fatal(common, instance, e, "produce"),
                }
            }
            Behavior::Circuit(_) => {
                let result = match &mut instance.kind {
                    InstanceKind::Composite(runtime) => runtime.produce()?,
                    InstanceKind::Simple(_) => unreachable!("circuit spec without composite instance"),
                };
                for (port, value) in result.outputs {
                    instance.set_outgoing(port, value);
                }
                // §4.4.3 consumption note: mirror a sub's consumption of a
                // forwarded external input back onto this circuit's own
                // incoming value for that port.
                for port in 0..instance.nports() {
                    if instance.get_incoming_index(port).is_void() {
                        continue;
                    }
                    let void_inside = match &instance.kind {
                        InstanceKind::Composite(runtime) => runtime.outlet_incoming_is_void(port),
                        InstanceKind::Simple(_) => false,
                    };
                    if void_inside {
                        instance.consume_port(port);
                    }
                }
                Ok(())
            }
        }
    }

    /// Writes a value to one of `instance`'s external ports, as a top-level
    /// driver (or a parent circuit) would. For a circuit-backed instance,
    /// the write is forwarded to the outlet sub-port per §4.4.4.
    pub fn set_input(&self, instance: &mut GateInstance, port: usize, value: PortValue) {
        instance.set_incoming(port, value.clone());
        if let InstanceKind::Composite(runtime) = &mut instance.kind {
            runtime.forward_incoming(port, value);
        }
    }

    /// Writes a demand tag to one of `instance`'s external ports. For a
    /// circuit-backed instance, the write is forwarded to the outlet
    /// sub-port per §4.4.4.
    pub fn set_request(&self, instance: &mut GateInstance, port: usize, tag: crate::tag::Tag) {
        instance.set_tag(port, tag);
        if let InstanceKind::Composite(runtime) = &mut instance.kind {
            runtime.forward_tag(port, tag);
        }
    }
}

impl std::fmt::Display for GateSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gate::common::CommonGateSpecBuilder;

    fn noop_spec() -> GateSpec {
        let common = CommonGateSpecBuilder::new("noop", vec!["out".into()])
            .starter(|| GateState::default())
            .build();
        GateSpec::new("noop", vec!["out".into()], Behavior::Primitive(common))
    }

    #[test]
    fn port_lookup_round_trips() {
        let spec = noop_spec();
        assert_eq!(spec.port_num("out").unwrap(), 0);
        assert_eq!(spec.port_name(0).unwrap(), "out");
    }

    #[test]
    fn unknown_port_name_is_structured_error() {
        let spec = noop_spec();
        let err = spec.port_num("bogus").unwrap_err();
        assert!(err.is_kind("key.invalid_port_name"));
    }

    #[test]
    fn out_of_range_index_is_structured_error() {
        let spec = noop_spec();
        let err = spec.port_num(5usize).unwrap_err();
        assert!(err.is_kind("index.invalid_port_number"));
    }

    #[test]
    fn same_signature_checks_order_and_names() {
        let a = noop_spec();
        let b = noop_spec();
        assert!(a.same_signature(&b));
    }
}
