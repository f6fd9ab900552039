//! The table-driven primitive shared by hand-written gates and the standard
//! library: a dependency table plus an ordered trigger list drive the
//! propagate/trigger/produce cycle instead of bespoke code per gate.

use crate::error::{mpvm_error, MpvmError};
use crate::gate::instance::{GateInstance, GateState};
use crate::tag::Tag;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A key into [`CommonGateSpec`]'s dependency table, from most to least
/// specific. Lookup tries, in order: `FlowOut(fs, port, Some(tag))`,
/// `FlowOut(fs, port, None)`, `Out(port, Some(tag))`, `Out(port, None)`,
/// `FlowState(fs)`, `Unconditional`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DepsKey {
    /// `()` — requests active regardless of flow-state.
    Unconditional,
    /// `(flow_state,)` — requests active only in the given flow-state.
    FlowState(i32),
    /// `(out_port, tag)` or `(out_port, None)` — requests triggered by a
    /// demand tag arriving on `out_port`; `None` matches any such tag.
    Out(usize, Option<Tag>),
    /// The flow-state-qualified form of [`DepsKey::Out`].
    FlowOut(i32, usize, Option<Tag>),
}

/// A single `(flow_state, pattern, function)` entry of the trigger list.
pub struct TriggerRule {
    /// `None` matches any flow-state.
    pub flow_state: Option<i32>,
    /// Required tag per input port index; all must match `tags_incoming`.
    pub pattern: Vec<(usize, Tag)>,
    /// Port indices whose current incoming values are passed to `function`,
    /// in order. Rust has no argument-name reflection, so callers name
    /// these explicitly (see DESIGN.md, "explicit arg_names").
    pub arg_names: Vec<usize>,
    pub function: Arc<TriggerFn>,
}

/// What a fired trigger function returns: the gate's next state, the
/// outputs to emit (by port index), and the input ports consumed.
pub struct TriggerOutput {
    pub state: GateState,
    pub outputs: HashMap<usize, crate::value::PortValue>,
    pub consumed: HashSet<usize>,
}

pub type TriggerFn = dyn Fn(&GateState, &[crate::value::PortValue]) -> TriggerOutput + Send + Sync;
pub type StarterFn = dyn Fn() -> GateState + Send + Sync;

pub struct CommonGateSpec {
    name: String,
    port_names: Vec<String>,
    port_index: HashMap<String, usize>,
    starter: Arc<StarterFn>,
    deps_map: HashMap<DepsKey, HashMap<usize, Tag>>,
    triggers: Vec<TriggerRule>,
    description: Option<String>,
}

impl CommonGateSpec {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn port_names(&self) -> &[String] {
        &self.port_names
    }
    pub fn nports(&self) -> usize {
        self.port_names.len()
    }
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn port_num(&self, name: &str) -> Result<usize, MpvmError> {
        self.port_index.get(name).copied().ok_or_else(|| {
            mpvm_error!(
                "key.invalid_port_name",
                "Port '{port_name}' of gate {gate} does not exist.",
                port_name = name,
                gate = self.name,
            )
        })
    }

    pub fn start(&self) -> GateState {
        (self.starter)()
    }

    /// Resolves the dependency entry for the given output request, trying
    /// keys from most to least specific. `port = None` means "the
    /// unconditional entry for this flow-state" (the §4.2.1 step-2 overlay).
    fn deps_for(
        &self,
        port: Option<usize>,
        tag: Option<Tag>,
        flow_state: i32,
    ) -> Result<&HashMap<usize, Tag>, MpvmError> {
        let candidates: Vec<DepsKey> = match port {
            None => vec![DepsKey::FlowState(flow_state), DepsKey::Unconditional],
            Some(p) => vec![
                DepsKey::FlowOut(flow_state, p, tag),
                DepsKey::FlowOut(flow_state, p, None),
                DepsKey::Out(p, tag),
                DepsKey::Out(p, None),
                DepsKey::FlowState(flow_state),
                DepsKey::Unconditional,
            ],
        };
        for key in &candidates {
            if let Some(found) = self.deps_map.get(key) {
                return Ok(found);
            }
        }
        match port {
            None => Err(mpvm_error!(
                "network.commongate.no_deps_for_nil",
                "Please give dependencies for the entry () or ({fs},) in the description of gate {this}",
                fs = flow_state,
                this = self.name,
            )),
            Some(p) => Err(mpvm_error!(
                "network.bad_out_req",
                "Gate {this} does not support tag {tag} on port '{port}' with flow state {fs}",
                this = self.name,
                tag = format!("{:?}", tag),
                port = self.port_names.get(p).cloned().unwrap_or_default(),
                fs = flow_state,
            )),
        }
    }

    /// §4.2.1: computes fresh `tags_outgoing` from `tags_incoming` and the
    /// instance's current flow-state and outgoing/incoming values.
    ///
    /// A port demand this gate's table has no entry for is a protocol
    /// violation (`network.commongate.no_deps_for_nil` for the mandatory
    /// unconditional entry, `network.bad_out_req` for an unhandled demand
    /// tag on a port) and is surfaced as `Err` rather than dropped — per
    /// spec.md §7, "errors never silently disappear".
    pub fn propagate(&self, tags_incoming: &[Tag], instance: &GateInstance) -> Result<Vec<Tag>, MpvmError> {
        let fs = instance.flow_state();
        let mut rval = vec![Tag::Notag; self.nports()];

        let unconditional = self.deps_for(None, None, fs)?;
        for (&port, &tag) in unconditional {
            rval[port] = tag;
        }

        for (i, &t) in tags_incoming.iter().enumerate() {
            if !matches!(t, Tag::Void | Tag::Notag | Tag::Avail) {
                let more = self.deps_for(Some(i), Some(t), fs)?;
                for (&port, &tag2) in more {
                    rval[port] = rval[port].join(tag2);
                }
            }
        }

        for (i, v) in instance.outgoing_values().iter().enumerate() {
            if !v.is_void() {
                rval[i] = Tag::Avail;
            }
        }

        for (i, &t) in instance.tags_incoming().iter().enumerate() {
            if t == Tag::Avail && rval[i] == Tag::Req {
                rval[i] = Tag::Notag;
            }
        }

        Ok(rval)
    }

    /// §4.2.2: walks the trigger list and returns the first matching rule's
    /// computed outputs, ready to be applied by [`Self::produce`].
    fn select_trigger(&self, instance: &GateInstance) -> Option<&TriggerRule> {
        let fs = instance.flow_state();
        self.triggers.iter().find(|rule| {
            (rule.flow_state.is_none() || rule.flow_state == Some(fs))
                && rule
                    .pattern
                    .iter()
                    .all(|&(port, tag)| instance.tags_incoming()[port] == tag)
        })
    }

    pub fn trigger(&self, instance: &GateInstance) -> bool {
        self.select_trigger(instance).is_some()
    }

    /// §4.2.3: fires the selected trigger and returns its raw result. The
    /// caller ([`GateInstance::produce`]) applies state/outputs/consumed to
    /// the instance.
    pub fn produce(&self, instance: &GateInstance) -> Result<TriggerOutput, MpvmError> {
        let rule = self.select_trigger(instance).ok_or_else(|| {
            mpvm_error!(
                "commongate.no_input",
                "The gate instance {this} is not supposed to get called with no trigger ready!",
                this = self.name,
            )
        })?;
        let args: Vec<crate::value::PortValue> = rule
            .arg_names
            .iter()
            .map(|&p| instance.get_incoming_index(p).clone())
            .collect();
        Ok((rule.function)(instance.state(), &args))
    }

    pub fn handle_vm_error(
        &self,
        error: MpvmError,
        instance: &GateInstance,
    ) -> Option<HashMap<usize, crate::value::PortValue>> {
        let errp = self.port_num("error").ok()?;
        if instance.tags_incoming()[errp] == Tag::Req {
            let mut out = HashMap::new();
            out.insert(errp, crate::value::PortValue::Error(Arc::new(error)));
            Some(out)
        } else {
            None
        }
    }
}

/// Builder for [`CommonGateSpec`], standing in for the original's keyword
/// constructor arguments.
pub struct CommonGateSpecBuilder {
    name: String,
    port_names: Vec<String>,
    port_index: HashMap<String, usize>,
    starter: Option<Arc<StarterFn>>,
    deps_map: HashMap<DepsKey, HashMap<usize, Tag>>,
    triggers: Vec<TriggerRule>,
    description: Option<String>,
}

impl CommonGateSpecBuilder {
    pub fn new(name: impl Into<String>, ports: Vec<String>) -> Self {
        let port_index = ports
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();
        CommonGateSpecBuilder {
            name: name.into(),
            port_names: ports,
            port_index,
            starter: None,
            deps_map: HashMap::new(),
            triggers: Vec::new(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn starter<F>(mut self, f: F) -> Self
    where
        F: Fn() -> GateState + Send + Sync + 'static,
    {
        self.starter = Some(Arc::new(f));
        self
    }

    fn port_num(&self, name: &str) -> usize {
        *self
            .port_index
            .get(name)
            .unwrap_or_else(|| panic!("unknown port '{}' while building gate spec", name))
    }

    pub fn deps_unconditional(mut self, ports: &[(&str, Tag)]) -> Self {
        let map = ports.iter().map(|(p, t)| (self.port_num(p), *t)).collect();
        self.deps_map.insert(DepsKey::Unconditional, map);
        self
    }

    pub fn deps_flow_state(mut self, fs: i32, ports: &[(&str, Tag)]) -> Self {
        let map = ports.iter().map(|(p, t)| (self.port_num(p), *t)).collect();
        self.deps_map.insert(DepsKey::FlowState(fs), map);
        self
    }

    pub fn deps_out(mut self, out_port: &str, tag: Option<Tag>, ports: &[(&str, Tag)]) -> Self {
        let key = DepsKey::Out(self.port_num(out_port), tag);
        let map = ports.iter().map(|(p, t)| (self.port_num(p), *t)).collect();
        self.deps_map.insert(key, map);
        self
    }

    pub fn deps_flow_out(
        mut self,
        fs: i32,
        out_port: &str,
        tag: Option<Tag>,
        ports: &[(&str, Tag)],
    ) -> Self {
        let key = DepsKey::FlowOut(fs, self.port_num(out_port), tag);
        let map = ports.iter().map(|(p, t)| (self.port_num(p), *t)).collect();
        self.deps_map.insert(key, map);
        self
    }

    pub fn trigger<F>(
        mut self,
        flow_state: Option<i32>,
        pattern: &[(&str, Tag)],
        arg_names: &[&str],
        function: F,
    ) -> Self
    where
        F: Fn(&GateState, &[crate::value::PortValue]) -> TriggerOutput + Send + Sync + 'static,
    {
        let pattern = pattern.iter().map(|(p, t)| (self.port_num(p), *t)).collect();
        let arg_names = arg_names.iter().map(|p| self.port_num(p)).collect();
        self.triggers.push(TriggerRule {
            flow_state,
            pattern,
            arg_names,
            function: Arc::new(function),
        });
        self
    }

    pub fn build(self) -> CommonGateSpec {
        CommonGateSpec {
            name: self.name,
            port_names: self.port_names,
            port_index: self.port_index,
            starter: self
                .starter
                .unwrap_or_else(|| Arc::new(|| GateState::default())),
            deps_map: self.deps_map,
            triggers: self.triggers,
            description: self.description,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gate::spec::GateSpec;
    use crate::value::PortValue;

    fn constant_gate(x: i64) -> GateSpec {
        let common = CommonGateSpecBuilder::new(format!("`{}`", x), vec!["out".into()])
            .starter(|| GateState::default())
            .deps_unconditional(&[])
            .deps_out("out", Some(Tag::Req), &[])
            .trigger(None, &[("out", Tag::Req)], &[], move |state, _args| {
                TriggerOutput {
                    state: state.clone(),
                    outputs: [(0usize, PortValue::Int(x))].into_iter().collect(),
                    consumed: HashSet::new(),
                }
            })
            .build();
        GateSpec::primitive(common)
    }

    #[test]
    fn constant_triggers_only_when_out_is_requested() {
        let spec = constant_gate(7);
        let mut inst = spec.make_instance(None, None).unwrap();
        assert!(!spec.trigger(&mut inst));
        inst.set_tag(0, Tag::Req);
        assert!(spec.trigger(&mut inst));
    }

    #[test]
    fn deps_lookup_falls_back_to_unconditional() {
        let common = CommonGateSpecBuilder::new("x", vec!["a".into()])
            .starter(|| GateState::default())
            .deps_unconditional(&[("a", Tag::Notag)])
            .build();
        let deps = common.deps_for(None, None, 0).unwrap();
        assert_eq!(deps.get(&0), Some(&Tag::Notag));
    }
}
