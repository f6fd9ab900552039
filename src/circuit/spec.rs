//! Static description of a composite gate: named sub-gates plus a wire list.

use crate::gate::spec::GateSpec;
use std::collections::HashMap;
use std::sync::Arc;

/// One side of a wire: either a named port of a named sub-gate, or one of
/// the circuit's own external ports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Sub(String, String),
    External(String),
}

impl Endpoint {
    pub fn sub(gate: impl Into<String>, port: impl Into<String>) -> Self {
        Endpoint::Sub(gate.into(), port.into())
    }
    pub fn external(port: impl Into<String>) -> Self {
        Endpoint::External(port.into())
    }
}

/// The static description of a circuit: the list of sub-gates, the wires
/// connecting them (and the circuit's own external ports) to each other,
/// and whether unwired external ports are tolerated.
pub struct CircuitSpec {
    name: String,
    port_names: Vec<String>,
    port_index: HashMap<String, usize>,
    pub(crate) subgates: Vec<(String, Arc<GateSpec>)>,
    pub(crate) connections: Vec<(Endpoint, Endpoint)>,
    pub(crate) allow_dangling: bool,
}

impl CircuitSpec {
    pub fn new(
        name: impl Into<String>,
        ports: Vec<String>,
        subgates: Vec<(String, Arc<GateSpec>)>,
        connections: Vec<(Endpoint, Endpoint)>,
        allow_dangling: bool,
    ) -> Self {
        let port_index = ports
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();
        CircuitSpec {
            name: name.into(),
            port_names: ports,
            port_index,
            subgates,
            connections,
            allow_dangling,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn port_names(&self) -> &[String] {
        &self.port_names
    }
    pub fn port_index(&self, name: &str) -> Option<usize> {
        self.port_index.get(name).copied()
    }
    pub fn nports(&self) -> usize {
        self.port_names.len()
    }
}

/// §6 construction API: builds a circuit's [`GateSpec`] from a list of named
/// sub-gates and a wire list. Structural validation (`multiple_connections`,
/// `short_circuit`, `missing_connection`) happens lazily, at instantiation
/// time (`GateSpec::make_instance`), not here — mirroring "enforced at
/// instantiation" in the specification.
pub fn new_circuit(
    name: impl Into<String>,
    ports: Vec<String>,
    subgates: Vec<(String, Arc<GateSpec>)>,
    connections: Vec<(Endpoint, Endpoint)>,
    allow_dangling: bool,
) -> GateSpec {
    GateSpec::circuit(CircuitSpec::new(name, ports, subgates, connections, allow_dangling))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn endpoint_constructors_build_expected_variants() {
        assert_eq!(Endpoint::sub("a", "out"), Endpoint::Sub("a".into(), "out".into()));
        assert_eq!(Endpoint::external("x"), Endpoint::External("x".into()));
    }
}
