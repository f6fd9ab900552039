//! Top-level drivers (§4.6): the loops that actually push a gate (usually a
//! circuit) through propagate/trigger/produce until it has nothing left to
//! give, either once or continuously against a stream of inputs.

use crate::error::MpvmError;
use crate::gate::spec::GateSpec;
use crate::tag::Tag;
use crate::value::PortValue;
use std::collections::HashMap;

/// A lazily-pulled sequence of values fed to one input port of
/// [`run_stream`]. Boxed so callers can drive it from anything — a `Vec`'s
/// iterator, a channel receiver, a file reader — without `run_stream` itself
/// needing to know which.
pub type InputStream = Box<dyn Iterator<Item = PortValue>>;

/// Runs `spec` to completion against a fixed set of inputs, returning the
/// requested output ports' final values (`PortValue::Void` if a request was
/// never satisfied).
///
/// Loops `{propagate; if not trigger: break; produce}` until every requested
/// port holds a non-VOID value or no gate is ready to fire.
pub fn run_once(
    spec: &GateSpec,
    inputs: &[(&str, PortValue)],
    requests: &[&str],
) -> Result<HashMap<String, PortValue>, MpvmError> {
    let mut instance = spec.make_instance(None, None)?;

    for (port, value) in inputs {
        let idx = spec.port_num(*port)?;
        spec.set_input(&mut instance, idx, value.clone());
    }

    let mut request_idxs = Vec::with_capacity(requests.len());
    for port in requests {
        let idx = spec.port_num(*port)?;
        spec.set_request(&mut instance, idx, Tag::Req);
        request_idxs.push((port.to_string(), idx));
    }

    let mut cycle = 0u64;
    loop {
        cycle += 1;
        log::trace!("run_once({}): cycle {} propagate", spec.name(), cycle);
        spec.propagate(&mut instance)?;
        if !spec.trigger(&mut instance) {
            log::debug!(
                "run_once({}): no gate ready to fire, stopping after {} cycle(s)",
                spec.name(),
                cycle
            );
            break;
        }
        spec.produce(&mut instance)?;
        let satisfied = request_idxs
            .iter()
            .all(|(_, idx)| !instance.get_outgoing_index(*idx).is_void());
        if satisfied {
            log::debug!(
                "run_once({}): all requests satisfied after {} cycle(s)",
                spec.name(),
                cycle
            );
            break;
        }
    }

    Ok(request_idxs
        .into_iter()
        .map(|(name, idx)| (name, instance.get_outgoing_index(idx).clone()))
        .collect())
}

/// Runs `spec` against lazily-pulled input streams, collecting every value
/// that appears on a requested output port until the gate has nothing left
/// to fire.
///
/// After each propagation, every streamed input port currently holding VOID
/// is refilled from its stream (left VOID once the stream is exhausted).
/// Whenever a requested output becomes non-VOID it is appended to that
/// port's result list, consumed (reset to VOID), and re-requested so the
/// next value can arrive. Terminates once `trigger` reports no gate ready.
pub fn run_stream(
    spec: &GateSpec,
    mut streams: HashMap<String, InputStream>,
    requests: &[&str],
) -> Result<HashMap<String, Vec<PortValue>>, MpvmError> {
    let mut instance = spec.make_instance(None, None)?;

    let stream_ports: Vec<(usize, String)> = streams
        .keys()
        .map(|name| spec.port_num(name.as_str()).map(|idx| (idx, name.clone())))
        .collect::<Result<_, _>>()?;

    let mut request_idxs = Vec::with_capacity(requests.len());
    let mut results: HashMap<String, Vec<PortValue>> = HashMap::new();
    for port in requests {
        let idx = spec.port_num(*port)?;
        spec.set_request(&mut instance, idx, Tag::Req);
        request_idxs.push((port.to_string(), idx));
        results.insert(port.to_string(), Vec::new());
    }

    let mut cycle = 0u64;
    loop {
        cycle += 1;
        spec.propagate(&mut instance)?;

        for (idx, name) in &stream_ports {
            if !instance.get_incoming_index(*idx).is_void() {
                continue;
            }
            if let Some(value) = streams.get_mut(name).and_then(Iterator::next) {
                log::trace!("run_stream({}): pulled next value for '{}'", spec.name(), name);
                spec.set_input(&mut instance, *idx, value);
            }
        }

        if !spec.trigger(&mut instance) {
            log::debug!(
                "run_stream({}): no gate ready to fire, stopping after {} cycle(s)",
                spec.name(),
                cycle
            );
            break;
        }
        spec.produce(&mut instance)?;

        for (name, idx) in &request_idxs {
            let value = instance.get_outgoing_index(*idx).clone();
            if value.is_void() {
                continue;
            }
            log::trace!("run_stream({}): '{}' produced a value", spec.name(), name);
            results.get_mut(name).unwrap().push(value);
            instance.set_outgoing(*idx, PortValue::Void);
            spec.set_request(&mut instance, *idx, Tag::Req);
        }
    }

    Ok(results)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::stdlib::arithmetic::add_gate;

    #[test]
    fn run_once_computes_a_simple_sum() {
        let spec = add_gate();
        let result = run_once(
            &spec,
            &[("a", PortValue::Int(3)), ("b", PortValue::Int(4))],
            &["out", "error"],
        )
        .unwrap();
        assert_eq!(result["out"].as_int(), Some(7));
        assert!(result["error"].is_void());
    }

    #[test]
    fn run_stream_processes_successive_values_in_order() {
        let spec = add_gate();
        let mut streams: HashMap<String, InputStream> = HashMap::new();
        streams.insert(
            "a".to_string(),
            Box::new(vec![PortValue::Int(1), PortValue::Int(20), PortValue::Int(300)].into_iter()),
        );
        streams.insert(
            "b".to_string(),
            Box::new(vec![PortValue::Int(6), PortValue::Int(50), PortValue::Int(400)].into_iter()),
        );
        let result = run_stream(&spec, streams, &["out", "error"]).unwrap();
        let outs: Vec<i64> = result["out"].iter().map(|v| v.as_int().unwrap()).collect();
        assert_eq!(outs, vec![7, 70, 700]);
        assert!(result["error"].is_empty());
    }
}
