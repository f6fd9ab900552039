//! Observation API: a gate instance can be watched without being touched.
//!
//! All callbacks default to no-ops, so attaching a listener never changes a
//! gate's behavior — only what an observer gets told about it.

use crate::tag::Tag;
use crate::value::PortValue;

/// Callbacks fired by a [`crate::gate::instance::GateInstance`] as it's driven.
/// Implement the handful of methods you care about; the rest stay no-ops.
pub trait GateListener {
    fn set_incoming(&mut self, _port: usize, _value: &PortValue) {}
    fn set_outgoing(&mut self, _port: usize, _value: &PortValue) {}
    fn set_tag(&mut self, _port: usize, _tag: Tag) {}
    fn set_outgoing_tag(&mut self, _port: usize, _tag: Tag) {}
    fn trigger(&mut self, _ready: bool) {}
    fn send_tags(&mut self) {}
    fn send(&mut self) {}
}
