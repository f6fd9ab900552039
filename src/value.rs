//! The payload domain carried on ports.
//!
//! Payloads are opaque to the runtime: they may be scalars, sequences, error
//! objects, or even gate specifications (used for higher-order agents, see
//! Design Note §9 of the specification this crate implements). `PortValue`
//! is the tagged union that replaces the dynamically-typed payloads of the
//! original implementation; runtime code pattern-matches on it rather than
//! relying on a dynamic type check.

use crate::error::MpvmError;
use crate::gate::GateSpec;
use auto_from::AutoFrom;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value flowing through a port, or the absence of one.
///
/// `Void` is a variant of this union rather than `Option<Payload>` so that
/// runtime code — which constantly asks "is this VOID or not" alongside
/// "what shape is this value" — gets a single match instead of an `Option`
/// wrapping an inner enum.
#[derive(Clone, AutoFrom)]
pub enum PortValue {
    Void,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Vec<PortValue>),
    Error(Arc<MpvmError>),
    /// A gate specification carried as a first-class value, for higher-order
    /// agents that instantiate a gate they received on a port.
    Gate(Arc<GateSpec>),
    /// Escape hatch for user payloads the tagged union doesn't anticipate.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl PortValue {
    #[inline(always)]
    pub fn is_void(&self) -> bool {
        matches!(self, PortValue::Void)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PortValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PortValue::Int(i) => Some(*i as f64),
            PortValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PortValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PortValue]> {
        match self {
            PortValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&MpvmError> {
        match self {
            PortValue::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Truthiness used by gates like `IfThenElse` that branch on a value.
    /// `Void` is falsy, as is `Bool(false)`, `Int(0)` and an empty
    /// string/list; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            PortValue::Void => false,
            PortValue::Bool(b) => *b,
            PortValue::Int(i) => *i != 0,
            PortValue::Float(f) => *f != 0.0,
            PortValue::Str(s) => !s.is_empty(),
            PortValue::List(l) => !l.is_empty(),
            PortValue::Error(_) => true,
            PortValue::Gate(_) => true,
            PortValue::Opaque(_) => true,
        }
    }
}

impl Default for PortValue {
    fn default() -> Self {
        PortValue::Void
    }
}

impl From<&str> for PortValue {
    fn from(s: &str) -> Self {
        PortValue::Str(s.to_string())
    }
}

impl fmt::Debug for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortValue::Void => write!(f, "VOID"),
            PortValue::Int(i) => write!(f, "{}", i),
            PortValue::Float(x) => write!(f, "{}", x),
            PortValue::Bool(b) => write!(f, "{}", b),
            PortValue::Str(s) => write!(f, "{:?}", s),
            PortValue::List(l) => write!(f, "{:?}", l),
            PortValue::Error(e) => write!(f, "Error({})", e.kind),
            PortValue::Gate(g) => write!(f, "Gate({})", g.name()),
            PortValue::Opaque(_) => write!(f, "<opaque>"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn void_is_falsy_others_follow_python_like_rules() {
        assert!(!PortValue::Void.is_truthy());
        assert!(!PortValue::Int(0).is_truthy());
        assert!(PortValue::Int(1).is_truthy());
        assert!(!PortValue::Str(String::new()).is_truthy());
        assert!(PortValue::Str("x".into()).is_truthy());
    }

    #[test]
    fn from_impls_wrap_scalars() {
        let v: PortValue = 7i64.into();
        assert_eq!(v.as_int(), Some(7));
        let v: PortValue = "hi".into();
        assert_eq!(v.as_list(), None);
        assert!(!v.is_void());
    }

    #[test]
    fn is_void_only_true_for_void_variant() {
        assert!(PortValue::Void.is_void());
        assert!(!PortValue::Int(0).is_void());
    }
}
