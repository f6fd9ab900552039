//! Structured errors with a dotted kind path and a rendered message.
//!
//! Construction-time errors (bad wiring, illegal gate signatures) are
//! returned as `Result::Err` and abort whatever was being built. Runtime
//! domain errors (a gate computing something that legitimately fails, like
//! division by zero) are carried as [`crate::value::PortValue::Error`]
//! values on the network, same as any other payload.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

/// A dotted path identifying an error's provenance, e.g. `network.bad_out_req`.
///
/// Matching is by prefix: an error of kind `network.bad_out_req` matches both
/// `network.bad_out_req` and `network`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Kind(SmallVec<[&'static str; 4]>);

impl Kind {
    /// Builds a [`Kind`] from a dotted path, e.g. `"circuit.multiple_connections"`.
    pub fn new(path: &'static str) -> Self {
        Kind(path.split('.').collect())
    }

    /// Returns true if `self` is `prefix` or a descendant of it.
    ///
    /// # Example
    /// ```
    /// # use gateflow::error::Kind;
    /// let k = Kind::new("network.bad_out_req");
    /// assert!(k.matches(&Kind::new("network")));
    /// assert!(k.matches(&Kind::new("network.bad_out_req")));
    /// assert!(!k.matches(&Kind::new("network.wrong_deps_map")));
    /// ```
    pub fn matches(&self, prefix: &Kind) -> bool {
        self.0.starts_with(prefix.0.as_slice())
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A runtime or construction-time error, identified by [`Kind`] and carrying
/// a rendered human message plus the named parameters used to render it.
///
/// Cloneable because it is routinely stored inside
/// [`crate::value::PortValue::Error`], which itself must be `Clone` to flow
/// through the network like any other payload.
#[derive(thiserror::Error, Clone, Debug)]
#[error("{message}")]
pub struct MpvmError {
    pub kind: Kind,
    pub message: String,
    pub params: HashMap<String, String>,
}

impl MpvmError {
    /// Builds an error of `kind`, rendering `template` by substituting
    /// `{name}` placeholders from `params`. Unknown placeholders are left
    /// untouched rather than panicking, mirroring the original's tolerant
    /// `str.format(**arguments)` behavior on a missing key.
    pub fn new(kind: &'static str, template: &str, params: &[(&str, String)]) -> Self {
        let params: HashMap<String, String> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let message = render_template(template, &params);
        MpvmError {
            kind: Kind::new(kind),
            message,
            params,
        }
    }

    pub fn is_kind(&self, prefix: &str) -> bool {
        self.kind.matches(&Kind::new(prefix))
    }
}

fn render_template(template: &str, params: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = template[i..].find('}') {
                let key = &template[i + 1..i + end];
                if let Some(value) = params.get(key) {
                    out.push_str(value);
                    i += end + 1;
                    continue;
                }
            }
        }
        let ch = template[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Shorthand for building an [`MpvmError`] with named parameters, mirroring
/// `MPVMException['kind.path'](template, name = value, ...)` from the
/// original implementation.
macro_rules! mpvm_error {
    ($kind:expr, $template:expr $(, $name:ident = $value:expr)* $(,)?) => {
        $crate::error::MpvmError::new(
            $kind,
            $template,
            &[$((stringify!($name), ::std::string::ToString::to_string(&$value))),*],
        )
    };
}
pub(crate) use mpvm_error;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kind_prefix_matching() {
        let k = Kind::new("circuit.multiple_connections");
        assert!(k.matches(&Kind::new("circuit")));
        assert!(k.matches(&Kind::new("circuit.multiple_connections")));
        assert!(!k.matches(&Kind::new("circuit.short_circuit")));
        assert!(!k.matches(&Kind::new("network")));
    }

    #[test]
    fn template_rendering_substitutes_named_params() {
        let err = mpvm_error!(
            "index.invalid_port_number",
            "Port #{port_num} of gate {gate} does not exist.",
            port_num = 3,
            gate = "adder",
        );
        assert_eq!(
            err.message,
            "Port #3 of gate adder does not exist."
        );
        assert_eq!(err.kind, Kind::new("index.invalid_port_number"));
    }

    #[test]
    fn template_rendering_leaves_unknown_placeholders() {
        let err = MpvmError::new("x.y", "value is {missing}", &[]);
        assert_eq!(err.message, "value is {missing}");
    }
}
