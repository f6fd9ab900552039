//! Arithmetic and comparison `FunctionWrapper` gates: the everyday
//! building blocks of a gate network, each a thin `new_function_gate` call
//! over a numeric closure.

use crate::error::mpvm_error;
use crate::gate::spec::GateSpec;
use crate::gate::function_gate::new_function_gate;
use crate::value::PortValue;

fn num(v: &PortValue) -> f64 {
    v.as_float().unwrap_or(0.0)
}

fn binary(name: &str, f: impl Fn(f64, f64) -> PortValue + Send + Sync + 'static) -> GateSpec {
    new_function_gate(
        name,
        vec!["a".into(), "b".into()],
        move |args| Ok(f(num(&args[0]), num(&args[1]))),
        true,
    )
    .expect("arithmetic gate port names never collide with out/error")
}

pub fn add_gate() -> GateSpec {
    binary("Add", |a, b| PortValue::Float(a + b).simplify())
}
pub fn sub_gate() -> GateSpec {
    binary("Sub", |a, b| PortValue::Float(a - b).simplify())
}
pub fn mul_gate() -> GateSpec {
    binary("Mul", |a, b| PortValue::Float(a * b).simplify())
}

/// `Div` is the one arithmetic gate that can legitimately fail: division by
/// zero returns a structured `arithmetic.division_by_zero` error on `error`
/// instead of panicking, the idiomatic-Rust substitute for the original's
/// "invoke under an exception boundary" (see `gate::function_gate`).
pub fn div_gate() -> GateSpec {
    new_function_gate(
        "Div",
        vec!["a".into(), "b".into()],
        |args| {
            let b = num(&args[1]);
            if b == 0.0 {
                return Err(mpvm_error!(
                    "arithmetic.division_by_zero",
                    "Division by zero: {a} / {b}",
                    a = num(&args[0]),
                    b = b,
                ));
            }
            Ok(PortValue::Float(num(&args[0]) / b).simplify())
        },
        true,
    )
    .expect("arithmetic gate port names never collide with out/error")
}

pub fn eq_gate() -> GateSpec {
    binary("Eq", |a, b| PortValue::Bool(a == b))
}
pub fn lt_gate() -> GateSpec {
    binary("Lt", |a, b| PortValue::Bool(a < b))
}
pub fn gt_gate() -> GateSpec {
    binary("Gt", |a, b| PortValue::Bool(a > b))
}
pub fn lte_gate() -> GateSpec {
    binary("Lte", |a, b| PortValue::Bool(a <= b))
}
pub fn gte_gate() -> GateSpec {
    binary("Gte", |a, b| PortValue::Bool(a >= b))
}

trait Simplify {
    /// Collapses a `Float` that holds an exact integer back to `Int`, so
    /// `Add` on two `Int`s yields an `Int`, matching the dynamically-typed
    /// original where `3 + 4 == 7`, not `7.0`.
    fn simplify(self) -> PortValue;
}
impl Simplify for PortValue {
    fn simplify(self) -> PortValue {
        match self {
            PortValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => PortValue::Int(f as i64),
            other => other,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::driver::run_once;

    #[test]
    fn add_sums_two_integers_as_an_integer() {
        let spec = add_gate();
        let result = run_once(&spec, &[("a", PortValue::Int(3)), ("b", PortValue::Int(4))], &["out", "error"]).unwrap();
        assert_eq!(result["out"].as_int(), Some(7));
        assert!(result["error"].is_void());
    }

    #[test]
    fn div_by_zero_reports_a_structured_error_and_void_output() {
        let spec = div_gate();
        let result = run_once(&spec, &[("a", PortValue::Int(10)), ("b", PortValue::Int(0))], &["out", "error"]).unwrap();
        assert!(result["out"].is_void());
        assert!(result["error"].as_error().unwrap().is_kind("arithmetic.division_by_zero"));
    }

    #[test]
    fn comparisons_yield_bools() {
        assert_eq!(
            run_once(&lt_gate(), &[("a", PortValue::Int(1)), ("b", PortValue::Int(2))], &["out"]).unwrap()["out"].as_bool(),
            Some(true)
        );
        assert_eq!(
            run_once(&gte_gate(), &[("a", PortValue::Int(2)), ("b", PortValue::Int(2))], &["out"]).unwrap()["out"].as_bool(),
            Some(true)
        );
    }
}
