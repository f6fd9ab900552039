//! `Join(n)`: the inverse of `Explode` — collects `n` separate inputs into
//! one list output.

use crate::gate::function_gate::new_function_gate;
use crate::gate::spec::GateSpec;
use crate::value::PortValue;

/// Demand on `out` demands every `iK`; once all have arrived, emits
/// `[i0, i1, ..., i(n-1)]` on `out` and consumes them all. Built on
/// `new_function_gate`, the same `FunctionGateSpec` family `arithmetic.rs`'s
/// gates use, rather than a hand-rolled `CommonGateSpecBuilder` instance —
/// `Join` can never fail, but still gets a generic `error` port for free.
pub fn join_gate(n: usize) -> GateSpec {
    let in_names: Vec<String> = (0..n).map(|i| format!("i{}", i)).collect();
    new_function_gate(
        format!("Join{}", n),
        in_names,
        |args| Ok(PortValue::List(args.to_vec())),
        true,
    )
    .expect("join gate port names never collide with out/error")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::driver::run_once;

    #[test]
    fn collects_every_input_into_one_ordered_list() {
        let spec = join_gate(3);
        let result = run_once(
            &spec,
            &[
                ("i0", PortValue::Int(1)),
                ("i1", PortValue::Int(2)),
                ("i2", PortValue::Int(3)),
            ],
            &["out"],
        )
        .unwrap();
        let list: Vec<i64> = result["out"].as_list().unwrap().iter().map(|v| v.as_int().unwrap()).collect();
        assert_eq!(list, vec![1, 2, 3]);
    }
}
