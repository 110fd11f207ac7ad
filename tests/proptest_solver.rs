//! Property tests for parametricity
//!
//! A predicate evaluated symbolically and then pinned to a concrete value
//! through `fix` must agree with the same predicate evaluated directly.


use generators::{arb_bool_tensor_with_shape, arb_relation, arb_value_table, table_index};
use indexmap::IndexMap;
use proptest::prelude::*;
use relsat::catalog::{CommutativeSemilattices, Equivalences, Functions, PartialOrders, Permutations, TotalOrders};
use relsat::problem::Problem;
use relsat::{Batsat, Bools, Instance, Literal, Operation, Relation, Solver, Tensor};

/// Whether `problem` has a solution once its single unknown is pinned
fn satisfiable_with<P: Problem>(problem: &P, name: &str, value: &Tensor<bool>) -> bool {
    let mut solver = Solver::new(Batsat::new());
    solver.fix(name, value.clone());
    solver.solve_one(problem).unwrap().is_some()
}

/// Evaluate a problem over constant literals
fn evaluate_over_constants<P: Problem>(problem: &P, name: &str, value: &Tensor<bool>) -> Literal {
    let mut instance = Instance::new();
    let lits = value.map(|&b| if b { Literal::TRUE } else { Literal::FALSE });
    let unknowns = IndexMap::from([(name.to_string(), lits)]);
    problem.compute(&mut instance, &unknowns).unwrap()
}

fn direct<P: Problem>(problem: &P, name: &str, value: &Tensor<bool>) -> bool {
    problem
        .check(&IndexMap::from([(name.to_string(), value.clone())]))
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Relation problems: fixed SAT search agrees with the direct check
    #[test]
    fn relation_problems_are_parametric(r in (1usize..5).prop_flat_map(|n| arb_relation(n, 2))) {
        let n = r.size();
        let t = r.tensor();
        let mut d = Bools;

        let po = r.is_partial_order(&mut d).unwrap();
        prop_assert_eq!(satisfiable_with(&PartialOrders { size: n }, "rel", t), po);
        prop_assert_eq!(direct(&PartialOrders { size: n }, "rel", t), po);

        let eq = r.is_equivalence(&mut d).unwrap();
        prop_assert_eq!(satisfiable_with(&Equivalences { size: n }, "rel", t), eq);

        let to = r.is_total_order(&mut d).unwrap();
        prop_assert_eq!(satisfiable_with(&TotalOrders { size: n }, "rel", t), to);
    }

    /// Over constant literals the circuit folds to the direct answer
    #[test]
    fn constant_literals_fold(r in (1usize..5).prop_flat_map(|n| arb_relation(n, 2))) {
        let n = r.size();
        let t = r.tensor();
        let expected = |b: bool| if b { Literal::TRUE } else { Literal::FALSE };
        prop_assert_eq!(
            evaluate_over_constants(&PartialOrders { size: n }, "rel", t),
            expected(direct(&PartialOrders { size: n }, "rel", t))
        );
        prop_assert_eq!(
            evaluate_over_constants(&Permutations { size: n }, "perm", t),
            expected(direct(&Permutations { size: n }, "perm", t))
        );
    }

    /// Arbitrary graphs: satisfiable as a function exactly when one-hot
    #[test]
    fn operation_validity(t in (1usize..4, 0usize..3).prop_flat_map(|(n, k)| arb_bool_tensor_with_shape(vec![n; k + 1]))) {
        let n = t.shape()[0];
        let arity = t.order() - 1;
        let one_hot = t.fold(1, |xs| xs.iter().filter(|&&b| b).count() == 1).iter().all(|&b| b);
        prop_assert_eq!(Operation::from_bool(t.clone()).is_ok(), one_hot);
        prop_assert_eq!(satisfiable_with(&Functions { size: n, arity }, "op", &t), one_hot);
    }

    /// Binary operations on three elements given by value tables
    #[test]
    fn semilattice_laws_are_parametric(table in arb_value_table(3, 2)) {
        let op = Operation::from_fn(3, 2, |a| table[table_index(3, a)]);
        let mut d = Bools;
        let laws = op.is_idempotent(&mut d).unwrap()
            && op.is_commutative(&mut d).unwrap()
            && op.is_associative(&mut d).unwrap();
        let problem = CommutativeSemilattices { size: 3 };
        prop_assert_eq!(satisfiable_with(&problem, "op", op.tensor()), laws);
        prop_assert_eq!(direct(&problem, "op", op.tensor()), laws);
    }

    /// Unary operations preserve a relation exactly when the graph check says so
    #[test]
    fn preservation_is_parametric(
        (table, r) in (2usize..4).prop_flat_map(|n| (arb_value_table(n, 1), arb_relation(n, 2)))
    ) {
        let n = r.size();
        let op = Operation::from_fn(n, 1, |a| table[a[0]]);
        let expected = (0..n).all(|x| (0..n).all(|y| !*r.get(&[x, y]) || *r.get(&[table[x], table[y]])));
        let mut d = Bools;
        prop_assert_eq!(op.preserves(&mut d, &r).unwrap(), expected);

        let problem = relsat::catalog::Polymorphisms { arity: 1, relations: vec![r.clone()] };
        prop_assert_eq!(satisfiable_with(&problem, "op", op.tensor()), expected);
    }
}

#[test]
fn lifted_relations_fold_to_constants() {
    let mut instance = Instance::new();
    let le = Relation::less_or_equal(&Bools, 4);
    let lifted = Relation::lift(&instance, &le);
    assert_eq!(lifted.is_partial_order(&mut instance).unwrap(), Literal::TRUE);
    assert_eq!(lifted.is_equivalence(&mut instance).unwrap(), Literal::FALSE);
    assert_eq!(instance.stats().or_gates, 0);
    assert_eq!(instance.stats().xor_gates, 0);
}
