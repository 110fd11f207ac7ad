//! Enumeration tests for the SAT-backed solver
//!
//! Counts of well-known structures on small sets, with every solution
//! checked for distinctness and re-validated directly with plain booleans.

use std::collections::HashSet;

use indexmap::IndexMap;
use relsat::backend::{DimacsProcess, OutputStyle};
use relsat::catalog::{CommutativeSemilattices, EvenPermutations, Equivalences, PartialOrders, Permutations, TotalOrders};
use relsat::problem::{unknown, Problem};
use relsat::{Batsat, BooleanDomain, Bools, Error, Operation, Permutation, Relation, Solution, Solver, SolverConfig, Tensor};

/// Enumerate every solution and check distinctness and the direct predicate
fn enumerate<P: Problem>(problem: &P, name: &str) -> Vec<Tensor<bool>> {
    let mut solver = Solver::new(Batsat::new());
    let solutions = solver.solve_all(problem, None).unwrap();
    let mut seen = HashSet::new();
    for solution in &solutions {
        assert!(problem.check(solution).unwrap(), "solution fails the direct check");
        assert!(seen.insert(solution[name].clone()), "duplicate solution");
    }
    solutions.into_iter().map(|mut s| s.swap_remove(name).unwrap()).collect()
}

#[test]
fn test_partial_orders_on_five() {
    let found = enumerate(&PartialOrders { size: 5 }, "rel");
    assert_eq!(found.len(), 4231);
    let mut d = Bools;
    for t in &found {
        assert!(Relation::new(t.clone()).unwrap().is_partial_order(&mut d).unwrap());
    }
}

#[test]
fn test_equivalences_on_seven() {
    let found = enumerate(&Equivalences { size: 7 }, "rel");
    assert_eq!(found.len(), 877);
    let mut d = Bools;
    for t in &found {
        assert!(Relation::new(t.clone()).unwrap().is_equivalence(&mut d).unwrap());
    }
}

#[test]
fn test_permutations_on_seven() {
    let found = enumerate(&Permutations { size: 7 }, "perm");
    assert_eq!(found.len(), 5040);
    let images: HashSet<Vec<usize>> = found
        .iter()
        .map(|t| Permutation::from_bool(t.clone()).unwrap().images().unwrap())
        .collect();
    assert_eq!(images.len(), 5040);
}

#[test]
fn test_even_permutations_on_five() {
    let found = enumerate(&EvenPermutations { size: 5 }, "perm");
    assert_eq!(found.len(), 60);
    let mut d = Bools;
    for t in &found {
        assert!(Permutation::from_bool(t.clone()).unwrap().is_even(&mut d).unwrap());
    }
}

#[test]
fn test_total_orders_on_five() {
    assert_eq!(enumerate(&TotalOrders { size: 5 }, "rel").len(), 120);
}

#[test]
fn test_commutative_semilattices_are_meets() {
    let found = enumerate(&CommutativeSemilattices { size: 3 }, "op");
    assert_eq!(found.len(), 9);
    for t in found {
        let op = Operation::from_bool(t).unwrap();
        // x ≤ y iff x·y = x orders the carrier with op as meet
        let order = Relation::new(Tensor::generate(&[3, 3], |i| op.value(&[i[0], i[1]]) == Some(i[0]))).unwrap();
        assert!(order.is_partial_order(&mut Bools).unwrap());
    }
}

#[test]
fn test_max_solutions_from_config() {
    let config = SolverConfig {
        max_solutions: Some(10),
        ..SolverConfig::default()
    };
    let mut solver = config.build();
    assert_eq!(solver.solve_all(&PartialOrders { size: 4 }, None).unwrap().len(), 10);
    assert_eq!(solver.solve_all(&PartialOrders { size: 4 }, Some(3)).unwrap().len(), 3);
}

#[test]
fn test_empty_set_has_one_structure() {
    let mut solver = Solver::new(Batsat::new());
    let found: Vec<Solution> = solver.solve_all(&PartialOrders { size: 0 }, None).unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
fn test_unsat_problem_has_no_solutions() {
    // Odd permutations of one element
    struct OddPermutations;

    impl Problem for OddPermutations {
        fn unknowns(&self) -> IndexMap<String, Vec<usize>> {
            IndexMap::from([("perm".to_string(), vec![1, 1])])
        }

        fn compute<D: BooleanDomain>(
            &self,
            d: &mut D,
            unknowns: &IndexMap<String, Tensor<D::Elem>>,
        ) -> relsat::Result<D::Elem> {
            let perm = Permutation::new(Operation::new(unknowns["perm"].clone())?)?;
            let bijective = perm.is_permutation(d)?;
            let odd = perm.is_odd(d)?;
            Ok(d.and(&bijective, &odd))
        }
    }

    let mut solver = Solver::new(Batsat::new());
    assert!(solver.solve_one(&OddPermutations).unwrap().is_none());
}

#[test]
fn test_unknown_backend_spec_is_config_error() {
    assert!(matches!("cryptominisat".parse::<relsat::BackendSpec>(), Err(Error::Config(_))));
}

// ============================================================================
// External DIMACS solvers
// ============================================================================

/// Exhaustive DIMACS solver for a handful of variables.
///
/// Called as `sh solver.sh input.cnf [result.txt]`: with a result path it
/// writes a MiniSat result file, otherwise competition output on stdout.
/// Exits 10 on SAT and 20 on UNSAT.
const BRUTE_FORCE_SOLVER: &str = r#"awk -v out="$2" '
BEGIN { k = 0 }
/^c/ { next }
/^p/ { n = $3; next }
{
    for (i = 1; i <= NF; i++) {
        if ($i == 0) { k++ } else { lit[k, size[k]++] = $i }
    }
}
END {
    for (m = 0; m < 2 ^ n; m++) {
        ok = 1
        for (j = 0; j < k && ok; j++) {
            sat = 0
            for (i = 0; i < size[j]; i++) {
                l = lit[j, i]
                v = l < 0 ? -l : l
                b = int(m / 2 ^ (v - 1)) % 2
                if ((l > 0 && b == 1) || (l < 0 && b == 0)) { sat = 1; break }
            }
            if (!sat) ok = 0
        }
        if (ok) {
            model = ""
            for (v = 1; v <= n; v++) {
                model = model (int(m / 2 ^ (v - 1)) % 2 ? v : -v) " "
            }
            if (out != "") {
                print "SAT" > out
                print model "0" > out
            } else {
                print "s SATISFIABLE"
                print "v " model "0"
            }
            exit 10
        }
    }
    if (out != "") { print "UNSAT" > out } else { print "s UNSATISFIABLE" }
    exit 20
}' "$1"
"#;

/// Two bits, at least one set
struct EitherBit;

impl Problem for EitherBit {
    fn unknowns(&self) -> IndexMap<String, Vec<usize>> {
        IndexMap::from([("bits".to_string(), vec![2])])
    }

    fn compute<D: BooleanDomain>(&self, d: &mut D, unknowns: &IndexMap<String, Tensor<D::Elem>>) -> relsat::Result<D::Elem> {
        let bits = unknown(unknowns, "bits")?.elems();
        Ok(d.or(&bits[0], &bits[1]))
    }
}

/// Run `EitherBit` through an external solver, free and with both bits pinned off
fn external_counts(style: OutputStyle) -> (usize, bool) {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("solver.sh");
    std::fs::write(&script, BRUTE_FORCE_SOLVER).unwrap();
    let backend = DimacsProcess::new("sh", vec![script.display().to_string()], style);

    let mut solver = Solver::new(backend);
    let found = solver.solve_all(&EitherBit, None).unwrap();
    let distinct: HashSet<_> = found.iter().map(|s| s["bits"].clone()).collect();
    assert_eq!(distinct.len(), found.len());

    solver.fix("bits", Tensor::constant(&[2], false));
    let unsat = solver.solve_one(&EitherBit).unwrap().is_none();
    (found.len(), unsat)
}

#[test]
fn test_external_solver_with_result_file() {
    assert_eq!(external_counts(OutputStyle::ResultFile), (3, true));
}

#[test]
fn test_external_solver_on_stdout() {
    assert_eq!(external_counts(OutputStyle::Stdout), (3, true));
}

