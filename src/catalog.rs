//! Ready-made problems over one finite set.
//!
//! Each problem declares a single unknown and states its predicate with the
//! relational layer, so the same code both searches (over literals) and
//! checks (over booleans).

use std::fmt::Write as _;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::backend::SatBackend;
use crate::domain::BooleanDomain;
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::permutation::Permutation;
use crate::problem::{unknown, Problem, Solution, Solver};
use crate::relation::Relation;
use crate::tensor::Tensor;

fn single(name: &str, shape: Vec<usize>) -> IndexMap<String, Vec<usize>> {
    IndexMap::from([(name.to_string(), shape)])
}

fn relation<E: Clone>(unknowns: &IndexMap<String, Tensor<E>>) -> Result<Relation<E>> {
    Relation::new(unknown(unknowns, "rel")?.clone())
}

fn operation<E: Clone>(unknowns: &IndexMap<String, Tensor<E>>) -> Result<Operation<E>> {
    Operation::new(unknown(unknowns, "op")?.clone())
}

fn permutation<E: Clone>(unknowns: &IndexMap<String, Tensor<E>>) -> Result<Permutation<E>> {
    Permutation::new(Operation::new(unknown(unknowns, "perm")?.clone())?)
}

// ============================================================================
// RELATIONS
// ============================================================================

/// Reflexive, antisymmetric, transitive relations
#[derive(Clone, Copy, Debug)]
pub struct PartialOrders {
    pub size: usize,
}

impl Problem for PartialOrders {
    fn unknowns(&self) -> IndexMap<String, Vec<usize>> {
        single("rel", vec![self.size; 2])
    }

    fn compute<D: BooleanDomain>(&self, d: &mut D, unknowns: &IndexMap<String, Tensor<D::Elem>>) -> Result<D::Elem> {
        relation(unknowns)?.is_partial_order(d)
    }
}

/// Linear orders
#[derive(Clone, Copy, Debug)]
pub struct TotalOrders {
    pub size: usize,
}

impl Problem for TotalOrders {
    fn unknowns(&self) -> IndexMap<String, Vec<usize>> {
        single("rel", vec![self.size; 2])
    }

    fn compute<D: BooleanDomain>(&self, d: &mut D, unknowns: &IndexMap<String, Tensor<D::Elem>>) -> Result<D::Elem> {
        relation(unknowns)?.is_total_order(d)
    }
}

/// Reflexive, symmetric, transitive relations
#[derive(Clone, Copy, Debug)]
pub struct Equivalences {
    pub size: usize,
}

impl Problem for Equivalences {
    fn unknowns(&self) -> IndexMap<String, Vec<usize>> {
        single("rel", vec![self.size; 2])
    }

    fn compute<D: BooleanDomain>(&self, d: &mut D, unknowns: &IndexMap<String, Tensor<D::Elem>>) -> Result<D::Elem> {
        relation(unknowns)?.is_equivalence(d)
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Bijections of the set
#[derive(Clone, Copy, Debug)]
pub struct Permutations {
    pub size: usize,
}

impl Problem for Permutations {
    fn unknowns(&self) -> IndexMap<String, Vec<usize>> {
        single("perm", vec![self.size; 2])
    }

    fn compute<D: BooleanDomain>(&self, d: &mut D, unknowns: &IndexMap<String, Tensor<D::Elem>>) -> Result<D::Elem> {
        permutation(unknowns)?.is_permutation(d)
    }
}

/// Permutations with an even number of inversions
#[derive(Clone, Copy, Debug)]
pub struct EvenPermutations {
    pub size: usize,
}

impl Problem for EvenPermutations {
    fn unknowns(&self) -> IndexMap<String, Vec<usize>> {
        single("perm", vec![self.size; 2])
    }

    fn compute<D: BooleanDomain>(&self, d: &mut D, unknowns: &IndexMap<String, Tensor<D::Elem>>) -> Result<D::Elem> {
        let perm = permutation(unknowns)?;
        let bijective = perm.is_permutation(d)?;
        let even = perm.is_even(d)?;
        Ok(d.and(&bijective, &even))
    }
}

/// All operations of one arity
#[derive(Clone, Copy, Debug)]
pub struct Functions {
    pub size: usize,
    pub arity: usize,
}

impl Problem for Functions {
    fn unknowns(&self) -> IndexMap<String, Vec<usize>> {
        single("op", vec![self.size; self.arity + 1])
    }

    fn compute<D: BooleanDomain>(&self, d: &mut D, unknowns: &IndexMap<String, Tensor<D::Elem>>) -> Result<D::Elem> {
        Ok(operation(unknowns)?.is_operation(d))
    }
}

/// Idempotent, commutative, associative binary operations
#[derive(Clone, Copy, Debug)]
pub struct CommutativeSemilattices {
    pub size: usize,
}

impl Problem for CommutativeSemilattices {
    fn unknowns(&self) -> IndexMap<String, Vec<usize>> {
        single("op", vec![self.size; 3])
    }

    fn compute<D: BooleanDomain>(&self, d: &mut D, unknowns: &IndexMap<String, Tensor<D::Elem>>) -> Result<D::Elem> {
        let op = operation(unknowns)?;
        let laws = [
            op.is_operation(d),
            op.is_idempotent(d)?,
            op.is_commutative(d)?,
            op.is_associative(d)?,
        ];
        Ok(d.all(&laws))
    }
}

/// Operations of one arity preserving every given relation
#[derive(Clone, Debug)]
pub struct Polymorphisms {
    pub arity: usize,
    pub relations: Vec<Relation<bool>>,
}

impl Polymorphisms {
    fn size(&self) -> usize {
        self.relations.first().map_or(0, Relation::size)
    }
}

impl Problem for Polymorphisms {
    fn unknowns(&self) -> IndexMap<String, Vec<usize>> {
        single("op", vec![self.size(); self.arity + 1])
    }

    fn compute<D: BooleanDomain>(&self, d: &mut D, unknowns: &IndexMap<String, Tensor<D::Elem>>) -> Result<D::Elem> {
        let op = operation(unknowns)?;
        let mut conditions = vec![op.is_operation(d)];
        for rel in &self.relations {
            let rel = Relation::lift(d, rel);
            conditions.push(op.preserves(d, &rel)?);
        }
        Ok(d.all(&conditions))
    }
}

// ============================================================================
// LOOKUP BY NAME
// ============================================================================

/// Problems selectable by name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Named {
    PartialOrders,
    TotalOrders,
    Equivalences,
    Permutations,
    EvenPermutations,
    Functions,
    CommutativeSemilattices,
}

impl Named {
    pub const ALL: [Named; 7] = [
        Named::PartialOrders,
        Named::TotalOrders,
        Named::Equivalences,
        Named::Permutations,
        Named::EvenPermutations,
        Named::Functions,
        Named::CommutativeSemilattices,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Named::PartialOrders => "partial-orders",
            Named::TotalOrders => "total-orders",
            Named::Equivalences => "equivalences",
            Named::Permutations => "permutations",
            Named::EvenPermutations => "even-permutations",
            Named::Functions => "functions",
            Named::CommutativeSemilattices => "commutative-semilattices",
        }
    }

    /// Enumerate solutions on a `size`-element set
    pub fn solve_all<B: SatBackend>(self, solver: &mut Solver<B>, size: usize, max: Option<usize>) -> Result<Vec<Solution>> {
        match self {
            Named::PartialOrders => solver.solve_all(&PartialOrders { size }, max),
            Named::TotalOrders => solver.solve_all(&TotalOrders { size }, max),
            Named::Equivalences => solver.solve_all(&Equivalences { size }, max),
            Named::Permutations => solver.solve_all(&Permutations { size }, max),
            Named::EvenPermutations => solver.solve_all(&EvenPermutations { size }, max),
            Named::Functions => solver.solve_all(&Functions { size, arity: 1 }, max),
            Named::CommutativeSemilattices => solver.solve_all(&CommutativeSemilattices { size }, max),
        }
    }
}

impl FromStr for Named {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Named::ALL
            .into_iter()
            .find(|n| n.name() == s)
            .ok_or_else(|| Error::Config(format!("unknown problem '{}'", s)))
    }
}

/// One line per unknown: its name and related tuples
pub fn format_solution(solution: &Solution) -> String {
    let mut out = String::new();
    for (name, value) in solution {
        let tuples: Vec<String> = value
            .tuples()
            .iter()
            .map(|t| {
                let parts: Vec<String> = t.iter().map(usize::to_string).collect();
                format!("({})", parts.join(","))
            })
            .collect();
        let _ = writeln!(out, "{}: {}", name, tuples.join(" "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Batsat;
    use crate::domain::Bools;

    fn count<P: Problem>(problem: &P) -> usize {
        Solver::new(Batsat::new()).solve_all(problem, None).unwrap().len()
    }

    #[test]
    fn test_small_counts() {
        assert_eq!(count(&PartialOrders { size: 3 }), 19);
        assert_eq!(count(&TotalOrders { size: 4 }), 24);
        assert_eq!(count(&Equivalences { size: 4 }), 15);
        assert_eq!(count(&Permutations { size: 4 }), 24);
        assert_eq!(count(&EvenPermutations { size: 4 }), 12);
        assert_eq!(count(&Functions { size: 3, arity: 1 }), 27);
        assert_eq!(count(&Functions { size: 2, arity: 2 }), 16);
        assert_eq!(count(&CommutativeSemilattices { size: 3 }), 9);
    }

    #[test]
    fn test_polymorphisms_of_order() {
        // Monotone maps of the 3-element chain
        let le = Relation::less_or_equal(&Bools, 3);
        let monotone = Polymorphisms { arity: 1, relations: vec![le.clone()] };
        assert_eq!(count(&monotone), 10);

        // Binary operations on {0, 1} preserving ≤: monotone boolean functions
        let le2 = Relation::less_or_equal(&Bools, 2);
        assert_eq!(count(&Polymorphisms { arity: 2, relations: vec![le2] }), 6);
    }

    #[test]
    fn test_named_lookup() {
        for named in Named::ALL {
            assert_eq!(named.name().parse::<Named>().unwrap(), named);
        }
        assert!("lattices".parse::<Named>().is_err());
        let mut solver = Solver::new(Batsat::new());
        assert_eq!(Named::Functions.solve_all(&mut solver, 2, None).unwrap().len(), 4);
    }

    #[test]
    fn test_format_solution() {
        let solution: Solution = IndexMap::from([(
            "rel".to_string(),
            Relation::from_tuples(2, 2, &[&[0, 0], &[0, 1], &[1, 1]]).unwrap().into_tensor(),
        )]);
        assert_eq!(format_solution(&solution), "rel: (0,0) (0,1) (1,1)\n");
    }
}
