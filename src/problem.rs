//! Problems over named unknowns and the SAT-backed solver.
//!
//! A [`Problem`] names its unknowns (tensors of fixed shape) and states a
//! predicate over them once, generically in the boolean domain. The solver
//! instantiates the unknowns with fresh literals, asks the backend for
//! models, decodes each into concrete tensors and blocks it before asking
//! again.
//!
//! # Lifecycle of one `solve_all`
//!
//! 1. Mint one literal per cell of every unknown.
//! 2. Pin fixed unknowns cell by cell.
//! 3. Evaluate the predicate over the literals and ensure its root.
//! 4. Repeat: solve, decode, self-check with plain booleans, block.
//! 5. Stop on UNSAT, on the solution limit, or on an empty blocking clause.

use indexmap::IndexMap;
use tracing::debug;

use crate::backend::SatBackend;
use crate::cnf::{decode, Instance, InstanceStats, Literal};
use crate::config::SolverConfig;
use crate::domain::{BooleanDomain, Bools};
use crate::error::{Error, Result};
use crate::tensor::Tensor;

/// Concrete values of every unknown, in declaration order
pub type Solution = IndexMap<String, Tensor<bool>>;

/// A predicate over named unknowns.
pub trait Problem {
    /// Unknown names and shapes
    fn unknowns(&self) -> IndexMap<String, Vec<usize>>;

    /// Evaluate the predicate in any boolean domain
    fn compute<D: BooleanDomain>(
        &self,
        d: &mut D,
        unknowns: &IndexMap<String, Tensor<D::Elem>>,
    ) -> Result<D::Elem>;

    /// Cells of an unknown that distinguish solutions; `None` means all.
    ///
    /// Two models that agree on every relevant cell count as one solution.
    fn mask(&self, _name: &str) -> Option<Tensor<bool>> {
        None
    }

    /// Evaluate the predicate on concrete values
    fn check(&self, solution: &Solution) -> Result<bool> {
        self.compute(&mut Bools, solution)
    }
}

/// Fetch an unknown by name from inside [`Problem::compute`]
pub fn unknown<'a, E>(unknowns: &'a IndexMap<String, Tensor<E>>, name: &str) -> Result<&'a Tensor<E>> {
    unknowns.get(name).ok_or_else(|| Error::Invalid {
        kind: "unknown",
        reason: format!("no unknown named '{}'", name),
    })
}

/// Enumerates solutions of problems through a SAT backend
pub struct Solver<B> {
    backend: B,
    config: SolverConfig,
    fixed: IndexMap<String, Tensor<bool>>,
    last_stats: Option<InstanceStats>,
}

impl<B: SatBackend> Solver<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, SolverConfig::default())
    }

    pub fn with_config(backend: B, config: SolverConfig) -> Self {
        Self {
            backend,
            config,
            fixed: IndexMap::new(),
            last_stats: None,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Pin an unknown to concrete values in every later solve
    pub fn fix(&mut self, name: impl Into<String>, value: Tensor<bool>) -> &mut Self {
        self.fixed.insert(name.into(), value);
        self
    }

    pub fn clear_fixed(&mut self) {
        self.fixed.clear();
    }

    /// Size of the formula built by the most recent solve
    pub fn last_stats(&self) -> Option<InstanceStats> {
        self.last_stats
    }

    /// Some solution, or `None` if there is none
    pub fn solve_one<P: Problem>(&mut self, problem: &P) -> Result<Option<Solution>> {
        Ok(self.solve_all(problem, Some(1))?.into_iter().next())
    }

    /// Every solution up to `max` (falling back to the configured limit),
    /// each distinct on the cells the problem's masks mark relevant.
    pub fn solve_all<P: Problem>(&mut self, problem: &P, max: Option<usize>) -> Result<Vec<Solution>> {
        let limit = max.or(self.config.max_solutions);
        self.backend.clear();

        let mut instance = Instance::new();
        let unknowns: IndexMap<String, Tensor<Literal>> = problem
            .unknowns()
            .into_iter()
            .map(|(name, shape)| {
                let lits = instance.fresh_tensor(&shape);
                (name, lits)
            })
            .collect();

        for (name, value) in &self.fixed {
            let lits = unknown(&unknowns, name)?;
            if lits.shape() != value.shape() {
                return Err(Error::shape(lits.shape(), value.shape()));
            }
            for (&lit, &v) in lits.iter().zip(value.iter()) {
                instance.ensure(if v { lit } else { -lit });
            }
        }

        let root = problem.compute(&mut instance, &unknowns)?;
        instance.ensure(root);

        let mut masks = IndexMap::new();
        for (name, lits) in &unknowns {
            if let Some(mask) = problem.mask(name) {
                if mask.shape() != lits.shape() {
                    return Err(Error::shape(lits.shape(), mask.shape()));
                }
                masks.insert(name.clone(), mask);
            }
        }

        let stats = instance.stats();
        debug!(
            backend = self.backend.name(),
            variables = stats.variables,
            clauses = stats.clauses,
            or_gates = stats.or_gates,
            xor_gates = stats.xor_gates,
            "instance built"
        );

        let mut solutions = Vec::new();
        while limit.map_or(true, |max| solutions.len() < max) {
            let Some(model) = self.backend.solve(instance.cnf())? else {
                debug!(found = solutions.len(), "unsatisfiable, enumeration complete");
                break;
            };

            let solution: Solution = unknowns
                .iter()
                .map(|(name, lits)| (name.clone(), decode(&model, lits)))
                .collect();
            if self.config.self_check && !problem.check(&solution)? {
                return Err(Error::InternalInvariantViolation(format!(
                    "model #{} does not satisfy the predicate",
                    solutions.len() + 1
                )));
            }

            let mut blocking = Vec::new();
            for (name, lits) in &unknowns {
                let mask = masks.get(name);
                for (i, (&lit, &value)) in lits.iter().zip(solution[name].iter()).enumerate() {
                    if mask.is_some_and(|m| !m.elems()[i]) {
                        continue;
                    }
                    let value = instance.constant(value);
                    let differs = instance.xor(&lit, &value);
                    if differs != Literal::FALSE {
                        blocking.push(differs);
                    }
                }
            }
            solutions.push(solution);
            debug!(found = solutions.len(), "model found");

            if blocking.is_empty() {
                break;
            }
            instance.add_clause(blocking);
        }

        self.last_stats = Some(instance.stats());
        Ok(solutions)
    }
}

/// Stack one unknown across solutions along a new last axis
pub fn stack(solutions: &[Solution], name: &str) -> Result<Tensor<bool>> {
    let parts = solutions
        .iter()
        .map(|s| unknown(s, name).cloned())
        .collect::<Result<Vec<_>>>()?;
    Tensor::concat(&parts)
}
