//! relsat: finite relations, operations and permutations, evaluated two ways
//!
//! Predicates over finite structures are written once against the
//! [`BooleanDomain`] trait. Instantiated with [`Bools`] they return a truth
//! value; instantiated with a CNF [`Instance`] they return a literal whose
//! satisfying assignments are exactly the structures making the predicate
//! true, which [`Solver`] enumerates through a SAT backend.

pub mod backend;
pub mod catalog;
pub mod cnf;
pub mod config;
pub mod contract;
pub mod domain;
pub mod error;
pub mod operation;
pub mod order;
pub mod permutation;
pub mod problem;
pub mod relation;
pub mod semiring;
pub mod tensor;

pub use backend::{Batsat, DimacsProcess, OutputStyle, SatBackend};
pub use cnf::{decode, Assignment, Cnf, Instance, Literal};
pub use config::{BackendSpec, SolverConfig};
pub use contract::Contract;
pub use domain::{BooleanDomain, Bools};
pub use error::{Error, Result};
pub use operation::Operation;
pub use order::PartialOrder;
pub use permutation::Permutation;
pub use problem::{stack, Problem, Solution, Solver};
pub use relation::Relation;
pub use tensor::Tensor;
