//! Einsum-style contraction of named-index tensors.
//!
//! Entries are added as `(tensor, variables)` where each variable is a single
//! character naming one axis, e.g. `add(&a, "ij")`. A query `get("ik")`
//! multiplies all entries pointwise over shared variables and sums out every
//! variable missing from the result:
//!
//! ```text
//! get("ik") = ⊕_j a[i,j] ⊗ b[j,k]       after add(a, "ij"), add(b, "jk")
//! ```
//!
//! The full product is never built. Instead the engine alternates two steps
//! until one entry remains:
//!
//! 1. **reduce**: sum out, in each entry, the variables that no other entry
//!    and not the result mentions (a repeated variable inside one entry
//!    selects its diagonal first)
//! 2. **join**: multiply the first entry with the next entry sharing a
//!    variable, broadcasting both to the union of their variables
//!
//! Summing out as early as possible only bounds intermediate sizes; the
//! result equals the naive einsum whenever the semiring laws hold.

use std::collections::HashMap;

use tracing::trace;

use crate::domain::BooleanDomain;
use crate::error::{Error, Result};
use crate::semiring::{Linear, Logical, Semiring};
use crate::tensor::Tensor;

#[derive(Clone, Debug)]
struct Entry<E> {
    tensor: Tensor<E>,
    vars: Vec<char>,
}

/// A single-use contraction query over semiring `S`.
///
/// After a successful [`Contract::get`] the contract is empty and may be
/// reused. After any error it is poisoned until [`Contract::clear`].
#[derive(Debug)]
pub struct Contract<S: Semiring> {
    semiring: S,
    entries: Vec<Entry<S::Elem>>,
    sizes: HashMap<char, usize>,
    poisoned: bool,
}

impl<'d, D: BooleanDomain> Contract<Logical<'d, D>> {
    /// Contraction with (OR, AND): existential projection of joins
    pub fn logical(domain: &'d mut D) -> Self {
        Self::new(Logical::new(domain))
    }
}

impl<'d, D: BooleanDomain> Contract<Linear<'d, D>> {
    /// Contraction with (XOR, AND): parity of the number of witnesses
    pub fn linear(domain: &'d mut D) -> Self {
        Self::new(Linear::new(domain))
    }
}

impl<S: Semiring> Contract<S> {
    pub fn new(semiring: S) -> Self {
        Self {
            semiring,
            entries: Vec::new(),
            sizes: HashMap::new(),
            poisoned: false,
        }
    }

    /// Access the underlying semiring (and through it, the domain)
    pub fn semiring(&mut self) -> &mut S {
        &mut self.semiring
    }

    /// Drop all entries and lift the poison flag.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.sizes.clear();
        self.poisoned = false;
    }

    /// Add an entry whose axes are named by the characters of `vars`.
    pub fn add(&mut self, tensor: &Tensor<S::Elem>, vars: &str) -> Result<()> {
        if self.poisoned {
            return Err(Error::StateReuse("contract used after a failed query without clear()"));
        }
        let outcome = self.bind(tensor, vars);
        if outcome.is_err() {
            self.poisoned = true;
        }
        outcome
    }

    /// Contract all entries into a tensor indexed by `result`.
    pub fn get(&mut self, result: &str) -> Result<Tensor<S::Elem>> {
        if self.poisoned {
            return Err(Error::StateReuse("contract used after a failed query without clear()"));
        }
        match self.contract(result) {
            Ok(tensor) => {
                self.clear();
                Ok(tensor)
            }
            Err(err) => {
                self.entries.clear();
                self.poisoned = true;
                Err(err)
            }
        }
    }

    fn bind(&mut self, tensor: &Tensor<S::Elem>, vars: &str) -> Result<()> {
        let vars: Vec<char> = vars.chars().collect();
        if vars.len() != tensor.order() {
            return Err(Error::arity(tensor.order(), vars.len()));
        }
        for (&var, &dim) in vars.iter().zip(tensor.shape()) {
            match self.sizes.get(&var) {
                Some(&first) if first != dim => {
                    return Err(Error::VariableDimensionMismatch {
                        var,
                        first,
                        second: dim,
                    });
                }
                Some(_) => {}
                None => {
                    self.sizes.insert(var, dim);
                }
            }
        }
        self.entries.push(Entry {
            tensor: tensor.clone(),
            vars,
        });
        Ok(())
    }

    fn contract(&mut self, result: &str) -> Result<Tensor<S::Elem>> {
        let result: Vec<char> = result.chars().collect();
        for (i, var) in result.iter().enumerate() {
            if result[..i].contains(var) {
                let mut unique = result.clone();
                unique.sort_unstable();
                unique.dedup();
                return Err(Error::arity(unique.len(), result.len()));
            }
            if !self.sizes.contains_key(var) {
                return Err(Error::UnknownVariable(*var));
            }
        }

        let mut entries = std::mem::take(&mut self.entries);
        if entries.is_empty() {
            entries.push(Entry {
                tensor: Tensor::scalar(self.semiring.one()),
                vars: Vec::new(),
            });
        }

        loop {
            // Number of entries mentioning each variable
            let mut counts: HashMap<char, usize> = HashMap::new();
            for entry in &entries {
                let mut seen = entry.vars.clone();
                seen.sort_unstable();
                seen.dedup();
                for var in seen {
                    *counts.entry(var).or_default() += 1;
                }
            }
            entries = entries
                .into_iter()
                .map(|entry| {
                    let keep = |v: char| counts[&v] > 1 || result.contains(&v);
                    self.reduce(entry, keep)
                })
                .collect::<Result<Vec<_>>>()?;

            if entries.len() == 1 {
                break;
            }

            let first = entries.remove(0);
            let partner = entries
                .iter()
                .position(|e| e.vars.iter().any(|v| first.vars.contains(v)))
                .unwrap_or(0);
            let second = entries.remove(partner);
            let joined = self.join(first, second)?;
            entries.insert(0, joined);
        }

        let Some(last) = entries.pop() else {
            return Err(Error::InternalInvariantViolation(
                "contraction lost all entries".to_string(),
            ));
        };
        if last.vars.len() != result.len() {
            return Err(Error::InternalInvariantViolation(format!(
                "contraction ended with variables {:?}, requested {:?}",
                last.vars, result
            )));
        }
        let mut perm = Vec::with_capacity(last.vars.len());
        for var in &last.vars {
            match result.iter().position(|r| r == var) {
                Some(p) => perm.push(p),
                None => {
                    return Err(Error::InternalInvariantViolation(format!(
                        "variable '{}' survived contraction to {:?}",
                        var, result
                    )));
                }
            }
        }
        let mut vars = vec![' '; result.len()];
        for (var, &p) in last.vars.iter().zip(&perm) {
            vars[p] = *var;
        }
        if vars != result {
            return Err(Error::InternalInvariantViolation(format!(
                "contraction produced {:?}, requested {:?}",
                vars, result
            )));
        }
        last.tensor.permute(&perm)
    }

    /// Select diagonals of repeated variables and sum out the variables
    /// `keep` rejects.
    fn reduce(&mut self, entry: Entry<S::Elem>, keep: impl Fn(char) -> bool) -> Result<Entry<S::Elem>> {
        let mut unique: Vec<char> = Vec::with_capacity(entry.vars.len());
        for &var in &entry.vars {
            if !unique.contains(&var) {
                unique.push(var);
            }
        }
        let (local, kept): (Vec<char>, Vec<char>) = unique.into_iter().partition(|&v| !keep(v));
        let target: Vec<char> = local.iter().chain(&kept).copied().collect();
        if local.is_empty() && target == entry.vars {
            return Ok(entry);
        }

        let tensor = if target == entry.vars {
            entry.tensor
        } else {
            let shape: Vec<usize> = target.iter().map(|v| self.sizes[v]).collect();
            let axis_map = positions(&entry.vars, &target);
            entry.tensor.reshape(&shape, &axis_map)?
        };

        if local.is_empty() {
            return Ok(Entry { tensor, vars: kept });
        }
        trace!(summed = ?local, kept = ?kept, "reduce");
        let semiring = &mut self.semiring;
        let tensor = tensor.fold(local.len(), |xs| semiring.sum(xs));
        Ok(Entry { tensor, vars: kept })
    }

    /// Pointwise product over the union of both variable lists
    fn join(&mut self, a: Entry<S::Elem>, b: Entry<S::Elem>) -> Result<Entry<S::Elem>> {
        let mut vars = a.vars.clone();
        for var in &b.vars {
            if !vars.contains(var) {
                vars.push(*var);
            }
        }
        trace!(left = ?a.vars, right = ?b.vars, joined = ?vars, "join");
        let shape: Vec<usize> = vars.iter().map(|v| self.sizes[v]).collect();
        let ta = a.tensor.reshape(&shape, &positions(&a.vars, &vars))?;
        let tb = b.tensor.reshape(&shape, &positions(&b.vars, &vars))?;
        let semiring = &mut self.semiring;
        let tensor = ta.map2(&tb, |x, y| semiring.mul(x, y))?;
        Ok(Entry { tensor, vars })
    }
}

/// Variable names available to generated contractions
const NAMES: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `count` distinct variable names starting at offset `start` of the pool.
pub(crate) fn names(start: usize, count: usize) -> Result<String> {
    if start + count > NAMES.len() {
        return Err(Error::Unsupported(format!(
            "contraction needs {} variables, at most {} available",
            start + count,
            NAMES.len()
        )));
    }
    Ok(NAMES[start..start + count].to_string())
}

/// Position in `target` of each variable of `vars`; all must be present.
fn positions(vars: &[char], target: &[char]) -> Vec<usize> {
    vars.iter()
        .map(|v| target.iter().position(|t| t == v).unwrap_or(target.len()))
        .collect()
}
