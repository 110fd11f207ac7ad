//! Finitary operations as graphs.
//!
//! An operation `f: Aᵏ → A` on an m-element set is stored as its graph, a
//! tensor of shape `[m; k+1]` whose cell `(r, a₁, ..., aₖ)` holds iff
//! `f(a₁, ..., aₖ) = r`. The result coordinate comes first so that the
//! "exactly one value" condition is a fold over axis 0.
//!
//! Over literals the graph is an unknown; `is_operation` is then the
//! constraint that makes it a function.

use std::fmt::Debug;

use crate::contract::{names, Contract};
use crate::domain::{BooleanDomain, Bools};
use crate::error::{Error, Result};
use crate::relation::Relation;
use crate::tensor::Tensor;

/// The graph of an operation; axis 0 holds the value
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Operation<E> {
    tensor: Tensor<E>,
}

impl<E> Operation<E> {
    /// Wrap a graph tensor (order = arity + 1, equal axis sizes).
    ///
    /// Whether the graph is a function is not checked here; see
    /// [`Operation::is_operation`] and [`Operation::from_bool`].
    pub fn new(tensor: Tensor<E>) -> Result<Self> {
        let relation = Relation::new(tensor)?;
        Ok(Self {
            tensor: relation.into_tensor(),
        })
    }

    /// Wrap a graph tensor already known to have equal axes
    pub(crate) fn wrap(tensor: Tensor<E>) -> Self {
        Self {
            tensor: Relation::wrap(tensor).into_tensor(),
        }
    }

    pub fn tensor(&self) -> &Tensor<E> {
        &self.tensor
    }

    pub fn into_tensor(self) -> Tensor<E> {
        self.tensor
    }

    pub fn size(&self) -> usize {
        self.tensor.shape()[0]
    }

    pub fn arity(&self) -> usize {
        self.tensor.order() - 1
    }

    fn require_arity(&self, arity: usize) -> Result<()> {
        if self.arity() != arity {
            return Err(Error::arity(arity, self.arity()));
        }
        Ok(())
    }
}

impl Operation<bool> {
    /// Graph of a concrete function.
    ///
    /// # Panics
    /// Panics if `f` returns a value outside the set.
    pub fn from_fn(size: usize, arity: usize, f: impl Fn(&[usize]) -> usize) -> Self {
        let tensor = Tensor::generate(&vec![size; arity + 1], |index| {
            let value = f(&index[1..]);
            assert!(value < size, "value {} outside the {}-element set", value, size);
            index[0] == value
        });
        Self { tensor }
    }

    /// Wrap a concrete graph, rejecting it unless it is one-hot along axis 0.
    pub fn from_bool(tensor: Tensor<bool>) -> Result<Self> {
        let op = Self::new(tensor)?;
        if !op.is_operation(&mut Bools) {
            return Err(Error::Invalid {
                kind: "operation",
                reason: "some argument tuple does not have exactly one value".to_string(),
            });
        }
        Ok(op)
    }

    /// Value at an argument tuple, if the graph defines exactly one
    pub fn value(&self, args: &[usize]) -> Option<usize> {
        let mut index = Vec::with_capacity(args.len() + 1);
        index.push(0);
        index.extend_from_slice(args);
        let mut found = None;
        for r in 0..self.size() {
            index[0] = r;
            if *self.tensor.get(&index) {
                if found.is_some() {
                    return None;
                }
                found = Some(r);
            }
        }
        found
    }
}

impl<E: Clone + Debug + PartialEq> Operation<E> {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// `(x₀, ..., xₖ₋₁) ↦ x_coord`
    pub fn projection<D: BooleanDomain<Elem = E>>(d: &D, size: usize, arity: usize, coord: usize) -> Result<Self> {
        if coord >= arity {
            return Err(Error::arity(arity, coord + 1));
        }
        Ok(Self {
            tensor: Tensor::generate(&vec![size; arity + 1], |i| d.constant(i[0] == i[coord + 1])),
        })
    }

    /// `(x₀, ..., xₖ₋₁) ↦ value`
    pub fn constant<D: BooleanDomain<Elem = E>>(d: &D, size: usize, arity: usize, value: usize) -> Self {
        Self {
            tensor: Tensor::generate(&vec![size; arity + 1], |i| d.constant(i[0] == value)),
        }
    }

    /// Embed a concrete operation as constants of the domain
    pub fn lift<D: BooleanDomain<Elem = E>>(d: &D, op: &Operation<bool>) -> Self {
        Self {
            tensor: op.tensor.map(|&b| d.constant(b)),
        }
    }

    /// The graph as a relation of arity `arity + 1`
    pub fn as_relation(&self) -> Relation<E> {
        Relation::wrap(self.tensor.clone())
    }

    // ========================================================================
    // Validity
    // ========================================================================

    /// Every argument tuple has exactly one value
    pub fn is_operation<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> E {
        let unique = self.tensor.fold(1, |xs| d.one(xs));
        d.all(unique.elems())
    }

    /// Every element is a value
    pub fn is_surjective<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        let vars = names(0, self.arity() + 1)?;
        let mut contract = Contract::logical(d);
        contract.add(&self.tensor, &vars)?;
        let image = contract.get(&vars[..1])?;
        Ok(d.all(image.elems()))
    }

    // ========================================================================
    // Building new operations
    // ========================================================================

    /// Identify and permute arguments: the result `g` of arity `arity`
    /// satisfies `g(x₀, ..., x_{arity-1}) = f(x_{map[0]}, ..., x_{map[k-1]})`.
    pub fn polymer(&self, arity: usize, map: &[usize]) -> Result<Self> {
        if map.len() != self.arity() {
            return Err(Error::arity(self.arity(), map.len()));
        }
        if let Some(&bad) = map.iter().find(|&&m| m >= arity) {
            return Err(Error::arity(arity, bad + 1));
        }
        let axis_map: Vec<usize> = std::iter::once(0).chain(map.iter().map(|m| m + 1)).collect();
        Ok(Self {
            tensor: self.tensor.reshape(&vec![self.size(); arity + 1], &axis_map)?,
        })
    }

    /// Composition of unary operations: `(f∘g)(x) = f(g(x))`
    pub fn compose<D: BooleanDomain<Elem = E>>(&self, d: &mut D, other: &Self) -> Result<Self> {
        self.require_arity(1)?;
        other.require_arity(1)?;
        self.compose_with(d, std::slice::from_ref(other))
    }

    /// Superposition `f(g₁(x̄), ..., gₖ(x̄))` of operations `gᵢ` sharing one arity.
    pub fn compose_with<D: BooleanDomain<Elem = E>>(&self, d: &mut D, inner: &[Self]) -> Result<Self> {
        let k = self.arity();
        if inner.len() != k {
            return Err(Error::arity(k, inner.len()));
        }
        let Some(first) = inner.first() else {
            return Err(Error::arity(1, 0));
        };
        let m = first.arity();
        for g in inner {
            g.require_arity(m)?;
        }

        let vars = names(0, 1 + k + m)?;
        let (head, rest) = vars.split_at(1);
        let (ys, xs) = rest.split_at(k);
        let mut contract = Contract::logical(d);
        contract.add(&self.tensor, &format!("{}{}", head, ys))?;
        for (g, y) in inner.iter().zip(ys.chars()) {
            contract.add(&g.tensor, &format!("{}{}", y, xs))?;
        }
        Operation::new(contract.get(&format!("{}{}", head, xs))?)
    }

    // ========================================================================
    // Identities
    // ========================================================================

    /// The identity `f(x_lhs) = f(x_rhs)` holds for all values of the variables
    pub fn is_satisfied<D: BooleanDomain<Elem = E>>(&self, d: &mut D, lhs: &[usize], rhs: &[usize]) -> Result<E> {
        let vars = lhs.iter().chain(rhs).max().map_or(1, |m| m + 1);
        let left = self.polymer(vars, lhs)?;
        let right = self.polymer(vars, rhs)?;
        left.as_relation().is_equal_to(d, &right.as_relation())
    }

    /// The identity `f(x_pattern) = x_var` holds for all values of the variables
    pub fn is_satisfied_by_variable<D: BooleanDomain<Elem = E>>(
        &self,
        d: &mut D,
        pattern: &[usize],
        var: usize,
    ) -> Result<E> {
        let vars = pattern.iter().copied().chain(std::iter::once(var)).max().map_or(1, |m| m + 1);
        let left = self.polymer(vars, pattern)?;
        let right = Self::projection(d, self.size(), vars, var)?;
        left.as_relation().is_equal_to(d, &right.as_relation())
    }

    /// `f` is one of the projections
    pub fn is_projection<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        let mut candidates = Vec::with_capacity(self.arity());
        for coord in 0..self.arity() {
            let proj = Self::projection(d, self.size(), self.arity(), coord)?;
            candidates.push(self.as_relation().is_equal_to(d, &proj.as_relation())?);
        }
        Ok(d.any(&candidates))
    }

    /// `f(x, ..., x) = x`
    pub fn is_idempotent<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        self.is_satisfied_by_variable(d, &vec![0; self.arity()], 0)
    }

    /// `f(x, y) = f(y, x)`
    pub fn is_commutative<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        self.require_arity(2)?;
        self.is_satisfied(d, &[0, 1], &[1, 0])
    }

    /// `f(f(x, y), z) = f(x, f(y, z))`
    pub fn is_associative<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        self.require_arity(2)?;
        let size = self.size();
        let x = Self::projection(d, size, 3, 0)?;
        let z = Self::projection(d, size, 3, 2)?;
        let xy = self.polymer(3, &[0, 1])?;
        let yz = self.polymer(3, &[1, 2])?;
        let left = self.compose_with(d, &[xy, z])?;
        let right = self.compose_with(d, &[x, yz])?;
        left.as_relation().is_equal_to(d, &right.as_relation())
    }

    /// `f(x, x, y) = f(x, y, x) = f(y, x, x) = x`
    pub fn is_majority<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        self.require_arity(3)?;
        let a = self.is_satisfied_by_variable(d, &[0, 0, 1], 0)?;
        let b = self.is_satisfied_by_variable(d, &[0, 1, 0], 0)?;
        let c = self.is_satisfied_by_variable(d, &[1, 0, 0], 0)?;
        Ok(d.all(&[a, b, c]))
    }

    /// `f(x, x, y) = f(x, y, x) = f(y, x, x) = y`
    pub fn is_minority<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        self.require_arity(3)?;
        let a = self.is_satisfied_by_variable(d, &[0, 0, 1], 1)?;
        let b = self.is_satisfied_by_variable(d, &[0, 1, 0], 1)?;
        let c = self.is_satisfied_by_variable(d, &[1, 0, 0], 1)?;
        Ok(d.all(&[a, b, c]))
    }

    /// `f(x, y, y) = f(y, y, x) = x`
    pub fn is_maltsev<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        self.require_arity(3)?;
        let a = self.is_satisfied_by_variable(d, &[0, 1, 1], 0)?;
        let b = self.is_satisfied_by_variable(d, &[1, 1, 0], 0)?;
        Ok(d.and(&a, &b))
    }

    // ========================================================================
    // Preservation
    // ========================================================================

    /// `f` is a polymorphism of `relation`: applying `f` row-wise to any
    /// matrix whose columns lie in the relation yields a tuple of it.
    ///
    /// Supported for operations of arity at most 3 and relations of arity
    /// at most 4.
    pub fn preserves<D: BooleanDomain<Elem = E>>(&self, d: &mut D, relation: &Relation<E>) -> Result<E> {
        if relation.size() != self.size() {
            return Err(Error::shape(
                &[self.size()],
                &[relation.size()],
            ));
        }
        let layout = Preservation::classify(self.arity(), relation.arity())?;
        let (k, m) = (layout.op_arity(), layout.rel_arity());

        // x[i][j]: row i < m, column j < k; then y[i]
        let vars: Vec<char> = names(0, m * k + m)?.chars().collect();
        let x = |i: usize, j: usize| vars[i * k + j];
        let y = |i: usize| vars[m * k + i];

        let outside = relation.complement(d);
        let mut contract = Contract::logical(d);
        for i in 0..m {
            let row: String = std::iter::once(y(i)).chain((0..k).map(|j| x(i, j))).collect();
            contract.add(&self.tensor, &row)?;
        }
        for j in 0..k {
            let column: String = (0..m).map(|i| x(i, j)).collect();
            contract.add(relation.tensor(), &column)?;
        }
        let image: String = (0..m).map(y).collect();
        contract.add(outside.tensor(), &image)?;
        let violated = contract.get("")?.into_scalar()?;
        Ok(d.not(&violated))
    }
}

/// Arity combinations `preserves` knows how to lay out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Preservation {
    Constant { rel: usize },
    Unary { rel: usize },
    Binary { rel: usize },
    Ternary { rel: usize },
}

impl Preservation {
    const MAX_RELATION_ARITY: usize = 4;

    fn classify(op_arity: usize, rel_arity: usize) -> Result<Self> {
        if rel_arity == 0 || rel_arity > Self::MAX_RELATION_ARITY {
            return Err(Error::Unsupported(format!(
                "preservation of relations of arity {}",
                rel_arity
            )));
        }
        match op_arity {
            0 => Ok(Preservation::Constant { rel: rel_arity }),
            1 => Ok(Preservation::Unary { rel: rel_arity }),
            2 => Ok(Preservation::Binary { rel: rel_arity }),
            3 => Ok(Preservation::Ternary { rel: rel_arity }),
            _ => Err(Error::Unsupported(format!(
                "preservation by operations of arity {}",
                op_arity
            ))),
        }
    }

    fn op_arity(self) -> usize {
        match self {
            Preservation::Constant { .. } => 0,
            Preservation::Unary { .. } => 1,
            Preservation::Binary { .. } => 2,
            Preservation::Ternary { .. } => 3,
        }
    }

    fn rel_arity(self) -> usize {
        match self {
            Preservation::Constant { rel }
            | Preservation::Unary { rel }
            | Preservation::Binary { rel }
            | Preservation::Ternary { rel } => rel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meet(size: usize) -> Operation<bool> {
        Operation::from_fn(size, 2, |a| a[0].min(a[1]))
    }

    fn median() -> Operation<bool> {
        Operation::from_fn(2, 3, |a| usize::from(a.iter().sum::<usize>() >= 2))
    }

    fn parity() -> Operation<bool> {
        Operation::from_fn(2, 3, |a| a.iter().sum::<usize>() % 2)
    }

    #[test]
    fn test_from_bool_validates() {
        assert!(Operation::from_bool(meet(3).into_tensor()).is_ok());
        let broken = Tensor::generate(&[3, 3], |i| i[0] <= i[1]);
        assert!(matches!(
            Operation::from_bool(broken),
            Err(Error::Invalid { kind: "operation", .. })
        ));
    }

    #[test]
    fn test_value_and_polymer() {
        let f = Operation::from_fn(3, 2, |a| (a[0] + 2 * a[1]) % 3);
        assert_eq!(f.value(&[1, 2]), Some(2));
        let swapped = f.polymer(2, &[1, 0]).unwrap();
        assert_eq!(swapped.value(&[1, 2]), f.value(&[2, 1]));
        let diag = f.polymer(1, &[0, 0]).unwrap();
        assert_eq!(diag.value(&[2]), Some(0));
        let padded = f.polymer(3, &[2, 0]).unwrap();
        assert_eq!(padded.value(&[1, 0, 2]), f.value(&[2, 1]));
        assert!(f.polymer(2, &[0, 2]).is_err());
    }

    #[test]
    fn test_compose() {
        let mut d = Bools;
        let succ = Operation::from_fn(4, 1, |a| (a[0] + 1) % 4);
        let twice = succ.compose(&mut d, &succ).unwrap();
        assert_eq!(twice, Operation::from_fn(4, 1, |a| (a[0] + 2) % 4));

        let plus = Operation::from_fn(4, 2, |a| (a[0] + a[1]) % 4);
        let shifted = plus.compose_with(&mut d, &[succ.clone(), succ]).unwrap();
        assert_eq!(shifted, Operation::from_fn(4, 1, |a| (2 * a[0] + 2) % 4));
    }

    #[test]
    fn test_semilattice_identities() {
        let mut d = Bools;
        let m = meet(3);
        assert!(m.is_operation(&mut d));
        assert!(m.is_surjective(&mut d).unwrap());
        assert!(m.is_idempotent(&mut d).unwrap());
        assert!(m.is_commutative(&mut d).unwrap());
        assert!(m.is_associative(&mut d).unwrap());
        assert!(!m.is_projection(&mut d).unwrap());

        let minus = Operation::from_fn(3, 2, |a| (a[0] + 3 - a[1]) % 3);
        assert!(!minus.is_commutative(&mut d).unwrap());
        assert!(!minus.is_associative(&mut d).unwrap());
    }

    #[test]
    fn test_ternary_identities() {
        let mut d = Bools;
        assert!(median().is_majority(&mut d).unwrap());
        assert!(!median().is_minority(&mut d).unwrap());
        assert!(parity().is_minority(&mut d).unwrap());
        assert!(parity().is_maltsev(&mut d).unwrap());
        assert!(!median().is_maltsev(&mut d).unwrap());
    }

    #[test]
    fn test_projection_detection() {
        let mut d = Bools;
        let p = Operation::<bool>::projection(&d, 3, 3, 1).unwrap();
        assert!(p.is_projection(&mut d).unwrap());
        assert!(p.is_idempotent(&mut d).unwrap());
        assert!(Operation::<bool>::projection(&d, 3, 2, 2).is_err());
        let c = Operation::<bool>::constant(&d, 3, 1, 2);
        assert!(!c.is_surjective(&mut d).unwrap());
    }

    #[test]
    fn test_preserves() {
        let mut d = Bools;
        let le = Relation::less_or_equal(&d, 3);
        assert!(meet(3).preserves(&mut d, &le).unwrap());
        let minus = Operation::from_fn(3, 2, |a| (a[0] + 3 - a[1]) % 3);
        assert!(!minus.preserves(&mut d, &le).unwrap());

        // Constants preserve exactly the reflexive relations at their value
        let c = Operation::<bool>::constant(&d, 3, 0, 1);
        assert!(c.preserves(&mut d, &le).unwrap());
        let lt = Relation::less_than(&d, 3);
        assert!(!c.preserves(&mut d, &lt).unwrap());

        // Median preserves every binary relation on {0, 1}
        let neq = Relation::equal(&d, 2).complement(&mut d);
        assert!(median().preserves(&mut d, &neq).unwrap());
        // ... but not the 1-in-3 relation, which parity does not preserve either
        let one_in_three = Relation::new(Tensor::generate(&[2, 2, 2], |i| i.iter().sum::<usize>() == 1)).unwrap();
        assert!(!median().preserves(&mut d, &one_in_three).unwrap());
        assert!(!parity().preserves(&mut d, &one_in_three).unwrap());
        // Parity preserves affine relations such as x + y + z = 1
        let affine = Relation::new(Tensor::generate(&[2, 2, 2], |i| i.iter().sum::<usize>() % 2 == 1)).unwrap();
        assert!(parity().preserves(&mut d, &affine).unwrap());
    }

    #[test]
    fn test_preserves_unsupported_arities() {
        let mut d = Bools;
        let quaternary = Operation::<bool>::projection(&d, 2, 4, 0).unwrap();
        let le = Relation::less_or_equal(&d, 2);
        assert!(matches!(quaternary.preserves(&mut d, &le), Err(Error::Unsupported(_))));
        let five = Relation::<bool>::full(&d, 2, 5);
        assert!(matches!(meet(2).preserves(&mut d, &five), Err(Error::Unsupported(_))));
    }
}
