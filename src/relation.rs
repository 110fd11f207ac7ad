//! Finite relations as boolean-valued tensors.
//!
//! A relation of arity n on an m-element set is a tensor of shape
//! `[m; n]` whose cell `(a₀, ..., aₙ₋₁)` holds iff the tuple is related.
//! The element type is generic: over `bool` the relation is concrete, over
//! `Literal` it is an unknown whose membership is decided by a SAT solver.
//!
//! Every operation takes the boolean domain explicitly and returns a new
//! relation. Structural operations go through [`Tensor::reshape`];
//! joins and projections go through [`Contract`].

use std::fmt::Debug;

use crate::contract::{names, Contract};
use crate::domain::BooleanDomain;
use crate::error::{Error, Result};
use crate::semiring::Semiring;
use crate::tensor::Tensor;

/// A relation: a tensor whose axes all have the same size
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Relation<E> {
    tensor: Tensor<E>,
}

impl<E> Relation<E> {
    /// Wrap a tensor of positive order whose axes share one size.
    pub fn new(tensor: Tensor<E>) -> Result<Self> {
        let Some(&size) = tensor.shape().first() else {
            return Err(Error::arity(1, 0));
        };
        if tensor.shape().iter().any(|&d| d != size) {
            return Err(Error::shape(&vec![size; tensor.order()], tensor.shape()));
        }
        Ok(Self { tensor })
    }

    /// Wrap a tensor already known to have positive order and equal axes
    pub(crate) fn wrap(tensor: Tensor<E>) -> Self {
        debug_assert!(tensor.order() > 0 && tensor.shape().iter().all(|&d| d == tensor.shape()[0]));
        Self { tensor }
    }

    pub fn tensor(&self) -> &Tensor<E> {
        &self.tensor
    }

    pub fn into_tensor(self) -> Tensor<E> {
        self.tensor
    }

    /// Size of the underlying set
    pub fn size(&self) -> usize {
        self.tensor.shape()[0]
    }

    pub fn arity(&self) -> usize {
        self.tensor.order()
    }

    /// Membership of a tuple
    pub fn get(&self, tuple: &[usize]) -> &E {
        self.tensor.get(tuple)
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.size(); self.arity()]
    }

    fn require_arity(&self, arity: usize) -> Result<()> {
        if self.arity() != arity {
            return Err(Error::arity(arity, self.arity()));
        }
        Ok(())
    }
}

impl Relation<bool> {
    /// Concrete relation from its tuples.
    ///
    /// A tuple of the wrong length is `ArityMismatch`; one leaving the set is
    /// `ShapeMismatch` against the smallest shape that would contain it.
    pub fn from_tuples(size: usize, arity: usize, tuples: &[&[usize]]) -> Result<Self> {
        let shape = vec![size; arity];
        let mut cells = Tensor::constant(&shape, false).into_elems();
        for tuple in tuples {
            if tuple.len() != arity {
                return Err(Error::arity(arity, tuple.len()));
            }
            if tuple.iter().any(|&a| a >= size) {
                let needed: Vec<usize> = tuple.iter().map(|&a| (a + 1).max(size)).collect();
                return Err(Error::shape(&shape, &needed));
            }
            let mut offset = 0;
            let mut stride = 1;
            for &a in tuple.iter() {
                offset += a * stride;
                stride *= size;
            }
            cells[offset] = true;
        }
        Relation::new(Tensor::from_vec(&shape, cells)?)
    }

    /// Related tuples, in storage order
    pub fn tuples(&self) -> Vec<Vec<usize>> {
        self.tensor.tuples()
    }
}

impl<E: Clone + Debug + PartialEq> Relation<E> {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// All tuples related
    pub fn full<D: BooleanDomain<Elem = E>>(d: &D, size: usize, arity: usize) -> Self {
        Self {
            tensor: Tensor::constant(&vec![size; arity], d.truth()),
        }
    }

    /// No tuple related
    pub fn empty<D: BooleanDomain<Elem = E>>(d: &D, size: usize, arity: usize) -> Self {
        Self {
            tensor: Tensor::constant(&vec![size; arity], d.falsity()),
        }
    }

    /// The equality relation
    pub fn equal<D: BooleanDomain<Elem = E>>(d: &D, size: usize) -> Self {
        Self::binary(d, size, |i, j| i == j)
    }

    /// The strict natural order `i < j`
    pub fn less_than<D: BooleanDomain<Elem = E>>(d: &D, size: usize) -> Self {
        Self::binary(d, size, |i, j| i < j)
    }

    /// The natural order `i ≤ j`
    pub fn less_or_equal<D: BooleanDomain<Elem = E>>(d: &D, size: usize) -> Self {
        Self::binary(d, size, |i, j| i <= j)
    }

    fn binary<D: BooleanDomain<Elem = E>>(d: &D, size: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        Self {
            tensor: Tensor::generate(&[size, size], |i| d.constant(f(i[0], i[1]))),
        }
    }

    /// Embed a concrete relation as constants of the domain
    pub fn lift<D: BooleanDomain<Elem = E>>(d: &D, relation: &Relation<bool>) -> Self {
        Self {
            tensor: relation.tensor.map(|&b| d.constant(b)),
        }
    }

    // ========================================================================
    // Boolean combinations
    // ========================================================================

    pub fn intersect<D: BooleanDomain<Elem = E>>(&self, d: &mut D, other: &Self) -> Result<Self> {
        let tensor = self.tensor.map2(&other.tensor, |a, b| d.and(a, b))?;
        Ok(Self { tensor })
    }

    pub fn union<D: BooleanDomain<Elem = E>>(&self, d: &mut D, other: &Self) -> Result<Self> {
        let tensor = self.tensor.map2(&other.tensor, |a, b| d.or(a, b))?;
        Ok(Self { tensor })
    }

    /// Symmetric difference
    pub fn symmdiff<D: BooleanDomain<Elem = E>>(&self, d: &mut D, other: &Self) -> Result<Self> {
        let tensor = self.tensor.map2(&other.tensor, |a, b| d.xor(a, b))?;
        Ok(Self { tensor })
    }

    pub fn complement<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Self {
        Self {
            tensor: self.tensor.map(|a| d.not(a)),
        }
    }

    // ========================================================================
    // Coordinate manipulation
    // ========================================================================

    /// Reverse the order of coordinates (the converse of a binary relation)
    pub fn revert(&self) -> Result<Self> {
        let n = self.arity();
        let perm: Vec<usize> = (0..n).map(|i| n - 1 - i).collect();
        Ok(Self {
            tensor: self.tensor.permute(&perm)?,
        })
    }

    /// Cycle coordinates: `(x₁, ..., xₙ₋₁, x₀)` is related iff
    /// `(x₀, ..., xₙ₋₁)` was.
    pub fn rotate(&self) -> Result<Self> {
        let n = self.arity();
        let perm: Vec<usize> = (0..n).map(|i| (i + n - 1) % n).collect();
        Ok(Self {
            tensor: self.tensor.permute(&perm)?,
        })
    }

    /// Swap the first two coordinates
    fn swap(&self) -> Result<Self> {
        let n = self.arity();
        let perm: Vec<usize> = (0..n)
            .map(|i| match i {
                0 => 1,
                1 => 0,
                i => i,
            })
            .collect();
        Ok(Self {
            tensor: self.tensor.permute(&perm)?,
        })
    }

    /// Existential projection onto the given coordinates, in the given order.
    pub fn project<D: BooleanDomain<Elem = E>>(&self, d: &mut D, coords: &[usize]) -> Result<Self> {
        if coords.is_empty() {
            return Err(Error::arity(1, 0));
        }
        let vars = names(0, self.arity())?;
        let mut result = String::with_capacity(coords.len());
        for &c in coords {
            let var = vars
                .chars()
                .nth(c)
                .ok_or_else(|| Error::arity(self.arity(), c + 1))?;
            result.push(var);
        }
        let mut contract = Contract::logical(d);
        contract.add(&self.tensor, &vars)?;
        Relation::new(contract.get(&result)?)
    }

    /// Relational composition: join the last coordinate of `self` with the
    /// first coordinate of `other` and project it away.
    pub fn compose<D: BooleanDomain<Elem = E>>(&self, d: &mut D, other: &Self) -> Result<Self> {
        let mut contract = Contract::logical(d);
        self.join_into(&mut contract, other)
    }

    /// Like [`Relation::compose`], counting witnesses modulo 2.
    pub fn multiply<D: BooleanDomain<Elem = E>>(&self, d: &mut D, other: &Self) -> Result<Self> {
        let mut contract = Contract::linear(d);
        self.join_into(&mut contract, other)
    }

    fn join_into<S>(&self, contract: &mut Contract<S>, other: &Self) -> Result<Self>
    where
        S: Semiring<Elem = E>,
    {
        let (a, b) = (self.arity(), other.arity());
        if a + b < 3 {
            return Err(Error::arity(3, a + b));
        }
        let outer = names(0, a + b - 2)?;
        let middle = names(a + b - 2, 1)?;
        let left = format!("{}{}", &outer[..a - 1], middle);
        let right = format!("{}{}", middle, &outer[a - 1..]);
        contract.add(&self.tensor, &left)?;
        contract.add(&other.tensor, &right)?;
        Relation::new(contract.get(&outer)?)
    }

    /// Elements `x` with `(x, ..., x)` related, as a unary relation
    pub fn diagonal(&self) -> Result<Self> {
        Ok(Self {
            tensor: self.tensor.reshape(&[self.size()], &vec![0; self.arity()])?,
        })
    }

    /// Direct product: `((a₀,b₀), ...)` is related iff `(a₀, ...)` is related
    /// in `self` and `(b₀, ...)` in `other`. Pairs are numbered `a·|B| + b`.
    pub fn product<D: BooleanDomain<Elem = E>>(&self, d: &mut D, other: &Self) -> Result<Self> {
        other.require_arity(self.arity())?;
        let (sa, sb) = (self.size(), other.size());
        let mut left = vec![0; self.arity()];
        let mut right = vec![0; self.arity()];
        let tensor = Tensor::generate(&vec![sa * sb; self.arity()], |index| {
            for (k, &i) in index.iter().enumerate() {
                left[k] = i / sb;
                right[k] = i % sb;
            }
            d.and(self.tensor.get(&left), other.tensor.get(&right))
        });
        Ok(Self { tensor })
    }

    /// Direct power with `k` factors
    pub fn power<D: BooleanDomain<Elem = E>>(&self, d: &mut D, k: usize) -> Result<Self> {
        let mut result = Self::full(d, 1, self.arity());
        for _ in 0..k {
            result = result.product(d, self)?;
        }
        Ok(result)
    }

    // ========================================================================
    // Closures
    // ========================================================================

    pub fn reflexive_closure<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<Self> {
        self.require_arity(2)?;
        let equal = Self::equal(d, self.size());
        self.union(d, &equal)
    }

    pub fn symmetric_closure<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<Self> {
        self.require_arity(2)?;
        self.union(d, &self.revert()?)
    }

    /// Least transitive relation containing `self`.
    ///
    /// Iterates `R ← R ∪ R∘R`; each round doubles the path length covered,
    /// so ⌈log₂ n⌉ rounds suffice. Stops early once `R` no longer changes.
    pub fn transitive_closure<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<Self> {
        self.require_arity(2)?;
        let mut closure = self.clone();
        let mut reach = 1;
        while reach < self.size() {
            let step = closure.compose(d, &closure)?;
            let next = closure.union(d, &step)?;
            if next == closure {
                break;
            }
            closure = next;
            reach *= 2;
        }
        Ok(closure)
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    pub fn is_full<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> E {
        d.all(self.tensor.elems())
    }

    pub fn is_empty<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> E {
        let any = d.any(self.tensor.elems());
        d.not(&any)
    }

    /// The number of related tuples is odd
    pub fn is_odd_card<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> E {
        d.sum(self.tensor.elems())
    }

    pub fn is_subset_of<D: BooleanDomain<Elem = E>>(&self, d: &mut D, other: &Self) -> Result<E> {
        let implied = self.tensor.map2(&other.tensor, |a, b| d.leq(a, b))?;
        Ok(d.all(implied.elems()))
    }

    pub fn is_equal_to<D: BooleanDomain<Elem = E>>(&self, d: &mut D, other: &Self) -> Result<E> {
        let same = self.tensor.map2(&other.tensor, |a, b| d.equ(a, b))?;
        Ok(d.all(same.elems()))
    }

    /// Each choice of the trailing coordinates has exactly one related first
    /// coordinate, i.e. the relation is the graph of a function whose value
    /// sits at coordinate 0.
    pub fn is_function<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> E {
        let unique = self.tensor.fold(1, |xs| d.one(xs));
        d.all(unique.elems())
    }

    /// Every constant tuple `(x, ..., x)` is related
    pub fn is_reflexive<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        Ok(d.all(self.diagonal()?.tensor.elems()))
    }

    /// Invariant under every permutation of coordinates
    pub fn is_symmetric<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        if self.arity() < 2 {
            return Ok(d.truth());
        }
        let swapped = self.is_subset_of(d, &self.swap()?)?;
        let rotated = self.is_subset_of(d, &self.rotate()?)?;
        Ok(d.and(&swapped, &rotated))
    }

    pub fn is_transitive<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        self.require_arity(2)?;
        self.compose(d, self)?.is_subset_of(d, self)
    }

    pub fn is_antisymmetric<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        self.require_arity(2)?;
        let both = self.intersect(d, &self.revert()?)?;
        let equal = Self::equal(d, self.size());
        both.is_subset_of(d, &equal)
    }

    /// Any two elements are comparable: `x R y`, `y R x` or `x = y`
    pub fn is_trichotome<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        self.require_arity(2)?;
        let either = self.union(d, &self.revert()?)?;
        let equal = Self::equal(d, self.size());
        let all = either.union(d, &equal)?;
        Ok(all.is_full(d))
    }

    pub fn is_equivalence<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        let refl = self.is_reflexive(d)?;
        let sym = self.is_symmetric(d)?;
        let trans = self.is_transitive(d)?;
        Ok(d.all(&[refl, sym, trans]))
    }

    pub fn is_partial_order<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        let refl = self.is_reflexive(d)?;
        let anti = self.is_antisymmetric(d)?;
        let trans = self.is_transitive(d)?;
        Ok(d.all(&[refl, anti, trans]))
    }

    pub fn is_total_order<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        let partial = self.is_partial_order(d)?;
        let total = self.is_trichotome(d)?;
        Ok(d.and(&partial, &total))
    }

    /// The relation is not an intersection of relations of smaller arity.
    ///
    /// Equivalently, some unrelated tuple becomes related after changing any
    /// single one of its coordinates suitably.
    pub fn is_essential<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        let n = self.arity();
        let vars = names(0, n)?;
        let mut witness = self.complement(d);
        for i in 0..n {
            // Tuples that some value at coordinate i makes related
            let others: String = vars.chars().enumerate().filter(|&(k, _)| k != i).map(|(_, c)| c).collect();
            let mut contract = Contract::logical(d);
            contract.add(&self.tensor, &vars)?;
            let shadow = contract.get(&others)?;
            let axis_map: Vec<usize> = (0..n).filter(|&k| k != i).collect();
            let cylinder = shadow.reshape(&self.shape(), &axis_map)?;
            witness = Self {
                tensor: witness.tensor.map2(&cylinder, |a, b| d.and(a, b))?,
            };
        }
        Ok(d.any(witness.tensor.elems()))
    }
}
