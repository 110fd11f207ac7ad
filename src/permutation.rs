//! Permutations as unary operations.

use std::fmt::Debug;

use crate::contract::Contract;
use crate::domain::{BooleanDomain, Bools};
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::relation::Relation;
use crate::tensor::Tensor;

/// A unary operation expected to be a bijection.
///
/// The graph `P[y, x]` holds iff the permutation maps `x` to `y`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Permutation<E> {
    op: Operation<E>,
}

impl<E> Permutation<E> {
    pub fn new(op: Operation<E>) -> Result<Self> {
        if op.arity() != 1 {
            return Err(Error::arity(1, op.arity()));
        }
        Ok(Self { op })
    }

    pub fn as_operation(&self) -> &Operation<E> {
        &self.op
    }

    pub fn tensor(&self) -> &Tensor<E> {
        self.op.tensor()
    }

    pub fn size(&self) -> usize {
        self.op.size()
    }
}

impl Permutation<bool> {
    /// Permutation sending `x` to `images[x]`
    pub fn from_images(images: &[usize]) -> Result<Self> {
        let size = images.len();
        let mut seen = vec![false; size];
        for &y in images {
            if y >= size || std::mem::replace(&mut seen[y], true) {
                return Err(Error::Invalid {
                    kind: "permutation",
                    reason: format!("{:?} is not a bijection of 0..{}", images, size),
                });
            }
        }
        Ok(Self {
            op: Operation::from_fn(size, 1, |x| images[x[0]]),
        })
    }

    /// Wrap a concrete graph, rejecting anything but a bijection
    pub fn from_bool(tensor: Tensor<bool>) -> Result<Self> {
        let perm = Self::new(Operation::new(tensor)?)?;
        if !perm.is_permutation(&mut Bools)? {
            return Err(Error::Invalid {
                kind: "permutation",
                reason: "graph is not a bijection".to_string(),
            });
        }
        Ok(perm)
    }

    /// `images()[x]` is the image of `x`; `None` unless every element has
    /// exactly one image.
    pub fn images(&self) -> Option<Vec<usize>> {
        (0..self.size()).map(|x| self.op.value(&[x])).collect()
    }
}

impl<E: Clone + Debug + PartialEq> Permutation<E> {
    pub fn identity<D: BooleanDomain<Elem = E>>(d: &D, size: usize) -> Self {
        Self {
            op: Operation::wrap(Relation::equal(d, size).into_tensor()),
        }
    }

    /// Functional and surjective; on a finite set that is bijective
    pub fn is_permutation<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        let functional = self.op.is_operation(d);
        let onto = self.op.is_surjective(d)?;
        Ok(d.and(&functional, &onto))
    }

    pub fn invert(&self) -> Result<Self> {
        Ok(Self {
            op: Operation::new(self.op.as_relation().revert()?.into_tensor())?,
        })
    }

    /// `(self ∘ other)(x) = self(other(x))`
    pub fn compose<D: BooleanDomain<Elem = E>>(&self, d: &mut D, other: &Self) -> Result<Self> {
        Ok(Self {
            op: self.op.compose(d, &other.op)?,
        })
    }

    /// Odd number of inversions: pairs `i < j` with `p(j) < p(i)`.
    pub fn is_odd<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        let less = Relation::less_than(d, self.size());
        let mut contract = Contract::linear(d);
        contract.add(less.tensor(), "ij")?;
        contract.add(self.tensor(), "xi")?;
        contract.add(self.tensor(), "yj")?;
        contract.add(less.tensor(), "yx")?;
        contract.get("")?.into_scalar()
    }

    pub fn is_even<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        let odd = self.is_odd(d)?;
        Ok(d.not(&odd))
    }
}
