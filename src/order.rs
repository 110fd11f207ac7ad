//! Partial orders as binary relations.

use std::fmt::Debug;

use crate::domain::{BooleanDomain, Bools};
use crate::error::{Error, Result};
use crate::relation::Relation;
use crate::tensor::Tensor;

/// A binary relation expected to be reflexive, antisymmetric and transitive
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PartialOrder<E> {
    relation: Relation<E>,
}

impl<E> PartialOrder<E> {
    pub fn new(relation: Relation<E>) -> Result<Self> {
        if relation.arity() != 2 {
            return Err(Error::arity(2, relation.arity()));
        }
        Ok(Self { relation })
    }

    pub fn as_relation(&self) -> &Relation<E> {
        &self.relation
    }

    pub fn into_relation(self) -> Relation<E> {
        self.relation
    }

    pub fn size(&self) -> usize {
        self.relation.size()
    }
}

impl PartialOrder<bool> {
    /// Wrap a concrete relation, rejecting anything but a partial order
    pub fn from_bool(tensor: Tensor<bool>) -> Result<Self> {
        let order = Self::new(Relation::new(tensor)?)?;
        if !order.is_partial_order(&mut Bools)? {
            return Err(Error::Invalid {
                kind: "partial order",
                reason: "relation is not reflexive, antisymmetric and transitive".to_string(),
            });
        }
        Ok(order)
    }
}

impl<E: Clone + Debug + PartialEq> PartialOrder<E> {
    /// `0 ≤ 1 ≤ ... ≤ size-1`
    pub fn chain<D: BooleanDomain<Elem = E>>(d: &D, size: usize) -> Self {
        Self {
            relation: Relation::less_or_equal(d, size),
        }
    }

    /// Only `x ≤ x`
    pub fn antichain<D: BooleanDomain<Elem = E>>(d: &D, size: usize) -> Self {
        Self {
            relation: Relation::equal(d, size),
        }
    }

    pub fn is_partial_order<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        self.relation.is_partial_order(d)
    }

    pub fn is_total_order<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<E> {
        self.relation.is_total_order(d)
    }

    /// The opposite order
    pub fn invert(&self) -> Result<Self> {
        Ok(Self {
            relation: self.relation.revert()?,
        })
    }

    pub fn intersect<D: BooleanDomain<Elem = E>>(&self, d: &mut D, other: &Self) -> Result<Self> {
        Ok(Self {
            relation: self.relation.intersect(d, &other.relation)?,
        })
    }

    /// `x < y`: related and distinct
    pub fn strict<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<Relation<E>> {
        let distinct = Relation::equal(d, self.size()).complement(d);
        self.relation.intersect(d, &distinct)
    }

    /// Covering pairs: `x < y` with nothing strictly between
    pub fn covers<D: BooleanDomain<Elem = E>>(&self, d: &mut D) -> Result<Relation<E>> {
        let strict = self.strict(d)?;
        let between = strict.compose(d, &strict)?;
        let direct = between.complement(d);
        strict.intersect(d, &direct)
    }
}
