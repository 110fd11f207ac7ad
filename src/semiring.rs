//! Commutative semirings driving contraction.
//!
//! A semiring (S, ⊕, ⊗, 0, 1) provides:
//! - Additive commutative monoid (S, ⊕, 0), used to sum indices out
//! - Multiplicative monoid (S, ⊗, 1), used to join entries pointwise
//! - Multiplication distributes over addition
//!
//! Contraction results do not depend on the order in which indices are
//! summed out or entries joined exactly when these laws hold.
//!
//! Over a [`BooleanDomain`] two semirings matter:
//! - **Logical** (⊕ = OR, ⊗ = AND): relational composition and projection
//! - **Linear** (⊕ = XOR, ⊗ = AND): parity of the number of witnesses

use crate::domain::BooleanDomain;

/// A commutative semiring over `Elem`.
///
/// Methods take `&mut self` so symbolic domains can record gates.
pub trait Semiring {
    type Elem: Clone;

    fn zero(&mut self) -> Self::Elem;

    fn one(&mut self) -> Self::Elem;

    /// Semiring addition (⊕)
    fn add(&mut self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;

    /// Semiring multiplication (⊗)
    fn mul(&mut self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;

    /// ⊕ over a slice
    fn sum(&mut self, elems: &[Self::Elem]) -> Self::Elem {
        let mut acc = self.zero();
        for e in elems {
            acc = self.add(&acc, e);
        }
        acc
    }
}

// ============================================================================
// Boolean semirings
// ============================================================================

/// (OR, AND) over a boolean domain
#[derive(Debug)]
pub struct Logical<'d, D> {
    pub domain: &'d mut D,
}

impl<'d, D: BooleanDomain> Logical<'d, D> {
    pub fn new(domain: &'d mut D) -> Self {
        Self { domain }
    }
}

impl<D: BooleanDomain> Semiring for Logical<'_, D> {
    type Elem = D::Elem;

    #[inline]
    fn zero(&mut self) -> D::Elem {
        self.domain.falsity()
    }

    #[inline]
    fn one(&mut self) -> D::Elem {
        self.domain.truth()
    }

    #[inline]
    fn add(&mut self, a: &D::Elem, b: &D::Elem) -> D::Elem {
        self.domain.or(a, b)
    }

    #[inline]
    fn mul(&mut self, a: &D::Elem, b: &D::Elem) -> D::Elem {
        self.domain.and(a, b)
    }

    fn sum(&mut self, elems: &[D::Elem]) -> D::Elem {
        self.domain.any(elems)
    }
}

/// (XOR, AND) over a boolean domain: the field with two elements
#[derive(Debug)]
pub struct Linear<'d, D> {
    pub domain: &'d mut D,
}

impl<'d, D: BooleanDomain> Linear<'d, D> {
    pub fn new(domain: &'d mut D) -> Self {
        Self { domain }
    }
}

impl<D: BooleanDomain> Semiring for Linear<'_, D> {
    type Elem = D::Elem;

    #[inline]
    fn zero(&mut self) -> D::Elem {
        self.domain.falsity()
    }

    #[inline]
    fn one(&mut self) -> D::Elem {
        self.domain.truth()
    }

    #[inline]
    fn add(&mut self, a: &D::Elem, b: &D::Elem) -> D::Elem {
        self.domain.xor(a, b)
    }

    #[inline]
    fn mul(&mut self, a: &D::Elem, b: &D::Elem) -> D::Elem {
        self.domain.and(a, b)
    }

    fn sum(&mut self, elems: &[D::Elem]) -> D::Elem {
        self.domain.sum(elems)
    }
}

// ============================================================================
// Counting semiring
// ============================================================================

/// Ordinary integer arithmetic (+, ×); counts witnesses instead of
/// testing for them.
#[derive(Clone, Copy, Debug, Default)]
pub struct Counting;

impl Semiring for Counting {
    type Elem = i64;

    fn zero(&mut self) -> i64 {
        0
    }

    fn one(&mut self) -> i64 {
        1
    }

    fn add(&mut self, a: &i64, b: &i64) -> i64 {
        a + b
    }

    fn mul(&mut self, a: &i64, b: &i64) -> i64 {
        a * b
    }

    fn sum(&mut self, elems: &[i64]) -> i64 {
        elems.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bools;

    #[test]
    fn test_logical_and_linear_sums() {
        let mut d = Bools;
        let xs = [true, true, false];
        assert!(Logical::new(&mut d).sum(&xs));
        assert!(!Linear::new(&mut d).sum(&xs));
        assert!(!Logical::new(&mut d).sum(&[]));
        assert!(Linear::new(&mut d).one());
    }

    #[test]
    fn test_distributivity_over_bools() {
        let mut d = Bools;
        for bits in 0..8u8 {
            let (a, b, c) = (bits & 1 == 1, bits & 2 == 2, bits & 4 == 4);
            let mut lin = Linear::new(&mut d);
            let bc = lin.add(&b, &c);
            let lhs = lin.mul(&a, &bc);
            let ab = lin.mul(&a, &b);
            let ac = lin.mul(&a, &c);
            assert_eq!(lhs, lin.add(&ab, &ac));
        }
    }

    #[test]
    fn test_counting() {
        let mut s = Counting;
        assert_eq!(s.sum(&[1, 2, 3]), 6);
        assert_eq!(s.mul(&3, &4), 12);
    }
}
