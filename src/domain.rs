//! Tagless final interface for boolean algebra.
//!
//! Predicates over relations and operations are written once against
//! [`BooleanDomain`] and can then be run by different interpreters:
//!
//! - **Bools**: plain truth values, evaluating the predicate directly
//! - **Instance** (see `cnf`): SAT literals, compiling the predicate to CNF
//!
//! Both interpreters must describe the same logical formula: evaluating a
//! predicate with `Bools` on concrete tensors gives `true` exactly when the
//! CNF compiled by `Instance` for the corresponding literal tensors is
//! satisfiable with those cells fixed.
//!
//! # Example
//!
//! ```
//! use relsat::domain::{BooleanDomain, Bools};
//!
//! fn implies_twice<D: BooleanDomain>(d: &mut D, a: &D::Elem, b: &D::Elem) -> D::Elem {
//!     let ab = d.leq(a, b);
//!     let ba = d.leq(b, a);
//!     d.and(&ab, &ba)
//! }
//!
//! assert!(implies_twice(&mut Bools, &true, &true));
//! assert!(!implies_twice(&mut Bools, &true, &false));
//! ```

use std::fmt::Debug;

use crate::error::{Error, Result};

/// A boolean algebra over an element type.
///
/// Only `truth`, `falsity`, `not`, `or` and `xor` are primitive; everything
/// else is derived, so an interpreter only has to supply those. Operations
/// take `&mut self` because symbolic interpreters grow a formula as they go.
pub trait BooleanDomain {
    /// Element type: truth values, literals, ...
    type Elem: Clone + Debug + PartialEq;

    /// The constant TRUE
    fn truth(&self) -> Self::Elem;

    /// The constant FALSE
    fn falsity(&self) -> Self::Elem;

    fn not(&mut self, a: &Self::Elem) -> Self::Elem;

    fn or(&mut self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;

    /// Exclusive or (addition modulo 2)
    fn xor(&mut self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;

    // ========================================================================
    // Derived operations
    // ========================================================================

    /// Lift a truth value into the domain
    fn constant(&self, value: bool) -> Self::Elem {
        if value {
            self.truth()
        } else {
            self.falsity()
        }
    }

    fn and(&mut self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem {
        let na = self.not(a);
        let nb = self.not(b);
        let either = self.or(&na, &nb);
        self.not(&either)
    }

    /// Implication `a → b`
    fn leq(&mut self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem {
        let na = self.not(a);
        self.or(&na, b)
    }

    /// Equivalence `a ↔ b`
    fn equ(&mut self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem {
        let x = self.xor(a, b);
        self.not(&x)
    }

    /// Conjunction of all elements (TRUE for an empty slice)
    fn all(&mut self, elems: &[Self::Elem]) -> Self::Elem {
        let mut acc = self.truth();
        for e in elems {
            acc = self.and(&acc, e);
        }
        acc
    }

    /// Disjunction of all elements (FALSE for an empty slice)
    fn any(&mut self, elems: &[Self::Elem]) -> Self::Elem {
        let mut acc = self.falsity();
        for e in elems {
            acc = self.or(&acc, e);
        }
        acc
    }

    /// Parity of all elements
    fn sum(&mut self, elems: &[Self::Elem]) -> Self::Elem {
        let mut acc = self.falsity();
        for e in elems {
            acc = self.xor(&acc, e);
        }
        acc
    }

    /// Exactly one element is true.
    ///
    /// Single left-to-right pass keeping "some element was true" and "two
    /// elements were true", so a symbolic interpreter needs a linear number
    /// of auxiliary variables.
    fn one(&mut self, elems: &[Self::Elem]) -> Self::Elem {
        let mut seen = self.falsity();
        let mut twice = self.falsity();
        for e in elems {
            let both = self.and(&seen, e);
            twice = self.or(&twice, &both);
            seen = self.or(&seen, e);
        }
        let ok = self.not(&twice);
        self.and(&seen, &ok)
    }

    /// Lexicographic `a < b`, index 0 being the most significant digit.
    fn lex_less(&mut self, a: &[Self::Elem], b: &[Self::Elem]) -> Result<Self::Elem> {
        if a.len() != b.len() {
            return Err(Error::arity(a.len(), b.len()));
        }
        let mut less = self.falsity();
        let mut equal = self.truth();
        for (x, y) in a.iter().zip(b) {
            let nx = self.not(x);
            let digit_less = self.and(&nx, y);
            let here = self.and(&equal, &digit_less);
            less = self.or(&less, &here);
            let same = self.equ(x, y);
            equal = self.and(&equal, &same);
        }
        Ok(less)
    }

    /// Lexicographic `a ≤ b`
    fn lex_leq(&mut self, a: &[Self::Elem], b: &[Self::Elem]) -> Result<Self::Elem> {
        let greater = self.lex_less(b, a)?;
        Ok(self.not(&greater))
    }
}

// ============================================================================
// Plain truth values
// ============================================================================

/// Direct evaluation over `bool`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bools;

impl BooleanDomain for Bools {
    type Elem = bool;

    #[inline]
    fn truth(&self) -> bool {
        true
    }

    #[inline]
    fn falsity(&self) -> bool {
        false
    }

    #[inline]
    fn not(&mut self, a: &bool) -> bool {
        !*a
    }

    #[inline]
    fn or(&mut self, a: &bool, b: &bool) -> bool {
        *a || *b
    }

    #[inline]
    fn xor(&mut self, a: &bool, b: &bool) -> bool {
        *a ^ *b
    }

    #[inline]
    fn and(&mut self, a: &bool, b: &bool) -> bool {
        *a && *b
    }

    fn all(&mut self, elems: &[bool]) -> bool {
        elems.iter().all(|&e| e)
    }

    fn any(&mut self, elems: &[bool]) -> bool {
        elems.iter().any(|&e| e)
    }

    fn one(&mut self, elems: &[bool]) -> bool {
        elems.iter().filter(|&&e| e).count() == 1
    }
}
