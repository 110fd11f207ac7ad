//! CNF construction: the literal interpreter of [`BooleanDomain`].
//!
//! An [`Instance`] owns a growing CNF formula. Evaluating a predicate with
//! it does not compute a truth value; it returns a [`Literal`] that is
//! equivalent (under the recorded clauses) to the predicate.
//!
//! Compound sub-expressions get one fresh variable each (Tseitin encoding),
//! memoized by operator and operand pair so repeated sub-expressions share a
//! variable. Memo tables live as long as the instance and no longer.
//!
//! Variable 1 is reserved as a pseudo-variable forced true, so the
//! constants are ordinary literals: `TRUE = +1`, `FALSE = -1`.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::domain::BooleanDomain;
use crate::tensor::Tensor;

// ============================================================================
// LITERALS AND CLAUSES
// ============================================================================

/// A possibly negated SAT variable, in DIMACS convention (never zero).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal(i32);

impl Literal {
    pub const TRUE: Literal = Literal(1);
    pub const FALSE: Literal = Literal(-1);

    /// Build from a DIMACS integer.
    ///
    /// # Panics
    /// Panics on zero, which DIMACS reserves as clause terminator.
    pub fn from_dimacs(value: i32) -> Self {
        assert!(value != 0, "literal 0 is not a variable");
        Literal(value)
    }

    pub fn dimacs(self) -> i32 {
        self.0
    }

    /// Variable index (1-based)
    pub fn var(self) -> u32 {
        self.0.unsigned_abs()
    }

    pub fn is_negated(self) -> bool {
        self.0 < 0
    }

    pub fn is_constant(self) -> bool {
        self.var() == 1
    }
}

impl std::ops::Neg for Literal {
    type Output = Literal;

    fn neg(self) -> Literal {
        Literal(-self.0)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Literal::TRUE => write!(f, "TRUE"),
            Literal::FALSE => write!(f, "FALSE"),
            Literal(v) => write!(f, "{}", v),
        }
    }
}

/// A CNF formula in DIMACS shape
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cnf {
    pub num_vars: u32,
    pub clauses: Vec<Vec<Literal>>,
}

impl Cnf {
    /// Render as DIMACS text
    pub fn to_dimacs(&self) -> String {
        let mut out = format!("p cnf {} {}\n", self.num_vars, self.clauses.len());
        for clause in &self.clauses {
            for lit in clause {
                out.push_str(&lit.dimacs().to_string());
                out.push(' ');
            }
            out.push_str("0\n");
        }
        out
    }
}

/// A model returned by a SAT backend, indexed by variable id
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<bool>,
}

impl Assignment {
    /// `values[v]` is the value of variable `v`; index 0 is ignored.
    pub fn new(values: Vec<bool>) -> Self {
        Self { values }
    }

    /// Build from the literals a solver reported true or false.
    pub fn from_literals(num_vars: u32, lits: impl IntoIterator<Item = Literal>) -> Self {
        let mut values = vec![false; num_vars as usize + 1];
        for lit in lits {
            if let Some(slot) = values.get_mut(lit.var() as usize) {
                *slot = !lit.is_negated();
            }
        }
        Self { values }
    }

    pub fn num_vars(&self) -> u32 {
        self.values.len().saturating_sub(1) as u32
    }

    /// Truth value of a literal.
    ///
    /// # Panics
    /// Panics if the variable lies outside the model.
    pub fn value(&self, lit: Literal) -> bool {
        if lit.is_constant() {
            return lit == Literal::TRUE;
        }
        self.values[lit.var() as usize] != lit.is_negated()
    }
}

/// Map each literal of a tensor to its truth value under a model.
pub fn decode(assignment: &Assignment, tensor: &Tensor<Literal>) -> Tensor<bool> {
    tensor.map(|&lit| assignment.value(lit))
}

// ============================================================================
// INSTANCE
// ============================================================================

/// Counters describing the size of an instance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InstanceStats {
    pub variables: u32,
    pub clauses: usize,
    pub or_gates: usize,
    pub xor_gates: usize,
}

/// A CNF under construction, usable as a [`BooleanDomain`] over literals.
#[derive(Clone, Debug)]
pub struct Instance {
    cnf: Cnf,
    /// Variables occurring in at least one clause
    occurs: Vec<bool>,
    or_memo: HashMap<(Literal, Literal), Literal>,
    xor_memo: HashMap<(Literal, Literal), Literal>,
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

impl Instance {
    pub fn new() -> Self {
        let mut instance = Self {
            cnf: Cnf::default(),
            occurs: vec![false],
            or_memo: HashMap::new(),
            xor_memo: HashMap::new(),
        };
        let truth = instance.fresh();
        debug_assert_eq!(truth, Literal::TRUE);
        instance.add_clause(vec![Literal::TRUE]);
        instance
    }

    /// Mint a fresh, unconstrained variable
    pub fn fresh(&mut self) -> Literal {
        self.cnf.num_vars += 1;
        self.occurs.push(false);
        Literal(self.cnf.num_vars as i32)
    }

    /// A tensor of fresh variables, one per cell
    pub fn fresh_tensor(&mut self, shape: &[usize]) -> Tensor<Literal> {
        Tensor::generate(shape, |_| self.fresh())
    }

    /// Record a clause.
    ///
    /// # Panics
    /// Panics if the clause mentions a variable that was never minted.
    pub fn add_clause(&mut self, clause: Vec<Literal>) {
        for lit in &clause {
            let var = lit.var() as usize;
            assert!(var < self.occurs.len(), "variable {} was never minted", var);
            self.occurs[var] = true;
        }
        self.cnf.clauses.push(clause);
    }

    /// Require a literal to hold
    pub fn ensure(&mut self, lit: Literal) {
        if lit != Literal::TRUE {
            self.add_clause(vec![lit]);
        }
    }

    pub fn num_vars(&self) -> u32 {
        self.cnf.num_vars
    }

    pub fn stats(&self) -> InstanceStats {
        InstanceStats {
            variables: self.cnf.num_vars,
            clauses: self.cnf.clauses.len(),
            or_gates: self.or_memo.len(),
            xor_gates: self.xor_memo.len(),
        }
    }

    /// The formula built so far.
    ///
    /// Variables that never appeared in a clause get a tautology `v ∨ ¬v`
    /// first, so every declared variable occurs in the output.
    pub fn cnf(&mut self) -> &Cnf {
        let missing: Vec<Literal> = (1..self.occurs.len())
            .filter(|&v| !self.occurs[v])
            .map(|v| Literal(v as i32))
            .collect();
        for lit in missing {
            self.add_clause(vec![lit, -lit]);
        }
        &self.cnf
    }

    fn mint_or(&mut self, a: Literal, b: Literal) -> Literal {
        let c = self.fresh();
        trace!(%a, %b, %c, "or gate");
        self.add_clause(vec![-a, c]);
        self.add_clause(vec![-b, c]);
        self.add_clause(vec![-c, a, b]);
        c
    }

    fn mint_xor(&mut self, a: Literal, b: Literal) -> Literal {
        let c = self.fresh();
        trace!(%a, %b, %c, "xor gate");
        self.add_clause(vec![-a, -b, -c]);
        self.add_clause(vec![a, b, -c]);
        self.add_clause(vec![a, -b, c]);
        self.add_clause(vec![-a, b, c]);
        c
    }
}

fn ordered(a: Literal, b: Literal) -> (Literal, Literal) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl BooleanDomain for Instance {
    type Elem = Literal;

    fn truth(&self) -> Literal {
        Literal::TRUE
    }

    fn falsity(&self) -> Literal {
        Literal::FALSE
    }

    fn not(&mut self, a: &Literal) -> Literal {
        -*a
    }

    fn or(&mut self, a: &Literal, b: &Literal) -> Literal {
        let (a, b) = (*a, *b);
        if a == Literal::TRUE || b == Literal::TRUE || a == -b {
            return Literal::TRUE;
        }
        if a == Literal::FALSE || a == b {
            return b;
        }
        if b == Literal::FALSE {
            return a;
        }
        let key = ordered(a, b);
        if let Some(&c) = self.or_memo.get(&key) {
            return c;
        }
        let c = self.mint_or(key.0, key.1);
        self.or_memo.insert(key, c);
        c
    }

    fn xor(&mut self, a: &Literal, b: &Literal) -> Literal {
        let (a, b) = (*a, *b);
        if a == Literal::FALSE {
            return b;
        }
        if b == Literal::FALSE {
            return a;
        }
        if a == Literal::TRUE {
            return -b;
        }
        if b == Literal::TRUE {
            return -a;
        }
        if a == b {
            return Literal::FALSE;
        }
        if a == -b {
            return Literal::TRUE;
        }

        // xor(¬a, b) = ¬xor(a, b): memoize on positive operands only
        let flip = a.is_negated() != b.is_negated();
        let key = ordered(Literal(a.var() as i32), Literal(b.var() as i32));
        let c = match self.xor_memo.get(&key) {
            Some(&c) => c,
            None => {
                let c = self.mint_xor(key.0, key.1);
                self.xor_memo.insert(key, c);
                c
            }
        };
        if flip {
            -c
        } else {
            c
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Brute-force satisfiability over the instance's variables
    fn models(cnf: &Cnf) -> Vec<Assignment> {
        let n = cnf.num_vars as usize;
        let mut found = Vec::new();
        for bits in 0u32..(1 << n) {
            let mut values = vec![false];
            values.extend((0..n).map(|i| (bits >> i) & 1 == 1));
            let assignment = Assignment::new(values);
            let sat = cnf
                .clauses
                .iter()
                .all(|c| c.iter().any(|&l| assignment.values[l.var() as usize] != l.is_negated()));
            if sat {
                found.push(assignment);
            }
        }
        found
    }

    #[test]
    fn test_constants_fold_away() {
        let mut inst = Instance::new();
        let x = inst.fresh();
        assert_eq!(inst.or(&x, &Literal::TRUE), Literal::TRUE);
        assert_eq!(inst.or(&x, &Literal::FALSE), x);
        assert_eq!(inst.or(&x, &-x), Literal::TRUE);
        assert_eq!(inst.or(&x, &x), x);
        assert_eq!(inst.xor(&x, &Literal::TRUE), -x);
        assert_eq!(inst.xor(&x, &x), Literal::FALSE);
        assert_eq!(inst.and(&x, &Literal::FALSE), Literal::FALSE);
        assert_eq!(inst.stats().or_gates, 0);
        assert_eq!(inst.stats().xor_gates, 0);
    }

    #[test]
    fn test_gates_are_memoized() {
        let mut inst = Instance::new();
        let x = inst.fresh();
        let y = inst.fresh();
        let a = inst.or(&x, &y);
        let b = inst.or(&y, &x);
        assert_eq!(a, b);
        let c = inst.xor(&x, &y);
        assert_eq!(inst.xor(&-x, &y), -c);
        assert_eq!(inst.xor(&-y, &-x), c);
        assert_eq!(inst.stats().or_gates, 1);
        assert_eq!(inst.stats().xor_gates, 1);
    }

    #[test]
    fn test_gate_semantics_by_enumeration() {
        let mut inst = Instance::new();
        let x = inst.fresh();
        let y = inst.fresh();
        let or = inst.or(&x, &y);
        let and = inst.and(&x, &y);
        let xor = inst.xor(&x, &y);
        let cnf = inst.cnf().clone();
        let all = models(&cnf);
        // Gates are functionally determined by their inputs
        assert_eq!(all.len(), 4);
        for m in all {
            let (vx, vy) = (m.value(x), m.value(y));
            assert_eq!(m.value(or), vx || vy);
            assert_eq!(m.value(and), vx && vy);
            assert_eq!(m.value(xor), vx ^ vy);
        }
    }

    #[test]
    fn test_one_uses_linear_aux_variables() {
        let mut inst = Instance::new();
        let xs: Vec<Literal> = (0..20).map(|_| inst.fresh()).collect();
        let before = inst.num_vars();
        inst.one(&xs);
        assert!(inst.num_vars() - before <= 4 * 20);
    }

    #[test]
    fn test_free_variables_are_padded() {
        let mut inst = Instance::new();
        let x = inst.fresh();
        let cnf = inst.cnf();
        assert!(cnf.clauses.contains(&vec![x, -x]));
        assert!(cnf.to_dimacs().starts_with("p cnf 2 2\n1 0\n"));
    }

    #[test]
    fn test_decode() {
        let mut inst = Instance::new();
        let t = inst.fresh_tensor(&[2]);
        let model = Assignment::from_literals(3, [Literal::from_dimacs(2), Literal::from_dimacs(-3)]);
        assert_eq!(decode(&model, &t).elems(), &[true, false]);
        assert!(model.value(Literal::TRUE));
        assert!(!model.value(Literal::FALSE));
    }
}
