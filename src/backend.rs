//! SAT backends.
//!
//! A backend takes the CNF of an [`Instance`](crate::cnf::Instance) and
//! returns a model or `None` for UNSAT. Two implementations:
//!
//! - [`Batsat`]: in-process through `rustsat`, incremental. Successive
//!   calls only load the clauses appended since the previous call, so
//!   enumeration with blocking clauses never reloads the formula.
//! - [`DimacsProcess`]: writes DIMACS to a temporary directory and runs an
//!   external executable, reading back either a MiniSat-style result file
//!   or competition-style stdout.

use std::fmt;
use std::fs;
use std::process::Command;

use rustsat::solvers::{Solve, SolverResult};
use rustsat::types::{Clause, Lit, TernaryVal};
use rustsat_batsat::BasicSolver;
use tracing::{debug, warn};

use crate::cnf::{Assignment, Cnf, Literal};
use crate::error::{Error, Result};

/// Anything that can decide a CNF
pub trait SatBackend {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    /// Forget every clause loaded so far
    fn clear(&mut self);

    /// Solve `cnf`; `None` means unsatisfiable.
    ///
    /// Incremental backends expect `cnf` to extend the formula passed on
    /// the previous call. A formula with fewer clauses is [`Error::StateReuse`]
    /// unless [`SatBackend::clear`] ran in between.
    fn solve(&mut self, cnf: &Cnf) -> Result<Option<Assignment>>;
}

impl<B: SatBackend + ?Sized> SatBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn solve(&mut self, cnf: &Cnf) -> Result<Option<Assignment>> {
        (**self).solve(cnf)
    }
}

// ============================================================================
// IN-PROCESS: BATSAT
// ============================================================================

/// Incremental in-process solver
pub struct Batsat {
    solver: BasicSolver,
    loaded: usize,
}

impl Default for Batsat {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Batsat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batsat").field("loaded", &self.loaded).finish()
    }
}

impl Batsat {
    pub fn new() -> Self {
        Self {
            solver: BasicSolver::default(),
            loaded: 0,
        }
    }

    /// Number of clauses handed to the solver so far
    pub fn loaded_clauses(&self) -> usize {
        self.loaded
    }
}

fn to_lit(lit: Literal) -> Lit {
    Lit::new(lit.var() - 1, lit.is_negated())
}

impl SatBackend for Batsat {
    fn name(&self) -> &str {
        "batsat"
    }

    fn clear(&mut self) {
        self.solver = BasicSolver::default();
        self.loaded = 0;
    }

    fn solve(&mut self, cnf: &Cnf) -> Result<Option<Assignment>> {
        if cnf.clauses.len() < self.loaded {
            return Err(Error::StateReuse(
                "backend received a shorter formula than it already holds",
            ));
        }
        for clause in &cnf.clauses[self.loaded..] {
            let clause: Clause = clause.iter().map(|&lit| to_lit(lit)).collect();
            self.solver
                .add_clause(clause)
                .map_err(|e| Error::backend("batsat", e))?;
        }
        debug!(
            new = cnf.clauses.len() - self.loaded,
            total = cnf.clauses.len(),
            "loaded clauses"
        );
        self.loaded = cnf.clauses.len();

        match self.solver.solve().map_err(|e| Error::backend("batsat", e))? {
            SolverResult::Unsat => Ok(None),
            SolverResult::Sat => {
                let mut values = vec![false; cnf.num_vars as usize + 1];
                for var in 1..=cnf.num_vars {
                    let value = self
                        .solver
                        .lit_val(Lit::new(var - 1, false))
                        .unwrap_or(TernaryVal::DontCare);
                    values[var as usize] = value == TernaryVal::True;
                }
                Ok(Some(Assignment::new(values)))
            }
            SolverResult::Interrupted => Err(Error::backend("batsat", "solver was interrupted")),
        }
    }
}

// ============================================================================
// EXTERNAL PROCESS: DIMACS
// ============================================================================

/// Where an external solver reports its answer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputStyle {
    /// `program [args] input.cnf result.txt`, MiniSat result file
    ResultFile,
    /// `program [args] input.cnf`, `s`/`v` lines on stdout
    Stdout,
}

/// An external solver run once per call on a fresh DIMACS file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DimacsProcess {
    program: String,
    args: Vec<String>,
    output: OutputStyle,
}

impl DimacsProcess {
    pub fn new(program: impl Into<String>, args: Vec<String>, output: OutputStyle) -> Self {
        Self {
            program: program.into(),
            args,
            output,
        }
    }

    /// MiniSat with its default result-file protocol
    pub fn minisat(program: impl Into<String>) -> Self {
        Self::new(program, Vec::new(), OutputStyle::ResultFile)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn output_style(&self) -> OutputStyle {
        self.output
    }

    fn fail(&self, message: impl ToString) -> Error {
        Error::backend(&self.program, message)
    }
}

impl SatBackend for DimacsProcess {
    fn name(&self) -> &str {
        &self.program
    }

    // Stateless: every call writes the whole formula
    fn clear(&mut self) {}

    fn solve(&mut self, cnf: &Cnf) -> Result<Option<Assignment>> {
        let dir = tempfile::tempdir().map_err(|e| self.fail(e))?;
        let input = dir.path().join("input.cnf");
        let result = dir.path().join("result.txt");
        fs::write(&input, cnf.to_dimacs()).map_err(|e| self.fail(e))?;

        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(&input);
        if self.output == OutputStyle::ResultFile {
            command.arg(&result);
        }
        debug!(program = %self.program, vars = cnf.num_vars, clauses = cnf.clauses.len(), "running external solver");
        let out = command.output().map_err(|e| self.fail(e))?;

        // SAT competition convention: 10 = SAT, 20 = UNSAT
        match out.status.code() {
            Some(0 | 10 | 20) => {}
            code => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                return Err(self.fail(format!("exited with {:?}: {}", code, stderr.trim())));
            }
        }

        let parsed = match self.output {
            OutputStyle::ResultFile => {
                let text = fs::read_to_string(&result).map_err(|e| self.fail(e))?;
                parse_result_file(&text, cnf.num_vars)
            }
            OutputStyle::Stdout => parse_competition_output(&String::from_utf8_lossy(&out.stdout), cnf.num_vars),
        };
        parsed.map_err(|e| match e {
            Error::Backend { message, .. } => self.fail(message),
            other => other,
        })
    }
}

// ============================================================================
// OUTPUT PARSING
// ============================================================================

fn malformed(message: impl ToString) -> Error {
    Error::backend("dimacs", message)
}

/// Collect literals from whitespace-separated integers up to a terminating `0`.
///
/// Returns whether the terminator was seen.
fn read_literals<'a>(
    tokens: impl Iterator<Item = &'a str>,
    num_vars: u32,
    model: &mut Vec<Literal>,
) -> Result<bool> {
    for token in tokens {
        let value: i32 = token
            .parse()
            .map_err(|_| malformed(format!("expected a literal, found '{}'", token)))?;
        if value == 0 {
            return Ok(true);
        }
        if value.unsigned_abs() > num_vars {
            return Err(malformed(format!(
                "literal {} outside the {} declared variables",
                value, num_vars
            )));
        }
        model.push(Literal::from_dimacs(value));
    }
    Ok(false)
}

/// Parse a MiniSat result file: `SAT` and a `0`-terminated literal line, or `UNSAT`.
///
/// Variables the file does not mention are false.
pub fn parse_result_file(text: &str, num_vars: u32) -> Result<Option<Assignment>> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    match lines.next() {
        Some("UNSAT") => Ok(None),
        Some("SAT") => {
            let mut model = Vec::new();
            let terminated = read_literals(lines.flat_map(str::split_whitespace), num_vars, &mut model)?;
            if !terminated {
                warn!("result file ended without a terminating 0");
            }
            Ok(Some(Assignment::from_literals(num_vars, model)))
        }
        Some(other) => Err(malformed(format!("unexpected result '{}'", other))),
        None => Err(malformed("empty result file")),
    }
}

/// Parse competition-style output: `c` comments, one `s` status line and
/// `v` value lines ending in `0`.
pub fn parse_competition_output(text: &str, num_vars: u32) -> Result<Option<Assignment>> {
    let mut status = None;
    let mut model = Vec::new();
    let mut terminated = false;
    for line in text.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("s ") {
            if status.is_some() {
                return Err(malformed("more than one status line"));
            }
            status = Some(rest.trim());
        } else if let Some(rest) = line.strip_prefix('v') {
            if terminated {
                return Err(malformed("values after the terminating 0"));
            }
            terminated = read_literals(rest.split_whitespace(), num_vars, &mut model)?;
        }
    }
    match status {
        Some("UNSATISFIABLE") => Ok(None),
        Some("SATISFIABLE") => {
            if !terminated {
                warn!("value lines ended without a terminating 0");
            }
            Ok(Some(Assignment::from_literals(num_vars, model)))
        }
        Some(other) => Err(malformed(format!("solver answered '{}'", other))),
        None => Err(malformed("no status line")),
    }
}
