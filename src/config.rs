//! Solver configuration.
//!
//! Backends are named by short strings so they can come from the command
//! line or the environment:
//!
//! | spec                        | backend                                   |
//! |-----------------------------|-------------------------------------------|
//! | `batsat`                    | in-process [`Batsat`]                     |
//! | `minisat` / `minisat:PROG`  | [`DimacsProcess`] with a result file      |
//! | `dimacs:PROG [ARGS...]`     | [`DimacsProcess`] reading stdout          |

use std::fmt;
use std::str::FromStr;

use crate::backend::{Batsat, DimacsProcess, OutputStyle, SatBackend};
use crate::error::{Error, Result};
use crate::problem::Solver;

/// Environment variable naming the backend
pub const BACKEND_ENV: &str = "RELSAT_BACKEND";
/// Environment variable capping enumeration
pub const MAX_SOLUTIONS_ENV: &str = "RELSAT_MAX_SOLUTIONS";

/// Which SAT backend to build
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendSpec {
    #[default]
    Batsat,
    Minisat { program: String },
    Dimacs { program: String, args: Vec<String> },
}

impl BackendSpec {
    pub fn build(&self) -> Box<dyn SatBackend> {
        match self {
            BackendSpec::Batsat => Box::new(Batsat::new()),
            BackendSpec::Minisat { program } => Box::new(DimacsProcess::minisat(program.clone())),
            BackendSpec::Dimacs { program, args } => {
                Box::new(DimacsProcess::new(program.clone(), args.clone(), OutputStyle::Stdout))
            }
        }
    }
}

impl FromStr for BackendSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (kind, rest) = match s.split_once(':') {
            Some((kind, rest)) => (kind, Some(rest.trim())),
            None => (s, None),
        };
        match (kind, rest) {
            ("batsat", None) => Ok(BackendSpec::Batsat),
            ("minisat", None) => Ok(BackendSpec::Minisat {
                program: "minisat".to_string(),
            }),
            ("minisat", Some(program)) if !program.is_empty() => Ok(BackendSpec::Minisat {
                program: program.to_string(),
            }),
            ("dimacs", Some(command)) => {
                let mut words = command.split_whitespace().map(str::to_string);
                let program = words
                    .next()
                    .ok_or_else(|| Error::Config("dimacs backend needs a program".to_string()))?;
                Ok(BackendSpec::Dimacs {
                    program,
                    args: words.collect(),
                })
            }
            _ => Err(Error::Config(format!("unknown backend '{}'", s))),
        }
    }
}

impl fmt::Display for BackendSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendSpec::Batsat => write!(f, "batsat"),
            BackendSpec::Minisat { program } => write!(f, "minisat:{}", program),
            BackendSpec::Dimacs { program, args } => {
                write!(f, "dimacs:{}", program)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
        }
    }
}

/// Settings shared by every solve
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    pub backend: BackendSpec,
    /// Re-evaluate every decoded model with plain booleans
    pub self_check: bool,
    /// Stop enumeration after this many solutions
    pub max_solutions: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: BackendSpec::Batsat,
            self_check: true,
            max_solutions: None,
        }
    }
}

impl SolverConfig {
    /// Defaults overridden by `RELSAT_BACKEND` and `RELSAT_MAX_SOLUTIONS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`SolverConfig::from_env`] with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(backend) = lookup(BACKEND_ENV) {
            config.backend = backend.parse()?;
        }
        if let Some(max) = lookup(MAX_SOLUTIONS_ENV) {
            let max = max
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{} must be a count, got '{}'", MAX_SOLUTIONS_ENV, max)))?;
            config.max_solutions = Some(max);
        }
        Ok(config)
    }

    pub fn build(&self) -> Solver<Box<dyn SatBackend>> {
        Solver::with_config(self.backend.build(), self.clone())
    }
}
