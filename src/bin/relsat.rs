//! relsat - enumerate finite structures with a SAT solver
//!
//! Usage: relsat <problem> <size> [--max N] [--backend SPEC] [--print]

use std::io;

use relsat::catalog::{format_solution, Named};
use relsat::{BackendSpec, SolverConfig};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parsed command line
struct Args {
    problem: Named,
    size: usize,
    max: Option<usize>,
    backend: Option<BackendSpec>,
    print: bool,
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!("Try 'relsat --help' for usage information");
    std::process::exit(1);
}

fn print_help() {
    println!("relsat v{} - enumerate finite structures with a SAT solver", VERSION);
    println!();
    println!("Usage: relsat <problem> <size> [OPTIONS]");
    println!();
    println!("Problems:");
    for named in Named::ALL {
        println!("  {}", named.name());
    }
    println!();
    println!("Options:");
    println!("  --max <n>          Stop after n solutions");
    println!("  --backend <spec>   batsat (default), minisat[:PROG], dimacs:PROG [ARGS]");
    println!("  --print            Print every solution");
    println!("  -h, --help         Show this help message");
    println!("  -v, --version      Show version");
    println!();
    println!("Environment:");
    println!("  RELSAT_BACKEND, RELSAT_MAX_SOLUTIONS   defaults for --backend and --max");
    println!("  RUST_LOG                               log filter, e.g. relsat=debug");
}

/// Parse command line arguments.
fn parse_args(args: &[String]) -> Args {
    let mut positional = Vec::new();
    let mut max = None;
    let mut backend = None;
    let mut print = false;
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--max" => {
                let Some(value) = args.get(i + 1) else {
                    fail("--max requires a count");
                };
                match value.parse::<usize>() {
                    Ok(n) => max = Some(n),
                    Err(_) => fail(&format!("--max expects a count, got '{}'", value)),
                }
                i += 2;
            }
            "--backend" => {
                let Some(value) = args.get(i + 1) else {
                    fail("--backend requires a spec");
                };
                match value.parse::<BackendSpec>() {
                    Ok(spec) => backend = Some(spec),
                    Err(e) => fail(&e.to_string()),
                }
                i += 2;
            }
            "--print" => {
                print = true;
                i += 1;
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                println!("relsat v{}", VERSION);
                std::process::exit(0);
            }
            _ if arg.starts_with('-') => fail(&format!("Unknown option '{}'", arg)),
            _ => {
                positional.push(arg.clone());
                i += 1;
            }
        }
    }

    let [problem, size] = positional.as_slice() else {
        fail("expected <problem> <size>");
    };
    let problem = problem.parse::<Named>().unwrap_or_else(|e| fail(&e.to_string()));
    let size = size
        .parse::<usize>()
        .unwrap_or_else(|_| fail(&format!("size must be a count, got '{}'", size)));

    Args {
        problem,
        size,
        max,
        backend,
        print,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "relsat=warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&args);

    let mut config = SolverConfig::from_env().unwrap_or_else(|e| fail(&e.to_string()));
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if args.max.is_some() {
        config.max_solutions = args.max;
    }

    let mut solver = config.build();
    match args.problem.solve_all(&mut solver, args.size, None) {
        Ok(solutions) => {
            if args.print {
                for (i, solution) in solutions.iter().enumerate() {
                    println!("#{}", i + 1);
                    print!("{}", format_solution(solution));
                }
            }
            println!("{} {} on {} elements", solutions.len(), args.problem.name(), args.size);
            if let Some(stats) = solver.last_stats() {
                eprintln!(
                    "{} variables, {} clauses ({} or, {} xor gates)",
                    stats.variables, stats.clauses, stats.or_gates, stats.xor_gates
                );
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
