//! qasmc - identifier resolution for OpenQASM 3
//!
//! Usage: qasmc [OPTIONS] <input>

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::Context as _;
use clap::Parser as ClapParser;
use qasm_compiler::common::{DiagnosticReporter, DEFAULT_MAX_ERRORS};
use qasm_compiler::driver::Pipeline;
use qasm_compiler::frontend::FrontendConfig;
use qasm_compiler::logging;
use qasm_compiler::sema::SessionConfig;
use tracing::info;

#[derive(ClapParser, Debug)]
#[command(name = "qasmc")]
#[command(version)]
#[command(about = "Resolve the identifiers of an OpenQASM 3 program", long_about = None)]
struct Args {
    /// Input source file (.qasm or .inc)
    #[arg(required = true)]
    input: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Dump tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,

    /// Dump the symbol table after analysis
    #[arg(long)]
    dump_symbols: bool,

    /// Dump the context tree after analysis
    #[arg(long)]
    dump_contexts: bool,

    /// Stop after this many errors
    #[arg(long, default_value_t = DEFAULT_MAX_ERRORS)]
    max_errors: u32,

    /// Reject declarations that shadow a binding of an enclosing block
    #[arg(long)]
    no_redeclaration: bool,

    /// Treat h, cx, ccx, cnot and u as builtin gates
    #[arg(long)]
    openqasm2: bool,
}

fn main() {
    let args = Args::parse();
    logging::init_tracing(args.verbose);

    match run(&args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Analyze the input file. Returns false when errors were reported.
fn run(args: &Args) -> anyhow::Result<bool> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let filename = args.input.display().to_string();

    let mut reporter = DiagnosticReporter::new();
    let file_id = reporter.add_file(&filename, &source);

    let config = FrontendConfig {
        dump_tokens: args.dump_tokens,
        dump_symbols: args.dump_symbols,
        dump_contexts: args.dump_contexts,
        verbose: args.verbose,
        session: SessionConfig {
            allow_redeclaration: !args.no_redeclaration,
            max_errors: args.max_errors,
            openqasm2_gates: args.openqasm2,
        },
    };

    info!(input = %filename, "analyzing");
    let pipeline = Pipeline::new();
    let mut analysis = pipeline
        .analyze_source(&source, &filename, None, &config, &reporter, file_id)
        .with_context(|| format!("analysis of {} failed", filename))?;

    if let Some(tokens) = &analysis.tokens {
        println!("=== Tokens ===");
        print!("{}", tokens);
        println!("=== End Tokens ===\n");
    }
    if config.dump_contexts {
        println!("=== Contexts ===");
        println!("{}", analysis.session.dump_contexts());
        println!("=== End Contexts ===\n");
    }
    if config.dump_symbols {
        println!("=== Symbols ===");
        println!("{}", analysis.session.dump_symbols());
        println!("=== End Symbols ===\n");
    }

    let summary = pipeline.report(&mut analysis, &reporter, file_id);
    info!(
        errors = summary.errors,
        warnings = summary.warnings,
        internal = summary.internal,
        "done"
    );
    Ok(!summary.failed())
}
