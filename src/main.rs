// ABOUTME: CLI entry point running the loop eliminator over a source file

use clap::{Parser, ValueEnum};
use loopfold::config::{self, Options, SAMPLE_PROGRAM};
use loopfold::{dump_c, dump_python, transform_source, CStyle};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    Python,
    C,
}

/// Symbolic loop eliminator: rewrites counting loops into closed-form
/// guarded increments
#[derive(Parser, Debug)]
#[command(name = "loopfold")]
#[command(version = config::VERSION)]
#[command(about = "Rewrites counting loops into closed-form guarded increments")]
struct CliArgs {
    /// Program to transform (built-in sample when omitted)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Output surface syntax
    #[arg(long, value_enum, default_value = "python")]
    emit: Target,

    /// Load transform options from a JSON file
    #[arg(long, value_name = "JSON")]
    options: Option<PathBuf>,

    /// Integer type prefixed to C assignments
    #[arg(long = "int-type", value_name = "TYPE", default_value = "long long")]
    integer_type: String,

    /// Brace single-statement bodies in C output
    #[arg(long)]
    force_braces: bool,

    /// Put the opening brace on the `if` line in C output
    #[arg(long)]
    brace_same_line: bool,

    /// Skip common-subexpression extraction
    #[arg(long = "no-cse")]
    no_cse: bool,

    /// Skip sibling increment and guard merging
    #[arg(long = "no-merge")]
    no_merge: bool,

    /// Leave residual max/min unsplit
    #[arg(long = "no-split")]
    no_split: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let source = match &args.script {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE_PROGRAM.to_string(),
    };

    let mut options: Options = match &args.options {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => Options::default(),
    };
    if args.no_cse {
        options.extract_common_subexpressions = false;
    }
    if args.no_merge {
        options.merge_sibling_increments = false;
        options.conjoin_sibling_ifs = false;
    }
    if args.no_split {
        options.split_residual_extrema = false;
    }

    let block = transform_source(&source, &options)?;
    let output = match args.emit {
        Target::Python => dump_python(&block),
        Target::C => dump_c(
            &block,
            &CStyle {
                integer_type: args.integer_type.clone(),
                force_braces: args.force_braces,
                brace_on_same_line: args.brace_same_line,
            },
        ),
    };
    print!("{}", output);
    Ok(())
}
