//! Command-line driver: read a source file, translate it, write C.

use clap::Parser;
use std::path::PathBuf;

use arafura_surface_syntax::{read_python, CWriter};

#[derive(Parser)]
#[command(name = "arafura")]
#[command(about = "Translate C-as-Python source files into C", version)]
struct Cli {
    /// Input source file
    input: PathBuf,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Parse and lower, but discard the output
    #[arg(long)]
    check: bool,

    /// Print the parsed AST as JSON instead of C
    #[arg(long)]
    dump_ast: bool,
}

fn run(args: Cli) -> i32 {
    let source = match std::fs::read_to_string(&args.input) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Failed to read {}: {}", args.input.display(), err);
            return 1;
        }
    };

    let module = match read_python(&source) {
        Ok(module) => module,
        Err(err) => {
            eprintln!("{}: {}", args.input.display(), err);
            return 1;
        }
    };

    if args.dump_ast {
        let json = match serde_json::to_string_pretty(&module) {
            Ok(json) => json,
            Err(err) => {
                eprintln!("Failed to serialize AST: {}", err);
                return 1;
            }
        };
        println!("{}", json);
        return 0;
    }

    let output = match CWriter::emit(&module) {
        Ok(output) => output,
        Err(err) => {
            eprintln!("{}: {}", args.input.display(), err);
            return 1;
        }
    };

    if args.check {
        return 0;
    }

    if let Some(path) = args.output {
        if let Err(err) = std::fs::write(&path, &output) {
            eprintln!("Failed to write {}: {}", path.display(), err);
            return 1;
        }
    } else {
        print!("{}", output);
    }

    0
}

fn main() {
    std::process::exit(run(Cli::parse()));
}
