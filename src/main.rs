use std::{env, fs, path::Path};

use simplelang::bytecode::disasm::print_bc;
use simplelang::frontend::token_dumper::TokenDumper;
use simplelang::ir::format_ir;
use simplelang::{BytecodeProgram, Error, VmConfig};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let tokens_only = args.contains(&"--tokens".to_string());
    let no_color = args.contains(&"--no-color".to_string());
    let pretty = args.contains(&"--pretty".to_string());
    let ast = args.contains(&"--ast".to_string());
    let ir = args.contains(&"--ir".to_string());
    let bytecode = args.contains(&"--bc".to_string()) || args.contains(&"--bytecode".to_string());
    let trace = args.contains(&"--trace".to_string());

    // --emit-bc takes the output path as its value
    let emit_pos = args.iter().position(|a| a == "--emit-bc");
    let emit_path = match emit_pos {
        Some(pos) => match args.get(pos + 1) {
            Some(path) => Some(path.as_str()),
            None => {
                eprintln!("Error: --emit-bc needs an output path");
                std::process::exit(1);
            }
        },
        None => None,
    };

    // first non-flag argument that isn't a flag's value is the filename
    let filename = args
        .iter()
        .enumerate()
        .skip(1)
        .find(|(i, a)| !a.starts_with('-') && emit_pos.map(|p| p + 1) != Some(*i))
        .map(|(_, a)| a);

    let Some(filename) = filename else {
        print_usage();
        std::process::exit(1);
    };

    let config = VmConfig {
        trace,
        ..VmConfig::default()
    };

    match extension(filename) {
        Some("slc") => run_image(filename, bytecode, config),
        Some("sl") => {
            let source = match fs::read_to_string(filename) {
                Ok(source) => source,
                Err(e) => {
                    eprintln!("Failed to read '{}': {}", filename, e);
                    std::process::exit(1);
                }
            };

            if tokens_only {
                dump_tokens(&source, no_color, pretty);
            } else if ast {
                print_ast(&source);
            } else if ir {
                print_ir(&source);
            } else {
                run_program(&source, bytecode, emit_path, config);
            }
        }
        _ => {
            eprintln!("Error: expected a .sl or .slc file, got {}", filename);
            std::process::exit(1);
        }
    }
}

fn extension(filename: &str) -> Option<&str> {
    Path::new(filename).extension().and_then(|e| e.to_str())
}

fn print_usage() {
    println!("SimpleLang - compiler and bytecode VM");
    println!();
    println!("Usage:");
    println!("  simplelang <file.sl>                    Compile and run a program");
    println!("  simplelang <file.slc>                   Run a bytecode image");
    println!("  simplelang --tokens <file.sl>           Show tokens only (--no-color, --pretty)");
    println!("  simplelang --ast <file.sl>              Show the syntax tree");
    println!("  simplelang --ir <file.sl>               Show the three-address IR");
    println!("  simplelang --bc <file.sl>               Show the bytecode disassembly");
    println!("  simplelang --trace <file.sl>            Trace VM execution on stderr");
    println!("  simplelang --emit-bc <out.slc> <file.sl>  Write the bytecode image");
    println!("  simplelang --help, -h                   Show this help");
}

fn fail(e: Error) -> ! {
    eprintln!("{}", e);
    std::process::exit(1);
}

fn dump_tokens(source: &str, no_color: bool, pretty: bool) {
    let tokens = simplelang::tokenize(source).unwrap_or_else(|e| fail(e));

    let mut dumper = TokenDumper::new();

    if no_color {
        dumper = dumper.no_color();
    }
    if pretty {
        dumper = dumper.pretty();
    }

    dumper.dump(&tokens);
}

fn print_ast(source: &str) {
    let program = simplelang::parse(source).unwrap_or_else(|e| fail(e));
    println!("{:#?}", program);
}

fn print_ir(source: &str) {
    let instrs = simplelang::lower(source).unwrap_or_else(|e| fail(e));
    print!("{}", format_ir(&instrs));
}

fn run_program(source: &str, bytecode: bool, emit_path: Option<&str>, config: VmConfig) {
    let program = simplelang::compile(source).unwrap_or_else(|e| fail(e));

    if let Some(path) = emit_path {
        let bytes = program.to_bytes().unwrap_or_else(|e| fail(e.into()));
        if let Err(e) = fs::write(path, bytes) {
            eprintln!("Failed to write '{}': {}", path, e);
            std::process::exit(1);
        }
        return;
    }

    if bytecode {
        print_bc(&program);
        return;
    }

    execute(&program, config);
}

fn run_image(filename: &str, bytecode: bool, config: VmConfig) {
    let bytes = match fs::read(filename) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", filename, e);
            std::process::exit(1);
        }
    };

    let program = BytecodeProgram::from_bytes(&bytes).unwrap_or_else(|e| fail(e.into()));

    if bytecode {
        print_bc(&program);
        return;
    }

    execute(&program, config);
}

fn execute(program: &BytecodeProgram, config: VmConfig) {
    match simplelang::run(program, config) {
        Ok(value) => println!("{}", value),
        Err(e) => fail(e),
    }
}
