//! Parse an RBS file given on the command line and dump its AST.
//!
//! ```text
//! cargo run --example parse -- sig/my_lib.rbs
//! ```

use std::env;
use std::fs;
use std::process::ExitCode;

use rbs_parser::{Buffer, Parser};

fn main() -> ExitCode {
    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: parse <file.rbs>");
        return ExitCode::FAILURE;
    };

    let content = match fs::read(&path) {
        Ok(content) => content,
        Err(error) => {
            eprintln!("{path}: {error}");
            return ExitCode::FAILURE;
        }
    };

    let buffer = Buffer::new(&content, Default::default());
    let mut parser = Parser::new(buffer);
    match parser.parse_signature() {
        Ok(signature) => {
            println!("{signature:#?}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{path}:{error}");
            ExitCode::FAILURE
        }
    }
}
