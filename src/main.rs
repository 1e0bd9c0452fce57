use std::path::PathBuf;

use winter::{
    compiler::{gen::Compiler, lex::Lexer, parse::Parser},
    Source,
};

/// Dumps every stage of the pipeline for a single file.
pub fn main() {
    // get the path and load the file
    let path = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("Usage: winter <path>");
            std::process::exit(2);
        },
    };

    let source = match Source::path(&path) {
        Ok(source) => source,
        Err(_) => {
            eprintln!("Error: File could not be read");
            std::process::exit(1);
        },
    };

    let result = Lexer::lex(source.clone()).and_then(|tokens| {
        println!("-- tokens --");
        for token in tokens.iter() {
            println!("{}", token);
        }

        let root = Parser::parse(source.clone(), tokens)?;
        println!("-- syntax tree --\n{}", root);

        Compiler::generate(&root)
    });

    // report any errors
    match result {
        Ok(module) => print!("{}", module),
        Err(error) => {
            eprintln!("{}", error);
            std::process::exit(1);
        },
    }
}
