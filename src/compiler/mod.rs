//! This module contains the compiler implementation.
//! Note that these modules are public for documentation visiblility,
//! But should never be used outside of the module by `common`.
//!
//! Each step in the compiler pipeline turns one datatype into another.
//! loosely, starting with `Source` (string + path):
//!
//! 1. Tokens:       `lex.rs`
//! 2. Abstract ST:  `parse.rs`
//! 3. Bytecode:     `gen.rs`
//!
//! Every step either yields its whole output or a single `Error`;
//! nothing downstream runs after a failure.

use std::rc::Rc;

use crate::common::{chunk::Module, source::Source};

pub mod ast;
pub mod error;
pub mod gen;
pub mod lex;
pub mod parse;
pub mod token;

use crate::compiler::{ast::Node, error::Error, token::Tokens};

/// Lexes a source into tokens, ending with `End`.
pub fn lex(source: Rc<Source>) -> Result<Tokens, Error> {
    lex::Lexer::lex(source)
}

/// Lexes and parses a source into a `Root` node.
pub fn parse(source: Rc<Source>) -> Result<Node, Error> {
    let tokens = lex(Rc::clone(&source))?;
    parse::Parser::parse(source, tokens)
}

/// Runs the whole pipeline, producing a `Module` named `main`.
pub fn gen(source: Rc<Source>) -> Result<Module, Error> {
    let root = parse(source)?;
    gen::Compiler::generate(&root)
}
