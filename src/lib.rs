//! # Winter
//! This repository contains the compiler front half of the Winter
//! Programming Language: a lexer, a precedence-climbing parser,
//! and a generator lowering function declarations to stack-machine bytecode.
//! Running that bytecode is up to an executor, which lives elsewhere.
//!
//! ## Embedding Winter in Rust
//! Add winter to your `Cargo.toml`:
//! ```toml
//! winter = "0.1"
//! ```
//! Then simply:
//! ```
//! let module = winter::compile("func main() { return 1 + 2 * 3; }").unwrap();
//! let main = module.chunk("main").unwrap();
//! assert_eq!(main.len(), 6);
//! ```
//!
//! ## Overview of the compilation process
//! Within the compiler pipeline, source code is represented as a `Source` object
//! (the text plus the path it came from).
//! The `Lexer` turns it into `Tokens`, each just a kind plus an offset and
//! a length into the source. The `Parser` builds a tree of `Node`s from those,
//! and the `Compiler` walks the tree, producing one `Chunk` per function,
//! all collected into a `Module`.
//! Each stage reports failure through `compiler::error::Error`,
//! which renders the offending source lines when displayed.
//!
//! The crate logs through the `log` facade but never installs a logger.

pub mod common;
pub mod compiler;

pub use common::{chunk::Module, source::Source};
pub use compiler::error::Error;

/// Compiles a string of source code into a `Module` named `main`.
/// The source is named `./source` in any reported error.
pub fn compile(source: &str) -> Result<Module, Error> {
    compiler::gen(Source::source(source))
}
