//! jackc - a Jack to VM code compiler
//!
//! Translates one Jack class per source file into text instructions for the
//! Hack stack virtual machine.
//!
//! # Pipeline
//! - `parser::lexer` turns source text into classified tokens
//! - `parser::grammar` parses the tokens into a syntax tree in one pass
//! - `parser::xml` renders the tree as XML for inspection
//! - `codegen` walks the tree, resolving names through two `symbol_table`
//!   scopes, and streams instructions through a `vm::VmWriter`
//!
//! # Example
//! ```
//! let vm = jackc::compile_source(
//!     "class Main { function void main() { do Output.printInt(1 + 2); return; } }",
//! )
//! .unwrap();
//! assert!(vm.starts_with("function Main.main 0\n"));
//! ```

use std::io::Write;

pub mod codegen;
pub mod driver;
pub mod error;
pub mod parser;
pub mod symbol_table;
pub mod vm;

// Re-export main types
pub use codegen::CodeGen;
pub use error::{Error, Result};
pub use symbol_table::{Kind, SymbolTable};

/// Compile one class and write its VM code to `sink`
pub fn compile_to<W: Write>(source: &str, sink: W) -> Result<W> {
    let class = parser::parse(source)?;
    #[cfg(feature = "dump")]
    log::debug!("{:#?}", class);

    let mut codegen = CodeGen::new(sink);
    codegen.compile_class(&class)?;
    codegen.finish()
}

/// Compile one class and return its VM code
pub fn compile_source(source: &str) -> Result<String> {
    let bytes = compile_to(source, Vec::new())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Lex `source` and render the token stream as XML
pub fn tokenize_source(source: &str) -> Result<String> {
    let tokens = parser::tokenize(source)?;
    Ok(parser::tokens_to_xml(&tokens))
}

/// Parse one class and render its parse tree as XML
pub fn parse_tree_source(source: &str) -> Result<String> {
    let class = parser::parse(source)?;
    Ok(parser::class_to_xml(&class))
}
