//! Jack front end
//!
//! Single-pass recursive-descent parser producing a syntax tree per class.

pub mod ast;
pub mod grammar;
pub mod lexer;
pub mod xml;

// Re-exports
pub use ast::Class;
pub use grammar::{Parser, parse};
pub use lexer::{Lexer, SpannedToken, Token, tokenize, tokens_to_xml};
pub use xml::class_to_xml;
