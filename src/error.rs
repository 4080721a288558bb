//! Compiler errors
//!
//! Every failure in the pipeline is fatal for the class being compiled. The
//! variants keep enough context (line, expected construct, offending text) to
//! produce a one-line diagnostic.

use std::path::PathBuf;

use snafu::Snafu;

/// Result alias used across the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Compilation error
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// Unrecognised character, bad literal or unterminated comment
    #[snafu(display("line {line}: {message}"))]
    Lex { line: usize, message: String },

    /// The token stream does not match the grammar
    #[snafu(display("line {line}: expected {expected}, found `{found}`"))]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },

    /// The token stream ended inside a production
    #[snafu(display("unexpected end of input, expected {expected}"))]
    UnexpectedEof { expected: String },

    /// A name was declared twice in the same scope
    #[snafu(display("`{name}` is already defined in this scope"))]
    DuplicateSymbol { name: String },

    /// Lookup of a name that no table knows
    #[snafu(display("`{name}` is not defined"))]
    UndefinedSymbol { name: String },

    /// A count that must fit a VM instruction operand does not
    #[snafu(display("too many {what} (at most {limit})"))]
    TooMany { what: String, limit: u16 },

    /// Expressions or statement blocks nested past the parser's depth limit
    #[snafu(display("line {line}: nesting deeper than {limit} levels"))]
    NestingTooDeep { line: usize, limit: usize },

    /// A storage kind that is not static, field, argument or local
    #[snafu(display("invalid storage kind `{kind}`"))]
    InvalidKind { kind: String },

    /// Writing VM instructions to the output sink failed
    #[snafu(display("failed to emit VM code: {source}"))]
    Emit { source: std::io::Error },

    /// Reading a source file or writing an output artifact failed
    #[snafu(display("{}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
