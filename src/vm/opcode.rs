//! VM instruction vocabulary
//!
//! The target is a stack machine with eight memory segments and nine
//! operand-less arithmetic/logical commands. Each type renders as the exact
//! text the VM translator expects.

use std::fmt;

/// Memory segments addressable by `push`/`pop`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Read-only pseudo segment holding the index itself
    Constant,
    Argument,
    Local,
    Static,
    /// Fields of the current object, based at `pointer 0`
    This,
    /// Array cells, based at `pointer 1`
    That,
    /// `pointer 0` is THIS, `pointer 1` is THAT
    Pointer,
    /// Eight scratch registers
    Temp,
}

impl Segment {
    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arithmetic and logical commands: pop operands, push one result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// x + y
    Add,
    /// x - y
    Sub,
    /// -y
    Neg,
    /// x == y
    Eq,
    /// x > y
    Gt,
    /// x < y
    Lt,
    /// bitwise x & y
    And,
    /// bitwise x | y
    Or,
    /// bitwise !y
    Not,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Add => "add",
            Command::Sub => "sub",
            Command::Neg => "neg",
            Command::Eq => "eq",
            Command::Gt => "gt",
            Command::Lt => "lt",
            Command::And => "and",
            Command::Or => "or",
            Command::Not => "not",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_names() {
        assert_eq!(Segment::Constant.to_string(), "constant");
        assert_eq!(Segment::This.to_string(), "this");
        assert_eq!(Segment::Pointer.to_string(), "pointer");
    }

    #[test]
    fn test_command_names() {
        assert_eq!(Command::Add.to_string(), "add");
        assert_eq!(Command::Not.to_string(), "not");
        assert_eq!(Command::Lt.to_string(), "lt");
    }
}
