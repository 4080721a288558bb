//! VM instruction emitter
//!
//! Serialises one instruction per line into an output sink, in call order.

use std::io::{self, Write};

use super::opcode::{Command, Segment};

/// Line-oriented writer of VM instructions
pub struct VmWriter<W: Write> {
    sink: W,
}

impl<W: Write> VmWriter<W> {
    pub fn new(sink: W) -> Self {
        VmWriter { sink }
    }

    /// `push segment index`
    pub fn write_push(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        writeln!(self.sink, "push {} {}", segment, index)
    }

    /// `pop segment index`
    pub fn write_pop(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        writeln!(self.sink, "pop {} {}", segment, index)
    }

    pub fn write_arithmetic(&mut self, command: Command) -> io::Result<()> {
        writeln!(self.sink, "{}", command)
    }

    pub fn write_label(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.sink, "label {}", label)
    }

    pub fn write_goto(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.sink, "goto {}", label)
    }

    /// `if-goto label`: jump when the popped value is not false
    pub fn write_if(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.sink, "if-goto {}", label)
    }

    /// `call Class.name n_args`
    pub fn write_call(&mut self, name: &str, n_args: u16) -> io::Result<()> {
        writeln!(self.sink, "call {} {}", name, n_args)
    }

    /// `function Class.name n_locals`
    pub fn write_function(&mut self, name: &str, n_locals: u16) -> io::Result<()> {
        writeln!(self.sink, "function {} {}", name, n_locals)
    }

    pub fn write_return(&mut self) -> io::Result<()> {
        writeln!(self.sink, "return")
    }

    /// Flush and hand back the sink
    pub fn close(mut self) -> io::Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}
