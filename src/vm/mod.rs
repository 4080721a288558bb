//! Stack-machine target
//!
//! Instruction vocabulary and the text emitter consumed by the downstream
//! VM translator.

pub mod opcode;
pub mod writer;

pub use opcode::{Command, Segment};
pub use writer::VmWriter;
