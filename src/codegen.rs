//! Code generator
//!
//! Walks the syntax tree of one class and emits VM instructions. Symbol
//! tables are filled as declarations are reached: the class table once per
//! class, the subroutine table afresh for every subroutine. The if/while label
//! counters live for the whole class so labels never repeat within one output
//! file.

use std::io::Write;

use log::debug;
use snafu::{OptionExt, ResultExt};

use crate::error::{EmitSnafu, Result, TooManySnafu, UndefinedSymbolSnafu};
use crate::parser::ast::{
    BinaryOp, Class, ClassVarDec, ClassVarKind, Expression, KeywordConstant, Statement,
    Subroutine, SubroutineCall, SubroutineKind, Term, UnaryOp,
};
use crate::symbol_table::{Entry, Kind, SymbolTable};
use crate::vm::{Command, Segment, VmWriter};

/// Per-class compilation state
pub struct CodeGen<W: Write> {
    class_name: String,
    class_table: SymbolTable,
    subroutine_table: SymbolTable,
    if_count: usize,
    while_count: usize,
    writer: VmWriter<W>,
}

impl<W: Write> CodeGen<W> {
    pub fn new(sink: W) -> Self {
        CodeGen {
            class_name: String::new(),
            class_table: SymbolTable::new(),
            subroutine_table: SymbolTable::new(),
            if_count: 0,
            while_count: 0,
            writer: VmWriter::new(sink),
        }
    }

    /// Class-scope table (statics and fields)
    pub fn class_table(&self) -> &SymbolTable {
        &self.class_table
    }

    /// Subroutine-scope table of the most recently compiled subroutine
    pub fn subroutine_table(&self) -> &SymbolTable {
        &self.subroutine_table
    }

    /// Flush the output and return the sink
    pub fn finish(self) -> Result<W> {
        self.writer.close().context(EmitSnafu)
    }

    /// Emit every subroutine of `class`.
    ///
    /// All per-class state is reset first, so one generator can compile several
    /// classes in a row into the same sink.
    pub fn compile_class(&mut self, class: &Class) -> Result<()> {
        debug!("compiling class {}", class.name);
        self.class_name = class.name.clone();
        self.class_table.reset();
        self.subroutine_table.reset();
        self.if_count = 0;
        self.while_count = 0;

        for dec in &class.vars {
            self.compile_class_var_dec(dec)?;
        }
        for subroutine in &class.subroutines {
            self.compile_subroutine(subroutine)?;
        }
        Ok(())
    }

    fn compile_class_var_dec(&mut self, dec: &ClassVarDec) -> Result<()> {
        let kind = match dec.kind {
            ClassVarKind::Static => Kind::Static,
            ClassVarKind::Field => Kind::Field,
        };
        let ty = dec.ty.to_string();
        for name in &dec.names {
            self.class_table.define(name, &ty, kind)?;
        }
        Ok(())
    }

    fn compile_subroutine(&mut self, subroutine: &Subroutine) -> Result<()> {
        debug!("compiling {}.{}", self.class_name, subroutine.name);
        self.subroutine_table.reset();

        if subroutine.kind == SubroutineKind::Method {
            self.subroutine_table
                .define("this", &self.class_name, Kind::Argument)?;
        }
        for param in &subroutine.params {
            self.subroutine_table
                .define(&param.name, &param.ty.to_string(), Kind::Argument)?;
        }
        for dec in &subroutine.locals {
            let ty = dec.ty.to_string();
            for name in &dec.names {
                self.subroutine_table.define(name, &ty, Kind::Local)?;
            }
        }

        let name = format!("{}.{}", self.class_name, subroutine.name);
        let n_locals = self.subroutine_table.var_count(Kind::Local);
        self.writer
            .write_function(&name, n_locals)
            .context(EmitSnafu)?;

        match subroutine.kind {
            SubroutineKind::Constructor => {
                let n_fields = self.class_table.var_count(Kind::Field);
                self.push(Segment::Constant, n_fields)?;
                self.call("Memory.alloc", 1)?;
                self.pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Method => {
                self.push(Segment::Argument, 0)?;
                self.pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Function => {}
        }

        self.compile_statements(&subroutine.body)
    }

    fn compile_statements(&mut self, statements: &[Statement]) -> Result<()> {
        for statement in statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    fn compile_statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Let {
                target,
                index: None,
                value,
            } => {
                let (segment, index) = self.resolve_variable(target)?;
                self.compile_expression(value)?;
                self.pop(segment, index)
            }
            Statement::Let {
                target,
                index: Some(offset),
                value,
            } => {
                // The right-hand side may index another array and clobber
                // pointer 1, so the target address waits on the stack.
                self.compile_element_address(target, offset)?;
                self.compile_expression(value)?;
                self.pop(Segment::Temp, 0)?;
                self.pop(Segment::Pointer, 1)?;
                self.push(Segment::Temp, 0)?;
                self.pop(Segment::That, 0)
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.compile_expression(condition)?;
                self.if_count += 1;
                let else_label = format!("ELSE{}", self.if_count);
                let end_label = format!("ENDIF{}", self.if_count);
                log::trace!("allocated {else_label}/{end_label}");

                self.arithmetic(Command::Not)?;
                self.writer.write_if(&else_label).context(EmitSnafu)?;
                self.compile_statements(then_branch)?;
                self.writer.write_goto(&end_label).context(EmitSnafu)?;
                self.writer.write_label(&else_label).context(EmitSnafu)?;
                if let Some(else_branch) = else_branch {
                    self.compile_statements(else_branch)?;
                }
                self.writer.write_label(&end_label).context(EmitSnafu)
            }
            Statement::While { condition, body } => {
                self.while_count += 1;
                let top_label = format!("WHILE{}", self.while_count);
                let end_label = format!("ENDWHILE{}", self.while_count);
                log::trace!("allocated {top_label}/{end_label}");

                self.writer.write_label(&top_label).context(EmitSnafu)?;
                self.compile_expression(condition)?;
                self.arithmetic(Command::Not)?;
                self.writer.write_if(&end_label).context(EmitSnafu)?;
                self.compile_statements(body)?;
                self.writer.write_goto(&top_label).context(EmitSnafu)?;
                self.writer.write_label(&end_label).context(EmitSnafu)
            }
            Statement::Do(call) => {
                self.compile_call(call)?;
                self.pop(Segment::Temp, 0)
            }
            Statement::Return(value) => {
                match value {
                    Some(value) => self.compile_expression(value)?,
                    // void subroutines still hand the caller one value to pop
                    None => self.push(Segment::Constant, 0)?,
                }
                self.writer.write_return().context(EmitSnafu)
            }
        }
    }

    fn compile_expression(&mut self, expression: &Expression) -> Result<()> {
        self.compile_term(&expression.first)?;
        for (op, term) in &expression.rest {
            self.compile_term(term)?;
            self.compile_binary_op(*op)?;
        }
        Ok(())
    }

    fn compile_binary_op(&mut self, op: BinaryOp) -> Result<()> {
        let command = match op {
            BinaryOp::Add => Command::Add,
            BinaryOp::Sub => Command::Sub,
            BinaryOp::And => Command::And,
            BinaryOp::Or => Command::Or,
            BinaryOp::Lt => Command::Lt,
            BinaryOp::Gt => Command::Gt,
            BinaryOp::Eq => Command::Eq,
            BinaryOp::Mul => return self.call("Math.multiply", 2),
            BinaryOp::Div => return self.call("Math.divide", 2),
        };
        self.arithmetic(command)
    }

    fn compile_term(&mut self, term: &Term) -> Result<()> {
        match term {
            Term::IntegerConstant(n) => self.push(Segment::Constant, *n),
            Term::StringConstant(s) => {
                self.push(Segment::Constant, s.chars().count() as u16)?;
                self.call("String.new", 1)?;
                for c in s.chars() {
                    self.push(Segment::Constant, c as u16)?;
                    self.call("String.appendChar", 2)?;
                }
                Ok(())
            }
            Term::Keyword(KeywordConstant::True) => {
                self.push(Segment::Constant, 1)?;
                self.arithmetic(Command::Neg)
            }
            Term::Keyword(KeywordConstant::False | KeywordConstant::Null) => {
                self.push(Segment::Constant, 0)
            }
            Term::Keyword(KeywordConstant::This) => self.push(Segment::Pointer, 0),
            Term::Variable(name) => {
                let (segment, index) = self.resolve_variable(name)?;
                self.push(segment, index)
            }
            Term::ArrayAccess { name, index } => {
                self.compile_element_address(name, index)?;
                self.pop(Segment::Pointer, 1)?;
                self.push(Segment::That, 0)
            }
            Term::Call(call) => self.compile_call(call),
            Term::Parenthesized(inner) => self.compile_expression(inner),
            Term::Unary(op, operand) => {
                self.compile_term(operand)?;
                self.arithmetic(match op {
                    UnaryOp::Neg => Command::Neg,
                    UnaryOp::Not => Command::Not,
                })
            }
        }
    }

    /// Leave `base + offset` on the stack
    fn compile_element_address(&mut self, base: &str, offset: &Expression) -> Result<()> {
        let (segment, index) = self.resolve_variable(base)?;
        self.push(segment, index)?;
        self.compile_expression(offset)?;
        self.arithmetic(Command::Add)
    }

    fn compile_call(&mut self, call: &SubroutineCall) -> Result<()> {
        let target = match call.receiver.as_deref() {
            None => {
                let n_args = argument_count(call.args.len(), 1)?;
                self.push(Segment::Pointer, 0)?;
                self.compile_arguments(&call.args)?;
                return self.call(&format!("{}.{}", self.class_name, call.name), n_args);
            }
            Some(receiver) => self.lookup(receiver).cloned().ok_or(receiver),
        };

        match target {
            Ok(Entry { ty, kind, index }) => {
                let n_args = argument_count(call.args.len(), 1)?;
                self.push(kind.segment(), index)?;
                self.compile_arguments(&call.args)?;
                self.call(&format!("{}.{}", ty, call.name), n_args)
            }
            // Not a variable in scope: a function or constructor of another class
            Err(class_name) => {
                let n_args = argument_count(call.args.len(), 0)?;
                self.compile_arguments(&call.args)?;
                self.call(&format!("{}.{}", class_name, call.name), n_args)
            }
        }
    }

    fn compile_arguments(&mut self, args: &[Expression]) -> Result<()> {
        for arg in args {
            self.compile_expression(arg)?;
        }
        Ok(())
    }

    /// Innermost scope wins
    fn lookup(&self, name: &str) -> Option<&Entry> {
        self.subroutine_table
            .get(name)
            .or_else(|| self.class_table.get(name))
    }

    fn resolve_variable(&self, name: &str) -> Result<(Segment, u16)> {
        match self.lookup(name) {
            Some(entry) => Ok((entry.kind.segment(), entry.index)),
            None => UndefinedSymbolSnafu { name }.fail(),
        }
    }

    fn push(&mut self, segment: Segment, index: u16) -> Result<()> {
        self.writer.write_push(segment, index).context(EmitSnafu)
    }

    fn pop(&mut self, segment: Segment, index: u16) -> Result<()> {
        self.writer.write_pop(segment, index).context(EmitSnafu)
    }

    fn arithmetic(&mut self, command: Command) -> Result<()> {
        self.writer.write_arithmetic(command).context(EmitSnafu)
    }

    fn call(&mut self, name: &str, n_args: u16) -> Result<()> {
        self.writer.write_call(name, n_args).context(EmitSnafu)
    }
}

/// Operand of a `call` line: explicit arguments plus the implicit receiver
fn argument_count(explicit: usize, receiver: u16) -> Result<u16> {
    u16::try_from(explicit)
        .ok()
        .and_then(|n| n.checked_add(receiver))
        .context(TooManySnafu {
            what: "call arguments",
            limit: u16::MAX,
        })
}
