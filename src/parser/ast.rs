//! Syntax tree for one Jack class
//!
//! The parser produces this tree in a single pass over the tokens; the code
//! generator walks it afterwards.

use std::fmt;

use super::lexer::{Keyword, Symbol};

/// `'class' name '{' classVarDec* subroutineDec* '}'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    pub name: String,
    pub vars: Vec<ClassVarDec>,
    pub subroutines: Vec<Subroutine>,
}

/// Storage of a class-level variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassVarKind {
    Static,
    Field,
}

/// `('static'|'field') type name (',' name)* ';'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassVarDec {
    pub kind: ClassVarKind,
    pub ty: Type,
    pub names: Vec<String>,
}

/// Declared type of a variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Char,
    Boolean,
    Class(String),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Char => f.write_str("char"),
            Type::Boolean => f.write_str("boolean"),
            Type::Class(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    Void,
    Type(Type),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub ty: Type,
    pub name: String,
}

/// `'var' type name (',' name)* ';'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDec {
    pub ty: Type,
    pub names: Vec<String>,
}

/// Constructor, function or method declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subroutine {
    pub kind: SubroutineKind,
    pub return_type: ReturnType,
    pub name: String,
    pub params: Vec<Parameter>,
    pub locals: Vec<VarDec>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `let name ([index])? = value;`
    Let {
        target: String,
        index: Option<Expression>,
        value: Expression,
    },
    If {
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    Do(SubroutineCall),
    Return(Option<Expression>),
}

/// `term (op term)*`, evaluated left to right without precedence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub first: Term,
    pub rest: Vec<(BinaryOp, Term)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    IntegerConstant(u16),
    StringConstant(String),
    Keyword(KeywordConstant),
    Variable(String),
    ArrayAccess {
        name: String,
        index: Box<Expression>,
    },
    Call(SubroutineCall),
    Parenthesized(Box<Expression>),
    Unary(UnaryOp, Box<Term>),
}

/// `name(args)` or `receiver.name(args)`; the receiver is either a variable
/// or a class name, which only the symbol tables can tell apart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubroutineCall {
    pub receiver: Option<String>,
    pub name: String,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordConstant {
    True,
    False,
    Null,
    This,
}

impl KeywordConstant {
    pub fn keyword(self) -> Keyword {
        match self {
            KeywordConstant::True => Keyword::True,
            KeywordConstant::False => Keyword::False,
            KeywordConstant::Null => Keyword::Null,
            KeywordConstant::This => Keyword::This,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn from_symbol(symbol: Symbol) -> Option<UnaryOp> {
        match symbol {
            Symbol::Minus => Some(UnaryOp::Neg),
            Symbol::Tilde => Some(UnaryOp::Not),
            _ => None,
        }
    }

    pub fn symbol(self) -> Symbol {
        match self {
            UnaryOp::Neg => Symbol::Minus,
            UnaryOp::Not => Symbol::Tilde,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Lt,
    Gt,
    Eq,
}

impl BinaryOp {
    pub fn from_symbol(symbol: Symbol) -> Option<BinaryOp> {
        let op = match symbol {
            Symbol::Plus => BinaryOp::Add,
            Symbol::Minus => BinaryOp::Sub,
            Symbol::Star => BinaryOp::Mul,
            Symbol::Slash => BinaryOp::Div,
            Symbol::Amp => BinaryOp::And,
            Symbol::Pipe => BinaryOp::Or,
            Symbol::Lt => BinaryOp::Lt,
            Symbol::Gt => BinaryOp::Gt,
            Symbol::Eq => BinaryOp::Eq,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> Symbol {
        match self {
            BinaryOp::Add => Symbol::Plus,
            BinaryOp::Sub => Symbol::Minus,
            BinaryOp::Mul => Symbol::Star,
            BinaryOp::Div => Symbol::Slash,
            BinaryOp::And => Symbol::Amp,
            BinaryOp::Or => Symbol::Pipe,
            BinaryOp::Lt => Symbol::Lt,
            BinaryOp::Gt => Symbol::Gt,
            BinaryOp::Eq => Symbol::Eq,
        }
    }
}
