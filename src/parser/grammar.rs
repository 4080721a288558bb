//! Recursive-descent parser
//!
//! Walks an index cursor over the token vector; lookahead is a peek at the
//! cursor, tokens are never copied back or re-inserted. Nesting of
//! expressions, unary operators and statement blocks is capped at
//! [`MAX_NESTING`] so hostile input fails with an error instead of exhausting
//! the stack.

use super::ast::{
    BinaryOp, Class, ClassVarDec, ClassVarKind, Expression, KeywordConstant, Parameter,
    ReturnType, Statement, Subroutine, SubroutineCall, SubroutineKind, Term, Type, UnaryOp,
    VarDec,
};
use super::lexer::{Keyword, SpannedToken, Symbol, Token, tokenize};
use crate::error::{NestingTooDeepSnafu, Result, UnexpectedEofSnafu, UnexpectedTokenSnafu};

/// Deepest accepted nesting of expressions, unary operators and blocks
pub const MAX_NESTING: usize = 256;

/// Parser state
pub struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Create a parser over an already lexed token stream
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Lex `source` and create a parser over the result
    pub fn from_source(source: &str) -> Result<Self> {
        Ok(Parser::new(tokenize(source)?))
    }

    /// Whether every token has been consumed
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Line of the current token, or of the last one at end of input
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map_or(1, |t| t.pos.line)
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return NestingTooDeepSnafu {
                line: self.line(),
                limit: MAX_NESTING,
            }
            .fail();
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Consume the current token; `expected` names the construct for the
    /// end-of-input diagnostic
    fn advance(&mut self, expected: &str) -> Result<Token> {
        match self.tokens.get(self.pos) {
            Some(t) => {
                self.pos += 1;
                Ok(t.token.clone())
            }
            None => UnexpectedEofSnafu { expected }.fail(),
        }
    }

    fn check_symbol(&self, symbol: Symbol) -> bool {
        self.peek() == Some(&Token::Symbol(symbol))
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek() == Some(&Token::Keyword(keyword))
    }

    /// Consume the current token if it is `symbol`
    fn eat_symbol(&mut self, symbol: Symbol) -> bool {
        if self.check_symbol(symbol) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, symbol: Symbol) -> Result<()> {
        if self.eat_symbol(symbol) {
            Ok(())
        } else {
            self.unexpected(format!("`{}`", symbol.as_char()))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.check_keyword(keyword) {
            self.pos += 1;
            Ok(())
        } else {
            self.unexpected(format!("`{}`", keyword.as_str()))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String> {
        if let Some(Token::Identifier(name)) = self.peek() {
            let name = name.clone();
            self.pos += 1;
            Ok(name)
        } else {
            self.unexpected(what)
        }
    }

    /// Fail with the current token (or end of input) as what was found
    fn unexpected<T>(&self, expected: impl Into<String>) -> Result<T> {
        let expected = expected.into();
        match self.tokens.get(self.pos) {
            Some(t) => UnexpectedTokenSnafu {
                line: t.pos.line,
                expected,
                found: t.token.to_string(),
            }
            .fail(),
            None => UnexpectedEofSnafu { expected }.fail(),
        }
    }

    /// `'class' name '{' classVarDec* subroutineDec* '}'`, which must be the
    /// whole input
    pub fn parse_class(&mut self) -> Result<Class> {
        self.expect_keyword(Keyword::Class)?;
        let name = self.expect_identifier("class name")?;
        self.expect_symbol(Symbol::LBrace)?;

        let mut vars = Vec::new();
        while self.check_keyword(Keyword::Static) || self.check_keyword(Keyword::Field) {
            vars.push(self.parse_class_var_dec()?);
        }

        let mut subroutines = Vec::new();
        while self.check_keyword(Keyword::Constructor)
            || self.check_keyword(Keyword::Function)
            || self.check_keyword(Keyword::Method)
        {
            subroutines.push(self.parse_subroutine()?);
        }

        self.expect_symbol(Symbol::RBrace)?;
        if !self.is_at_end() {
            return self.unexpected("end of input after class");
        }

        Ok(Class {
            name,
            vars,
            subroutines,
        })
    }

    fn parse_class_var_dec(&mut self) -> Result<ClassVarDec> {
        let kind = match self.advance("`static` or `field`")? {
            Token::Keyword(Keyword::Static) => ClassVarKind::Static,
            _ => ClassVarKind::Field,
        };
        let ty = self.parse_type()?;
        let names = self.parse_name_list()?;
        Ok(ClassVarDec { kind, ty, names })
    }

    /// `name (',' name)* ';'`
    fn parse_name_list(&mut self) -> Result<Vec<String>> {
        let mut names = vec![self.expect_identifier("variable name")?];
        while self.eat_symbol(Symbol::Comma) {
            names.push(self.expect_identifier("variable name")?);
        }
        self.expect_symbol(Symbol::Semicolon)?;
        Ok(names)
    }

    /// `'int' | 'char' | 'boolean' | className`
    fn parse_type(&mut self) -> Result<Type> {
        let ty = match self.peek() {
            Some(Token::Keyword(Keyword::Int)) => Type::Int,
            Some(Token::Keyword(Keyword::Char)) => Type::Char,
            Some(Token::Keyword(Keyword::Boolean)) => Type::Boolean,
            Some(Token::Identifier(name)) => Type::Class(name.clone()),
            _ => return self.unexpected("type"),
        };
        self.pos += 1;
        Ok(ty)
    }

    /// `('constructor'|'function'|'method') ('void'|type) name
    /// '(' parameterList ')' '{' varDec* statements '}'`
    fn parse_subroutine(&mut self) -> Result<Subroutine> {
        let kind = match self.advance("subroutine declaration")? {
            Token::Keyword(Keyword::Constructor) => SubroutineKind::Constructor,
            Token::Keyword(Keyword::Method) => SubroutineKind::Method,
            _ => SubroutineKind::Function,
        };

        let return_type = if self.check_keyword(Keyword::Void) {
            self.pos += 1;
            ReturnType::Void
        } else {
            ReturnType::Type(self.parse_type()?)
        };

        let name = self.expect_identifier("subroutine name")?;
        self.expect_symbol(Symbol::LParen)?;
        let params = self.parse_parameter_list()?;
        self.expect_symbol(Symbol::RParen)?;

        self.expect_symbol(Symbol::LBrace)?;
        let mut locals = Vec::new();
        while self.check_keyword(Keyword::Var) {
            locals.push(self.parse_var_dec()?);
        }
        let body = self.parse_statements()?;
        self.expect_symbol(Symbol::RBrace)?;

        Ok(Subroutine {
            kind,
            return_type,
            name,
            params,
            locals,
            body,
        })
    }

    /// `((type name) (',' type name)*)?`
    fn parse_parameter_list(&mut self) -> Result<Vec<Parameter>> {
        let mut params = Vec::new();
        if self.check_symbol(Symbol::RParen) {
            return Ok(params);
        }
        loop {
            let ty = self.parse_type()?;
            let name = self.expect_identifier("parameter name")?;
            params.push(Parameter { ty, name });
            if !self.eat_symbol(Symbol::Comma) {
                return Ok(params);
            }
        }
    }

    fn parse_var_dec(&mut self) -> Result<VarDec> {
        self.expect_keyword(Keyword::Var)?;
        let ty = self.parse_type()?;
        let names = self.parse_name_list()?;
        Ok(VarDec { ty, names })
    }

    /// `statement*`; stops at the first token that cannot start a statement
    pub fn parse_statements(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        while let Some(&Token::Keyword(keyword)) = self.peek() {
            let statement = match keyword {
                Keyword::Let => self.parse_let()?,
                Keyword::If => self.parse_if()?,
                Keyword::While => self.parse_while()?,
                Keyword::Do => self.parse_do()?,
                Keyword::Return => self.parse_return()?,
                _ => break,
            };
            statements.push(statement);
        }
        Ok(statements)
    }

    /// `'{' statements '}'`
    fn parse_block(&mut self) -> Result<Vec<Statement>> {
        self.expect_symbol(Symbol::LBrace)?;
        let statements = self.nested(Self::parse_statements)?;
        self.expect_symbol(Symbol::RBrace)?;
        Ok(statements)
    }

    fn parse_let(&mut self) -> Result<Statement> {
        self.expect_keyword(Keyword::Let)?;
        let target = self.expect_identifier("variable name")?;
        let index = if self.eat_symbol(Symbol::LBracket) {
            let index = self.parse_expression()?;
            self.expect_symbol(Symbol::RBracket)?;
            Some(index)
        } else {
            None
        };
        self.expect_symbol(Symbol::Eq)?;
        let value = self.parse_expression()?;
        self.expect_symbol(Symbol::Semicolon)?;
        Ok(Statement::Let {
            target,
            index,
            value,
        })
    }

    fn parse_if(&mut self) -> Result<Statement> {
        self.expect_keyword(Keyword::If)?;
        let condition = self.parse_condition()?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.check_keyword(Keyword::Else) {
            self.pos += 1;
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Statement> {
        self.expect_keyword(Keyword::While)?;
        let condition = self.parse_condition()?;
        let body = self.parse_block()?;
        Ok(Statement::While { condition, body })
    }

    /// `'(' expression ')'`
    fn parse_condition(&mut self) -> Result<Expression> {
        self.expect_symbol(Symbol::LParen)?;
        let condition = self.parse_expression()?;
        self.expect_symbol(Symbol::RParen)?;
        Ok(condition)
    }

    fn parse_do(&mut self) -> Result<Statement> {
        self.expect_keyword(Keyword::Do)?;
        let name = self.expect_identifier("subroutine call")?;
        let call = self.parse_subroutine_call(name)?;
        self.expect_symbol(Symbol::Semicolon)?;
        Ok(Statement::Do(call))
    }

    fn parse_return(&mut self) -> Result<Statement> {
        self.expect_keyword(Keyword::Return)?;
        let value = if self.check_symbol(Symbol::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_symbol(Symbol::Semicolon)?;
        Ok(Statement::Return(value))
    }

    /// `term (op term)*`
    pub fn parse_expression(&mut self) -> Result<Expression> {
        self.nested(Self::parse_operator_chain)
    }

    fn parse_operator_chain(&mut self) -> Result<Expression> {
        let first = self.parse_term()?;
        let mut rest = Vec::new();
        while let Some(&Token::Symbol(symbol)) = self.peek()
            && let Some(op) = BinaryOp::from_symbol(symbol)
        {
            self.pos += 1;
            rest.push((op, self.parse_term()?));
        }
        Ok(Expression { first, rest })
    }

    fn parse_term(&mut self) -> Result<Term> {
        let Some(token) = self.peek().cloned() else {
            return self.unexpected("term");
        };

        let term = match token {
            Token::IntegerConstant(n) => {
                self.pos += 1;
                Term::IntegerConstant(n)
            }
            Token::StringConstant(s) => {
                self.pos += 1;
                Term::StringConstant(s)
            }
            Token::Keyword(keyword) => {
                let constant = match keyword {
                    Keyword::True => KeywordConstant::True,
                    Keyword::False => KeywordConstant::False,
                    Keyword::Null => KeywordConstant::Null,
                    Keyword::This => KeywordConstant::This,
                    _ => return self.unexpected("term"),
                };
                self.pos += 1;
                Term::Keyword(constant)
            }
            Token::Symbol(Symbol::LParen) => {
                self.pos += 1;
                let inner = self.parse_expression()?;
                self.expect_symbol(Symbol::RParen)?;
                Term::Parenthesized(Box::new(inner))
            }
            Token::Symbol(symbol) => {
                let Some(op) = UnaryOp::from_symbol(symbol) else {
                    return self.unexpected("term");
                };
                self.pos += 1;
                Term::Unary(op, Box::new(self.nested(Self::parse_term)?))
            }
            Token::Identifier(name) => {
                self.pos += 1;
                if self.eat_symbol(Symbol::LBracket) {
                    let index = self.parse_expression()?;
                    self.expect_symbol(Symbol::RBracket)?;
                    Term::ArrayAccess {
                        name,
                        index: Box::new(index),
                    }
                } else if self.check_symbol(Symbol::LParen) || self.check_symbol(Symbol::Dot) {
                    Term::Call(self.parse_subroutine_call(name)?)
                } else {
                    Term::Variable(name)
                }
            }
        };
        Ok(term)
    }

    /// Rest of `name '(' args ')'` or `receiver '.' name '(' args ')'` after
    /// the first identifier
    fn parse_subroutine_call(&mut self, first: String) -> Result<SubroutineCall> {
        let (receiver, name) = if self.eat_symbol(Symbol::Dot) {
            (Some(first), self.expect_identifier("subroutine name")?)
        } else {
            (None, first)
        };
        self.expect_symbol(Symbol::LParen)?;
        let args = self.parse_expression_list()?;
        self.expect_symbol(Symbol::RParen)?;
        Ok(SubroutineCall {
            receiver,
            name,
            args,
        })
    }

    /// `(expression (',' expression)*)?`
    fn parse_expression_list(&mut self) -> Result<Vec<Expression>> {
        let mut args = Vec::new();
        if self.check_symbol(Symbol::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if !self.eat_symbol(Symbol::Comma) {
                return Ok(args);
            }
        }
    }
}

/// Parse a whole class from its source text
pub fn parse(source: &str) -> Result<Class> {
    Parser::from_source(source)?.parse_class()
}
