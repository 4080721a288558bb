//! Parse-tree XML listing
//!
//! Renders a parsed class as nested elements, one per grammar rule, with the
//! rule's tokens as `<kind> text </kind>` leaves in source order. Each level
//! is indented by two spaces. Subroutine calls have no element of their own;
//! their tokens sit directly inside the enclosing `<term>` or `<doStatement>`.

use super::ast::{
    Class, ClassVarDec, ClassVarKind, Expression, Parameter, ReturnType, Statement, Subroutine,
    SubroutineCall, SubroutineKind, Term, Type, VarDec,
};
use super::lexer::{Keyword, Symbol, Token};

/// Render `class` as `<class>` XML
pub fn class_to_xml(class: &Class) -> String {
    let mut xml = XmlWriter::default();
    xml.class(class);
    xml.out
}

#[derive(Default)]
struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    fn open(&mut self, tag: &str) {
        self.indent();
        self.out.push_str(&format!("<{tag}>\n"));
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth -= 1;
        self.indent();
        self.out.push_str(&format!("</{tag}>\n"));
    }

    fn token(&mut self, token: &Token) {
        let tag = token.kind().xml_tag();
        self.indent();
        self.out
            .push_str(&format!("<{tag}> {} </{tag}>\n", token.render()));
    }

    fn keyword(&mut self, keyword: Keyword) {
        self.token(&Token::Keyword(keyword));
    }

    fn symbol(&mut self, symbol: Symbol) {
        self.token(&Token::Symbol(symbol));
    }

    fn identifier(&mut self, name: &str) {
        self.token(&Token::Identifier(name.to_string()));
    }

    /// `name (',' name)*`
    fn names(&mut self, names: &[String]) {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.symbol(Symbol::Comma);
            }
            self.identifier(name);
        }
    }

    fn ty(&mut self, ty: &Type) {
        match ty {
            Type::Int => self.keyword(Keyword::Int),
            Type::Char => self.keyword(Keyword::Char),
            Type::Boolean => self.keyword(Keyword::Boolean),
            Type::Class(name) => self.identifier(name),
        }
    }

    fn class(&mut self, class: &Class) {
        self.open("class");
        self.keyword(Keyword::Class);
        self.identifier(&class.name);
        self.symbol(Symbol::LBrace);
        for dec in &class.vars {
            self.class_var_dec(dec);
        }
        for subroutine in &class.subroutines {
            self.subroutine(subroutine);
        }
        self.symbol(Symbol::RBrace);
        self.close("class");
    }

    fn class_var_dec(&mut self, dec: &ClassVarDec) {
        self.open("classVarDec");
        self.keyword(match dec.kind {
            ClassVarKind::Static => Keyword::Static,
            ClassVarKind::Field => Keyword::Field,
        });
        self.ty(&dec.ty);
        self.names(&dec.names);
        self.symbol(Symbol::Semicolon);
        self.close("classVarDec");
    }

    fn subroutine(&mut self, subroutine: &Subroutine) {
        self.open("subroutineDec");
        self.keyword(match subroutine.kind {
            SubroutineKind::Constructor => Keyword::Constructor,
            SubroutineKind::Function => Keyword::Function,
            SubroutineKind::Method => Keyword::Method,
        });
        match &subroutine.return_type {
            ReturnType::Void => self.keyword(Keyword::Void),
            ReturnType::Type(ty) => self.ty(ty),
        }
        self.identifier(&subroutine.name);
        self.symbol(Symbol::LParen);
        self.parameter_list(&subroutine.params);
        self.symbol(Symbol::RParen);

        self.open("subroutineBody");
        self.symbol(Symbol::LBrace);
        for dec in &subroutine.locals {
            self.var_dec(dec);
        }
        self.statements(&subroutine.body);
        self.symbol(Symbol::RBrace);
        self.close("subroutineBody");
        self.close("subroutineDec");
    }

    fn parameter_list(&mut self, params: &[Parameter]) {
        self.open("parameterList");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.symbol(Symbol::Comma);
            }
            self.ty(&param.ty);
            self.identifier(&param.name);
        }
        self.close("parameterList");
    }

    fn var_dec(&mut self, dec: &VarDec) {
        self.open("varDec");
        self.keyword(Keyword::Var);
        self.ty(&dec.ty);
        self.names(&dec.names);
        self.symbol(Symbol::Semicolon);
        self.close("varDec");
    }

    /// `{ statements }`
    fn block(&mut self, statements: &[Statement]) {
        self.symbol(Symbol::LBrace);
        self.statements(statements);
        self.symbol(Symbol::RBrace);
    }

    fn statements(&mut self, statements: &[Statement]) {
        self.open("statements");
        for statement in statements {
            self.statement(statement);
        }
        self.close("statements");
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Let {
                target,
                index,
                value,
            } => {
                self.open("letStatement");
                self.keyword(Keyword::Let);
                self.identifier(target);
                if let Some(index) = index {
                    self.symbol(Symbol::LBracket);
                    self.expression(index);
                    self.symbol(Symbol::RBracket);
                }
                self.symbol(Symbol::Eq);
                self.expression(value);
                self.symbol(Symbol::Semicolon);
                self.close("letStatement");
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.open("ifStatement");
                self.keyword(Keyword::If);
                self.condition(condition);
                self.block(then_branch);
                if let Some(else_branch) = else_branch {
                    self.keyword(Keyword::Else);
                    self.block(else_branch);
                }
                self.close("ifStatement");
            }
            Statement::While { condition, body } => {
                self.open("whileStatement");
                self.keyword(Keyword::While);
                self.condition(condition);
                self.block(body);
                self.close("whileStatement");
            }
            Statement::Do(call) => {
                self.open("doStatement");
                self.keyword(Keyword::Do);
                self.subroutine_call(call);
                self.symbol(Symbol::Semicolon);
                self.close("doStatement");
            }
            Statement::Return(value) => {
                self.open("returnStatement");
                self.keyword(Keyword::Return);
                if let Some(value) = value {
                    self.expression(value);
                }
                self.symbol(Symbol::Semicolon);
                self.close("returnStatement");
            }
        }
    }

    fn condition(&mut self, condition: &Expression) {
        self.symbol(Symbol::LParen);
        self.expression(condition);
        self.symbol(Symbol::RParen);
    }

    fn expression(&mut self, expression: &Expression) {
        self.open("expression");
        self.term(&expression.first);
        for (op, term) in &expression.rest {
            self.symbol(op.symbol());
            self.term(term);
        }
        self.close("expression");
    }

    fn term(&mut self, term: &Term) {
        self.open("term");
        match term {
            Term::IntegerConstant(n) => self.token(&Token::IntegerConstant(*n)),
            Term::StringConstant(s) => self.token(&Token::StringConstant(s.clone())),
            Term::Keyword(constant) => self.keyword(constant.keyword()),
            Term::Variable(name) => self.identifier(name),
            Term::ArrayAccess { name, index } => {
                self.identifier(name);
                self.symbol(Symbol::LBracket);
                self.expression(index);
                self.symbol(Symbol::RBracket);
            }
            Term::Call(call) => self.subroutine_call(call),
            Term::Parenthesized(inner) => self.condition(inner),
            Term::Unary(op, operand) => {
                self.symbol(op.symbol());
                self.term(operand);
            }
        }
        self.close("term");
    }

    fn subroutine_call(&mut self, call: &SubroutineCall) {
        if let Some(receiver) = &call.receiver {
            self.identifier(receiver);
            self.symbol(Symbol::Dot);
        }
        self.identifier(&call.name);
        self.symbol(Symbol::LParen);
        self.open("expressionList");
        for (i, arg) in call.args.iter().enumerate() {
            if i > 0 {
                self.symbol(Symbol::Comma);
            }
            self.expression(arg);
        }
        self.close("expressionList");
        self.symbol(Symbol::RParen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_small_class() {
        let class = parse(
            "class P {
                field int x, y;
                method int sum(int k) { var Array a; let a[0] = -x; do Out.print(x < y, 2); return (x + k); }
            }",
        )
        .unwrap();
        let expected = "\
<class>
  <keyword> class </keyword>
  <identifier> P </identifier>
  <symbol> { </symbol>
  <classVarDec>
    <keyword> field </keyword>
    <keyword> int </keyword>
    <identifier> x </identifier>
    <symbol> , </symbol>
    <identifier> y </identifier>
    <symbol> ; </symbol>
  </classVarDec>
  <subroutineDec>
    <keyword> method </keyword>
    <keyword> int </keyword>
    <identifier> sum </identifier>
    <symbol> ( </symbol>
    <parameterList>
      <keyword> int </keyword>
      <identifier> k </identifier>
    </parameterList>
    <symbol> ) </symbol>
    <subroutineBody>
      <symbol> { </symbol>
      <varDec>
        <keyword> var </keyword>
        <identifier> Array </identifier>
        <identifier> a </identifier>
        <symbol> ; </symbol>
      </varDec>
      <statements>
        <letStatement>
          <keyword> let </keyword>
          <identifier> a </identifier>
          <symbol> [ </symbol>
          <expression>
            <term>
              <integerConstant> 0 </integerConstant>
            </term>
          </expression>
          <symbol> ] </symbol>
          <symbol> = </symbol>
          <expression>
            <term>
              <symbol> - </symbol>
              <term>
                <identifier> x </identifier>
              </term>
            </term>
          </expression>
          <symbol> ; </symbol>
        </letStatement>
        <doStatement>
          <keyword> do </keyword>
          <identifier> Out </identifier>
          <symbol> . </symbol>
          <identifier> print </identifier>
          <symbol> ( </symbol>
          <expressionList>
            <expression>
              <term>
                <identifier> x </identifier>
              </term>
              <symbol> &lt; </symbol>
              <term>
                <identifier> y </identifier>
              </term>
            </expression>
            <symbol> , </symbol>
            <expression>
              <term>
                <integerConstant> 2 </integerConstant>
              </term>
            </expression>
          </expressionList>
          <symbol> ) </symbol>
          <symbol> ; </symbol>
        </doStatement>
        <returnStatement>
          <keyword> return </keyword>
          <expression>
            <term>
              <symbol> ( </symbol>
              <expression>
                <term>
                  <identifier> x </identifier>
                </term>
                <symbol> + </symbol>
                <term>
                  <identifier> k </identifier>
                </term>
              </expression>
              <symbol> ) </symbol>
            </term>
          </expression>
          <symbol> ; </symbol>
        </returnStatement>
      </statements>
      <symbol> } </symbol>
    </subroutineBody>
  </subroutineDec>
  <symbol> } </symbol>
</class>
";
        assert_eq!(class_to_xml(&class), expected);
    }

    #[test]
    fn test_empty_lists_and_else() {
        let class = parse(
            "class E { function void f() { if (true) { } else { return; } while (~false) { do g(); } } }",
        )
        .unwrap();
        let xml = class_to_xml(&class);
        assert!(xml.contains("    <parameterList>\n    </parameterList>\n"));
        assert!(xml.contains("<keyword> else </keyword>\n"));
        // Empty `then` block: class > subroutineDec > subroutineBody >
        // statements > ifStatement > statements
        let pad = " ".repeat(10);
        assert!(xml.contains(&format!("<statements>\n{pad}</statements>\n")));
        let pad = " ".repeat(14);
        assert!(xml.contains(&format!(
            "<identifier> g </identifier>\n{pad}<symbol> ( </symbol>\n\
             {pad}<expressionList>\n{pad}</expressionList>\n"
        )));
    }

    #[test]
    fn test_tokens_match_token_listing() {
        let source = "class T { static boolean b; function char c(int n, T t) {
            let b = t.ok(\"s\") & (n > 3) | null; return a[n * 2]; } }";
        let listed = crate::parser::tokens_to_xml(&crate::parser::tokenize(source).unwrap());
        let tree = class_to_xml(&parse(source).unwrap());
        let leaves: Vec<&str> = tree
            .lines()
            .map(str::trim_start)
            .filter(|line| line.contains("> ") && line.contains(" </"))
            .collect();
        let tokens: Vec<&str> = listed
            .lines()
            .filter(|line| *line != "<tokens>" && *line != "</tokens>")
            .collect();
        assert_eq!(leaves, tokens);
    }
}
