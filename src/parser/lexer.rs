//! Jack lexer/tokenizer
//!
//! Converts source text into a flat vector of classified tokens. Whitespace,
//! `//` line comments and `/* */` block comments are skipped.

use std::borrow::Cow;
use std::fmt;

use snafu::ensure;

use crate::error::{LexSnafu, Result};

/// Reserved words of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    /// Look up a reserved word
    pub fn lookup(word: &str) -> Option<Keyword> {
        let keyword = match word {
            "class" => Keyword::Class,
            "constructor" => Keyword::Constructor,
            "function" => Keyword::Function,
            "method" => Keyword::Method,
            "field" => Keyword::Field,
            "static" => Keyword::Static,
            "var" => Keyword::Var,
            "int" => Keyword::Int,
            "char" => Keyword::Char,
            "boolean" => Keyword::Boolean,
            "void" => Keyword::Void,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            "this" => Keyword::This,
            "let" => Keyword::Let,
            "do" => Keyword::Do,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "return" => Keyword::Return,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Class => "class",
            Keyword::Constructor => "constructor",
            Keyword::Function => "function",
            Keyword::Method => "method",
            Keyword::Field => "field",
            Keyword::Static => "static",
            Keyword::Var => "var",
            Keyword::Int => "int",
            Keyword::Char => "char",
            Keyword::Boolean => "boolean",
            Keyword::Void => "void",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::This => "this",
            Keyword::Let => "let",
            Keyword::Do => "do",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Return => "return",
        }
    }
}

/// Single-character punctuation and operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    LBrace,    // {
    RBrace,    // }
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    Dot,       // .
    Comma,     // ,
    Semicolon, // ;
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Amp,       // &
    Pipe,      // |
    Lt,        // <
    Gt,        // >
    Eq,        // =
    Tilde,     // ~
}

impl Symbol {
    pub fn from_byte(c: u8) -> Option<Symbol> {
        let symbol = match c {
            b'{' => Symbol::LBrace,
            b'}' => Symbol::RBrace,
            b'(' => Symbol::LParen,
            b')' => Symbol::RParen,
            b'[' => Symbol::LBracket,
            b']' => Symbol::RBracket,
            b'.' => Symbol::Dot,
            b',' => Symbol::Comma,
            b';' => Symbol::Semicolon,
            b'+' => Symbol::Plus,
            b'-' => Symbol::Minus,
            b'*' => Symbol::Star,
            b'/' => Symbol::Slash,
            b'&' => Symbol::Amp,
            b'|' => Symbol::Pipe,
            b'<' => Symbol::Lt,
            b'>' => Symbol::Gt,
            b'=' => Symbol::Eq,
            b'~' => Symbol::Tilde,
            _ => return None,
        };
        Some(symbol)
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::LBrace => '{',
            Symbol::RBrace => '}',
            Symbol::LParen => '(',
            Symbol::RParen => ')',
            Symbol::LBracket => '[',
            Symbol::RBracket => ']',
            Symbol::Dot => '.',
            Symbol::Comma => ',',
            Symbol::Semicolon => ';',
            Symbol::Plus => '+',
            Symbol::Minus => '-',
            Symbol::Star => '*',
            Symbol::Slash => '/',
            Symbol::Amp => '&',
            Symbol::Pipe => '|',
            Symbol::Lt => '<',
            Symbol::Gt => '>',
            Symbol::Eq => '=',
            Symbol::Tilde => '~',
        }
    }
}

/// Largest integer constant the VM can push
pub const MAX_INT_CONSTANT: u16 = 32767;

/// Token types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Keyword(Keyword),
    Symbol(Symbol),
    Identifier(String),
    IntegerConstant(u16),
    StringConstant(String),
}

/// Lexical class of a token, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Symbol,
    Identifier,
    IntegerConstant,
    StringConstant,
}

impl TokenKind {
    /// Tag name used in the XML token listing
    pub fn xml_tag(self) -> &'static str {
        match self {
            TokenKind::Keyword => "keyword",
            TokenKind::Symbol => "symbol",
            TokenKind::Identifier => "identifier",
            TokenKind::IntegerConstant => "integerConstant",
            TokenKind::StringConstant => "stringConstant",
        }
    }
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Keyword(_) => TokenKind::Keyword,
            Token::Symbol(_) => TokenKind::Symbol,
            Token::Identifier(_) => TokenKind::Identifier,
            Token::IntegerConstant(_) => TokenKind::IntegerConstant,
            Token::StringConstant(_) => TokenKind::StringConstant,
        }
    }

    /// Raw token text; string constants are returned without their quotes
    pub fn text(&self) -> String {
        match self {
            Token::Keyword(k) => k.as_str().to_string(),
            Token::Symbol(s) => s.as_char().to_string(),
            Token::Identifier(name) => name.clone(),
            Token::IntegerConstant(n) => n.to_string(),
            Token::StringConstant(s) => s.clone(),
        }
    }

    /// Token text made safe for XML output
    pub fn render(&self) -> String {
        match self {
            Token::Symbol(s) => render_symbol(s.as_char()).into_owned(),
            other => other.text(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::StringConstant(s) => write!(f, "\"{}\"", s),
            other => f.write_str(&other.text()),
        }
    }
}

/// Escape the four characters that are unsafe in XML text
pub fn render_symbol(c: char) -> Cow<'static, str> {
    match c {
        '<' => Cow::Borrowed("&lt;"),
        '>' => Cow::Borrowed("&gt;"),
        '&' => Cow::Borrowed("&amp;"),
        '"' => Cow::Borrowed("&quot;"),
        other => Cow::Owned(other.to_string()),
    }
}

/// Source position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourcePos {
    /// 1-based line
    pub line: usize,
}

/// A token together with the position it started at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken {
    pub token: Token,
    pub pos: SourcePos,
}

/// Lexer for Jack source code
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    /// Get the current source position
    pub fn position(&self) -> SourcePos {
        SourcePos { line: self.line }
    }

    /// Peek at the current byte without consuming it
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Peek at the next byte
    fn peek_next(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    /// Consume the current byte
    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Skip whitespace and comments
    fn skip_whitespace(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.advance();
                }
                Some(b'/') if self.peek_next() == Some(b'/') => {
                    while let Some(c) = self.advance() {
                        if c == b'\n' {
                            break;
                        }
                    }
                }
                Some(b'/') if self.peek_next() == Some(b'*') => {
                    let line = self.line;
                    self.advance(); // /
                    self.advance(); // *
                    let mut closed = false;
                    while let Some(c) = self.advance() {
                        if c == b'*' && self.peek() == Some(b'/') {
                            self.advance();
                            closed = true;
                            break;
                        }
                    }
                    ensure!(
                        closed,
                        LexSnafu {
                            line,
                            message: "unterminated block comment",
                        }
                    );
                }
                _ => return Ok(()),
            }
        }
    }

    /// Read the next token, `None` once the input is exhausted
    pub fn next_token(&mut self) -> Result<Option<SpannedToken>> {
        self.skip_whitespace()?;

        let pos = self.position();
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let token = if c.is_ascii_alphabetic() || c == b'_' {
            self.read_identifier()
        } else if c.is_ascii_digit() {
            self.read_number()?
        } else if c == b'"' {
            self.read_string()?
        } else if let Some(symbol) = Symbol::from_byte(c) {
            self.advance();
            Token::Symbol(symbol)
        } else {
            let found = self.source[self.pos..].chars().next().unwrap_or('\0');
            return LexSnafu {
                line: self.line,
                message: format!("unexpected character {:?}", found),
            }
            .fail();
        };

        Ok(Some(SpannedToken { token, pos }))
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let start = self.pos;

        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.advance();
            } else {
                break;
            }
        }

        let ident = &self.source[start..self.pos];
        match Keyword::lookup(ident) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Identifier(ident.to_string()),
        }
    }

    /// Read a decimal integer constant
    fn read_number(&mut self) -> Result<Token> {
        let start = self.pos;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        let digits = &self.source[start..self.pos];
        match digits.parse::<u16>() {
            Ok(n) if n <= MAX_INT_CONSTANT => Ok(Token::IntegerConstant(n)),
            _ => LexSnafu {
                line: self.line,
                message: format!("integer constant {} out of range", digits),
            }
            .fail(),
        }
    }

    /// Read a string literal; strings may not span lines
    fn read_string(&mut self) -> Result<Token> {
        let line = self.line;
        self.advance(); // opening quote
        let start = self.pos;

        loop {
            match self.peek() {
                Some(b'"') => break,
                Some(b'\n') | None => {
                    return LexSnafu {
                        line,
                        message: "unterminated string constant",
                    }
                    .fail();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        let contents = self.source[start..self.pos].to_string();
        self.advance(); // closing quote

        ensure!(
            contents.chars().all(|c| matches!(c, ' '..='~')),
            LexSnafu {
                line,
                message: "string constant contains a non-printable or non-ASCII character",
            }
        );
        ensure!(
            contents.len() <= MAX_INT_CONSTANT as usize,
            LexSnafu {
                line,
                message: "string constant too long",
            }
        );
        Ok(Token::StringConstant(contents))
    }
}

/// Lex a whole source file
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    log::trace!("lexed {} tokens", tokens.len());
    Ok(tokens)
}

/// Render a token stream as the `<tokens>` XML listing
pub fn tokens_to_xml(tokens: &[SpannedToken]) -> String {
    let mut out = String::from("<tokens>\n");
    for SpannedToken { token, .. } in tokens {
        let tag = token.kind().xml_tag();
        out.push_str(&format!("<{tag}> {} </{tag}>\n", token.render()));
    }
    out.push_str("</tokens>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn lex(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_integer_constants() {
        assert_eq!(
            lex("0 42 32767"),
            vec![
                Token::IntegerConstant(0),
                Token::IntegerConstant(42),
                Token::IntegerConstant(32767),
            ]
        );
    }

    #[test]
    fn test_integer_out_of_range() {
        assert!(matches!(tokenize("32768"), Err(Error::Lex { line: 1, .. })));
        assert!(matches!(tokenize("99999999"), Err(Error::Lex { .. })));
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            lex(r#""hello world" "/* not a comment */""#),
            vec![
                Token::StringConstant("hello world".to_string()),
                Token::StringConstant("/* not a comment */".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(tokenize("\"abc"), Err(Error::Lex { line: 1, .. })));
        assert!(matches!(tokenize("\n\"abc\ndef\""), Err(Error::Lex { line: 2, .. })));
        assert!(matches!(tokenize("\"tab\there\""), Err(Error::Lex { .. })));
    }

    #[test]
    fn test_identifiers_and_keywords() {
        assert_eq!(
            lex("foo _bar x1 class classy while"),
            vec![
                Token::Identifier("foo".to_string()),
                Token::Identifier("_bar".to_string()),
                Token::Identifier("x1".to_string()),
                Token::Keyword(Keyword::Class),
                Token::Identifier("classy".to_string()),
                Token::Keyword(Keyword::While),
            ]
        );
    }

    #[test]
    fn test_symbols() {
        assert_eq!(
            lex("a[i]=~-1;"),
            vec![
                Token::Identifier("a".to_string()),
                Token::Symbol(Symbol::LBracket),
                Token::Identifier("i".to_string()),
                Token::Symbol(Symbol::RBracket),
                Token::Symbol(Symbol::Eq),
                Token::Symbol(Symbol::Tilde),
                Token::Symbol(Symbol::Minus),
                Token::IntegerConstant(1),
                Token::Symbol(Symbol::Semicolon),
            ]
        );
    }

    #[test]
    fn test_comments() {
        let tokens = tokenize("1 // comment\n2 /* block\n */ 3 /** doc */ 4").unwrap();
        let lines: Vec<usize> = tokens.iter().map(|t| t.pos.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 3]);
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_unterminated_comment() {
        assert!(matches!(tokenize("1 /* never closed"), Err(Error::Lex { .. })));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("let x = 1;\nlet y = #;").unwrap_err();
        assert!(matches!(err, Error::Lex { line: 2, .. }));
        assert!(err.to_string().contains('#'));
        assert!(tokenize("let é = 1;").is_err());
    }

    #[test]
    fn test_render_symbol() {
        assert_eq!(render_symbol('<'), "&lt;");
        assert_eq!(render_symbol('>'), "&gt;");
        assert_eq!(render_symbol('&'), "&amp;");
        assert_eq!(render_symbol('"'), "&quot;");
        assert_eq!(render_symbol('+'), "+");
    }

    #[test]
    fn test_tokens_to_xml() {
        let tokens = tokenize("if (x < 1) { let s = \"a&b\"; }").unwrap();
        let xml = tokens_to_xml(&tokens);
        assert!(xml.starts_with("<tokens>\n<keyword> if </keyword>\n"));
        assert!(xml.contains("<symbol> &lt; </symbol>\n"));
        assert!(xml.contains("<integerConstant> 1 </integerConstant>\n"));
        assert!(xml.contains("<stringConstant> a&b </stringConstant>\n"));
        assert!(xml.ends_with("</tokens>\n"));
    }
}
