use std::fmt;

use crate::error::SyntaxError;

/// Token types for formula parsing
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),

    // References, uppercased (a1 -> A1)
    CellRef(String),

    // Function or constant name, uppercased
    Identifier(String),

    // Arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
    FloorDivide, // //
    Modulo,      // %
    Power,       // ^ or **

    // Comparison
    Equal,        // = or ==
    NotEqual,     // != or <>
    LessThan,     // <
    GreaterThan,  // >
    LessEqual,    // <=
    GreaterEqual, // >=

    // Logical keywords
    And,
    Or,

    // Delimiters
    LeftParen,
    RightParen,
    Comma,
    Colon,

    EOF,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::String(s) => write!(f, "string \"{}\"", s),
            Token::Boolean(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Token::CellRef(r) => write!(f, "reference {}", r),
            Token::Identifier(name) => write!(f, "name {}", name),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Multiply => f.write_str("'*'"),
            Token::Divide => f.write_str("'/'"),
            Token::FloorDivide => f.write_str("'//'"),
            Token::Modulo => f.write_str("'%'"),
            Token::Power => f.write_str("'^'"),
            Token::Equal => f.write_str("'='"),
            Token::NotEqual => f.write_str("'!='"),
            Token::LessThan => f.write_str("'<'"),
            Token::GreaterThan => f.write_str("'>'"),
            Token::LessEqual => f.write_str("'<='"),
            Token::GreaterEqual => f.write_str("'>='"),
            Token::And => f.write_str("'and'"),
            Token::Or => f.write_str("'or'"),
            Token::LeftParen => f.write_str("'('"),
            Token::RightParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
            Token::Colon => f.write_str("':'"),
            Token::EOF => f.write_str("end of formula"),
        }
    }
}

/// A token and the character offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: usize,
}

/// Lexer for tokenizing formula expressions
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the entire input. The result always ends with `Token::EOF`.
    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, SyntaxError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let pos = self.position;
            if pos >= self.input.len() {
                tokens.push(Spanned {
                    token: Token::EOF,
                    pos,
                });
                return Ok(tokens);
            }

            let token = self.next_token()?;
            tokens.push(Spanned { token, pos });
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.position += 1;
        c
    }

    /// Consume `second` if it follows, choosing between a one- and two-character token
    fn pair(&mut self, second: char, double: Token, single: Token) -> Token {
        self.advance();
        if self.peek() == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        let pos = self.position;
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::EOF),
        };

        let token = match c {
            '+' => {
                self.advance();
                Token::Plus
            }
            '-' => {
                self.advance();
                Token::Minus
            }
            '*' => self.pair('*', Token::Power, Token::Multiply),
            '/' => self.pair('/', Token::FloorDivide, Token::Divide),
            '^' => {
                self.advance();
                Token::Power
            }
            '%' => {
                self.advance();
                Token::Modulo
            }
            '=' => self.pair('=', Token::Equal, Token::Equal),
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Token::NotEqual
                } else {
                    return Err(SyntaxError::UnexpectedChar { ch: '!', pos });
                }
            }
            '<' => {
                self.advance();
                match self.peek() {
                    Some('=') => {
                        self.advance();
                        Token::LessEqual
                    }
                    Some('>') => {
                        self.advance();
                        Token::NotEqual
                    }
                    _ => Token::LessThan,
                }
            }
            '>' => self.pair('=', Token::GreaterEqual, Token::GreaterThan),
            '(' => {
                self.advance();
                Token::LeftParen
            }
            ')' => {
                self.advance();
                Token::RightParen
            }
            ',' => {
                self.advance();
                Token::Comma
            }
            ':' => {
                self.advance();
                Token::Colon
            }
            '"' => self.read_string()?,
            '0'..='9' | '.' => self.read_number()?,
            c if c.is_ascii_alphabetic() => self.read_word()?,
            _ => return Err(SyntaxError::UnexpectedChar { ch: c, pos }),
        };

        Ok(token)
    }

    fn read_string(&mut self) -> Result<Token, SyntaxError> {
        let start = self.position;
        self.advance(); // opening quote
        let mut s = String::new();

        while let Some(c) = self.advance() {
            if c == '"' {
                // "" inside a string is an escaped quote
                if self.peek() == Some('"') {
                    self.advance();
                    s.push('"');
                } else {
                    return Ok(Token::String(s));
                }
            } else {
                s.push(c);
            }
        }

        Err(SyntaxError::UnterminatedString { pos: start })
    }

    fn read_number(&mut self) -> Result<Token, SyntaxError> {
        let start = self.position;
        let mut s = String::new();
        let mut has_dot = false;

        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => s.push(c),
                '.' if !has_dot => {
                    has_dot = true;
                    s.push(c);
                }
                _ => break,
            }
            self.advance();
        }

        // Exponent only when digits follow: 1e3, 2.5E-4
        if matches!(self.peek(), Some('e' | 'E')) {
            let digits_at = match self.peek_at(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_at(digits_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digits_at {
                    s.extend(self.advance());
                }
                while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                    s.push(c);
                    self.advance();
                }
            }
        }

        s.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| SyntaxError::InvalidNumber { text: s, pos: start })
    }

    /// Letters optionally followed by digits: a keyword, a name or a cell reference
    fn read_word(&mut self) -> Result<Token, SyntaxError> {
        let start = self.position;
        let mut letters = String::new();
        let mut digits = String::new();

        while let Some(c) = self.peek().filter(char::is_ascii_alphabetic) {
            letters.push(c.to_ascii_uppercase());
            self.advance();
        }
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            digits.push(c);
            self.advance();
        }

        // Trailing letters or underscores after the row digits (A1B, A1_x)
        if !digits.is_empty() && self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            let mut text = format!("{}{}", letters, digits);
            while let Some(c) = self.peek().filter(|c| c.is_ascii_alphanumeric() || *c == '_') {
                text.push(c.to_ascii_uppercase());
                self.advance();
            }
            return Err(SyntaxError::InvalidReference { text, pos: start });
        }

        let call_follows = self.peek() == Some('(');

        if digits.is_empty() {
            let token = match letters.as_str() {
                "TRUE" => Token::Boolean(true),
                "FALSE" => Token::Boolean(false),
                "AND" if !call_follows => Token::And,
                "OR" if !call_follows => Token::Or,
                _ => Token::Identifier(letters),
            };
            return Ok(token);
        }

        let word = format!("{}{}", letters, digits);
        if call_follows {
            // LOG10(...) is a call, not a reference
            Ok(Token::Identifier(word))
        } else {
            Ok(Token::CellRef(word))
        }
    }
}

/// Tokenize a formula body
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, SyntaxError> {
    Lexer::new(input).tokenize()
}
