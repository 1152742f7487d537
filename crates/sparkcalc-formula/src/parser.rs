use std::f64::consts;

use sparkcalc_core::{CellCoord, CellRange};

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::SyntaxError;
use crate::lexer::{Lexer, Spanned, Token};

/// Recursive-descent parser over a token stream.
///
/// Precedence, loosest first: `and`/`or`, comparison (non-chaining), `+ -`,
/// `* / // %`, `^` (right-associative), unary `- +`, primary.
pub struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parse the token stream into an AST
    pub fn parse(&mut self) -> Result<Expr, SyntaxError> {
        if self.is_at_end() {
            return Err(SyntaxError::Empty);
        }

        let expr = self.parse_expression()?;

        if !self.is_at_end() {
            return Err(self.unexpected());
        }

        Ok(expr)
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.position)
            .map(|s| &s.token)
            .unwrap_or(&Token::EOF)
    }

    fn peek_pos(&self) -> usize {
        match self.tokens.get(self.position) {
            Some(s) => s.pos,
            None => self.tokens.last().map(|s| s.pos).unwrap_or(0),
        }
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::EOF)
    }

    fn unexpected(&self) -> SyntaxError {
        SyntaxError::UnexpectedToken {
            found: self.peek().to_string(),
            pos: self.peek_pos(),
        }
    }

    fn expect(&mut self, expected: Token, description: &'static str) -> Result<(), SyntaxError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(SyntaxError::Expected {
                expected: description,
                found: self.peek().to_string(),
                pos: self.peek_pos(),
            })
        }
    }

    fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_logical()
    }

    fn parse_logical(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_comparison()?;

        loop {
            let op = match self.peek() {
                Token::And => BinaryOp::And,
                Token::Or => BinaryOp::Or,
                _ => break,
            };

            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::binary(left, op, right);
        }

        Ok(left)
    }

    fn comparison_op(&self) -> Option<BinaryOp> {
        match self.peek() {
            Token::Equal => Some(BinaryOp::Eq),
            Token::NotEqual => Some(BinaryOp::Ne),
            Token::LessThan => Some(BinaryOp::Lt),
            Token::GreaterThan => Some(BinaryOp::Gt),
            Token::LessEqual => Some(BinaryOp::Le),
            Token::GreaterEqual => Some(BinaryOp::Ge),
            _ => None,
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.parse_additive()?;

        let Some(op) = self.comparison_op() else {
            return Ok(left);
        };
        self.advance();
        let right = self.parse_additive()?;

        if self.comparison_op().is_some() {
            return Err(SyntaxError::ChainedComparison {
                pos: self.peek_pos(),
            });
        }

        Ok(Expr::binary(left, op, right))
    }

    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_power()?;

        loop {
            let op = match self.peek() {
                Token::Multiply => BinaryOp::Mul,
                Token::Divide => BinaryOp::Div,
                Token::FloorDivide => BinaryOp::FloorDiv,
                Token::Modulo => BinaryOp::Mod,
                _ => break,
            };

            self.advance();
            let right = self.parse_power()?;
            left = Expr::binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.parse_unary()?;

        if matches!(self.peek(), Token::Power) {
            self.advance();
            // Power is right-associative
            let right = self.parse_power()?;
            Ok(Expr::binary(left, BinaryOp::Pow, right))
        } else {
            Ok(left)
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Pos,
            _ => return self.parse_primary(),
        };

        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::unary(op, operand))
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let pos = self.peek_pos();

        match self.peek().clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::number(n))
            }
            Token::String(s) => {
                self.advance();
                Ok(Expr::text(s))
            }
            Token::Boolean(b) => {
                self.advance();
                Ok(Expr::boolean(b))
            }
            Token::CellRef(text) => {
                self.advance();
                self.parse_cell_ref_or_range(&text, pos)
            }
            Token::Identifier(name) => {
                self.advance();
                if matches!(self.peek(), Token::LeftParen) {
                    self.parse_call(name)
                } else {
                    constant(&name)
                        .map(Expr::number)
                        .ok_or(SyntaxError::UnknownName { name, pos })
                }
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RightParen, "')'")?;
                Ok(expr)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_cell_ref_or_range(&mut self, text: &str, pos: usize) -> Result<Expr, SyntaxError> {
        let start = parse_cell_reference(text, pos)?;

        if !matches!(self.peek(), Token::Colon) {
            return Ok(Expr::CellRef(start));
        }
        self.advance();

        let end_pos = self.peek_pos();
        match self.advance() {
            Token::CellRef(end_text) => {
                let end = parse_cell_reference(&end_text, end_pos)?;
                Ok(Expr::Range(CellRange::new(start, end)))
            }
            other => Err(SyntaxError::Expected {
                expected: "cell reference after ':'",
                found: other.to_string(),
                pos: end_pos,
            }),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Expr, SyntaxError> {
        self.expect(Token::LeftParen, "'('")?;

        let mut args = Vec::new();

        if !matches!(self.peek(), Token::RightParen) {
            loop {
                args.push(self.parse_expression()?);

                match self.peek() {
                    Token::Comma => {
                        self.advance();
                    }
                    Token::RightParen => break,
                    _ => {
                        return Err(SyntaxError::Expected {
                            expected: "',' or ')'",
                            found: self.peek().to_string(),
                            pos: self.peek_pos(),
                        })
                    }
                }
            }
        }

        self.expect(Token::RightParen, "')'")?;

        Ok(Expr::call(name, args))
    }
}

/// Named constants usable without parentheses
fn constant(name: &str) -> Option<f64> {
    match name {
        "PI" => Some(consts::PI),
        "E" => Some(consts::E),
        "TAU" => Some(consts::TAU),
        _ => None,
    }
}

fn parse_cell_reference(text: &str, pos: usize) -> Result<CellCoord, SyntaxError> {
    CellCoord::from_a1(text).ok_or_else(|| SyntaxError::InvalidReference {
        text: text.to_string(),
        pos,
    })
}

/// Parse a formula body (leading `=` already stripped)
pub fn parse(formula: &str) -> Result<Expr, SyntaxError> {
    let tokens = Lexer::new(formula).tokenize()?;
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_number() {
        assert_eq!(parse("42").unwrap(), Expr::number(42.0));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::binary(
                Expr::number(1.0),
                BinaryOp::Add,
                Expr::binary(Expr::number(2.0), BinaryOp::Mul, Expr::number(3.0)),
            )
        );
        assert_eq!(parse("(1 + 2) * 3").unwrap().to_string(), "(1 + 2) * 3");
        assert_eq!(parse("17 // 5 % 3").unwrap().to_string(), "(17 // 5) % 3");
        assert_eq!(parse("1 < 2 and 3 > 4 or True").unwrap().to_string(), "((1 < 2) and (3 > 4)) or True");
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(
            parse("2 ^ 3 ** 2").unwrap(),
            Expr::binary(
                Expr::number(2.0),
                BinaryOp::Pow,
                Expr::binary(Expr::number(3.0), BinaryOp::Pow, Expr::number(2.0)),
            )
        );
    }

    #[test]
    fn test_unary_binds_tighter_than_power() {
        assert_eq!(
            parse("-2^2").unwrap(),
            Expr::binary(
                Expr::unary(UnaryOp::Neg, Expr::number(2.0)),
                BinaryOp::Pow,
                Expr::number(2.0),
            )
        );
        assert_eq!(parse("2^-1").unwrap().to_string(), "2 ^ -1");
    }

    #[test]
    fn test_cell_reference() {
        assert_eq!(parse("b3").unwrap(), Expr::cell(2, 1));
    }

    #[test]
    fn test_range_corners_normalized() {
        assert_eq!(parse("A10:A1").unwrap(), parse("A1:A10").unwrap());
        assert_eq!(parse("B3:A1").unwrap().to_string(), "A1:B3");
    }

    #[test]
    fn test_function_call() {
        let expr = parse("sum(A1:A3, 4, max(B1:B2))").unwrap();
        let Expr::Call { name, args } = expr else {
            panic!("Expected function call");
        };
        assert_eq!(name, "SUM");
        assert_eq!(args.len(), 3);
        assert!(matches!(args[0], Expr::Range(_)));
        assert!(matches!(args[2], Expr::Call { .. }));

        assert_eq!(parse("TODAY()").unwrap(), Expr::call("TODAY", vec![]));
    }

    #[test]
    fn test_constants() {
        assert_eq!(parse("pi").unwrap(), Expr::number(std::f64::consts::PI));
        assert!(matches!(
            parse("foo + 1"),
            Err(SyntaxError::UnknownName { ref name, pos: 0 }) if name == "FOO"
        ));
    }

    #[test]
    fn test_equality_synonyms() {
        assert_eq!(parse("A1=5").unwrap(), parse("A1==5").unwrap());
        assert_eq!(parse("2^8").unwrap(), parse("2**8").unwrap());
    }

    #[test]
    fn test_chained_comparison_rejected() {
        assert_eq!(
            parse("1 < 2 < 3"),
            Err(SyntaxError::ChainedComparison { pos: 6 })
        );
        // Parenthesized comparisons are fine
        assert!(parse("(1 < 2) = True").is_ok());
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(parse(""), Err(SyntaxError::Empty));
        assert_eq!(parse("   "), Err(SyntaxError::Empty));
        assert!(matches!(parse("(1 + 2"), Err(SyntaxError::Expected { expected: "')'", .. })));
        assert!(matches!(parse("1 + 2)"), Err(SyntaxError::UnexpectedToken { pos: 5, .. })));
        assert!(matches!(parse("1 +"), Err(SyntaxError::UnexpectedToken { .. })));
        assert!(matches!(parse("A0 + 1"), Err(SyntaxError::InvalidReference { .. })));
        assert!(matches!(parse("A1:"), Err(SyntaxError::Expected { .. })));
        assert!(matches!(parse("A1:5"), Err(SyntaxError::Expected { .. })));
        assert!(matches!(parse("SUM(1 2)"), Err(SyntaxError::Expected { .. })));
        assert!(matches!(parse("SUM(1,)"), Err(SyntaxError::UnexpectedToken { .. })));
    }
}
