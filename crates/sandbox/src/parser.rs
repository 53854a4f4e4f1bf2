//! Pratt parser producing the statement list the interpreter runs.
//!
//! Running out of input where more is required (an open bracket, a dangling
//! operator, an unterminated string) is reported as
//! [`ParseError::Incomplete`] so that a session can keep buffering.
//! Anything else that does not parse is [`ParseError::Invalid`].

use thiserror::Error;

use crate::lexer::{Spanned, Token, tokenize};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
	#[error("{0}")]
	Incomplete(String),
	#[error("{message}")]
	Invalid { message: String, line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	Neg,
	Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
	Rem,
	Eq,
	NotEq,
	Lt,
	LtEq,
	Gt,
	GtEq,
	And,
	Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	Number(f64),
	Str(String),
	Bool(bool),
	Null,
	Undefined,
	This,
	Ident(String),
	Array(Vec<Expr>),
	Object(Vec<(String, Expr)>),
	Member(Box<Expr>, String),
	Index(Box<Expr>, Box<Expr>),
	Call(Box<Expr>, Vec<Expr>),
	Unary(UnaryOp, Box<Expr>),
	Binary(BinaryOp, Box<Expr>, Box<Expr>),
	Assign(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
	pub expr: Expr,
	pub line: usize,
}

pub fn parse(source: &str) -> Result<Vec<Stmt>, ParseError> {
	let tokens = tokenize(source)?;
	Parser {
		tokens,
		pos: 0,
		nesting: 0,
		depth: 0,
	}
	.program()
}

/// Deepest expression tree a statement may produce.
pub const MAX_DEPTH: usize = 128;

mod prec {
	pub const ASSIGN: u8 = 1;
	pub const OR: u8 = 2;
	pub const AND: u8 = 3;
	pub const EQUALITY: u8 = 4;
	pub const COMPARE: u8 = 5;
	pub const SUM: u8 = 6;
	pub const PRODUCT: u8 = 7;
	pub const PREFIX: u8 = 8;
	pub const POSTFIX: u8 = 9;
}

struct Parser {
	tokens: Vec<Spanned>,
	pos: usize,
	/// Open brackets around the current position. Line breaks are
	/// insignificant inside brackets.
	nesting: usize,
	/// Depth of the expression tree under construction.
	depth: usize,
}

impl Parser {
	fn program(mut self) -> Result<Vec<Stmt>, ParseError> {
		let mut statements = Vec::new();
		loop {
			while matches!(self.peek_raw(), Some(Token::Newline | Token::Semicolon)) {
				self.pos += 1;
			}
			let Some(line) = self.tokens.get(self.pos).map(|t| t.line) else {
				return Ok(statements);
			};
			let expr = self.expression(0)?;
			statements.push(Stmt { expr, line });
			match self.peek_raw() {
				None | Some(Token::Newline | Token::Semicolon) => {}
				Some(token) => return Err(self.unexpected(&token.clone())),
			}
		}
	}

	fn peek_raw(&self) -> Option<&Token> {
		self.tokens.get(self.pos).map(|t| &t.token)
	}

	fn skip_newlines(&mut self) {
		while matches!(self.peek_raw(), Some(Token::Newline)) {
			self.pos += 1;
		}
	}

	/// Next significant token.
	fn peek(&mut self) -> Option<&Token> {
		if self.nesting > 0 {
			self.skip_newlines();
		}
		self.peek_raw()
	}

	fn line(&self) -> usize {
		self.tokens
			.get(self.pos)
			.or_else(|| self.tokens.last())
			.map(|t| t.line)
			.unwrap_or(1)
	}

	fn next(&mut self) -> Result<Token, ParseError> {
		if self.nesting > 0 {
			self.skip_newlines();
		}
		let token = self
			.tokens
			.get(self.pos)
			.map(|t| t.token.clone())
			.ok_or_else(|| ParseError::Incomplete("unexpected end of input".to_string()))?;
		self.pos += 1;
		Ok(token)
	}

	fn expect(&mut self, want: Token) -> Result<(), ParseError> {
		let token = self.next()?;
		if token == want {
			Ok(())
		} else {
			Err(ParseError::Invalid {
				message: format!("expected {want} but found {token}"),
				line: self.line(),
			})
		}
	}

	fn unexpected(&self, token: &Token) -> ParseError {
		ParseError::Invalid {
			message: format!("unexpected token {token}"),
			line: self.line(),
		}
	}

	fn expression(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
		let outer = self.depth;
		self.descend()?;
		self.skip_newlines();
		let mut lhs = self.prefix()?;
		loop {
			let Some(token) = self.peek().cloned() else {
				break;
			};
			let Some((prec, right_assoc)) = infix_precedence(&token) else {
				break;
			};
			if prec < min_prec {
				break;
			}
			self.pos += 1;
			self.descend()?;
			lhs = self.infix(lhs, token, prec, right_assoc)?;
		}
		self.depth = outer;
		Ok(lhs)
	}

	/// Left-leaning chains such as `a.b.c` deepen the tree as much as
	/// nested brackets do, so both count.
	fn descend(&mut self) -> Result<(), ParseError> {
		self.depth += 1;
		if self.depth > MAX_DEPTH {
			return Err(ParseError::Invalid {
				message: "too much recursion".to_string(),
				line: self.line(),
			});
		}
		Ok(())
	}

	fn prefix(&mut self) -> Result<Expr, ParseError> {
		let token = self.next()?;
		let expr = match token {
			Token::Number(n) => Expr::Number(n),
			Token::Str(s) => Expr::Str(s),
			Token::True => Expr::Bool(true),
			Token::False => Expr::Bool(false),
			Token::Null => Expr::Null,
			Token::Undefined => Expr::Undefined,
			Token::This => Expr::This,
			Token::Ident(name) => Expr::Ident(name),
			Token::Minus => Expr::Unary(UnaryOp::Neg, Box::new(self.expression(prec::PREFIX)?)),
			Token::Bang => Expr::Unary(UnaryOp::Not, Box::new(self.expression(prec::PREFIX)?)),
			Token::LParen => {
				self.nesting += 1;
				let inner = self.expression(0)?;
				self.expect(Token::RParen)?;
				self.nesting -= 1;
				inner
			}
			Token::LBracket => Expr::Array(self.list(Token::RBracket)?),
			Token::LBrace => self.object()?,
			other => return Err(self.unexpected(&other)),
		};
		Ok(expr)
	}

	fn infix(&mut self, lhs: Expr, token: Token, prec: u8, right_assoc: bool) -> Result<Expr, ParseError> {
		let next_prec = if right_assoc { prec } else { prec + 1 };
		let expr = match token {
			Token::Dot => match self.next()? {
				Token::Ident(name) => Expr::Member(Box::new(lhs), name),
				other => return Err(self.unexpected(&other)),
			},
			Token::LParen => Expr::Call(Box::new(lhs), self.list(Token::RParen)?),
			Token::LBracket => {
				self.nesting += 1;
				let index = self.expression(0)?;
				self.expect(Token::RBracket)?;
				self.nesting -= 1;
				Expr::Index(Box::new(lhs), Box::new(index))
			}
			Token::Assign => {
				if !matches!(lhs, Expr::Ident(_) | Expr::Member(..) | Expr::Index(..)) {
					return Err(ParseError::Invalid {
						message: "invalid assignment target".to_string(),
						line: self.line(),
					});
				}
				Expr::Assign(Box::new(lhs), Box::new(self.expression(next_prec)?))
			}
			other => {
				let op = binary_op(&other).ok_or_else(|| self.unexpected(&other))?;
				Expr::Binary(op, Box::new(lhs), Box::new(self.expression(next_prec)?))
			}
		};
		Ok(expr)
	}

	/// Comma-separated expressions up to `close`; the opening bracket has
	/// been consumed.
	fn list(&mut self, close: Token) -> Result<Vec<Expr>, ParseError> {
		self.nesting += 1;
		let mut items = Vec::new();
		loop {
			if self.peek() == Some(&close) {
				self.pos += 1;
				break;
			}
			items.push(self.expression(0)?);
			match self.next()? {
				Token::Comma => {}
				token if token == close => break,
				other => return Err(self.unexpected(&other)),
			}
		}
		self.nesting -= 1;
		Ok(items)
	}

	fn object(&mut self) -> Result<Expr, ParseError> {
		self.nesting += 1;
		let mut entries = Vec::new();
		loop {
			let key = match self.next()? {
				Token::RBrace => break,
				Token::Ident(name) | Token::Str(name) => name,
				other => return Err(self.unexpected(&other)),
			};
			self.expect(Token::Colon)?;
			entries.push((key, self.expression(0)?));
			match self.next()? {
				Token::Comma => {}
				Token::RBrace => break,
				other => return Err(self.unexpected(&other)),
			}
		}
		self.nesting -= 1;
		Ok(Expr::Object(entries))
	}
}

fn infix_precedence(token: &Token) -> Option<(u8, bool)> {
	let entry = match token {
		Token::Assign => (prec::ASSIGN, true),
		Token::Or => (prec::OR, false),
		Token::And => (prec::AND, false),
		Token::Eq | Token::NotEq => (prec::EQUALITY, false),
		Token::Lt | Token::LtEq | Token::Gt | Token::GtEq => (prec::COMPARE, false),
		Token::Plus | Token::Minus => (prec::SUM, false),
		Token::Star | Token::Slash | Token::Percent => (prec::PRODUCT, false),
		Token::Dot | Token::LParen | Token::LBracket => (prec::POSTFIX, false),
		_ => return None,
	};
	Some(entry)
}

fn binary_op(token: &Token) -> Option<BinaryOp> {
	let op = match token {
		Token::Plus => BinaryOp::Add,
		Token::Minus => BinaryOp::Sub,
		Token::Star => BinaryOp::Mul,
		Token::Slash => BinaryOp::Div,
		Token::Percent => BinaryOp::Rem,
		Token::Eq => BinaryOp::Eq,
		Token::NotEq => BinaryOp::NotEq,
		Token::Lt => BinaryOp::Lt,
		Token::LtEq => BinaryOp::LtEq,
		Token::Gt => BinaryOp::Gt,
		Token::GtEq => BinaryOp::GtEq,
		Token::And => BinaryOp::And,
		Token::Or => BinaryOp::Or,
		_ => return None,
	};
	Some(op)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn single(source: &str) -> Expr {
		let mut statements = parse(source).unwrap();
		assert_eq!(statements.len(), 1, "{source}");
		statements.remove(0).expr
	}

	#[test]
	fn precedence_binds_products_tighter() {
		assert_eq!(
			single("1 + 2 * 3"),
			Expr::Binary(
				BinaryOp::Add,
				Box::new(Expr::Number(1.0)),
				Box::new(Expr::Binary(BinaryOp::Mul, Box::new(Expr::Number(2.0)), Box::new(Expr::Number(3.0))))
			)
		);
	}

	#[test]
	fn assignment_is_right_associative() {
		assert_eq!(
			single("a = b = 1"),
			Expr::Assign(
				Box::new(Expr::Ident("a".into())),
				Box::new(Expr::Assign(Box::new(Expr::Ident("b".into())), Box::new(Expr::Number(1.0))))
			)
		);
	}

	#[test]
	fn calls_and_members_chain() {
		assert_eq!(
			single("repl.enter(win)"),
			Expr::Call(
				Box::new(Expr::Member(Box::new(Expr::Ident("repl".into())), "enter".into())),
				vec![Expr::Ident("win".into())]
			)
		);
	}

	#[test]
	fn line_breaks_separate_statements_outside_brackets() {
		let statements = parse("a = 1\nb = 2; c").unwrap();
		assert_eq!(statements.iter().map(|s| s.line).collect::<Vec<_>>(), vec![1, 2, 2]);
	}

	#[test]
	fn line_breaks_inside_brackets_are_ignored() {
		let statements = parse("f(1,\n2)\n").unwrap();
		assert_eq!(statements.len(), 1);
		let object = parse("{\n a: 1,\n b: [2,\n 3]\n}").unwrap();
		assert_eq!(object.len(), 1);
	}

	#[test]
	fn unfinished_input_is_incomplete() {
		for source in ["f(1,\n", "1 +\n", "{ a: 1", "[1, 2", "repl.", "x = "] {
			assert!(matches!(parse(source), Err(ParseError::Incomplete(_))), "{source}");
		}
	}

	#[test]
	fn wrong_input_is_invalid() {
		for source in ["1 +* 2", ")", "1 2", "3 = 4", "f(1 2)"] {
			assert!(matches!(parse(source), Err(ParseError::Invalid { .. })), "{source}");
		}
	}

	#[test]
	fn deep_nesting_is_rejected() {
		for source in ["(".repeat(50_000), "-".repeat(50_000), "a".to_string() + &".b".repeat(MAX_DEPTH + 1)] {
			assert_eq!(
				parse(&source),
				Err(ParseError::Invalid {
					message: "too much recursion".to_string(),
					line: 1,
				})
			);
		}
		let modest = format!("{}1{}", "(".repeat(100), ")".repeat(100));
		assert_eq!(parse(&modest).unwrap().len(), 1);
	}

	#[test]
	fn blank_input_has_no_statements() {
		assert!(parse(" \n ; \n").unwrap().is_empty());
	}
}
