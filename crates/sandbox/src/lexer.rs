//! Tokenizer for sandbox source text.

use crate::parser::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
	Number(f64),
	Str(String),
	Ident(String),
	True,
	False,
	Null,
	Undefined,
	This,
	LParen,
	RParen,
	LBracket,
	RBracket,
	LBrace,
	RBrace,
	Comma,
	Colon,
	Semicolon,
	Dot,
	Newline,
	Plus,
	Minus,
	Star,
	Slash,
	Percent,
	Bang,
	Assign,
	Eq,
	NotEq,
	Lt,
	LtEq,
	Gt,
	GtEq,
	And,
	Or,
}

impl std::fmt::Display for Token {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Token::Number(n) => write!(f, "{n}"),
			Token::Str(s) => write!(f, "{s:?}"),
			Token::Ident(name) => f.write_str(name),
			Token::True => f.write_str("true"),
			Token::False => f.write_str("false"),
			Token::Null => f.write_str("null"),
			Token::Undefined => f.write_str("undefined"),
			Token::This => f.write_str("this"),
			Token::LParen => f.write_str("("),
			Token::RParen => f.write_str(")"),
			Token::LBracket => f.write_str("["),
			Token::RBracket => f.write_str("]"),
			Token::LBrace => f.write_str("{"),
			Token::RBrace => f.write_str("}"),
			Token::Comma => f.write_str(","),
			Token::Colon => f.write_str(":"),
			Token::Semicolon => f.write_str(";"),
			Token::Dot => f.write_str("."),
			Token::Newline => f.write_str("line break"),
			Token::Plus => f.write_str("+"),
			Token::Minus => f.write_str("-"),
			Token::Star => f.write_str("*"),
			Token::Slash => f.write_str("/"),
			Token::Percent => f.write_str("%"),
			Token::Bang => f.write_str("!"),
			Token::Assign => f.write_str("="),
			Token::Eq => f.write_str("=="),
			Token::NotEq => f.write_str("!="),
			Token::Lt => f.write_str("<"),
			Token::LtEq => f.write_str("<="),
			Token::Gt => f.write_str(">"),
			Token::GtEq => f.write_str(">="),
			Token::And => f.write_str("&&"),
			Token::Or => f.write_str("||"),
		}
	}
}

/// A token and the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
	pub token: Token,
	pub line: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ParseError> {
	let mut tokens = Vec::new();
	let mut chars = source.chars().peekable();
	let mut line = 1;

	while let Some(c) = chars.next() {
		let token = match c {
			'\n' => {
				let token = Spanned {
					token: Token::Newline,
					line,
				};
				line += 1;
				tokens.push(token);
				continue;
			}
			c if c.is_whitespace() => continue,
			'/' if chars.peek() == Some(&'/') => {
				while chars.peek().is_some_and(|&next| next != '\n') {
					chars.next();
				}
				continue;
			}
			'0'..='9' => {
				let mut literal = String::from(c);
				while let Some(&next) = chars.peek() {
					if next.is_ascii_digit() || next == '.' {
						literal.push(next);
						chars.next();
					} else {
						break;
					}
				}
				let value = literal.parse::<f64>().map_err(|_| ParseError::Invalid {
					message: format!("malformed number {literal}"),
					line,
				})?;
				Token::Number(value)
			}
			'"' | '\'' => Token::Str(read_string(&mut chars, c, &mut line)?),
			c if c.is_alphabetic() || c == '_' || c == '$' => {
				let mut word = String::from(c);
				while let Some(&next) = chars.peek() {
					if next.is_alphanumeric() || next == '_' || next == '$' {
						word.push(next);
						chars.next();
					} else {
						break;
					}
				}
				keyword(word)
			}
			'(' => Token::LParen,
			')' => Token::RParen,
			'[' => Token::LBracket,
			']' => Token::RBracket,
			'{' => Token::LBrace,
			'}' => Token::RBrace,
			',' => Token::Comma,
			':' => Token::Colon,
			';' => Token::Semicolon,
			'.' => Token::Dot,
			'+' => Token::Plus,
			'-' => Token::Minus,
			'*' => Token::Star,
			'/' => Token::Slash,
			'%' => Token::Percent,
			'!' if chars.next_if_eq(&'=').is_some() => Token::NotEq,
			'!' => Token::Bang,
			'=' if chars.next_if_eq(&'=').is_some() => Token::Eq,
			'=' => Token::Assign,
			'<' if chars.next_if_eq(&'=').is_some() => Token::LtEq,
			'<' => Token::Lt,
			'>' if chars.next_if_eq(&'=').is_some() => Token::GtEq,
			'>' => Token::Gt,
			'&' if chars.next_if_eq(&'&').is_some() => Token::And,
			'|' if chars.next_if_eq(&'|').is_some() => Token::Or,
			other => {
				return Err(ParseError::Invalid {
					message: format!("illegal character {other:?}"),
					line,
				});
			}
		};
		tokens.push(Spanned { token, line });
	}
	Ok(tokens)
}

fn read_string(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, quote: char, line: &mut usize) -> Result<String, ParseError> {
	let mut text = String::new();
	loop {
		match chars.next() {
			None => return Err(ParseError::Incomplete("unterminated string literal".to_string())),
			Some(c) if c == quote => return Ok(text),
			Some('\\') => match chars.next() {
				None => return Err(ParseError::Incomplete("unterminated string literal".to_string())),
				Some('n') => text.push('\n'),
				Some('t') => text.push('\t'),
				Some('\n') => *line += 1,
				Some(other) => text.push(other),
			},
			Some('\n') => {
				return Err(ParseError::Invalid {
					message: "unterminated string literal".to_string(),
					line: *line,
				});
			}
			Some(c) => text.push(c),
		}
	}
}

fn keyword(word: String) -> Token {
	match word.as_str() {
		"true" => Token::True,
		"false" => Token::False,
		"null" => Token::Null,
		"undefined" => Token::Undefined,
		"this" => Token::This,
		_ => Token::Ident(word),
	}
}
