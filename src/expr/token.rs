//! Hand-rolled tokenizer for ruleset-authored expressions.
//!
//! There's no dependency here to lean on: the expression grammar is
//! small and specific to this engine, so the lexer is a plain
//! byte-at-a-time hand-written scan rather than pulling in a
//! parser-combinator crate for a dozen token kinds.

use crate::error::ParseError;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    String(String),
    Identifier(String),
    True,
    False,
    LParen,
    RParen,
    Comma,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b'(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            b',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            b'.' if !bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => {
                tokens.push(Token::Dot);
                i += 1;
            }
            b'+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            b'-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            b'*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            b'/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            b'%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            b'=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::EqEq);
                    i += 2;
                } else {
                    return Err(ParseError::Tokenize {
                        pos: i,
                        reason: "expected `==`".into(),
                    });
                }
            }
            b'!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::NotEq);
                    i += 2;
                } else {
                    tokens.push(Token::Bang);
                    i += 1;
                }
            }
            b'<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::LtEq);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            b'>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::GtEq);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            b'&' => {
                if bytes.get(i + 1) == Some(&b'&') {
                    tokens.push(Token::AndAnd);
                    i += 2;
                } else {
                    return Err(ParseError::Tokenize {
                        pos: i,
                        reason: "expected `&&`".into(),
                    });
                }
            }
            b'|' => {
                if bytes.get(i + 1) == Some(&b'|') {
                    tokens.push(Token::OrOr);
                    i += 2;
                } else {
                    return Err(ParseError::Tokenize {
                        pos: i,
                        reason: "expected `||`".into(),
                    });
                }
            }
            b'"' => {
                let start = i;
                i += 1;
                let mut s = String::new();
                loop {
                    match bytes.get(i) {
                        Some(b'"') => {
                            i += 1;
                            break;
                        }
                        Some(b'\\') => {
                            let escaped = bytes.get(i + 1).ok_or_else(|| ParseError::Tokenize {
                                pos: i,
                                reason: "unterminated escape at end of input".into(),
                            })?;
                            s.push(match escaped {
                                b'n' => '\n',
                                b't' => '\t',
                                b'\\' => '\\',
                                b'"' => '"',
                                b'\'' => '\'',
                                other => {
                                    return Err(ParseError::Tokenize {
                                        pos: i,
                                        reason: format!("unsupported escape `\\{}`", *other as char),
                                    });
                                }
                            });
                            i += 2;
                        }
                        Some(&b) => {
                            s.push(b as char);
                            i += 1;
                        }
                        None => {
                            return Err(ParseError::Tokenize {
                                pos: start,
                                reason: "unterminated string literal".into(),
                            });
                        }
                    }
                }
                tokens.push(Token::String(s));
            }
            b'0'..=b'9' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                let text = &src[start..i];
                if text.ends_with('.') {
                    return Err(ParseError::Tokenize {
                        pos: start,
                        reason: format!("trailing decimal point in number literal `{text}`"),
                    });
                }
                let n: f64 = text.parse().map_err(|_| ParseError::Tokenize {
                    pos: start,
                    reason: format!("invalid number literal `{text}`"),
                })?;
                tokens.push(Token::Number(n));
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                let text = &src[start..i];
                tokens.push(match text {
                    "true" => Token::True,
                    "false" => Token::False,
                    _ => Token::Identifier(text.to_string()),
                });
            }
            other => {
                return Err(ParseError::Tokenize {
                    pos: i,
                    reason: format!("unexpected character `{}`", other as char),
                });
            }
        }
    }

    Ok(tokens)
}
