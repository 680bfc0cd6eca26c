//! Reader for the libconfig text format used by the switch configuration.
//!
//! Settings are returned as a `serde_json` object so that typed
//! configuration structs can be filled in with `serde`.

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

pub fn parse(text: &str) -> Result<Map<String, Value>, ParseError> {
    let mut parser = Parser::new(text);
    let settings = parser.settings()?;
    parser.skip_blank()?;
    match parser.peek() {
        None => Ok(settings),
        Some(c) => Err(parser.error(format!("syntax error near '{}'", c as char))),
    }
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            src: text.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.line,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    // whitespace plus `#`, `//` and `/* */` comments
    fn skip_blank(&mut self) -> Result<(), ParseError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_ascii_whitespace() => {
                    self.bump();
                }
                (Some(b'#'), _) | (Some(b'/'), Some(b'/')) => {
                    while let Some(c) = self.bump() {
                        if c == b'\n' {
                            break;
                        }
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    let start = self.line;
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some(b'*'), Some(b'/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => {
                                return Err(ParseError {
                                    line: start,
                                    message: "unterminated comment".into(),
                                });
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn settings(&mut self) -> Result<Map<String, Value>, ParseError> {
        let mut settings = Map::new();
        loop {
            self.skip_blank()?;
            match self.peek() {
                Some(c) if is_name_start(c) => {
                    let name = self.name();
                    if settings.contains_key(&name) {
                        return Err(self.error(format!("duplicate setting name '{name}'")));
                    }
                    self.skip_blank()?;
                    if !self.eat(b'=') && !self.eat(b':') {
                        return Err(self.error(format!("expected '=' or ':' after '{name}'")));
                    }
                    let value = self.value()?;
                    self.skip_blank()?;
                    let _ = self.eat(b';') || self.eat(b',');
                    settings.insert(name, value);
                }
                Some(b'@') => return Err(self.error("include directives are not supported")),
                _ => return Ok(settings),
            }
        }
    }

    fn name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, b'-' | b'_' | b'*') {
                self.pos += 1;
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        self.skip_blank()?;
        match self.peek() {
            Some(b'{') => {
                self.bump();
                let group = self.settings()?;
                self.skip_blank()?;
                if !self.eat(b'}') {
                    return Err(self.error("expected '}' to close group"));
                }
                Ok(Value::Object(group))
            }
            Some(b'[') => {
                self.bump();
                self.sequence(b']', true)
            }
            Some(b'(') => {
                self.bump();
                self.sequence(b')', false)
            }
            _ => self.scalar(),
        }
    }

    fn sequence(&mut self, close: u8, scalars_only: bool) -> Result<Value, ParseError> {
        let mut items = Vec::new();
        loop {
            self.skip_blank()?;
            if self.eat(close) {
                return Ok(Value::Array(items));
            }
            if !items.is_empty() {
                if !self.eat(b',') {
                    return Err(self.error(format!("expected ',' or '{}'", close as char)));
                }
                self.skip_blank()?;
            }
            let item = if scalars_only { self.scalar()? } else { self.value()? };
            items.push(item);
        }
    }

    fn scalar(&mut self) -> Result<Value, ParseError> {
        self.skip_blank()?;
        match self.peek() {
            Some(b'"') => self.string(),
            Some(c) if c.is_ascii_digit() || matches!(c, b'-' | b'+' | b'.') => self.number(),
            Some(c) if c.is_ascii_alphabetic() => {
                let word = self.name();
                if word.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if word.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(self.error(format!("unexpected word '{word}'")))
                }
            }
            Some(c) => Err(self.error(format!("syntax error near '{}'", c as char))),
            None => Err(self.error("unexpected end of file")),
        }
    }

    fn string(&mut self) -> Result<Value, ParseError> {
        let mut bytes = Vec::new();
        loop {
            self.skip_blank()?;
            if !self.eat(b'"') {
                break;
            }
            loop {
                match self.bump() {
                    Some(b'"') => break,
                    Some(b'\\') => {
                        let escaped = match self.bump() {
                            Some(b'n') => b'\n',
                            Some(b't') => b'\t',
                            Some(b'r') => b'\r',
                            Some(b'f') => 0x0c,
                            Some(b'\\') => b'\\',
                            Some(b'"') => b'"',
                            Some(b'x') => self.hex_escape()?,
                            _ => return Err(self.error("invalid escape sequence")),
                        };
                        bytes.push(escaped);
                    }
                    Some(c) => bytes.push(c),
                    None => return Err(self.error("unterminated string")),
                }
            }
        }
        Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn hex_escape(&mut self) -> Result<u8, ParseError> {
        let digits = [self.bump(), self.bump()];
        let text: Option<String> = digits.iter().map(|d| d.map(char::from)).collect();
        text.and_then(|t| u8::from_str_radix(&t, 16).ok())
            .ok_or_else(|| self.error("invalid \\x escape"))
    }

    fn number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let exponent_sign = matches!(c, b'-' | b'+')
                && matches!(self.src.get(self.pos.wrapping_sub(1)), Some(b'e' | b'E'))
                && !self.src[start..self.pos].starts_with(b"0x");
            if c.is_ascii_alphanumeric() || c == b'.' || exponent_sign || self.pos == start {
                self.pos += 1;
            } else {
                break;
            }
        }
        let token = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        parse_number(&token).ok_or_else(|| self.error(format!("invalid number '{token}'")))
    }
}

fn is_name_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'*'
}

fn parse_number(token: &str) -> Option<Value> {
    let (negative, body) = match token.as_bytes().first()? {
        b'-' => (true, &token[1..]),
        b'+' => (false, &token[1..]),
        _ => (false, token),
    };

    let lower = body.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        let hex = hex.trim_end_matches('l');
        let magnitude = i64::from_str_radix(hex, 16).ok()?;
        return Some(Value::Number(Number::from(if negative {
            -magnitude
        } else {
            magnitude
        })));
    }

    let is_float = lower.contains(['.', 'e']);
    if is_float {
        let value: f64 = body.parse().ok()?;
        return Number::from_f64(if negative { -value } else { value }).map(Value::Number);
    }

    let digits = lower.trim_end_matches('l');
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude: i64 = digits.parse().ok()?;
    Some(Value::Number(Number::from(if negative {
        -magnitude
    } else {
        magnitude
    })))
}
