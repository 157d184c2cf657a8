//! Reader for the protobuf text format used by `METADATA.pb` files.
//!
//! Only the subset the family records use is supported: scalar fields
//! (`key: "string"`, `key: 400`, `key: IDENT`), nested messages
//! (`key { ... }`, `key: { ... }` or `key < ... >`), repeated fields, adjacent
//! string concatenation and `#` comments. Values stay untyped until a
//! getter asks for them, so unknown fields cost nothing.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct TextProtoError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A quoted string, escapes resolved.
    String(String),
    /// Anything unquoted: numbers, enum names, `true`/`false`.
    Literal(String),
    Message(Message),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    fields: Vec<(String, Value)>,
}

impl Message {
    /// Every value stored under `name`, in file order.
    pub fn values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Value> + 'a {
        let name = name.to_string();
        self.fields
            .iter()
            .filter(move |(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// The last occurrence of a singular string field, as protobuf does.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.values(name)
            .filter_map(|value| match value {
                Value::String(s) => Some(s.as_str()),
                _ => None,
            })
            .last()
    }

    pub fn strings<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.values(name).filter_map(|value| match value {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.values(name)
            .filter_map(|value| match value {
                Value::Literal(s) => parse_int(s),
                _ => None,
            })
            .last()
    }

    pub fn messages<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Message> + 'a {
        self.values(name).filter_map(|value| match value {
            Value::Message(m) => Some(m),
            _ => None,
        })
    }
}

fn parse_int(s: &str) -> Option<i64> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

// ─── Tokenizer ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Colon,
    Open(char),
    Close(char),
    Separator,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> TextProtoError {
        TextProtoError {
            line: self.line,
            message: message.into(),
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn skip_trivia(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else if ch.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<(Token, usize)>, TextProtoError> {
        self.skip_trivia();
        let line = self.line;
        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };
        let token = match ch {
            ':' => {
                self.bump();
                Token::Colon
            }
            '{' | '<' => {
                self.bump();
                Token::Open(ch)
            }
            '}' | '>' => {
                self.bump();
                Token::Close(ch)
            }
            ',' | ';' => {
                self.bump();
                Token::Separator
            }
            '"' | '\'' => Token::Str(self.string(ch)?),
            c if c.is_alphanumeric() || matches!(c, '_' | '-' | '+' | '.') => {
                let mut ident = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c.is_alphanumeric() || matches!(c, '_' | '-' | '+' | '.') {
                        ident.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                Token::Ident(ident)
            }
            other => return Err(self.error(format!("unexpected character '{}'", other))),
        };
        Ok(Some((token, line)))
    }

    fn string(&mut self, quote: char) -> Result<String, TextProtoError> {
        self.bump();
        let mut bytes = Vec::new();
        loop {
            let ch = self.bump().ok_or_else(|| self.error("unterminated string"))?;
            match ch {
                c if c == quote => break,
                '\n' => return Err(self.error("newline in string")),
                '\\' => {
                    let escaped = self.bump().ok_or_else(|| self.error("unterminated string"))?;
                    match escaped {
                        'n' => bytes.push(b'\n'),
                        't' => bytes.push(b'\t'),
                        'r' => bytes.push(b'\r'),
                        'a' => bytes.push(0x07),
                        'b' => bytes.push(0x08),
                        'f' => bytes.push(0x0C),
                        'v' => bytes.push(0x0B),
                        '\\' | '\'' | '"' | '?' => bytes.push(escaped as u8),
                        'x' => {
                            let mut value = 0u32;
                            let mut digits = 0;
                            while let Some(d) = self.chars.peek().and_then(|c| c.to_digit(16)) {
                                if digits == 2 {
                                    break;
                                }
                                value = value * 16 + d;
                                digits += 1;
                                self.bump();
                            }
                            if digits == 0 {
                                return Err(self.error("\\x with no hex digits"));
                            }
                            bytes.push(value as u8);
                        }
                        '0'..='7' => {
                            let mut value = escaped.to_digit(8).unwrap_or(0);
                            for _ in 0..2 {
                                match self.chars.peek().and_then(|c| c.to_digit(8)) {
                                    Some(d) => {
                                        value = value * 8 + d;
                                        self.bump();
                                    }
                                    None => break,
                                }
                            }
                            bytes.push(value as u8);
                        }
                        other => return Err(self.error(format!("unknown escape '\\{}'", other))),
                    }
                }
                c => {
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
        // Escapes may spell out UTF-8 byte by byte.
        String::from_utf8(bytes).map_err(|_| self.error("string is not valid UTF-8"))
    }
}

// ─── Parser ─────────────────────────────────────────────────────

/// Parse a whole text-format document into its top-level message.
pub fn parse(input: &str) -> Result<Message, TextProtoError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        eof_line: lexer.line,
        depth: 0,
    };
    parser.message(None)
}

/// Deepest `{ ... }` nesting accepted. Family records use two levels.
pub const MAX_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    eof_line: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, line)| *line)
            .unwrap_or(self.eof_line)
    }

    fn error(&self, message: impl Into<String>) -> TextProtoError {
        TextProtoError {
            line: self.line(),
            message: message.into(),
        }
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        self.pos += 1;
        token
    }

    /// Fields until `close` (or end of input at top level).
    fn message(&mut self, close: Option<char>) -> Result<Message, TextProtoError> {
        let mut message = Message::default();
        loop {
            match self.peek() {
                None => {
                    return match close {
                        None => Ok(message),
                        Some(c) => Err(self.error(format!("expected '{}' before end of input", c))),
                    };
                }
                Some(Token::Close(c)) => {
                    let c = *c;
                    if close == Some(c) {
                        self.pos += 1;
                        return Ok(message);
                    }
                    return Err(self.error(format!("unexpected '{}'", c)));
                }
                Some(Token::Separator) => {
                    self.pos += 1;
                }
                Some(Token::Ident(_)) => {
                    let (name, value) = self.field()?;
                    message.fields.push((name, value));
                }
                Some(other) => {
                    let found = format!("{:?}", other);
                    return Err(self.error(format!("expected field name, found {}", found)));
                }
            }
        }
    }

    fn field(&mut self) -> Result<(String, Value), TextProtoError> {
        let Some(Token::Ident(name)) = self.next() else {
            return Err(self.error("expected field name"));
        };
        let had_colon = matches!(self.peek(), Some(Token::Colon));
        if had_colon {
            self.pos += 1;
        }
        match self.next() {
            Some(Token::Open(open)) => {
                let close = if open == '{' { '}' } else { '>' };
                if self.depth >= MAX_DEPTH {
                    self.pos -= 1;
                    return Err(self.error("nesting too deep"));
                }
                self.depth += 1;
                let message = self.message(Some(close))?;
                self.depth -= 1;
                Ok((name, Value::Message(message)))
            }
            Some(Token::Str(first)) if had_colon => {
                let mut s = first;
                while let Some(Token::Str(next)) = self.peek() {
                    s.push_str(next);
                    self.pos += 1;
                }
                Ok((name, Value::String(s)))
            }
            Some(Token::Ident(literal)) if had_colon => Ok((name, Value::Literal(literal))),
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.error(format!("expected value for field '{}'", name)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# This file is generated.
name: "ABeeZee"
designer: "Anja Meiners"
license: "OFL"
category: "SANS_SERIF"
date_added: "2012-09-30"
fonts {
  name: "ABeeZee"
  style: "normal"
  weight: 400
  filename: "ABeeZee-Regular.ttf"
  post_script_name: "ABeeZee-Regular"
  full_name: "ABeeZee Regular"
  copyright: "Copyright " "2011"
}
fonts {
  name: "ABeeZee"
  style: "italic"
  weight: 400
  filename: "ABeeZee-Italic.ttf"
  full_name: "ABeeZee Italic"
}
subsets: "latin"
axes: < tag: "wght" min_value: 100.0 max_value: 900.0 >
aliases: "A Bee Zee"
aliases: "ABZ"
"#;

    #[test]
    fn test_parse_sample() {
        let msg = parse(SAMPLE).unwrap();
        assert_eq!(msg.string("name"), Some("ABeeZee"));
        assert_eq!(msg.string("date_added"), Some("2012-09-30"));
        assert_eq!(msg.strings("aliases").collect::<Vec<_>>(), vec!["A Bee Zee", "ABZ"]);

        let fonts: Vec<_> = msg.messages("fonts").collect();
        assert_eq!(fonts.len(), 2);
        assert_eq!(fonts[0].int("weight"), Some(400));
        assert_eq!(fonts[0].string("copyright"), Some("Copyright 2011"));
        assert_eq!(fonts[1].string("filename"), Some("ABeeZee-Italic.ttf"));

        let axes = msg.messages("axes").next().unwrap();
        assert_eq!(axes.string("tag"), Some("wght"));
    }

    #[test]
    fn test_escapes() {
        let msg = parse(r#"name: "Caf\303\251 \"Q\"\x21\n""#).unwrap();
        assert_eq!(msg.string("name"), Some("Café \"Q\"!\n"));
    }

    #[test]
    fn test_int_forms() {
        let msg = parse("a: -12 b: 0x1F c: BOLD").unwrap();
        assert_eq!(msg.int("a"), Some(-12));
        assert_eq!(msg.int("b"), Some(31));
        assert_eq!(msg.int("c"), None);
    }

    #[test]
    fn test_unterminated_message_reports_line() {
        let err = parse("name: \"x\"\nfonts {\n  weight: 400\n").unwrap_err();
        assert_eq!(err.line, 4);
        assert!(err.message.contains("'}'"));
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let input = format!("{}{}", "a {".repeat(10_000), "}".repeat(10_000));
        let err = parse(&input).unwrap_err();
        assert_eq!(err.message, "nesting too deep");
        assert_eq!(err.line, 1);

        let ok = format!("{}{}", "a {".repeat(MAX_DEPTH), "}".repeat(MAX_DEPTH));
        assert!(parse(&ok).is_ok());
    }

    #[test]
    fn test_unterminated_string() {
        let err = parse("name: \"abc").unwrap_err();
        assert_eq!(err.message, "unterminated string");
    }

    #[test]
    fn test_missing_value() {
        let err = parse("name:\n}").unwrap_err();
        assert_eq!(err.line, 2);
    }
}
