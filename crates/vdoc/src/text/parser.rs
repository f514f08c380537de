//! Relaxed JSON parsing into [`Node`] trees.
//!
//! The grammar accepts double- or single-quoted strings, case-insensitive
//! `true`/`false`/`null`, integer literals, `{}` documents, and `[]` arrays.
//! Fractional numbers are rejected by design; only integers parse.
//!
//! The parser is an explicit state machine: an enum state (value expected,
//! key expected, separator expected) plus a stack of currently open
//! containers. The resulting tree is identical in shape to what binary
//! decoding of the equivalent document produces, so text and binary input
//! are interchangeable upstream.
//!
//! Empty or whitespace-only input yields an empty document.

use std::collections::BTreeMap;

use log::trace;

use crate::error::ParseError;
use crate::limits::MAX_DEPTH;
use crate::model::Node;

/// Parses relaxed JSON text into a node tree.
pub fn parse_json(input: &str) -> Result<Node, ParseError> {
    Parser::new(input).parse()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// A value may start here.
    PreValue,
    /// A value just completed; expecting `,`, `}`, `]`, or end of input.
    PostValue,
    /// Inside a document, expecting a key or `}`.
    ExpectKey,
    /// Between a key and its value.
    ExpectColon,
}

enum Open {
    Document {
        children: BTreeMap<String, Node>,
        pending_key: Option<String>,
    },
    Array(Vec<Node>),
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
    stack: Vec<Open>,
    state: State,
    result: Option<Node>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            stack: Vec::new(),
            state: State::PreValue,
            result: None,
        }
    }

    fn parse(mut self) -> Result<Node, ParseError> {
        loop {
            self.skip_whitespace();
            let Some(b) = self.peek() else { break };
            match self.state {
                State::PreValue => self.pre_value(b)?,
                State::PostValue => self.post_value(b)?,
                State::ExpectKey => self.expect_key(b)?,
                State::ExpectColon => {
                    if b == b':' {
                        self.bump();
                        self.state = State::PreValue;
                    } else {
                        return Err(self.err("expected ':' after key"));
                    }
                }
            }
        }

        if !self.stack.is_empty() {
            return Err(self.err("unexpected end of input"));
        }
        Ok(self.result.unwrap_or_else(Node::new_document))
    }

    // =========================================================================
    // States
    // =========================================================================

    fn pre_value(&mut self, b: u8) -> Result<(), ParseError> {
        match b {
            b'"' | b'\'' => {
                self.bump();
                let s = self.string_body(b)?;
                self.complete(Node::new_string(s))
            }
            b't' | b'T' => {
                self.keyword("true")?;
                self.complete(Node::new_boolean(true))
            }
            b'f' | b'F' => {
                self.keyword("false")?;
                self.complete(Node::new_boolean(false))
            }
            b'n' | b'N' => {
                self.keyword("null")?;
                self.complete(Node::new_null())
            }
            b'-' | b'.' | b'0'..=b'9' => {
                let v = self.integer()?;
                self.complete(Node::new_int64(v))
            }
            b'[' => {
                self.bump();
                self.open(Open::Array(Vec::new()))
                // Still pre-value: next is the first element or `]`.
            }
            b'{' => {
                self.bump();
                self.open(Open::Document {
                    children: BTreeMap::new(),
                    pending_key: None,
                })?;
                self.state = State::ExpectKey;
                Ok(())
            }
            b']' => {
                self.bump();
                let node = self.close_array()?;
                self.complete(node)
            }
            _ => Err(self.err(format!("unexpected character {:?}", b as char))),
        }
    }

    fn post_value(&mut self, b: u8) -> Result<(), ParseError> {
        match b {
            b',' => {
                self.bump();
                match self.stack.last() {
                    Some(Open::Document { .. }) => self.state = State::ExpectKey,
                    Some(Open::Array(_)) => self.state = State::PreValue,
                    None => return Err(self.err("unexpected ',' outside of a container")),
                }
                Ok(())
            }
            b'}' => {
                self.bump();
                let node = self.close_document()?;
                self.complete(node)
            }
            b']' => {
                self.bump();
                let node = self.close_array()?;
                self.complete(node)
            }
            _ => Err(self.err(format!(
                "expected ',' or closing bracket, found {:?}",
                b as char
            ))),
        }
    }

    fn expect_key(&mut self, b: u8) -> Result<(), ParseError> {
        match b {
            b'"' | b'\'' => {
                self.bump();
                let key = self.string_body(b)?;
                match self.stack.last_mut() {
                    Some(Open::Document { pending_key, .. }) => {
                        *pending_key = Some(key);
                    }
                    _ => return Err(self.err("key outside of a document")),
                }
                self.state = State::ExpectColon;
                Ok(())
            }
            b'}' => {
                self.bump();
                let node = self.close_document()?;
                self.complete(node)
            }
            _ => Err(self.err(format!("expected key or '}}', found {:?}", b as char))),
        }
    }

    // =========================================================================
    // Container stack
    // =========================================================================

    fn open(&mut self, container: Open) -> Result<(), ParseError> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(self.err("nesting too deep"));
        }
        trace!("text parser: opening container at line {}", self.line);
        self.stack.push(container);
        Ok(())
    }

    fn close_document(&mut self) -> Result<Node, ParseError> {
        trace!("text parser: closing document at line {}", self.line);
        match self.stack.pop() {
            Some(Open::Document { children, .. }) => Ok(Node::Document(children)),
            Some(Open::Array(_)) => Err(self.err("'}' closes an open array")),
            None => Err(self.err("unmatched '}'")),
        }
    }

    fn close_array(&mut self) -> Result<Node, ParseError> {
        trace!("text parser: closing array at line {}", self.line);
        match self.stack.pop() {
            Some(Open::Array(items)) => Ok(Node::Array(items)),
            Some(Open::Document { .. }) => Err(self.err("']' closes an open document")),
            None => Err(self.err("unmatched ']'")),
        }
    }

    /// Attaches a completed value to the enclosing container, or records it
    /// as the top-level result.
    fn complete(&mut self, node: Node) -> Result<(), ParseError> {
        let (line, column) = (self.line, self.column);
        match self.stack.last_mut() {
            Some(Open::Document {
                children,
                pending_key,
            }) => match pending_key.take() {
                Some(key) => {
                    children.insert(key, node);
                }
                None => {
                    return Err(ParseError::new(line, column, "value without a key"));
                }
            },
            Some(Open::Array(items)) => items.push(node),
            None => {
                if self.result.is_some() {
                    return Err(ParseError::new(line, column, "multiple top-level values"));
                }
                self.result = Some(node);
            }
        }
        self.state = State::PostValue;
        Ok(())
    }

    // =========================================================================
    // Lexing
    // =========================================================================

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) {
        if let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if b & 0xC0 != 0x80 {
                // Count characters, not UTF-8 continuation bytes.
                self.column += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\n' | b'\r' | b'\t')) {
            self.bump();
        }
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.line, self.column, message)
    }

    /// Matches a keyword case-insensitively, consuming it.
    fn keyword(&mut self, expected: &'static str) -> Result<(), ParseError> {
        for want in expected.bytes() {
            let Some(b) = self.peek() else {
                return Err(self.err("unexpected end of value"));
            };
            if !b.eq_ignore_ascii_case(&want) {
                return Err(self.err(format!("unexpected value, expected {expected:?}")));
            }
            self.bump();
        }
        Ok(())
    }

    /// Reads the body of a quoted string, the opening quote already
    /// consumed. Handles the standard escapes; an unknown escape passes the
    /// following character through literally.
    fn string_body(&mut self, quote: u8) -> Result<String, ParseError> {
        let mut buf: Vec<u8> = Vec::new();
        loop {
            let Some(b) = self.peek() else {
                return Err(self.err("unterminated string"));
            };
            self.bump();
            if b == quote {
                break;
            }
            if b == b'\\' {
                let Some(esc) = self.peek() else {
                    return Err(self.err("unterminated string"));
                };
                self.bump();
                match esc {
                    b'"' => buf.push(b'"'),
                    b'\\' => buf.push(b'\\'),
                    b'/' => buf.push(b'/'),
                    b'b' => buf.push(0x08),
                    b'f' => buf.push(0x0C),
                    b'n' => buf.push(b'\n'),
                    b'r' => buf.push(b'\r'),
                    b't' => buf.push(b'\t'),
                    other => buf.push(other),
                }
                continue;
            }
            buf.push(b);
        }
        String::from_utf8(buf).map_err(|_| self.err("invalid utf-8 in string"))
    }

    /// Reads an integer literal. A literal containing `.` is rejected:
    /// decimal values are not supported.
    fn integer(&mut self) -> Result<i64, ParseError> {
        let mut text = String::new();
        let mut decimal = false;
        if self.peek() == Some(b'-') {
            text.push('-');
            self.bump();
        }
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => {
                    text.push(b as char);
                    self.bump();
                }
                b'.' => {
                    decimal = true;
                    self.bump();
                }
                _ => break,
            }
        }
        if decimal {
            return Err(self.err("decimal values are not supported"));
        }
        if text.is_empty() || text == "-" {
            return Err(self.err("malformed number"));
        }
        text.parse::<i64>()
            .map_err(|_| self.err("integer literal out of range"))
    }
}
