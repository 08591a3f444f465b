//! Route file literals
//!
//! Route files hold one list literal per line, either of quoted IP strings
//! (`['10.0.0.1', '10.0.0.2']`) or of coordinate pairs
//! (`[(34.05, -118.24), (50.11, 8.68)]`). Lines are parsed by a small
//! recursive descent parser that only understands lists, tuples, strings
//! and numbers.

use crate::models::{CoordRoute, Coordinate, IpRoute};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Parse failure with the byte offset where it happened
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid literal at offset {position}: {message}")]
pub struct LiteralError {
    pub position: usize,
    pub message: String,
}

/// Parsed literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Number(f64),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn expect_end(&mut self) -> Result<(), LiteralError> {
        self.skip_whitespace();
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(self.error(format!("unexpected trailing character {c:?}"))),
        }
    }

    fn value(&mut self) -> Result<Literal, LiteralError> {
        self.skip_whitespace();
        match self.peek() {
            Some('[') => self.sequence('[', ']').map(Literal::List),
            Some('(') => self.sequence('(', ')').map(Literal::Tuple),
            Some(q @ ('\'' | '"')) => self.string(q).map(Literal::Str),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
                self.number().map(Literal::Number)
            }
            Some(c) => Err(self.error(format!("unexpected character {c:?}"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<Vec<Literal>, LiteralError> {
        debug_assert_eq!(self.peek(), Some(open));
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(items),
                Some(c) => return Err(self.error(format!("expected ',' or {close:?}, found {c:?}"))),
                None => return Err(self.error(format!("unterminated sequence, expected {close:?}"))),
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String, LiteralError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    Some(c) => return Err(self.error(format!("unsupported escape \\{c}"))),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn number(&mut self) -> Result<f64, LiteralError> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
        ) {
            self.bump();
        }
        let text = &self.input[start..self.pos];
        text.parse::<f64>().map_err(|_| LiteralError {
            position: start,
            message: format!("invalid number {text:?}"),
        })
    }
}

/// Parse a single literal expression
pub fn parse_literal(input: &str) -> Result<Literal, LiteralError> {
    let mut parser = Parser::new(input);
    let value = parser.value()?;
    parser.expect_end()?;
    Ok(value)
}

/// Parse one IP route line: a list of strings
pub fn parse_ip_route(line: &str) -> Result<IpRoute, LiteralError> {
    match parse_literal(line)? {
        Literal::List(items) => items
            .into_iter()
            .map(|item| match item {
                Literal::Str(ip) => Ok(ip),
                other => Err(LiteralError {
                    position: 0,
                    message: format!("expected IP string, found {other:?}"),
                }),
            })
            .collect(),
        other => Err(LiteralError {
            position: 0,
            message: format!("expected list of IP strings, found {other:?}"),
        }),
    }
}

fn coordinate_from_literal(value: Literal) -> Result<Coordinate, LiteralError> {
    match value {
        Literal::Tuple(items) | Literal::List(items) => match items.as_slice() {
            [Literal::Number(lat), Literal::Number(lon)] => Ok(Coordinate::new(*lat, *lon)),
            _ => Err(LiteralError {
                position: 0,
                message: format!("expected (lat, long) pair, found {items:?}"),
            }),
        },
        other => Err(LiteralError {
            position: 0,
            message: format!("expected (lat, long) pair, found {other:?}"),
        }),
    }
}

/// Parse one coordinate route line: a list of `(lat, long)` tuples
pub fn parse_coordinate_route(line: &str) -> Result<CoordRoute, LiteralError> {
    match parse_literal(line)? {
        Literal::List(items) => items
            .into_iter()
            .map(coordinate_from_literal)
            .collect::<Result<Vec<_>, _>>()
            .map(CoordRoute::new),
        other => Err(LiteralError {
            position: 0,
            message: format!("expected list of coordinates, found {other:?}"),
        }),
    }
}

/// Parse a pipe-joined canonical route: `(a, b)|(c, d)`
pub fn parse_canonical_route(canonical: &str) -> Result<CoordRoute, LiteralError> {
    canonical
        .split('|')
        .map(|token| parse_literal(token).and_then(coordinate_from_literal))
        .collect::<Result<Vec<_>, _>>()
        .map(CoordRoute::new)
}

/// Render a coordinate route as one route file line (without newline)
pub fn format_route_line(route: &CoordRoute) -> String {
    let hops: Vec<String> = route.hops().iter().map(|c| c.to_string()).collect();
    format!("[{}]", hops.join(", "))
}

fn read_routes<T>(
    reader: impl Read,
    source: &str,
    parse: impl Fn(&str) -> Result<T, LiteralError>,
) -> Result<Vec<T>> {
    let mut routes = Vec::new();
    for (line_no, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {source} line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let route = parse(&line)
            .with_context(|| format!("Malformed route on {source} line {}", line_no + 1))?;
        routes.push(route);
    }
    Ok(routes)
}

fn open_routes_file(path: &Path) -> Result<File> {
    info!(path = %path.display(), "Loading routes");
    File::open(path).with_context(|| format!("Failed to open routes file {}", path.display()))
}

/// Read a file of IP routes
pub fn read_ip_routes(path: impl AsRef<Path>) -> Result<Vec<IpRoute>> {
    let path = path.as_ref();
    let routes = read_routes(open_routes_file(path)?, &path.display().to_string(), parse_ip_route)?;
    info!(path = %path.display(), routes = routes.len(), "Loaded routes");
    Ok(routes)
}

/// Read a file of coordinate routes
pub fn read_coordinate_routes(path: impl AsRef<Path>) -> Result<Vec<CoordRoute>> {
    let path = path.as_ref();
    let routes = read_routes(
        open_routes_file(path)?,
        &path.display().to_string(),
        parse_coordinate_route,
    )?;
    info!(path = %path.display(), routes = routes.len(), "Loaded routes");
    Ok(routes)
}

/// Read IP routes from an arbitrary reader
pub fn read_ip_routes_from(reader: impl Read) -> Result<Vec<IpRoute>> {
    read_routes(reader, "input", parse_ip_route)
}

/// Read coordinate routes from an arbitrary reader
pub fn read_coordinate_routes_from(reader: impl Read) -> Result<Vec<CoordRoute>> {
    read_routes(reader, "input", parse_coordinate_route)
}
