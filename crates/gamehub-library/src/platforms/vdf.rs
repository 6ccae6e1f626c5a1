//! Text KeyValues (`.vdf` / `.acf`) parsing
//!
//! Steam stores library folders and app manifests as nested quoted
//! key/value pairs:
//!
//! ```text
//! "AppState"
//! {
//!     "appid"      "440"
//!     "StateFlags" "4"
//! }
//! ```

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Deepest section nesting accepted before a document is rejected
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct VdfError {
    pub line: usize,
    pub reason: String,
}

/// A value is either a string or a nested section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvValue {
    String(String),
    Section(KeyValues),
}

/// Ordered key/value pairs. Keys compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValues {
    entries: Vec<(String, KvValue)>,
}

impl KeyValues {
    pub fn get(&self, key: &str) -> Option<&KvValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            KvValue::String(s) => Some(s),
            KvValue::Section(_) => None,
        }
    }

    pub fn section(&self, key: &str) -> Option<&KeyValues> {
        match self.get(key)? {
            KvValue::Section(s) => Some(s),
            KvValue::String(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KvValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Str(String),
    Open,
    Close,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn error(&self, reason: impl Into<String>) -> VdfError {
        VdfError {
            line: self.line,
            reason: reason.into(),
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                self.line += 1;
                self.chars.next();
            } else if c.is_whitespace() {
                self.chars.next();
            } else if c == '/' {
                // `//` comment to end of line
                let mut ahead = self.chars.clone();
                ahead.next();
                if ahead.peek() != Some(&'/') {
                    return;
                }
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.chars.next();
                }
            } else {
                return;
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, VdfError> {
        loop {
            self.skip_trivia();
            let Some(&c) = self.chars.peek() else {
                return Ok(None);
            };

            match c {
                '{' => {
                    self.chars.next();
                    return Ok(Some(Token::Open));
                }
                '}' => {
                    self.chars.next();
                    return Ok(Some(Token::Close));
                }
                '"' => {
                    self.chars.next();
                    return self.quoted().map(|s| Some(Token::Str(s)));
                }
                '[' => {
                    // Platform conditionals like [$WIN32] are ignored
                    for c in self.chars.by_ref() {
                        if c == ']' {
                            break;
                        }
                    }
                }
                _ => return Ok(Some(Token::Str(self.bare()))),
            }
        }
    }

    fn quoted(&mut self) -> Result<String, VdfError> {
        let mut out = String::new();
        while let Some(c) = self.chars.next() {
            match c {
                '"' => return Ok(out),
                '\\' => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => break,
                },
                '\n' => {
                    self.line += 1;
                    out.push(c);
                }
                _ => out.push(c),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn bare(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | '"') {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out
    }
}

/// Parse a whole document into its top-level pairs
pub fn parse(input: &str) -> Result<KeyValues, VdfError> {
    let mut lexer = Lexer::new(input.trim_start_matches('\u{feff}'));
    let root = parse_section(&mut lexer, 0)?;
    Ok(root)
}

fn parse_section(lexer: &mut Lexer<'_>, depth: usize) -> Result<KeyValues, VdfError> {
    let nested = depth > 0;
    let mut section = KeyValues::default();

    loop {
        let key = match lexer.next_token()? {
            Some(Token::Str(key)) => key,
            Some(Token::Close) if nested => return Ok(section),
            Some(Token::Close) => return Err(lexer.error("unexpected '}'")),
            Some(Token::Open) => return Err(lexer.error("expected key, found '{'")),
            None if nested => return Err(lexer.error("unexpected end of input")),
            None => return Ok(section),
        };

        let value = match lexer.next_token()? {
            Some(Token::Str(value)) => KvValue::String(value),
            Some(Token::Open) if depth >= MAX_DEPTH => {
                return Err(lexer.error("nesting too deep"));
            }
            Some(Token::Open) => KvValue::Section(parse_section(lexer, depth + 1)?),
            Some(Token::Close) | None => {
                return Err(lexer.error(format!("missing value for '{key}'")));
            }
        };

        section.entries.push((key, value));
    }
}

/// Read and parse a file
pub fn load(path: &Path) -> Result<KeyValues, crate::ScanError> {
    let text = fs::read_to_string(path)?;
    parse(&text).map_err(|e| crate::ScanError::manifest(path, e.to_string()))
}
