//! Named operation documents.
//!
//! A document holds any number of `query`/`mutation` blocks of the form
//! `kind name (args) { body }`. Blocks are found with a brace-depth scanner
//! that skips string literals and `#` comments.

use std::collections::HashMap;

use fieldgate_core::{OperationKind, ProjectionParams};

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// OperationDocument
// ---------------------------------------------------------------------------

/// Source text of one named operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDocument {
    kind: OperationKind,
    name: String,
    text: String,
    /// Offset of the `{` opening the operation body.
    body_open: usize,
}

impl OperationDocument {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the selection set of the operation's root field with the
    /// fragment formatted from `projection`.
    ///
    /// An empty projection, or a document whose body has no root field,
    /// is returned unchanged.
    #[must_use]
    pub fn with_projection(&self, projection: &ProjectionParams) -> Self {
        let Some(fragment) = projection.to_fragment() else {
            return self.clone();
        };

        let mut scanner = Scanner::at(&self.text, self.body_open + 1);
        scanner.skip_ignored();
        if scanner.read_ident().is_none() {
            return self.clone();
        }
        scanner.skip_ignored();
        if scanner.peek() == Some(b':') {
            scanner.bump();
            scanner.skip_ignored();
            if scanner.read_ident().is_none() {
                return self.clone();
            }
        }
        let field_end = scanner.pos;
        scanner.skip_ignored();
        let mut insert_at = field_end;
        if scanner.peek() == Some(b'(') {
            match scanner.skip_balanced(b'(', b')') {
                Some(end) => insert_at = end + 1,
                None => return self.clone(),
            }
            scanner.bump();
            scanner.skip_ignored();
        }

        let mut text = String::with_capacity(self.text.len() + fragment.len());
        if scanner.peek() == Some(b'{') {
            let open = scanner.pos;
            let Some(close) = scanner.skip_balanced(b'{', b'}') else {
                return self.clone();
            };
            text.push_str(&self.text[..open]);
            text.push_str(&fragment);
            text.push_str(&self.text[close + 1..]);
        } else {
            text.push_str(&self.text[..insert_at]);
            text.push(' ');
            text.push_str(&fragment);
            text.push_str(&self.text[insert_at..]);
        }

        Self {
            kind: self.kind,
            name: self.name.clone(),
            text,
            body_open: self.body_open,
        }
    }
}

// ---------------------------------------------------------------------------
// OperationStore
// ---------------------------------------------------------------------------

/// Operation documents keyed by operation name. Immutable once parsed.
#[derive(Debug, Clone, Default)]
pub struct OperationStore {
    operations: HashMap<String, OperationDocument>,
}

impl OperationStore {
    /// Extracts every named `query`/`mutation` block from `source`.
    ///
    /// Anonymous operations and other top-level definitions are skipped.
    ///
    /// # Errors
    ///
    /// Fails on a repeated operation name or an operation whose braces or
    /// parentheses never close.
    pub fn parse(source: &str) -> Result<Self, StoreError> {
        let mut operations = HashMap::new();
        let mut scanner = Scanner::at(source, 0);

        while let Some(byte) = scanner.peek() {
            match byte {
                b'#' => scanner.skip_comment(),
                b'"' => scanner.skip_string(),
                b'{' => {
                    if scanner.skip_balanced(b'{', b'}').is_none() {
                        break;
                    }
                    scanner.bump();
                }
                b if is_ident_start(b) => {
                    let start = scanner.pos;
                    let Some(word) = scanner.read_ident() else {
                        continue;
                    };
                    let Some(kind) = OperationKind::from_keyword(word) else {
                        continue;
                    };
                    if let Some(document) = read_operation(&mut scanner, source, start, kind)? {
                        let name = document.name.clone();
                        if operations.insert(name.clone(), document).is_some() {
                            return Err(StoreError::DuplicateOperation { name });
                        }
                    }
                }
                _ => scanner.bump(),
            }
        }

        Ok(Self { operations })
    }

    /// # Errors
    ///
    /// Returns [`StoreError::UnknownOperation`] if no operation has this name.
    pub fn find(&self, name: &str) -> Result<&OperationDocument, StoreError> {
        self.operations
            .get(name)
            .ok_or_else(|| StoreError::UnknownOperation {
                name: name.to_string(),
            })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }
}

/// Reads the rest of an operation after its keyword. Returns `None` for
/// anonymous operations, which are skipped.
fn read_operation(
    scanner: &mut Scanner<'_>,
    source: &str,
    start: usize,
    kind: OperationKind,
) -> Result<Option<OperationDocument>, StoreError> {
    scanner.skip_ignored();
    let Some(name) = scanner.read_ident().map(str::to_string) else {
        return Ok(None);
    };

    scanner.skip_ignored();
    if scanner.peek() == Some(b'(') {
        if scanner.skip_balanced(b'(', b')').is_none() {
            return Err(StoreError::Unbalanced { name });
        }
        scanner.bump();
        scanner.skip_ignored();
    }

    if scanner.peek() != Some(b'{') {
        return Ok(None);
    }
    let body_open = scanner.pos - start;
    let Some(close) = scanner.skip_balanced(b'{', b'}') else {
        return Err(StoreError::Unbalanced { name });
    };
    scanner.bump();

    Ok(Some(OperationDocument {
        kind,
        name,
        text: source[start..=close].to_string(),
        body_open,
    }))
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Byte cursor over document text. Only ever stops on ASCII bytes, so
/// every position it reports is a valid `str` boundary.
struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn at(src: &'a str, pos: usize) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) {
        if self.pos < self.bytes.len() {
            self.pos += 1;
        }
    }

    /// Skips whitespace, commas and comments.
    fn skip_ignored(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b'#' => self.skip_comment(),
                b',' => self.bump(),
                b if b.is_ascii_whitespace() => self.bump(),
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(b) = self.peek() {
            self.bump();
            if b == b'\n' {
                break;
            }
        }
    }

    /// Skips a `"..."` or `"""..."""` literal starting at the cursor.
    fn skip_string(&mut self) {
        if self.bytes[self.pos..].starts_with(b"\"\"\"") {
            self.pos += 3;
            while self.pos < self.bytes.len() {
                if self.bytes[self.pos..].starts_with(b"\\\"\"\"") {
                    self.pos += 4;
                } else if self.bytes[self.pos..].starts_with(b"\"\"\"") {
                    self.pos += 3;
                    return;
                } else {
                    self.pos += 1;
                }
            }
            return;
        }

        self.bump();
        while let Some(b) = self.peek() {
            self.bump();
            match b {
                b'\\' => self.bump(),
                b'"' | b'\n' => return,
                _ => {}
            }
        }
    }

    fn read_ident(&mut self) -> Option<&'a str> {
        let start = self.pos;
        if !self.peek().is_some_and(is_ident_start) {
            return None;
        }
        while self.peek().is_some_and(is_ident) {
            self.pos += 1;
        }
        Some(&self.src[start..self.pos])
    }

    /// With the cursor on `open`, moves to its matching `close` and returns
    /// that position. Returns `None` if the input ends first.
    fn skip_balanced(&mut self, open: u8, close: u8) -> Option<usize> {
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            match b {
                b'"' => {
                    self.skip_string();
                    continue;
                }
                b'#' => {
                    self.skip_comment();
                    continue;
                }
                b if b == open => depth += 1,
                b if b == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(self.pos);
                    }
                }
                _ => {}
            }
            self.bump();
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
