//! Byte-by-byte reader for ASCII tree files.
//!
//! [ByteParser] owns the full input and keeps a cursor into it. It supports
//! case-insensitive keyword matching, skipping of whitespace and `[...]`
//! comments, and quote-aware label parsing as needed by NEXUS and Newick.

use crate::parser::parsing_error::ParsingError;
use std::path::Path;

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================#=
/// A cursor over an in-memory byte buffer with peek, consume and match operations.
///
/// All keyword matching is case-insensitive for ASCII, as NEXUS keywords are.
/// Labels are returned verbatim.
///
/// # Example
/// ```
/// use treeset::parser::ByteParser;
///
/// let mut parser = ByteParser::for_str("BEGIN TREES;");
/// assert!(parser.consume_if_sequence(b"begin"));
/// parser.skip_whitespace();
/// assert!(parser.peek_is_sequence(b"trees"));
/// ```
pub struct ByteParser {
    input: Vec<u8>,
    pos: usize,
}

impl ByteParser {
    /// Creates a parser over a copy of the given string.
    pub fn for_str(input: &str) -> Self {
        Self::from_vec(input.as_bytes().to_vec())
    }

    /// Creates a parser that owns the given bytes.
    pub fn from_vec(input: Vec<u8>) -> Self {
        Self { input, pos: 0 }
    }

    /// Reads the whole file into memory and creates a parser over it.
    ///
    /// # Errors
    /// Returns a [ParsingError] of kind `IoError` if the file cannot be read.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParsingError> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_vec(bytes))
    }

    /// Returns the current byte without consuming it, or `None` at EOF.
    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Returns the current byte and advances, or `None` at EOF.
    #[inline(always)]
    pub fn next(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Skips spaces, tabs, newlines and carriage returns.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Skips one `[...]` comment if the parser is positioned at `[`.
    ///
    /// # Returns
    /// * `Ok(true)` - a comment was consumed
    /// * `Ok(false)` - no comment at the current position
    ///
    /// # Errors
    /// Returns an `UnclosedComment` error if there is no closing `]`.
    pub fn skip_comment(&mut self) -> Result<bool, ParsingError> {
        if !self.consume_if(b'[') {
            return Ok(false);
        }
        if !self.consume_until(b']', ConsumeMode::Inclusive) {
            return Err(ParsingError::unclosed_comment(self));
        }
        Ok(true)
    }

    /// Skips any sequence of whitespace and comments.
    pub fn skip_comment_and_whitespace(&mut self) -> Result<(), ParsingError> {
        self.skip_whitespace();
        while self.skip_comment()? {
            self.skip_whitespace();
        }
        Ok(())
    }

    /// Checks whether the current byte equals `ch`, ignoring ASCII case.
    pub fn peek_is(&self, ch: u8) -> bool {
        self.peek().is_some_and(|b| b.eq_ignore_ascii_case(&ch))
    }

    /// Checks whether the upcoming bytes equal `sequence`, ignoring ASCII case.
    #[inline]
    pub fn peek_is_sequence(&self, sequence: &[u8]) -> bool {
        let end = self.pos + sequence.len();
        end <= self.input.len() && self.input[self.pos..end].eq_ignore_ascii_case(sequence)
    }

    /// Consumes the current byte if it equals `ch` (ignoring ASCII case).
    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek_is(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes `sequence` if the upcoming bytes match it (ignoring ASCII case).
    pub fn consume_if_sequence(&mut self, sequence: &[u8]) -> bool {
        if self.peek_is_sequence(sequence) {
            self.pos += sequence.len();
            true
        } else {
            false
        }
    }

    /// Consumes bytes until `target` is found.
    ///
    /// # Returns
    /// `true` if the target was found, `false` if EOF was reached first
    pub fn consume_until(&mut self, target: u8, mode: ConsumeMode) -> bool {
        while let Some(b) = self.peek() {
            if b == target {
                if mode == ConsumeMode::Inclusive {
                    self.pos += 1;
                }
                return true;
            }
            self.pos += 1;
        }
        false
    }

    /// Consumes bytes until the upcoming bytes match `sequence` (ignoring ASCII case).
    ///
    /// # Returns
    /// `true` if the sequence was found, `false` if EOF was reached first
    pub fn consume_until_sequence(&mut self, sequence: &[u8], mode: ConsumeMode) -> bool {
        while !self.is_eof() {
            if self.peek_is_sequence(sequence) {
                if mode == ConsumeMode::Inclusive {
                    self.pos += sequence.len();
                }
                return true;
            }
            self.pos += 1;
        }
        false
    }

    /// Returns whether all input has been consumed.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the bytes from `start` up to the current position,
    /// or an empty slice if `start` lies ahead of it.
    pub fn slice_from(&self, start: usize) -> &[u8] {
        if start <= self.pos {
            &self.input[start..self.pos]
        } else {
            &[]
        }
    }

    /// Returns up to `k` upcoming bytes as a (lossy) string, for error messages.
    pub fn context_as_string(&self, k: usize) -> String {
        let start = self.pos.min(self.input.len());
        let end = (self.pos + k).min(self.input.len());
        String::from_utf8_lossy(&self.input[start..end]).into_owned()
    }

    /// Parses a label, quoted or unquoted, after skipping whitespace and comments.
    ///
    /// # Arguments
    /// * `delimiters` - Bytes that terminate an unquoted label
    ///
    /// # Errors
    /// Returns an error on unclosed comments or quotes.
    pub fn parse_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        self.skip_comment_and_whitespace()?;

        if self.peek() == Some(b'\'') {
            self.parse_quoted_label()
        } else {
            Ok(self.parse_unquoted_label(delimiters))
        }
    }

    /// Parses a label enclosed in single quotes, where `''` stands for one quote,
    /// e.g. `'Wilson''s storm-petrel'`. Expects the parser at the opening quote.
    ///
    /// # Errors
    /// Returns an `UnclosedQuote` error if input ends before the closing quote.
    pub fn parse_quoted_label(&mut self) -> Result<String, ParsingError> {
        self.next();

        let mut label = Vec::new();
        loop {
            match self.next() {
                Some(b'\'') => {
                    if self.peek() == Some(b'\'') {
                        label.push(b'\'');
                        self.next();
                    } else {
                        break;
                    }
                }
                Some(b) => label.push(b),
                None => return Err(ParsingError::unclosed_quote(self)),
            }
        }

        Ok(String::from_utf8_lossy(&label).into_owned())
    }

    /// Parses an unquoted label up to (excluding) the first delimiter or EOF.
    pub fn parse_unquoted_label(&mut self, delimiters: &[u8]) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if delimiters.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }
}

/// Whether `consume_until` methods also consume the target they stop at.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ConsumeMode {
    /// Consume the target as well; the parser ends up right after it.
    Inclusive,
    /// Stop at the target; the parser ends up on it.
    Exclusive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_nested_whitespace_and_comments() {
        let mut parser = ByteParser::for_str("  [a comment] \n [&R] tree");
        parser.skip_comment_and_whitespace().unwrap();
        assert!(parser.peek_is_sequence(b"TREE"));
    }

    #[test]
    fn unclosed_comment_is_an_error() {
        let mut parser = ByteParser::for_str("[never closed");
        assert!(parser.skip_comment().is_err());
    }

    #[test]
    fn quoted_label_unescapes_quotes() {
        let mut parser = ByteParser::for_str("'Wilson''s storm-petrel',");
        let label = parser.parse_label(b",;").unwrap();
        assert_eq!(label, "Wilson's storm-petrel");
        assert_eq!(parser.peek(), Some(b','));
    }

    #[test]
    fn unclosed_quote_is_an_error() {
        let mut parser = ByteParser::for_str("'open");
        assert!(parser.parse_label(b",").is_err());
    }

    #[test]
    fn consume_modes() {
        let mut parser = ByteParser::for_str("tree t1 = (A,B);");
        assert!(parser.consume_until(b'=', ConsumeMode::Inclusive));
        parser.skip_whitespace();
        assert_eq!(parser.peek(), Some(b'('));

        assert!(parser.consume_until(b';', ConsumeMode::Exclusive));
        assert_eq!(parser.peek(), Some(b';'));
    }
}
