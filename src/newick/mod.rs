//! Newick parser for binary phylogenetic trees.
//!
//! # Quick API
//! * [parse_str] - parses a semicolon-separated list of Newick strings
//! * [parse_file] - the same for a file
//!
//! # Full API
//! Configure a [NewickParser] (e.g. with a [LabelResolver]) and feed it a
//! [ByteParser] positioned at the start of a tree.
//!
//! # Format
//! * `tree ::= vertex ';'`
//! * `vertex ::= leaf | internal_vertex`
//! * `internal_vertex ::= '(' vertex ',' vertex ')' [branch_length]`
//! * `leaf ::= label [branch_length]`
//! * `branch_length ::= ':' number`
//!
//! Labels can be quoted (`'Wilson''s storm-petrel'`), and `[...]` comments
//! as well as annotations may occur between elements.

mod parser;

pub use self::parser::{LabelResolver, NewickParser};

use crate::model::RawTreeSet;
use crate::parser::{ByteParser, ParsingError};
use std::path::Path;

// ============================================================================
// QUICK PARSING API (pub)
// ============================================================================
/// Parses all trees of a semicolon-separated list of Newick strings.
///
/// # Example
/// ```
/// let raw = treeset::newick::parse_str("(A:1,B:1);\n(B:2,A:2);").unwrap();
/// assert_eq!(raw.len(), 2);
/// assert_eq!(raw.labels().num_labels(), 2);
/// ```
pub fn parse_str<S: AsRef<str>>(newick: S) -> Result<RawTreeSet, ParsingError> {
    parse_all(ByteParser::for_str(newick.as_ref()))
}

/// Parses all trees of a file containing a semicolon-separated list of Newick strings.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<RawTreeSet, ParsingError> {
    parse_all(ByteParser::from_file(path)?)
}

pub(crate) fn parse_all(mut byte_parser: ByteParser) -> Result<RawTreeSet, ParsingError> {
    let mut newick_parser = NewickParser::new();
    let mut trees = Vec::new();

    byte_parser.skip_comment_and_whitespace()?;
    while !byte_parser.is_eof() {
        trees.push(newick_parser.parse(&mut byte_parser)?);
        byte_parser.skip_comment_and_whitespace()?;
    }

    Ok(RawTreeSet::new(trees, newick_parser.into_leaf_label_map()))
}
