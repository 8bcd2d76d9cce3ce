//! NEXUS reader for tree sets.
//!
//! # Quick API
//! - [parse_file] / [parse_str]: read all trees into a [RawTreeSet]
//!
//! # Format
//! A NEXUS tree file consists of:
//! - the `#NEXUS` header
//! - an optional TAXA block: `DIMENSIONS NTAX=n;` followed by `TAXLABELS a b c;`
//! - a TREES block with an optional TRANSLATE command and `tree` commands
//!
//! Other blocks before the TREES block are skipped.
//!
//! ## TRANSLATE
//! - Comma separated pairs `key label`, terminated by a semicolon
//! - Keys are integers or short labels
//! - Labels with spaces or apostrophes are quoted: `'Wilson''s storm-petrel'`
//! - Without TAXA block, the TRANSLATE labels define the taxa in order of appearance
//!
//! ## Trees
//! - One tree per command: `tree <name> = [&R] <Newick string>;`
//! - Leaf labels are TRANSLATE keys, 1-based taxon numbers, or taxon names

mod defs;
mod parser;

pub(crate) use self::parser::parse_nexus;

use crate::model::RawTreeSet;
use crate::parser::{ByteParser, ParsingError};
use std::path::Path;

// ============================================================================
// QUICK PARSING API (pub)
// ============================================================================
/// Parses a NEXUS file and returns all trees with their shared label map.
///
/// # Errors
/// Returns an error if the file cannot be read or is malformed.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<RawTreeSet, ParsingError> {
    let mut byte_parser = ByteParser::from_file(path)?;
    parser::parse_nexus(&mut byte_parser)
}

/// Parses NEXUS content from a string.
///
/// # Example
/// ```
/// let nexus = "#NEXUS
/// BEGIN TREES;
///     TRANSLATE 1 Homo, 2 Pan, 3 Gorilla;
///     tree STATE_0 = [&R] ((1:0.5,2:0.5):1.0,3:1.5);
/// END;";
///
/// let raw = treeset::nexus::parse_str(nexus).unwrap();
/// assert_eq!(raw.len(), 1);
/// assert_eq!(raw.labels().get_index("Gorilla"), Some(2));
/// ```
pub fn parse_str<S: AsRef<str>>(nexus: S) -> Result<RawTreeSet, ParsingError> {
    let mut byte_parser = ByteParser::for_str(nexus.as_ref());
    parser::parse_nexus(&mut byte_parser)
}
