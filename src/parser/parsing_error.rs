//! Error type for reading tree-set files.
//!
//! [ParsingError] records what went wrong ([ParsingErrorType]), the byte
//! position in the input, and a short snippet of the input following it.

use crate::parser::byte_parser::ByteParser;
use std::error::Error;
use std::fmt;

/// Default number of bytes shown as context in error messages
const DEFAULT_CONTEXT_LENGTH: usize = 50;

// =#========================================================================#=
// PARSING ERROR TYPE
// =#========================================================================#=
/// Kinds of errors when reading NEXUS files and Newick strings.
#[derive(PartialEq, Debug, Clone)]
pub enum ParsingErrorType {
    /// Reading the underlying file failed
    IoError(String),
    /// Input ended in the middle of a construct
    UnexpectedEOF,
    /// NEXUS input does not start with `#NEXUS`
    MissingNexusHeader,
    /// Block name after `Begin` could not be read
    InvalidBlockName,
    /// TAXA block is malformed
    InvalidTaxaBlock(String),
    /// TREES block is malformed
    InvalidTreesBlock(String),
    /// TRANSLATE command is inconsistent with the TAXA block
    InvalidTranslateCommand(String),
    /// `[` without matching `]`
    UnclosedComment,
    /// `'` without matching `'`
    UnclosedQuote,
    /// Newick string is malformed
    InvalidNewickString(String),
    /// Branch length is not a non-negative finite number
    InvalidBranchLength(String),
    /// Leaf label cannot be mapped to a taxon
    UnresolvedLabel(String),
}

// =#========================================================================#=
// PARSING ERROR
// =#========================================================================#=
/// Parsing error with position and context (the bytes following the position).
#[derive(Debug)]
pub struct ParsingError {
    kind: ParsingErrorType,
    position: usize,
    context: String,
}

impl ParsingError {
    /// Creates a [ParsingError] of the given kind at the current parser position.
    pub fn from_parser(kind: ParsingErrorType, parser: &ByteParser) -> Self {
        Self {
            kind,
            position: parser.position(),
            context: parser.context_as_string(DEFAULT_CONTEXT_LENGTH),
        }
    }

    /// Convenience constructor for [ParsingErrorType::UnexpectedEOF]
    pub fn unexpected_eof(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorType::UnexpectedEOF, parser)
    }

    /// Convenience constructor for [ParsingErrorType::MissingNexusHeader]
    pub fn missing_nexus_header(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorType::MissingNexusHeader, parser)
    }

    /// Convenience constructor for [ParsingErrorType::InvalidBlockName]
    pub fn invalid_block_name(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorType::InvalidBlockName, parser)
    }

    /// Convenience constructor for [ParsingErrorType::InvalidTaxaBlock]
    pub fn invalid_taxa_block(parser: &ByteParser, msg: impl Into<String>) -> Self {
        Self::from_parser(ParsingErrorType::InvalidTaxaBlock(msg.into()), parser)
    }

    /// Convenience constructor for [ParsingErrorType::InvalidTreesBlock]
    pub fn invalid_trees_block(parser: &ByteParser, msg: impl Into<String>) -> Self {
        Self::from_parser(ParsingErrorType::InvalidTreesBlock(msg.into()), parser)
    }

    /// Convenience constructor for [ParsingErrorType::InvalidTranslateCommand]
    pub fn invalid_translate_command(parser: &ByteParser, msg: impl Into<String>) -> Self {
        Self::from_parser(ParsingErrorType::InvalidTranslateCommand(msg.into()), parser)
    }

    /// Convenience constructor for [ParsingErrorType::UnclosedComment]
    pub fn unclosed_comment(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorType::UnclosedComment, parser)
    }

    /// Convenience constructor for [ParsingErrorType::UnclosedQuote]
    pub fn unclosed_quote(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorType::UnclosedQuote, parser)
    }

    /// Convenience constructor for [ParsingErrorType::InvalidNewickString]
    pub fn invalid_newick_string(parser: &ByteParser, msg: impl Into<String>) -> Self {
        Self::from_parser(ParsingErrorType::InvalidNewickString(msg.into()), parser)
    }

    /// Convenience constructor for [ParsingErrorType::InvalidBranchLength]
    pub fn invalid_branch_length(parser: &ByteParser, msg: impl Into<String>) -> Self {
        Self::from_parser(ParsingErrorType::InvalidBranchLength(msg.into()), parser)
    }

    /// Convenience constructor for [ParsingErrorType::UnresolvedLabel]
    pub fn unresolved_label(parser: &ByteParser, msg: impl Into<String>) -> Self {
        Self::from_parser(ParsingErrorType::UnresolvedLabel(msg.into()), parser)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> &ParsingErrorType {
        &self.kind
    }

    /// Returns the byte position where the error occurred.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ParsingErrorType::IoError(msg) => return write!(f, "IO error - {msg}"),
            ParsingErrorType::UnexpectedEOF => write!(f, "Unexpected end of input")?,
            ParsingErrorType::MissingNexusHeader => write!(f, "Input does not start with #NEXUS header")?,
            ParsingErrorType::InvalidBlockName => write!(f, "Invalid block name")?,
            ParsingErrorType::InvalidTaxaBlock(msg) => write!(f, "Invalid TAXA block - {msg}")?,
            ParsingErrorType::InvalidTreesBlock(msg) => write!(f, "Invalid TREES block - {msg}")?,
            ParsingErrorType::InvalidTranslateCommand(msg) => write!(f, "Invalid TRANSLATE command - {msg}")?,
            ParsingErrorType::UnclosedComment => write!(f, "Unclosed comment")?,
            ParsingErrorType::UnclosedQuote => write!(f, "Unclosed quoted label")?,
            ParsingErrorType::InvalidNewickString(msg) => write!(f, "Invalid Newick string - {msg}")?,
            ParsingErrorType::InvalidBranchLength(msg) => write!(f, "Invalid branch length - {msg}")?,
            ParsingErrorType::UnresolvedLabel(msg) => write!(f, "Could not resolve label - {msg}")?,
        }

        write!(f, " at position {}", self.position)?;
        if !self.context.is_empty() {
            write!(f, "\n  Context (next {} bytes): {}", self.context.len(), self.context)?;
        }

        Ok(())
    }
}

impl Error for ParsingError {}

impl From<std::io::Error> for ParsingError {
    fn from(err: std::io::Error) -> Self {
        ParsingError {
            kind: ParsingErrorType::IoError(err.to_string()),
            position: 0,
            context: String::new(),
        }
    }
}
