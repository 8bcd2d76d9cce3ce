//! Low-level byte parsing shared by the Newick and NEXUS readers.
//!
//! [ByteParser] walks over an in-memory buffer of ASCII text and provides
//! peeking, consuming and label parsing. Errors are reported as
//! [ParsingError] carrying the byte position and some context.

pub mod byte_parser;
pub mod parsing_error;

pub use byte_parser::{ByteParser, ConsumeMode};
pub use parsing_error::{ParsingError, ParsingErrorType};
