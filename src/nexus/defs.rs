//! NEXUS block names and keywords.

/// Label delimiters within NEXUS commands
pub(crate) const NEXUS_LABEL_DELIMITERS: &[u8] = b" ,;=\t\n\r";

/// Block types of a NEXUS file; only TAXA and TREES are read, the others are skipped.
#[derive(Debug, PartialEq, Clone)]
pub(crate) enum NexusBlock {
    Taxa,
    Trees,
    Data,
    Characters,
    Assumptions,
    Unknown(String),
}

impl NexusBlock {
    /// Parses a block name (case-insensitive).
    pub(crate) fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "taxa" => NexusBlock::Taxa,
            "trees" => NexusBlock::Trees,
            "data" => NexusBlock::Data,
            "characters" => NexusBlock::Characters,
            "assumptions" => NexusBlock::Assumptions,
            _ => NexusBlock::Unknown(name.to_string()),
        }
    }
}
