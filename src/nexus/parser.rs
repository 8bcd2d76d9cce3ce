//! Reads the TAXA and TREES blocks of a NEXUS file.

use crate::model::{LeafLabelMap, RawTreeSet, Tree};
use crate::newick::{LabelResolver, NewickParser};
use crate::nexus::defs::{NEXUS_LABEL_DELIMITERS, NexusBlock};
use crate::parser::{ByteParser, ConsumeMode, ParsingError};

/// Parses a NEXUS file into a [RawTreeSet].
///
/// Blocks before the TREES block are skipped unless they are a TAXA block;
/// anything after the TREES block is ignored.
pub(crate) fn parse_nexus(parser: &mut ByteParser) -> Result<RawTreeSet, ParsingError> {
    parse_nexus_header(parser)?;

    let mut labels = None;
    loop {
        parser.skip_comment_and_whitespace()?;
        if parser.is_eof() {
            return Err(ParsingError::invalid_trees_block(parser, "No TREES block found"));
        }

        match detect_next_block(parser)? {
            NexusBlock::Taxa => labels = Some(parse_taxa_block(parser)?),
            NexusBlock::Trees => {
                let labels = labels.unwrap_or_default();
                return parse_trees_block(parser, labels);
            }
            other => {
                log::debug!("Skipping NEXUS block {other:?}");
                skip_to_block_end(parser)?;
            }
        }
    }
}

/// Parses the `#NEXUS` header.
fn parse_nexus_header(parser: &mut ByteParser) -> Result<(), ParsingError> {
    parser.skip_comment_and_whitespace()?;
    if !parser.consume_if_sequence(b"#NEXUS") {
        return Err(ParsingError::missing_nexus_header(parser));
    }
    Ok(())
}

/// Parses `BEGIN <name>;` and returns the block type.
fn detect_next_block(parser: &mut ByteParser) -> Result<NexusBlock, ParsingError> {
    if !parser.consume_if_sequence(b"BEGIN") {
        return Err(ParsingError::invalid_block_name(parser));
    }
    parser.skip_comment_and_whitespace()?;

    let start = parser.position();
    if !parser.consume_until(b';', ConsumeMode::Exclusive) {
        return Err(ParsingError::unexpected_eof(parser));
    }
    let name = std::str::from_utf8(parser.slice_from(start))
        .map_err(|_| ParsingError::invalid_block_name(parser))?
        .to_string();
    parser.next();

    Ok(NexusBlock::from_name(&name))
}

/// Skips to after the next `END;` (or `ENDBLOCK;`).
fn skip_to_block_end(parser: &mut ByteParser) -> Result<(), ParsingError> {
    loop {
        if !parser.consume_until_sequence(b"END", ConsumeMode::Inclusive) {
            return Err(ParsingError::unexpected_eof(parser));
        }
        parser.consume_if_sequence(b"BLOCK");
        parser.skip_whitespace();
        if parser.consume_if(b';') {
            return Ok(());
        }
    }
}

// ============================================================================
// TAXA block
// ============================================================================
/// Parses `DIMENSIONS NTAX=n;` and `TAXLABELS a b c;`, in this order.
fn parse_taxa_block(parser: &mut ByteParser) -> Result<LeafLabelMap, ParsingError> {
    let num_taxa = parse_ntax(parser)?;

    parser.skip_comment_and_whitespace()?;
    if !parser.consume_if_sequence(b"TAXLABELS") {
        return Err(ParsingError::invalid_taxa_block(parser, "Expected 'TAXLABELS' in TAXA block"));
    }

    let mut labels = LeafLabelMap::new();
    loop {
        parser.skip_comment_and_whitespace()?;
        match parser.peek() {
            None => return Err(ParsingError::unexpected_eof(parser)),
            Some(b';') => {
                parser.next();
                break;
            }
            Some(_) => {
                let label = parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
                if label.is_empty() {
                    return Err(ParsingError::invalid_taxa_block(parser, "Empty taxon label"));
                }
                labels.get_or_insert(&label);
            }
        }
    }

    if labels.num_labels() != num_taxa {
        return Err(ParsingError::invalid_taxa_block(
            parser,
            format!(
                "Number of labels ({}) does not match NTAX ({num_taxa})",
                labels.num_labels()
            ),
        ));
    }

    skip_to_block_end(parser)?;
    Ok(labels)
}

fn parse_ntax(parser: &mut ByteParser) -> Result<usize, ParsingError> {
    parser.skip_comment_and_whitespace()?;
    if !parser.consume_if_sequence(b"DIMENSIONS") {
        return Err(ParsingError::invalid_taxa_block(parser, "Expected 'DIMENSIONS' in TAXA block"));
    }
    parser.skip_whitespace();
    if !parser.consume_if_sequence(b"NTAX") {
        return Err(ParsingError::invalid_taxa_block(parser, "Expected 'NTAX' in TAXA block"));
    }
    parser.skip_whitespace();
    if !parser.consume_if(b'=') {
        return Err(ParsingError::invalid_taxa_block(parser, "Expected '=' after 'NTAX'"));
    }
    parser.skip_whitespace();

    let start = parser.position();
    if !parser.consume_until(b';', ConsumeMode::Exclusive) {
        return Err(ParsingError::unexpected_eof(parser));
    }
    let text = String::from_utf8_lossy(parser.slice_from(start)).trim().to_string();
    let ntax = text
        .parse()
        .map_err(|_| ParsingError::invalid_taxa_block(parser, format!("Cannot parse NTAX value '{text}'")))?;
    parser.next();

    Ok(ntax)
}

// ============================================================================
// TREES block
// ============================================================================
/// Parses an optional `TRANSLATE` command followed by `tree name = newick;` commands.
fn parse_trees_block(parser: &mut ByteParser, labels: LeafLabelMap) -> Result<RawTreeSet, ParsingError> {
    let translation = parse_translate(parser)?;
    // with a TAXA block, leaves may also be 1-based taxon numbers
    let resolver = match translation {
        Some(translation) => LabelResolver::translated(translation, labels),
        None if !labels.is_empty() => LabelResolver::translated(Vec::new(), labels),
        None => LabelResolver::Verbatim(labels),
    };

    let mut newick_parser = NewickParser::new().with_resolver(resolver);
    let mut trees: Vec<Tree> = Vec::new();
    loop {
        parser.skip_comment_and_whitespace()?;
        if parser.is_eof() {
            return Err(ParsingError::unexpected_eof(parser));
        }
        if parser.peek_is_sequence(b"END") {
            skip_to_block_end(parser)?;
            break;
        }

        if !parser.consume_if_sequence(b"TREE") {
            return Err(ParsingError::invalid_trees_block(parser, "Expected 'tree' command"));
        }
        let name = parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b'=') {
            return Err(ParsingError::invalid_trees_block(parser, "Expected '=' after tree name"));
        }

        // `[&R]` and `[&U]` are comments here
        let tree = newick_parser.parse(parser)?.with_name(name);
        trees.push(tree);
    }

    Ok(RawTreeSet::new(trees, newick_parser.into_leaf_label_map()))
}

/// Parses `TRANSLATE key label, key label, ...;` if present.
fn parse_translate(parser: &mut ByteParser) -> Result<Option<Vec<(String, String)>>, ParsingError> {
    parser.skip_comment_and_whitespace()?;
    if !parser.consume_if_sequence(b"TRANSLATE") {
        return Ok(None);
    }

    let mut translation = Vec::new();
    loop {
        let key = parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
        let label = parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
        if key.is_empty() || label.is_empty() {
            return Err(ParsingError::invalid_translate_command(parser, "Expected pair of key and label"));
        }
        if translation.iter().any(|(k, _)| *k == key) {
            return Err(ParsingError::invalid_translate_command(parser, format!("Duplicate key '{key}'")));
        }
        translation.push((key, label));

        parser.skip_comment_and_whitespace()?;
        match parser.next() {
            Some(b',') => {
                // a trailing comma before `;` is tolerated
                parser.skip_comment_and_whitespace()?;
                if parser.consume_if(b';') {
                    break;
                }
            }
            Some(b';') => break,
            Some(b) => {
                return Err(ParsingError::invalid_translate_command(
                    parser,
                    format!("Unexpected '{}' in TRANSLATE", b as char),
                ));
            }
            None => return Err(ParsingError::unexpected_eof(parser)),
        }
    }

    Ok(Some(translation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_end_accepts_endblock() {
        let mut parser = ByteParser::for_str("something; ENDBLOCK; BEGIN");
        skip_to_block_end(&mut parser).unwrap();
        parser.skip_whitespace();
        assert!(parser.peek_is_sequence(b"begin"));
    }

    #[test]
    fn translate_with_trailing_comma() {
        let mut parser = ByteParser::for_str("Translate 1 A, 2 'B b',;");
        let translation = parse_translate(&mut parser).unwrap().unwrap();
        assert_eq!(
            translation,
            vec![("1".to_string(), "A".to_string()), ("2".to_string(), "B b".to_string())]
        );
    }
}
