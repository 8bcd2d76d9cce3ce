//! Parser for binary Newick trees.

use crate::model::{BranchLength, LabelIndex, LeafLabelMap, Tree, TreeIndex};
use crate::parser::{ByteParser, ParsingError};
use std::collections::HashMap;

/// Newick label delimiters: parentheses, comma, colon, semicolon, brackets, whitespace
const NEWICK_LABEL_DELIMITERS: &[u8] = b"([,:; \n\t\r)]";

/// Default guess for number of leaves, when unknown
const DEFAULT_NUM_LEAVES_GUESS: usize = 10;

/// Parser (configuration) for binary phylogenetic [Tree]s in Newick format.
///
/// Parses one tree per call to [NewickParser::parse]; all trees share one
/// [LabelResolver] and thus one [LeafLabelMap].
///
/// # Format
/// * tree ::= vertex ';'
/// * vertex ::= leaf | internal_vertex
/// * internal_vertex ::= '(' vertex ',' vertex ')' [branch_length]
/// * leaf ::= label [branch_length]
/// * branch_length ::= ':' number
///
/// Whitespace and `[...]` comments may occur between elements. Annotations
/// such as `[&rate=0.5]` are comments as well and skipped.
///
/// # Example
/// ```
/// use treeset::newick::NewickParser;
/// use treeset::parser::ByteParser;
///
/// let mut byte_parser = ByteParser::for_str("((A:1,B:1):0.5,C:1.5);");
/// let mut newick_parser = NewickParser::new();
/// let tree = newick_parser.parse(&mut byte_parser).unwrap();
/// let labels = newick_parser.into_leaf_label_map();
///
/// assert_eq!(tree.num_leaves(), 3);
/// assert_eq!(labels.get_index("C"), Some(2));
/// ```
pub struct NewickParser {
    num_leaves: usize,
    resolver: LabelResolver,
}

impl Default for NewickParser {
    fn default() -> Self {
        Self::new()
    }
}

impl NewickParser {
    /// Creates a parser that takes leaf labels verbatim.
    pub fn new() -> Self {
        Self {
            num_leaves: DEFAULT_NUM_LEAVES_GUESS,
            resolver: LabelResolver::Verbatim(LeafLabelMap::new()),
        }
    }

    /// Sets the expected number of leaves, used to pre-allocate trees.
    pub fn with_num_leaves(mut self, num_leaves: usize) -> Self {
        self.num_leaves = num_leaves;
        self
    }

    /// Sets the [LabelResolver] that maps labels in Newick strings to taxa.
    pub fn with_resolver(mut self, resolver: LabelResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Consumes the parser and returns the [LeafLabelMap] of all parsed trees.
    pub fn into_leaf_label_map(self) -> LeafLabelMap {
        self.resolver.into_leaf_label_map()
    }

    /// Parses a single Newick tree, up to and including its terminating `;`.
    ///
    /// # Errors
    /// Returns a [ParsingError] if the string is malformed, not binary,
    /// has an invalid branch length, or a label cannot be resolved.
    pub fn parse(&mut self, parser: &mut ByteParser) -> Result<Tree, ParsingError> {
        let mut tree = Tree::new(self.num_leaves);
        self.parse_root(parser, &mut tree)?;
        self.num_leaves = tree.num_leaves();
        Ok(tree)
    }

    /// Parses `(left,right)[:length];` and adds the root.
    fn parse_root(&mut self, parser: &mut ByteParser, tree: &mut Tree) -> Result<(), ParsingError> {
        parser.skip_comment_and_whitespace()?;
        let children = self.parse_children(parser, tree)?;

        // A root branch length is allowed but carries no information
        self.parse_branch_length(parser)?;

        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b';') {
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected ';' at end of tree but found {:?}", parser.peek().map(|b| b as char)),
            ));
        }

        tree.add_root(children);
        Ok(())
    }

    fn parse_vertex(&mut self, parser: &mut ByteParser, tree: &mut Tree) -> Result<TreeIndex, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        if parser.peek_is(b'(') {
            let children = self.parse_children(parser, tree)?;
            let branch_length = self.parse_branch_length(parser)?;
            Ok(tree.add_internal_vertex(children, branch_length))
        } else {
            self.parse_leaf(parser, tree)
        }
    }

    /// Parses `(left,right)`; anything but exactly two children is an error.
    fn parse_children(
        &mut self,
        parser: &mut ByteParser,
        tree: &mut Tree,
    ) -> Result<(TreeIndex, TreeIndex), ParsingError> {
        expect(parser, b'(', "before children")?;
        let left = self.parse_vertex(parser, tree)?;

        parser.skip_comment_and_whitespace()?;
        expect(parser, b',', "between children")?;
        let right = self.parse_vertex(parser, tree)?;

        parser.skip_comment_and_whitespace()?;
        expect(parser, b')', "after two children (only binary trees are supported)")?;

        Ok((left, right))
    }

    fn parse_leaf(&mut self, parser: &mut ByteParser, tree: &mut Tree) -> Result<TreeIndex, ParsingError> {
        let label = parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
        if label.is_empty() {
            return Err(ParsingError::invalid_newick_string(parser, "Expected leaf label"));
        }
        let taxon = self.resolver.resolve_label(&label, parser)?;
        let branch_length = self.parse_branch_length(parser)?;

        Ok(tree.add_leaf(taxon, branch_length))
    }

    /// Parses an optional `:number`, including scientific notation like `1.5e-10`.
    fn parse_branch_length(&mut self, parser: &mut ByteParser) -> Result<Option<BranchLength>, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b':') {
            return Ok(None);
        }
        parser.skip_comment_and_whitespace()?;

        let start = parser.position();
        while let Some(b) = parser.peek() {
            if b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E') {
                parser.next();
            } else {
                break;
            }
        }
        let text = String::from_utf8_lossy(parser.slice_from(start)).into_owned();

        let value: f64 = text
            .parse()
            .map_err(|_| ParsingError::invalid_branch_length(parser, format!("'{text}' is not a number")))?;
        BranchLength::new(value)
            .map(Some)
            .ok_or_else(|| ParsingError::invalid_branch_length(parser, format!("{value} is negative or not finite")))
    }
}

fn expect(parser: &mut ByteParser, byte: u8, location: &str) -> Result<(), ParsingError> {
    if parser.consume_if(byte) {
        return Ok(());
    }
    Err(ParsingError::invalid_newick_string(
        parser,
        format!(
            "Expected '{}' {location} but found {:?}",
            byte as char,
            parser.peek().map(|b| b as char)
        ),
    ))
}

// =#========================================================================#=
// LABEL RESOLVER
// =#========================================================================#=
/// Resolves leaf labels of Newick strings to indices in a [LeafLabelMap].
#[derive(Debug)]
pub enum LabelResolver {
    /// Labels are taxon names; new names are added to the map.
    Verbatim(LeafLabelMap),

    /// Labels as used in a NEXUS TREES block, tried in this order:
    /// 1. a key of the TRANSLATE command
    /// 2. a 1-based integer into the taxa definition order
    /// 3. a verbatim taxon name
    Translated {
        index_map: HashMap<String, LabelIndex>,
        leaf_label_map: LeafLabelMap,
    },
}

impl LabelResolver {
    /// Creates a resolver for NEXUS trees.
    ///
    /// Labels of `translation` unknown to `leaf_label_map` are appended to it,
    /// so a TRANSLATE command alone may define the taxa.
    pub fn translated(translation: Vec<(String, String)>, mut leaf_label_map: LeafLabelMap) -> Self {
        let index_map = translation
            .into_iter()
            .map(|(key, label)| {
                let index = leaf_label_map.get_or_insert(&label);
                (key, index)
            })
            .collect();
        LabelResolver::Translated {
            index_map,
            leaf_label_map,
        }
    }

    /// Resolves `label` to a [LabelIndex].
    ///
    /// # Errors
    /// Returns an `UnresolvedLabel` error if a translated resolver cannot map the label.
    pub fn resolve_label(&mut self, label: &str, parser: &ByteParser) -> Result<LabelIndex, ParsingError> {
        match self {
            LabelResolver::Verbatim(leaf_label_map) => Ok(leaf_label_map.get_or_insert(label)),
            LabelResolver::Translated {
                index_map,
                leaf_label_map,
            } => {
                if let Some(&index) = index_map.get(label) {
                    return Ok(index);
                }

                if let Ok(nexus_index) = label.parse::<usize>() {
                    if nexus_index == 0 || nexus_index > leaf_label_map.num_labels() {
                        return Err(ParsingError::unresolved_label(
                            parser,
                            format!(
                                "Taxon number {nexus_index} out of bounds (1-based, max {})",
                                leaf_label_map.num_labels()
                            ),
                        ));
                    }
                    return Ok(nexus_index - 1);
                }

                leaf_label_map
                    .get_index(label)
                    .ok_or_else(|| ParsingError::unresolved_label(parser, format!("Unknown taxon '{label}'")))
            }
        }
    }

    /// Consumes the resolver and returns its [LeafLabelMap].
    pub fn into_leaf_label_map(self) -> LeafLabelMap {
        match self {
            LabelResolver::Verbatim(leaf_label_map) | LabelResolver::Translated { leaf_label_map, .. } => {
                leaf_label_map
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_multifurcation() {
        let mut parser = ByteParser::for_str("(A,B,C);");
        let result = NewickParser::new().parse(&mut parser);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_negative_branch_length() {
        let mut parser = ByteParser::for_str("(A:-1,B:1);");
        let result = NewickParser::new().parse(&mut parser);
        assert!(result.is_err());
    }

    #[test]
    fn translated_resolver_tries_key_number_then_name() {
        let labels = LeafLabelMap::from_labels(["Ant", "Bee", "Cat"]);
        let translation = vec![("b".to_string(), "Bee".to_string())];
        let mut resolver = LabelResolver::translated(translation, labels);
        let parser = ByteParser::for_str("");

        assert_eq!(resolver.resolve_label("b", &parser).unwrap(), 1);
        assert_eq!(resolver.resolve_label("3", &parser).unwrap(), 2);
        assert_eq!(resolver.resolve_label("Ant", &parser).unwrap(), 0);
        assert!(resolver.resolve_label("Dog", &parser).is_err());
        assert!(resolver.resolve_label("4", &parser).is_err());
    }
}
