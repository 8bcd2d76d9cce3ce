//! Observed discrete characters per taxon.

use crate::error::ConfigurationError;
use crate::model::{LabelIndex, LeafLabelMap};

/// Discrete-state data: one sequence of state codes per taxon.
///
/// `None` marks missing or ambiguous data. The taxon order defines the
/// reference taxa that tree ensembles are reconciled against.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    id: String,
    taxa: LeafLabelMap,
    sequences: Vec<Vec<Option<usize>>>,
    state_count: usize,
}

impl Alignment {
    /// Creates an alignment over `state_count` states.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if there are no taxa, taxa repeat,
    /// sequences differ in length or are empty, or a state is `>= state_count`.
    pub fn new(
        id: impl Into<String>,
        state_count: usize,
        sequences: Vec<(String, Vec<Option<usize>>)>,
    ) -> Result<Self, ConfigurationError> {
        let id = id.into();
        if sequences.is_empty() {
            return Err(ConfigurationError::invalid(id, "contains no taxa"));
        }
        let site_count = sequences[0].1.len();
        if site_count == 0 {
            return Err(ConfigurationError::invalid(id, "contains no sites"));
        }

        let mut taxa = LeafLabelMap::new();
        let mut data = Vec::with_capacity(sequences.len());
        for (taxon, sequence) in sequences {
            if taxa.contains(&taxon) {
                return Err(ConfigurationError::invalid(id, format!("taxon {taxon} occurs twice")));
            }
            if sequence.len() != site_count {
                return Err(ConfigurationError::dimension(
                    format!("sequence of {taxon} in {id}"),
                    sequence.len(),
                    site_count,
                ));
            }
            if let Some(state) = sequence.iter().flatten().find(|&&s| s >= state_count) {
                return Err(ConfigurationError::invalid(
                    id,
                    format!("state {state} of {taxon} exceeds state count {state_count}"),
                ));
            }
            taxa.get_or_insert(&taxon);
            data.push(sequence);
        }

        Ok(Self {
            id,
            taxa,
            sequences: data,
            state_count,
        })
    }

    /// Creates a single-site 4-state alignment from two binary traits.
    ///
    /// The compound state is `2·t0 + t1`, missing if either trait is missing.
    /// Trait values are `0`, `1`, or `?`/`-` for missing. The taxon order
    /// follows `trait0`.
    ///
    /// # Errors
    /// Returns a [ConfigurationError] if the traits cover different taxa or a
    /// value is not binary.
    ///
    /// # Example
    /// ```
    /// use treeset::alignment::Alignment;
    ///
    /// let trait0 = [("A", "0"), ("B", "1"), ("C", "1")];
    /// let trait1 = [("C", "?"), ("B", "1"), ("A", "1")];
    /// let alignment = Alignment::compound("pair", &trait0, &trait1).unwrap();
    ///
    /// assert_eq!(alignment.state(0, 0), Some(1));
    /// assert_eq!(alignment.state(1, 0), Some(3));
    /// assert_eq!(alignment.state(2, 0), None);
    /// ```
    pub fn compound<S: AsRef<str>, T: AsRef<str>>(
        id: impl Into<String>,
        trait0: &[(S, T)],
        trait1: &[(S, T)],
    ) -> Result<Self, ConfigurationError> {
        let id = id.into();
        if trait0.len() != trait1.len() {
            return Err(ConfigurationError::dimension(
                format!("second trait of {id}"),
                trait1.len(),
                trait0.len(),
            ));
        }

        let mut sequences = Vec::with_capacity(trait0.len());
        for (taxon, value0) in trait0 {
            let taxon = taxon.as_ref();
            let value1 = trait1
                .iter()
                .find(|(other, _)| other.as_ref() == taxon)
                .map(|(_, value)| value.as_ref())
                .ok_or_else(|| ConfigurationError::invalid(&id, format!("taxon {taxon} lacks the second trait")))?;

            let state = match (parse_binary(&id, value0.as_ref())?, parse_binary(&id, value1)?) {
                (Some(t0), Some(t1)) => Some(2 * t0 + t1),
                _ => None,
            };
            sequences.push((taxon.to_string(), vec![state]));
        }

        Self::new(id, 4, sequences)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the taxa in alignment order.
    pub fn taxa(&self) -> &LeafLabelMap {
        &self.taxa
    }

    pub fn taxon_count(&self) -> usize {
        self.sequences.len()
    }

    pub fn site_count(&self) -> usize {
        self.sequences[0].len()
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// Returns the state of `taxon` at `site`, `None` if missing.
    pub fn state(&self, taxon: LabelIndex, site: usize) -> Option<usize> {
        self.sequences[taxon][site]
    }

    pub fn sequence(&self, taxon: LabelIndex) -> &[Option<usize>] {
        &self.sequences[taxon]
    }
}

fn parse_binary(id: &str, value: &str) -> Result<Option<usize>, ConfigurationError> {
    match value.trim() {
        "0" => Ok(Some(0)),
        "1" => Ok(Some(1)),
        "?" | "-" => Ok(None),
        other => Err(ConfigurationError::invalid(
            id,
            format!("trait value '{other}' is not binary"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_states() {
        let sequences = vec![("A".to_string(), vec![Some(0)]), ("B".to_string(), vec![Some(2)])];
        assert!(Alignment::new("binary", 2, sequences).is_err());
    }

    #[test]
    fn compound_requires_matching_taxa() {
        let trait0 = [("A", "0"), ("B", "1")];
        let trait1 = [("A", "0"), ("C", "1")];
        assert!(Alignment::compound("pair", &trait0, &trait1).is_err());
    }

    #[test]
    fn compound_rejects_non_binary_values() {
        let trait0 = [("A", "0"), ("B", "2")];
        let trait1 = [("A", "0"), ("B", "1")];
        assert!(Alignment::compound("pair", &trait0, &trait1).is_err());
    }
}
