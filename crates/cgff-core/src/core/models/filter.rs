use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// How the bead sequence of an n-body potential is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpeciesOrdering {
    /// Any permutation of the beads names the same interaction.
    #[default]
    Unordered,
    /// A sequence and its reverse name the same interaction (bonds, angles).
    Reversible,
    /// The sequence is significant as written.
    Ordered,
}

impl SpeciesOrdering {
    /// Returns the representative of `items` under this ordering.
    pub fn canonical<T: Ord + Clone>(&self, items: &[T]) -> Vec<T> {
        match self {
            SpeciesOrdering::Ordered => items.to_vec(),
            SpeciesOrdering::Reversible => {
                let forward = items.to_vec();
                let mut reversed = forward.clone();
                reversed.reverse();
                forward.min(reversed)
            }
            SpeciesOrdering::Unordered => {
                let mut sorted = items.to_vec();
                sorted.sort();
                sorted
            }
        }
    }

    pub fn canonical_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let owned: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        self.canonical(&owned)
    }

    pub fn equivalent<T: Ord + Clone>(&self, a: &[T], b: &[T]) -> bool {
        a.len() == b.len() && self.canonical(a) == self.canonical(b)
    }
}

impl fmt::Display for SpeciesOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SpeciesOrdering::Unordered => "unordered",
            SpeciesOrdering::Reversible => "reversible",
            SpeciesOrdering::Ordered => "ordered",
        };
        f.write_str(s)
    }
}

impl FromStr for SpeciesOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unordered" => Ok(SpeciesOrdering::Unordered),
            "reversible" => Ok(SpeciesOrdering::Reversible),
            "ordered" => Ok(SpeciesOrdering::Ordered),
            other => Err(format!(
                "unknown species ordering '{}' (expected unordered, reversible or ordered)",
                other
            )),
        }
    }
}

/// Whether every name can be given its own slot, where `candidates[i]` lists the
/// slots name `i` may occupy.
///
/// Kuhn's augmenting-path matching; polynomial in the arity.
fn has_complete_assignment(candidates: &[Vec<usize>]) -> bool {
    fn augment(
        name: usize,
        candidates: &[Vec<usize>],
        visited: &mut [bool],
        owner: &mut [Option<usize>],
    ) -> bool {
        for &slot in &candidates[name] {
            if visited[slot] {
                continue;
            }
            visited[slot] = true;
            let free = match owner[slot] {
                None => true,
                Some(other) => augment(other, candidates, visited, owner),
            };
            if free {
                owner[slot] = Some(name);
                return true;
            }
        }
        false
    }

    let n = candidates.len();
    let mut owner = vec![None; n];
    (0..n).all(|name| augment(name, candidates, &mut vec![false; n], &mut owner))
}

/// A bead-type pattern for an n-body potential: one group of bead names per slot.
///
/// `[A] [B;C]` describes the pair interactions `A-B` and `A-C`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesFilter {
    slots: Vec<Vec<String>>,
    ordering: SpeciesOrdering,
}

impl SpeciesFilter {
    /// Builds a filter, dropping repeated names within each slot (first one wins).
    pub fn new(slots: Vec<Vec<String>>, ordering: SpeciesOrdering) -> Self {
        let slots = slots
            .into_iter()
            .map(|slot| {
                let mut seen = HashSet::new();
                slot.into_iter()
                    .filter(|name| seen.insert(name.clone()))
                    .collect()
            })
            .collect();
        Self { slots, ordering }
    }

    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[Vec<String>] {
        &self.slots
    }

    pub fn ordering(&self) -> SpeciesOrdering {
        self.ordering
    }

    pub fn is_grouped(&self) -> bool {
        self.slots.iter().any(|slot| slot.len() > 1)
    }

    /// Cartesian product of the slots, without combinations that are equivalent
    /// under the filter's ordering.
    pub fn expand(&self) -> Vec<Vec<String>> {
        let mut combos: Vec<Vec<String>> = vec![Vec::new()];
        for slot in &self.slots {
            combos = combos
                .into_iter()
                .flat_map(|prefix| {
                    slot.iter().map(move |name| {
                        let mut next = prefix.clone();
                        next.push(name.clone());
                        next
                    })
                })
                .collect();
        }

        let mut seen = HashSet::new();
        combos
            .into_iter()
            .filter(|combo| !combo.is_empty() && seen.insert(self.ordering.canonical(combo)))
            .collect()
    }

    /// Whether the given beads are one of the interactions this filter describes.
    pub fn matches<S: AsRef<str>>(&self, names: &[S]) -> bool {
        if names.len() != self.arity() {
            return false;
        }
        let fits = |name: &S, slot: &Vec<String>| slot.iter().any(|s| s == name.as_ref());
        match self.ordering {
            SpeciesOrdering::Ordered => names.iter().zip(&self.slots).all(|(n, s)| fits(n, s)),
            SpeciesOrdering::Reversible => {
                names.iter().zip(&self.slots).all(|(n, s)| fits(n, s))
                    || names.iter().rev().zip(&self.slots).all(|(n, s)| fits(n, s))
            }
            SpeciesOrdering::Unordered => {
                let candidates: Vec<Vec<usize>> = names
                    .iter()
                    .map(|name| {
                        (0..self.arity())
                            .filter(|&slot| fits(name, &self.slots[slot]))
                            .collect()
                    })
                    .collect();
                has_complete_assignment(&candidates)
            }
        }
    }

    /// Canonical keys of the interactions described by both filters.
    pub fn overlap(&self, other: &SpeciesFilter) -> Vec<Vec<String>> {
        if self.arity() != other.arity() {
            return Vec::new();
        }
        self.expand()
            .into_iter()
            .filter(|combo| other.matches(combo))
            .map(|combo| self.ordering.canonical(&combo))
            .collect()
    }

    /// Slot groups joined with `;`, slots joined with `_` (e.g. `A_B;C`).
    pub fn label(&self) -> String {
        self.slots
            .iter()
            .map(|slot| slot.join(";"))
            .collect::<Vec<_>>()
            .join("_")
    }
}
