//! Selection of the repositories to make private
//!
//! Turns the listed candidates plus a run mode into a [`SelectionSet`].
//! Nothing here touches the network.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::console::Console;
use crate::error::Result;
use crate::github::RepositoryRecord;

/// How the repositories to update are chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    /// Ask about each candidate in turn
    Interactive,
    /// Use the given names, ignoring those that are not candidates
    Batch(Vec<String>),
    /// Every candidate
    All,
}

/// Ordered, duplicate-free set of repository names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    names: Vec<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name; returns false if it was already selected
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

/// Result of intersecting requested names with the candidates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSelection {
    pub selected: SelectionSet,
    /// Requested names that are not public repositories of the user, one entry per distinct name
    pub missing: Vec<String>,
}

/// Split a comma-separated `--batch` argument into trimmed, non-empty names
pub fn parse_batch_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Every candidate, in listing order
pub fn select_all(candidates: &[RepositoryRecord]) -> SelectionSet {
    candidates.iter().map(|repo| repo.name.clone()).collect()
}

/// Keep the requested names that are candidates, in request order
pub fn select_batch(candidates: &[RepositoryRecord], requested: &[String]) -> BatchSelection {
    let available: HashSet<&str> = candidates.iter().map(|repo| repo.name.as_str()).collect();
    let mut result = BatchSelection::default();

    for name in requested {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        if available.contains(name) {
            result.selected.insert(name);
        } else if !result.missing.iter().any(|m| m == name) {
            warn!("Repository not found or not public: {}", name);
            result.missing.push(name.to_string());
        }
    }

    debug!(
        "Batch selection: {} selected, {} missing",
        result.selected.len(),
        result.missing.len()
    );
    result
}

/// Answer to a per-repository prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Yes,
    No,
    All,
    Quit,
}

fn parse_choice(answer: &str) -> Option<Choice> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(Choice::Yes),
        "n" | "no" | "" => Some(Choice::No),
        "a" | "all" => Some(Choice::All),
        "q" | "quit" => Some(Choice::Quit),
        _ => None,
    }
}

/// Ask about each candidate in turn
///
/// "all" takes the current and every remaining candidate; "quit" or end of
/// input stops asking and keeps what was already chosen.
pub fn select_interactive(
    candidates: &[RepositoryRecord],
    console: &mut dyn Console,
) -> Result<SelectionSet> {
    let mut selected = SelectionSet::new();
    if candidates.is_empty() {
        return Ok(selected);
    }

    console.say("")?;
    console.say("Answer for each repository: [y]es, [n]o, [a]ll remaining, [q]uit")?;

    for (index, repo) in candidates.iter().enumerate() {
        let prompt = format!(
            "({}/{}) Make {} private? [y/N/a/q]: ",
            index + 1,
            candidates.len(),
            repo.name
        );

        let choice = loop {
            let Some(answer) = console.ask(&prompt)? else {
                break Choice::Quit;
            };
            match parse_choice(&answer) {
                Some(choice) => break choice,
                None => console.say("❌ Invalid choice. Please answer y, n, a or q.")?,
            }
        };

        match choice {
            Choice::Yes => {
                selected.insert(repo.name.clone());
            }
            Choice::No => {}
            Choice::All => {
                for remaining in &candidates[index..] {
                    selected.insert(remaining.name.clone());
                }
                break;
            }
            Choice::Quit => break,
        }
    }

    Ok(selected)
}
