//! Idempotence guard: decide whether a regenerated artifact differs.
//!
//! Re-provisioning renders every artifact again; only materially different
//! output may be written back. Changed lines are reported by number only,
//! since artifact lines can carry credentials.

use std::collections::HashMap;

use tracing::debug;

/// Line numbers (1-indexed) that differ between two renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    pub added: Vec<usize>,
    pub removed: Vec<usize>,
}

/// Outcome of comparing a previous artifact with a fresh render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffVerdict {
    Unchanged,
    Changed(ChangeSet),
}

impl DiffVerdict {
    /// Whether the deployment collaborator needs to write the new content.
    pub fn needs_write(&self) -> bool {
        matches!(self, DiffVerdict::Changed(_))
    }
}

/// Compares artifact texts line-wise.
pub struct ArtifactDiff;

impl ArtifactDiff {
    /// Compare a previously deployed artifact with a fresh render.
    pub fn between(previous: &str, next: &str) -> DiffVerdict {
        if previous == next {
            return DiffVerdict::Unchanged;
        }

        let removed = unmatched_lines(previous, next);
        let added = unmatched_lines(next, previous);
        debug!(
            added = added.len(),
            removed = removed.len(),
            "artifact content changed"
        );
        DiffVerdict::Changed(ChangeSet { added, removed })
    }
}

/// 1-indexed positions of lines in `subject` without a matching occurrence
/// in `other`, multiplicity respected.
fn unmatched_lines(subject: &str, other: &str) -> Vec<usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in other.lines() {
        *counts.entry(line).or_insert(0) += 1;
    }

    let mut unmatched = Vec::new();
    for (idx, line) in subject.lines().enumerate() {
        match counts.get_mut(line) {
            Some(count) if *count > 0 => *count -= 1,
            _ => unmatched.push(idx + 1),
        }
    }
    unmatched
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_content_is_unchanged() {
        let text = "a\nb\nc\n";
        assert_eq!(ArtifactDiff::between(text, text), DiffVerdict::Unchanged);
        assert!(!ArtifactDiff::between(text, text).needs_write());
    }

    #[test]
    fn test_changed_lines_reported_by_number_only() {
        let previous = "listen 80;\npassword secret1;\nroot /srv;\n";
        let next = "listen 80;\npassword secret2;\nroot /srv;\n";

        match ArtifactDiff::between(previous, next) {
            DiffVerdict::Changed(set) => {
                assert_eq!(set.removed, vec![2]);
                assert_eq!(set.added, vec![2]);
            }
            DiffVerdict::Unchanged => panic!("expected a change"),
        }
    }

    #[test]
    fn test_duplicate_lines_respect_multiplicity() {
        let previous = "x\nx\n";
        let next = "x\n";

        match ArtifactDiff::between(previous, next) {
            DiffVerdict::Changed(set) => {
                assert_eq!(set.removed, vec![2]);
                assert!(set.added.is_empty());
            }
            DiffVerdict::Unchanged => panic!("expected a change"),
        }
    }
}
