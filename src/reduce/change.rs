use std::hash::{Hash, Hasher};

use ahash::AHasher;

/// Decides whether an accumulate step had an observable effect, without
/// access to the step's internals. Swappable: the default trades soundness
/// for per-element cost, the clone-based one trades the other way.
pub trait ChangePolicy<Acc>: Send + Sync {
    type Mark;

    /// Taken immediately before the step.
    fn mark(&self, acc: &Acc) -> Self::Mark;

    /// Compared immediately after the step returns.
    fn changed(&self, before: &Self::Mark, acc: &Acc) -> bool;
}

/// Structural hash of the accumulator's current content.
pub fn structural_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = AHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Default policy: hash before vs. hash after.
///
/// This is a heuristic, not a proof. A collision reports a real effect as
/// NOP; a mutation of content the `Hash` impl does not cover goes whichever
/// way the hash falls. Accepted tradeoff, and equality of the two hashes is
/// the sole arbiter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashChangePolicy;

impl<Acc: Hash> ChangePolicy<Acc> for HashChangePolicy {
    type Mark = u64;

    fn mark(&self, acc: &Acc) -> u64 {
        structural_hash(acc)
    }

    fn changed(&self, before: &u64, acc: &Acc) -> bool {
        *before != structural_hash(acc)
    }
}

/// Full-fidelity alternative: clone the accumulator up front, deep-compare
/// after. No false verdicts, but pays a clone per element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloneEqPolicy;

impl<Acc: Clone + PartialEq> ChangePolicy<Acc> for CloneEqPolicy {
    type Mark = Acc;

    fn mark(&self, acc: &Acc) -> Acc {
        acc.clone()
    }

    fn changed(&self, before: &Acc, acc: &Acc) -> bool {
        before != acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_for_unchanged_content() {
        let set: std::collections::BTreeSet<i32> = [1, 2, 3].into_iter().collect();
        assert_eq!(structural_hash(&set), structural_hash(&set));
    }

    #[test]
    fn hash_tracks_content_changes() {
        let mut items = vec![1, 2, 3];
        let before = structural_hash(&items);
        items.push(4);
        assert_ne!(before, structural_hash(&items));
        items.pop();
        assert_eq!(before, structural_hash(&items), "restored content restores the hash");
    }

    #[test]
    fn clone_eq_policy_detects_in_place_mutation() {
        let policy = CloneEqPolicy;
        let mut acc = vec![1];
        let mark = policy.mark(&acc);
        assert!(!policy.changed(&mark, &acc));
        acc.push(2);
        assert!(policy.changed(&mark, &acc));
    }
}
