//! Sequential matcher - nearest indexed key, eyes first
//!
//! Search order is fixed: eye expression, then mouth, then head. Eyes carry
//! most of a pose's identity, the head tolerates the most approximation.
//! When nothing survives, a terminal chain (previous match, neutral pose,
//! near-neutral backups, first indexed key) still produces a key as long as
//! the index is not empty.

use puppet_core::{Axis, GridKey, MatchResult, MatchTag};

use crate::SpriteIndex;

/// Near-neutral keys tried after the neutral pose, in order
pub const BACKUP_KEYS: [[u8; 8]; 6] = [
    [0, 0, 0, 0, 0, 5, 5, 0],
    [0, 0, 0, 0, 0, 5, 5, 3],
    [0, 0, 0, 0, 0, 5, 5, 7],
    [1, 1, 0, 0, 0, 5, 5, 5],
    [0, 0, 1, 1, 0, 5, 5, 5],
    [0, 0, 0, 0, 1, 5, 5, 5],
];

/// Per-stage axis tolerances of the relaxed search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchTolerances {
    /// First eye pass
    pub eye_strict: u8,
    /// Eye pass used when the strict one finds nothing
    pub eye_relaxed: u8,
    pub mouth: u8,
    pub head: u8,
}

impl Default for MatchTolerances {
    fn default() -> Self {
        MatchTolerances {
            eye_strict: 1,
            eye_relaxed: 2,
            mouth: 1,
            head: 2,
        }
    }
}

/// Staged nearest-key search over a sprite index
///
/// Remembers the last key it returned for the terminal chain.
#[derive(Debug, Clone, Default)]
pub struct SequentialMatcher {
    tolerances: MatchTolerances,
    previous: Option<GridKey>,
}

impl SequentialMatcher {
    pub fn new(tolerances: MatchTolerances) -> Self {
        SequentialMatcher {
            tolerances,
            previous: None,
        }
    }

    pub fn tolerances(&self) -> MatchTolerances {
        self.tolerances
    }

    pub fn set_tolerances(&mut self, tolerances: MatchTolerances) {
        self.tolerances = tolerances;
    }

    /// Last key returned
    pub fn previous(&self) -> Option<GridKey> {
        self.previous
    }

    /// Forget the previous match
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Find the best indexed key for `target`
    ///
    /// With `allow_fallback` off only the exact stage and the terminal chain
    /// run. Returns `None` only when the index is empty.
    pub fn find_match(
        &mut self,
        target: GridKey,
        index: &SpriteIndex,
        allow_fallback: bool,
    ) -> Option<MatchResult> {
        let result = self.search(target, index, allow_fallback)?;
        self.previous = Some(result.key);
        Some(result)
    }

    /// Record a key chosen outside this matcher (e.g. a held image)
    pub fn remember(&mut self, key: GridKey) {
        self.previous = Some(key);
    }

    /// Indexed keys of the default chain, in order
    ///
    /// Neutral pose, then the backups, then the first sorted key (which may
    /// repeat an earlier one). The previous match is not included.
    pub fn terminal_candidates(index: &SpriteIndex) -> impl Iterator<Item = GridKey> + '_ {
        std::iter::once(GridKey::NEUTRAL)
            .chain(BACKUP_KEYS.iter().filter_map(|l| GridKey::new(*l)))
            .filter(|k| index.contains(k))
            // Sparse corpus without any near-neutral pose
            .chain(index.first())
    }

    fn search(
        &self,
        target: GridKey,
        index: &SpriteIndex,
        allow_fallback: bool,
    ) -> Option<MatchResult> {
        // Stage 1: exact
        if index.contains(&target) {
            return Some(MatchResult::exact(target));
        }

        // Stages 2-5: eyes, mouth, head, closest
        if allow_fallback {
            if let Some(key) = self.sequential(target, index) {
                return Some(MatchResult::new(key, MatchTag::SequentialFallback));
            }
        }

        // Stage 6: terminal chain
        self.terminal(index)
    }

    fn sequential(&self, target: GridKey, index: &SpriteIndex) -> Option<GridKey> {
        let tol = self.tolerances;

        let mut eyes = filter_by_eyes(target, index.sorted_keys(), tol.eye_strict);
        if eyes.is_empty() {
            eyes = filter_by_eyes(target, index.sorted_keys(), tol.eye_relaxed);
        }
        if eyes.is_empty() {
            return None;
        }

        let mouth = filter_or_keep(eyes, |k| target.within(*k, &Axis::MOUTH, tol.mouth));
        let head = filter_or_keep(mouth, |k| target.within(*k, &Axis::HEAD, tol.head));

        closest(target, &head)
    }

    fn terminal(&self, index: &SpriteIndex) -> Option<MatchResult> {
        if let Some(prev) = self.previous.filter(|k| index.contains(k)) {
            return Some(MatchResult::new(prev, MatchTag::Previous));
        }

        Self::terminal_candidates(index)
            .next()
            .map(|key| MatchResult::new(key, MatchTag::Default))
    }
}

/// Keys whose four eye axes are each within `tolerance` of the target
pub fn filter_by_eyes(target: GridKey, keys: &[GridKey], tolerance: u8) -> Vec<GridKey> {
    keys.iter()
        .copied()
        .filter(|k| target.within(*k, &Axis::EYES, tolerance))
        .collect()
}

/// Narrow `candidates` by `pred`, or keep them all if nothing passes
fn filter_or_keep<F: Fn(&GridKey) -> bool>(candidates: Vec<GridKey>, pred: F) -> Vec<GridKey> {
    let narrowed: Vec<GridKey> = candidates.iter().copied().filter(|k| pred(k)).collect();
    if narrowed.is_empty() {
        candidates
    } else {
        narrowed
    }
}

/// Candidate nearest to the target; the first one wins ties
pub fn closest(target: GridKey, candidates: &[GridKey]) -> Option<GridKey> {
    let mut best: Option<(u32, GridKey)> = None;
    for &key in candidates {
        let d = target.distance_sq(key);
        if best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, key));
        }
    }
    best.map(|(_, key)| key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn key(levels: [u8; 8]) -> GridKey {
        GridKey::new(levels).unwrap()
    }

    fn index_of(keys: &[[u8; 8]]) -> SpriteIndex {
        let entries: HashMap<GridKey, PathBuf> = keys
            .iter()
            .map(|l| (key(*l), PathBuf::from(format!("{}.png", key(*l)))))
            .collect();
        SpriteIndex::from_entries(entries)
    }

    #[test]
    fn test_exact_match() {
        let index = index_of(&[[0, 0, 0, 0, 0, 5, 5, 5], [2, 2, 1, 1, 1, 3, 7, 5]]);
        let mut matcher = SequentialMatcher::default();
        let target = key([2, 2, 1, 1, 1, 3, 7, 5]);
        assert_eq!(matcher.find_match(target, &index, true), Some(MatchResult::exact(target)));
    }

    #[test]
    fn test_relaxed_eye_pass_beats_neutral() {
        let index = index_of(&[[0, 0, 0, 0, 0, 5, 5, 5], [0, 0, 1, 1, 0, 5, 5, 5]]);
        let mut matcher = SequentialMatcher::default();
        let result = matcher.find_match(key([0, 0, 2, 2, 0, 5, 5, 5]), &index, true).unwrap();
        assert_eq!(result.key, key([0, 0, 1, 1, 0, 5, 5, 5]));
        assert_eq!(result.tag, MatchTag::SequentialFallback);
    }

    #[test]
    fn test_relaxed_eye_pass_only_when_strict_empty() {
        // Strict pass finds [0,0,3,3..]; relaxed would also admit [0,0,2,2..]
        let index = index_of(&[[0, 0, 2, 2, 0, 5, 5, 5], [0, 0, 3, 3, 3, 0, 0, 0]]);
        let mut matcher = SequentialMatcher::default();
        let result = matcher.find_match(key([0, 0, 4, 4, 3, 0, 0, 0]), &index, true).unwrap();
        assert_eq!(result.key, key([0, 0, 3, 3, 3, 0, 0, 0]));
    }

    #[test]
    fn test_eyes_dominate_head() {
        // Same eyes far head versus near head with different eyes
        let index = index_of(&[[4, 4, 0, 0, 0, 0, 0, 0], [0, 0, 0, 0, 0, 10, 10, 10]]);
        let mut matcher = SequentialMatcher::default();
        let result = matcher.find_match(key([4, 4, 0, 0, 0, 10, 10, 10]), &index, true).unwrap();
        assert_eq!(result.key, key([4, 4, 0, 0, 0, 0, 0, 0]));
    }

    #[test]
    fn test_mouth_filter_falls_back_to_eye_set() {
        let index = index_of(&[[0, 0, 0, 0, 0, 5, 5, 5], [0, 0, 0, 0, 0, 9, 9, 9]]);
        let mut matcher = SequentialMatcher::default();
        // No candidate within jaw ±1 of 3; head stage picks the near pose
        let result = matcher.find_match(key([0, 0, 0, 0, 3, 5, 6, 5]), &index, true).unwrap();
        assert_eq!(result.key, GridKey::NEUTRAL);
        assert_eq!(result.tag, MatchTag::SequentialFallback);
    }

    #[test]
    fn test_tie_keeps_first_sorted() {
        let index = index_of(&[[0, 0, 0, 0, 0, 5, 5, 4], [0, 0, 0, 0, 0, 5, 5, 6]]);
        let mut matcher = SequentialMatcher::default();
        let result = matcher.find_match(GridKey::NEUTRAL, &index, true).unwrap();
        assert_eq!(result.key, key([0, 0, 0, 0, 0, 5, 5, 4]));
    }

    #[test]
    fn test_terminal_chain_prefers_previous() {
        let index = index_of(&[[0, 0, 0, 0, 0, 5, 5, 5], [4, 4, 4, 4, 3, 0, 0, 0]]);
        let mut matcher = SequentialMatcher::default();

        let first = matcher.find_match(key([4, 4, 4, 4, 3, 0, 0, 0]), &index, false).unwrap();
        assert_eq!(first.tag, MatchTag::Exact);

        // Fallback disabled: no staged search, previous key is reused
        let second = matcher.find_match(key([4, 4, 4, 4, 2, 0, 0, 0]), &index, false).unwrap();
        assert_eq!(second, MatchResult::new(key([4, 4, 4, 4, 3, 0, 0, 0]), MatchTag::Previous));

        matcher.reset();
        let third = matcher.find_match(key([4, 4, 4, 4, 2, 0, 0, 0]), &index, false).unwrap();
        assert_eq!(third, MatchResult::new(GridKey::NEUTRAL, MatchTag::Default));
    }

    #[test]
    fn test_backup_keys_in_order() {
        let index = index_of(&[[0, 0, 0, 0, 1, 5, 5, 5], [0, 0, 0, 0, 0, 5, 5, 3]]);
        let mut matcher = SequentialMatcher::default();
        let result = matcher.find_match(key([4, 4, 4, 4, 3, 0, 0, 0]), &index, false).unwrap();
        assert_eq!(result, MatchResult::new(key([0, 0, 0, 0, 0, 5, 5, 3]), MatchTag::Default));
    }

    #[test]
    fn test_terminal_candidates_order() {
        let index = index_of(&[
            [0, 0, 0, 0, 1, 5, 5, 5],
            [0, 0, 0, 0, 0, 5, 5, 5],
            [0, 0, 0, 0, 0, 5, 5, 7],
        ]);
        let chain: Vec<GridKey> = SequentialMatcher::terminal_candidates(&index).collect();
        assert_eq!(
            chain,
            vec![
                GridKey::NEUTRAL,
                key([0, 0, 0, 0, 0, 5, 5, 7]),
                key([0, 0, 0, 0, 1, 5, 5, 5]),
                key([0, 0, 0, 0, 0, 5, 5, 5]),
            ]
        );

        let sparse = index_of(&[[3, 3, 3, 3, 3, 10, 10, 10]]);
        let chain: Vec<GridKey> = SequentialMatcher::terminal_candidates(&sparse).collect();
        assert_eq!(chain, vec![key([3, 3, 3, 3, 3, 10, 10, 10])]);
        assert_eq!(SequentialMatcher::terminal_candidates(&SpriteIndex::empty()).count(), 0);
    }

    #[test]
    fn test_stale_previous_is_skipped() {
        let mut matcher = SequentialMatcher::default();
        matcher.remember(key([4, 4, 4, 4, 3, 0, 0, 0]));
        let index = index_of(&[[3, 3, 3, 3, 3, 10, 10, 10]]);
        let result = matcher.find_match(GridKey::NEUTRAL, &index, false).unwrap();
        assert_eq!(result, MatchResult::new(key([3, 3, 3, 3, 3, 10, 10, 10]), MatchTag::Default));
    }

    #[test]
    fn test_empty_index_has_no_match() {
        let mut matcher = SequentialMatcher::default();
        assert_eq!(matcher.find_match(GridKey::NEUTRAL, &SpriteIndex::empty(), true), None);
        assert_eq!(matcher.previous(), None);
    }

    #[test]
    fn test_custom_tolerances() {
        let index = index_of(&[[0, 0, 0, 0, 0, 5, 5, 5], [0, 0, 3, 3, 0, 5, 5, 5]]);
        let mut matcher = SequentialMatcher::new(MatchTolerances {
            eye_strict: 0,
            eye_relaxed: 0,
            ..Default::default()
        });
        let result = matcher.find_match(key([0, 0, 2, 2, 0, 5, 5, 5]), &index, true).unwrap();
        assert_eq!(result.tag, MatchTag::Default);
    }

    #[test]
    fn test_closest() {
        let target = GridKey::NEUTRAL;
        assert_eq!(closest(target, &[]), None);
        let far = key([4, 4, 4, 4, 3, 0, 0, 0]);
        let near = key([1, 0, 0, 0, 0, 5, 5, 5]);
        assert_eq!(closest(target, &[far, near]), Some(near));
    }

    proptest::proptest! {
        #[test]
        fn prop_indexed_key_matches_exactly(
            keys in proptest::collection::vec(proptest::array::uniform8(0u8..=10), 1..30),
            pick in 0usize..30,
        ) {
            let keys: Vec<[u8; 8]> = keys
                .iter()
                .map(|l| GridKey::clamped(l.map(i64::from)).levels())
                .collect();
            let index = index_of(&keys);
            let target = key(keys[pick % keys.len()]);
            let mut matcher = SequentialMatcher::default();
            proptest::prop_assert_eq!(
                matcher.find_match(target, &index, true),
                Some(MatchResult::exact(target))
            );
        }

        #[test]
        fn prop_nonempty_index_always_matches(
            keys in proptest::collection::vec(proptest::array::uniform8(0u8..=10), 1..30),
            target in proptest::array::uniform8(0u8..=10),
            allow_fallback in proptest::bool::ANY,
        ) {
            let keys: Vec<[u8; 8]> = keys
                .iter()
                .map(|l| GridKey::clamped(l.map(i64::from)).levels())
                .collect();
            let index = index_of(&keys);
            let target = GridKey::clamped(target.map(i64::from));
            let mut matcher = SequentialMatcher::default();
            let result = matcher.find_match(target, &index, allow_fallback);
            proptest::prop_assert!(result.is_some_and(|r| index.contains(&r.key)));
        }
    }
}
