// 🔐 Match State - Which records have been consumed so far
//
// Passed by reference into every pass. Flags are set exactly once and
// never cleared; a commit either sets all of its flags or none.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchState {
    bank: Vec<bool>,
    ledger: Vec<bool>,
}

impl MatchState {
    pub fn new(bank_len: usize, ledger_len: usize) -> Self {
        MatchState {
            bank: vec![false; bank_len],
            ledger: vec![false; ledger_len],
        }
    }

    pub fn is_bank_matched(&self, index: usize) -> bool {
        self.bank.get(index).copied().unwrap_or(false)
    }

    pub fn is_ledger_matched(&self, index: usize) -> bool {
        self.ledger.get(index).copied().unwrap_or(false)
    }

    /// Mark one bank record and its ledger records as matched
    ///
    /// Returns false and changes nothing if any of them is already matched,
    /// out of range, or the ledger side is empty or repeats an index.
    pub fn commit(&mut self, bank_index: usize, ledger_indices: &[usize]) -> bool {
        if ledger_indices.is_empty() || bank_index >= self.bank.len() || self.bank[bank_index] {
            return false;
        }

        for (pos, &i) in ledger_indices.iter().enumerate() {
            if i >= self.ledger.len() || self.ledger[i] || ledger_indices[..pos].contains(&i) {
                return false;
            }
        }

        self.bank[bank_index] = true;
        for &i in ledger_indices {
            self.ledger[i] = true;
        }

        true
    }

    pub fn matched_bank_count(&self) -> usize {
        self.bank.iter().filter(|m| **m).count()
    }

    pub fn matched_ledger_count(&self) -> usize {
        self.ledger.iter().filter(|m| **m).count()
    }

    /// Indices of matched bank records, ascending
    pub fn matched_bank_indices(&self) -> Vec<usize> {
        flagged(&self.bank, true)
    }

    /// Indices of matched ledger records, ascending
    pub fn matched_ledger_indices(&self) -> Vec<usize> {
        flagged(&self.ledger, true)
    }

    pub fn unmatched_bank_indices(&self) -> Vec<usize> {
        flagged(&self.bank, false)
    }

    pub fn unmatched_ledger_indices(&self) -> Vec<usize> {
        flagged(&self.ledger, false)
    }
}

fn flagged(flags: &[bool], wanted: bool) -> Vec<usize> {
    flags
        .iter()
        .enumerate()
        .filter(|&(_, &flag)| flag == wanted)
        .map(|(i, _)| i)
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_sets_flags() {
        let mut state = MatchState::new(2, 3);
        assert!(state.commit(1, &[0, 2]));

        assert!(state.is_bank_matched(1));
        assert!(!state.is_bank_matched(0));
        assert!(state.is_ledger_matched(0));
        assert!(!state.is_ledger_matched(1));
        assert!(state.is_ledger_matched(2));
        assert_eq!(state.matched_bank_count(), 1);
        assert_eq!(state.matched_ledger_count(), 2);
    }

    #[test]
    fn test_commit_is_all_or_nothing() {
        let mut state = MatchState::new(2, 3);
        assert!(state.commit(0, &[1]));

        // ledger 1 already consumed: nothing from this commit may stick
        assert!(!state.commit(1, &[0, 1]));
        assert!(!state.is_bank_matched(1));
        assert!(!state.is_ledger_matched(0));
    }

    #[test]
    fn test_commit_rejects_bad_input() {
        let mut state = MatchState::new(1, 2);
        assert!(!state.commit(0, &[]));
        assert!(!state.commit(0, &[5]));
        assert!(!state.commit(3, &[0]));
        assert!(!state.commit(0, &[1, 1]));
        assert_eq!(state.matched_ledger_count(), 0);
    }

    #[test]
    fn test_bank_record_matches_once() {
        let mut state = MatchState::new(1, 2);
        assert!(state.commit(0, &[0]));
        assert!(!state.commit(0, &[1]));
        assert!(!state.is_ledger_matched(1));
    }

    #[test]
    fn test_index_views() {
        let mut state = MatchState::new(3, 3);
        state.commit(2, &[0]);
        assert_eq!(state.matched_bank_indices(), vec![2]);
        assert_eq!(state.unmatched_bank_indices(), vec![0, 1]);
        assert_eq!(state.matched_ledger_indices(), vec![0]);
        assert_eq!(state.unmatched_ledger_indices(), vec![1, 2]);
    }
}
