use tracing::debug;

use crate::evaluation::Eval;
use crate::position::{Move, ZobristHash};

/// Memory budget used by [`TranspositionTable::new`].
pub const DEFAULT_MEMORY_BYTES: usize = 16 * 1024 * 1024;

/// Generations a deeper entry survives against shallower, newer results.
pub const DEFAULT_AGE_DECAY: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    /// Search failed high, the true score is at least the stored one.
    Lower,
    /// Search failed low, the true score is at most the stored one.
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranspositionTableEntry {
    hash: ZobristHash,
    pub score: Eval,
    pub bound: Bound,
    pub depth: u8,
    pub generation: u8,
    pub best_move: Option<Move>,
}

impl TranspositionTableEntry {
    pub fn hash(&self) -> ZobristHash {
        self.hash
    }
}

pub struct TranspositionTable {
    entries: Vec<Option<TranspositionTableEntry>>,
    age_decay: u8,
    generation: u8,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::with_memory(DEFAULT_MEMORY_BYTES)
    }

    /// Largest power-of-two entry count that fits in `bytes`, at least one entry.
    pub fn with_memory(bytes: usize) -> Self {
        let entry_size = std::mem::size_of::<Option<TranspositionTableEntry>>();
        let max_entries = (bytes / entry_size).max(1);
        let num_entries = 1 << max_entries.ilog2();
        debug!(num_entries, entry_size, bytes, "allocating transposition table");

        Self {
            entries: vec![None; num_entries],
            age_decay: DEFAULT_AGE_DECAY,
            generation: 0,
        }
    }

    pub fn with_age_decay(mut self, age_decay: u8) -> Self {
        self.age_decay = age_decay;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn generation(&self) -> u8 {
        self.generation
    }

    /// Starts a new search generation. Wraps around after 256 searches.
    pub fn new_generation(&mut self) -> u8 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    fn index(&self, hash: ZobristHash) -> usize {
        (hash.value() as usize) & (self.entries.len() - 1)
    }

    /// Raw slot for `hash`. It may hold a different position that shares the index.
    pub fn slot(&self, hash: ZobristHash) -> Option<&TranspositionTableEntry> {
        self.entries[self.index(hash)].as_ref()
    }

    /// Entry for exactly `hash`. Index collisions read as a miss.
    pub fn probe(&self, hash: ZobristHash) -> Option<&TranspositionTableEntry> {
        self.slot(hash).filter(|entry| entry.hash == hash)
    }

    /// Writes the entry if the slot is empty, the new result is at least as
    /// deep, or the old entry has aged out: `depth + age >= old depth + age decay`,
    /// where age counts generations since the old entry was written.
    /// Returns whether the entry was written.
    pub fn store(
        &mut self,
        hash: ZobristHash,
        score: Eval,
        bound: Bound,
        depth: u8,
        generation: u8,
        best_move: Option<Move>,
    ) -> bool {
        let idx = self.index(hash);

        if let Some(existing) = &self.entries[idx] {
            let age = generation.wrapping_sub(existing.generation);
            let replace = depth >= existing.depth
                || u32::from(depth) + u32::from(age)
                    >= u32::from(existing.depth) + u32::from(self.age_decay);
            if !replace {
                return false;
            }
        }

        self.entries[idx] = Some(TranspositionTableEntry {
            hash,
            score,
            bound,
            depth,
            generation,
            best_move,
        });
        true
    }

    pub fn clear(&mut self) {
        self.entries.fill(None);
        self.generation = 0;
    }

    /// Occupied slots per mille, sampled from the first thousand slots.
    pub fn hashfull(&self) -> u16 {
        let sample = &self.entries[..self.entries.len().min(1000)];
        let used = sample.iter().filter(|slot| slot.is_some()).count();
        (used * 1000 / sample.len()) as u16
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::Square::*;
    use test_case::test_case;

    fn colliding_hashes(table: &TranspositionTable) -> (ZobristHash, ZobristHash) {
        let first = ZobristHash::from_value(0x1234);
        let second = ZobristHash::from_value(0x1234 + table.len() as u64);
        (first, second)
    }

    #[test_case(0 ; "zero bytes still gets one entry")]
    #[test_case(1024 ; "one kilobyte")]
    #[test_case(1000 ; "not a power of two")]
    #[test_case(DEFAULT_MEMORY_BYTES ; "default")]
    fn test_with_memory(bytes: usize) {
        let table = TranspositionTable::with_memory(bytes);
        let entry_size = std::mem::size_of::<Option<TranspositionTableEntry>>();

        assert!(table.len().is_power_of_two());
        assert!(table.len() == 1 || table.len() * entry_size <= bytes);
        assert!(table.len() * 2 * entry_size > bytes);
    }

    #[test]
    fn test_probe_verifies_full_hash() {
        let mut table = TranspositionTable::with_memory(4096);
        let (first, second) = colliding_hashes(&table);

        assert!(table.store(first, Eval(10), Bound::Exact, 3, 0, Some(Move::new(E2, E4))));

        assert_eq!(table.probe(first).map(|entry| entry.score), Some(Eval(10)));
        assert_eq!(table.probe(second), None);
        assert_eq!(table.slot(second).map(|entry| entry.hash()), Some(first));
    }

    // (existing depth, existing generation, new depth, new generation, replaced)
    #[test_case(5, 0, 5, 0, true ; "equal depth")]
    #[test_case(5, 0, 7, 0, true ; "deeper")]
    #[test_case(5, 0, 4, 0, false ; "shallower same generation")]
    #[test_case(10, 0, 3, 7, false ; "shallower not aged out")]
    #[test_case(10, 0, 3, 15, true ; "shallower aged out")]
    #[test_case(4, 250, 3, 3, true ; "age survives generation wrap")]
    fn test_replacement_policy(
        old_depth: u8,
        old_generation: u8,
        new_depth: u8,
        new_generation: u8,
        replaced: bool,
    ) {
        let mut table = TranspositionTable::with_memory(4096);
        let (first, second) = colliding_hashes(&table);

        assert!(table.store(first, Eval(1), Bound::Exact, old_depth, old_generation, None));
        let stored = table.store(second, Eval(2), Bound::Lower, new_depth, new_generation, None);

        assert_eq!(stored, replaced);
        let want_hash = if replaced { second } else { first };
        assert_eq!(table.slot(first).map(|entry| entry.hash()), Some(want_hash));
    }

    #[test]
    fn test_age_decay_is_configurable() {
        let mut table = TranspositionTable::with_memory(4096).with_age_decay(2);
        let (first, second) = colliding_hashes(&table);

        table.store(first, Eval(1), Bound::Exact, 6, 0, None);
        assert!(!table.store(second, Eval(2), Bound::Upper, 4, 3, None));
        assert!(table.store(second, Eval(2), Bound::Upper, 4, 4, None));
    }

    #[test]
    fn test_clear() {
        let mut table = TranspositionTable::with_memory(4096);
        let hash = ZobristHash::from_value(99);
        table.new_generation();
        table.store(hash, Eval(1), Bound::Exact, 1, table.generation(), None);
        assert!(table.hashfull() > 0);

        table.clear();

        assert_eq!(table.probe(hash), None);
        assert_eq!(table.hashfull(), 0);
        assert_eq!(table.generation(), 0);
    }
}
