use multiverse_common::DimensionId;

use crate::error::LifecycleError;

const WORD_BITS: usize = u64::BITS as usize;

/// Width of a persisted word. Persisted data packs 32 ids per int.
const PERSISTED_WORD_BITS: usize = 32;

/// Growable bitmap of dimension ids in use.
///
/// Bit `i` set means id `i` belongs to a registered dimension. Only ids
/// `>= 0` participate; built-in negative ids are silently ignored.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    words: Vec<u64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is marked in use. Negative ids are never marked.
    pub fn contains(&self, id: DimensionId) -> bool {
        index_of(id).is_some_and(|i| self.get(i))
    }

    /// Mark `id` in use, failing if it already is.
    pub fn claim(&mut self, id: DimensionId) -> Result<(), LifecycleError> {
        let Some(index) = index_of(id) else {
            return Ok(());
        };
        if self.get(index) {
            return Err(LifecycleError::AlreadyRegistered(id));
        }
        self.set(index);
        Ok(())
    }

    /// Mark `id` in use regardless of its previous state.
    pub fn mark(&mut self, id: DimensionId) {
        if let Some(index) = index_of(id) {
            self.set(index);
        }
    }

    /// Lowest id that is neither marked nor reported registered by `is_registered`.
    ///
    /// Clear bits belonging to registered dimensions are repaired on the way,
    /// so repeated calls converge. The returned id is not reserved; the caller
    /// must register it before asking again.
    pub fn next_free_id(&mut self, is_registered: impl Fn(DimensionId) -> bool) -> DimensionId {
        let mut next = 0;
        loop {
            next = self.next_clear_bit(next);
            let candidate = DimensionId(next as i32);
            if is_registered(candidate) {
                tracing::debug!(id = next, "repairing clear bit of a registered dimension");
                self.set(next);
            } else {
                return candidate;
            }
        }
    }

    /// Drop every mark and set exactly the given ids.
    pub fn seed(&mut self, ids: impl IntoIterator<Item = DimensionId>) {
        self.words.clear();
        for id in ids {
            self.mark(id);
        }
    }

    /// Export the bitmap as 32-bit words, bit `j` of word `i` standing for id `32 * i + j`.
    pub fn snapshot(&self) -> Vec<i32> {
        let count = self.len().div_ceil(PERSISTED_WORD_BITS);
        (0..count)
            .map(|i| {
                let word = self.words[i / 2];
                let shift = (i % 2) * PERSISTED_WORD_BITS;
                (word >> shift) as u32 as i32
            })
            .collect()
    }

    /// Replace the whole bitmap with previously exported words, growing as needed.
    pub fn restore(&mut self, words: &[i32]) {
        self.words.clear();
        for (i, word) in words.iter().enumerate() {
            let bits = *word as u32;
            for j in 0..PERSISTED_WORD_BITS {
                if bits & (1 << j) != 0 {
                    self.set(i * PERSISTED_WORD_BITS + j);
                }
            }
        }
    }

    /// Marked ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = DimensionId> + '_ {
        self.words.iter().enumerate().flat_map(|(w, word)| {
            (0..WORD_BITS)
                .filter(move |b| word & (1u64 << b) != 0)
                .map(move |b| DimensionId((w * WORD_BITS + b) as i32))
        })
    }

    /// One past the highest marked id, or 0 when nothing is marked.
    pub fn len(&self) -> usize {
        self.words
            .iter()
            .rposition(|w| *w != 0)
            .map(|w| w * WORD_BITS + (WORD_BITS - self.words[w].leading_zeros() as usize))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> bool {
        self.words
            .get(index / WORD_BITS)
            .is_some_and(|w| w & (1u64 << (index % WORD_BITS)) != 0)
    }

    fn set(&mut self, index: usize) {
        let word = index / WORD_BITS;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (index % WORD_BITS);
    }

    fn next_clear_bit(&self, from: usize) -> usize {
        let mut word_index = from / WORD_BITS;
        let mut mask = u64::MAX << (from % WORD_BITS);
        while let Some(word) = self.words.get(word_index) {
            let free = !word & mask;
            if free != 0 {
                return word_index * WORD_BITS + free.trailing_zeros() as usize;
            }
            word_index += 1;
            mask = u64::MAX;
        }
        from.max(self.words.len() * WORD_BITS)
    }
}

impl PartialEq for IdAllocator {
    fn eq(&self, other: &Self) -> bool {
        let trimmed = |words: &[u64]| {
            let end = words.iter().rposition(|w| *w != 0).map_or(0, |i| i + 1);
            words[..end].to_vec()
        };
        trimmed(&self.words) == trimmed(&other.words)
    }
}

impl Eq for IdAllocator {}

fn index_of(id: DimensionId) -> Option<usize> {
    usize::try_from(id.get()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[i32]) -> Vec<DimensionId> {
        values.iter().copied().map(DimensionId).collect()
    }

    #[test]
    fn empty_allocator_hands_out_zero() {
        let mut alloc = IdAllocator::new();
        assert!(alloc.is_empty());
        assert_eq!(alloc.next_free_id(|_| false), DimensionId(0));
    }

    #[test]
    fn claim_rejects_duplicates() {
        let mut alloc = IdAllocator::new();
        alloc.claim(DimensionId(3)).unwrap();
        match alloc.claim(DimensionId(3)) {
            Err(LifecycleError::AlreadyRegistered(id)) => assert_eq!(id, DimensionId(3)),
            other => panic!("expected AlreadyRegistered, got: {other:?}"),
        }
    }

    #[test]
    fn negative_ids_are_ignored() {
        let mut alloc = IdAllocator::new();
        alloc.claim(DimensionId(-1)).unwrap();
        alloc.claim(DimensionId(-1)).unwrap();
        alloc.mark(DimensionId(-7));
        assert!(alloc.is_empty());
        assert!(!alloc.contains(DimensionId(-1)));
    }

    #[test]
    fn next_free_skips_marked_ids() {
        let mut alloc = IdAllocator::new();
        alloc.seed(ids(&[0, 1, 2]));
        assert_eq!(alloc.next_free_id(|_| false), DimensionId(3));
    }

    #[test]
    fn next_free_fills_holes_first() {
        let mut alloc = IdAllocator::new();
        alloc.seed(ids(&[0, 1, 3]));
        assert_eq!(alloc.next_free_id(|_| false), DimensionId(2));
    }

    #[test]
    fn next_free_repairs_registered_clear_bits() {
        let mut alloc = IdAllocator::new();
        alloc.mark(DimensionId(0));
        let registered = ids(&[1, 2]);
        let next = alloc.next_free_id(|id| registered.contains(&id));
        assert_eq!(next, DimensionId(3));
        assert!(alloc.contains(DimensionId(1)));
        assert!(alloc.contains(DimensionId(2)));
    }

    #[test]
    fn next_free_crosses_word_boundaries() {
        let mut alloc = IdAllocator::new();
        alloc.seed((0..130).map(DimensionId));
        assert_eq!(alloc.next_free_id(|_| false), DimensionId(130));
    }

    #[test]
    fn len_tracks_highest_bit() {
        let mut alloc = IdAllocator::new();
        alloc.mark(DimensionId(70));
        assert_eq!(alloc.len(), 71);
        alloc.mark(DimensionId(2));
        assert_eq!(alloc.len(), 71);
    }

    #[test]
    fn snapshot_packs_32_ids_per_word() {
        let mut alloc = IdAllocator::new();
        alloc.seed(ids(&[0, 1, 33]));
        assert_eq!(alloc.snapshot(), vec![0b11, 0b10]);
    }

    #[test]
    fn snapshot_of_high_bit_is_negative_int() {
        let mut alloc = IdAllocator::new();
        alloc.mark(DimensionId(31));
        assert_eq!(alloc.snapshot(), vec![i32::MIN]);
    }

    #[test]
    fn snapshot_restore_roundtrip() {
        let mut alloc = IdAllocator::new();
        alloc.seed(ids(&[0, 1, 2, 31, 32, 63, 64, 100, 257]));

        let mut restored = IdAllocator::new();
        restored.restore(&alloc.snapshot());
        assert_eq!(restored, alloc);
        assert_eq!(restored.ids().collect::<Vec<_>>(), alloc.ids().collect::<Vec<_>>());
    }

    #[test]
    fn restore_replaces_previous_state() {
        let mut alloc = IdAllocator::new();
        alloc.seed(ids(&[5, 6, 7]));
        alloc.restore(&[0b1]);
        assert_eq!(alloc.ids().collect::<Vec<_>>(), ids(&[0]));
    }

    #[test]
    fn restore_extends_beyond_current_range() {
        let mut alloc = IdAllocator::new();
        alloc.mark(DimensionId(0));
        alloc.restore(&[0, 0, 0, 0b1]);
        assert!(alloc.contains(DimensionId(96)));
        assert_eq!(alloc.next_free_id(|_| false), DimensionId(0));
    }

    #[test]
    fn empty_snapshot_is_empty() {
        let alloc = IdAllocator::new();
        assert!(alloc.snapshot().is_empty());
    }
}
