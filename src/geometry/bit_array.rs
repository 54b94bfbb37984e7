/// A fixed-length set of bits backed by 64-bit words.
///
/// Used to track which features and contacts are still active after the
/// refinement passes. The length is fixed at construction; bits outside the
/// length are never set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitArray {
    words: Vec<u64>,
    len: usize,
}

impl BitArray {
    /// Create a bit array of `len` bits, all cleared.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// Create a bit array of `len` bits, all set.
    pub fn with_all_set(len: usize) -> Self {
        let mut words = vec![u64::MAX; len.div_ceil(64)];
        let tail = len % 64;
        if tail != 0 {
            if let Some(last) = words.last_mut() {
                *last &= (1u64 << tail) - 1;
            }
        }
        Self { words, len }
    }

    /// Number of bits in the array.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if the array holds no bits at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether bit `index` is set.
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.len);
        self.words[index >> 6] & (1u64 << (index & 63)) != 0
    }

    /// Set bit `index`.
    pub fn set(&mut self, index: usize) {
        assert!(index < self.len);
        self.words[index >> 6] |= 1u64 << (index & 63);
    }

    /// Clear bit `index`.
    pub fn clear(&mut self, index: usize) {
        assert!(index < self.len);
        self.words[index >> 6] &= !(1u64 << (index & 63));
    }

    /// Number of set bits.
    pub fn count_set(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate over the indices of all set bits, in ascending order.
    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.get(i))
    }
}
