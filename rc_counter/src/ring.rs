use crate::bucket::Bucket;

/// Fixed-capacity circular buffer of buckets, oldest at `head`
///
/// Holds `num_buckets + 1` slots but at most `num_buckets` live buckets. The
/// spare slot keeps `head != tail` whenever the ring is non-empty, and `len` is
/// tracked explicitly so that empty and full are never told apart by comparing
/// indices.
#[derive(Debug)]
pub(crate) struct BucketRing {
    /// Physical storage, `None` outside the live range
    slots: Box<[Option<Bucket>]>,

    /// Physical index of the oldest live bucket
    head: usize,

    /// Physical index of the next free slot
    tail: usize,

    /// Number of live buckets
    len: usize,
}

impl BucketRing {
    /// Create an empty ring able to hold `num_buckets` live buckets
    pub fn new(num_buckets: usize) -> Self {
        let capacity = num_buckets.saturating_add(1);
        Self { slots: vec![None; capacity].into_boxed_slice(), head: 0, tail: 0, len: 0 }
    }

    /// Number of physical slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Maximum number of live buckets
    #[inline]
    pub fn max_len(&self) -> usize {
        self.capacity() - 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.max_len()
    }

    /// Map a logical offset from the oldest bucket to a physical slot
    #[inline]
    fn convert_index(&self, index: usize) -> usize {
        (index + self.head) % self.capacity()
    }

    /// Bucket at logical offset `index`, 0 being the oldest
    pub fn get(&self, index: usize) -> Option<&Bucket> {
        if index >= self.len {
            return None;
        }
        self.slots[self.convert_index(index)].as_ref()
    }

    /// Most recently added bucket
    pub fn peek_last(&self) -> Option<&Bucket> {
        if self.len == 0 {
            return None;
        }
        let last = self.convert_index(self.len - 1);
        self.slots[last].as_ref()
    }

    pub fn peek_last_mut(&mut self) -> Option<&mut Bucket> {
        if self.len == 0 {
            return None;
        }
        let last = self.convert_index(self.len - 1);
        self.slots[last].as_mut()
    }

    /// Append a bucket at `tail`, evicting and returning the oldest one when full
    pub fn add_last(&mut self, bucket: Bucket) -> Option<Bucket> {
        let capacity = self.capacity();
        self.slots[self.tail] = Some(bucket);

        let evicted = if self.is_full() {
            let evicted = self.slots[self.head].take();
            self.head = (self.head + 1) % capacity;
            evicted
        } else {
            self.len += 1;
            None
        };

        self.tail = (self.tail + 1) % capacity;
        evicted
    }

    /// Drop every bucket and rewind both indices
    pub fn reset(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }

    /// Live buckets from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Bucket> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    /// Total count across live buckets
    pub fn sum(&self) -> u64 {
        self.iter().fold(0u64, |acc, bucket| acc.saturating_add(bucket.count()))
    }
}
