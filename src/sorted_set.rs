use std::collections::BTreeMap;
use std::ops::{Bound, Range};

use bytes::Bytes;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

pub type FastHashMap<K, V> = FxHashMap<K, V>;

type Bucket = SmallVec<[Bytes; 4]>;

/// Traversal direction for rank and range queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

/// One (value, score) pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub value: Bytes,
    pub score: i64,
}

impl Element {
    pub fn new(value: impl Into<Bytes>, score: i64) -> Self {
        Self {
            value: value.into(),
            score,
        }
    }
}

/// Sorted set over `(score, value)` with a value-to-score side index.
///
/// The score map orders elements ascending by score; ties share a bucket kept
/// sorted by value bytes, so tie order has a single source of truth.
/// Descending queries reverse the traversal, never the storage. Both indices
/// hold exactly the same value set at all times.
#[derive(Default)]
pub struct SortedSet {
    by_score: BTreeMap<i64, Bucket>,
    members: FastHashMap<Bytes, i64>,
}

impl SortedSet {
    /// Inserts the value or moves it to a new score. Returns false when the
    /// pair was already present unchanged.
    pub fn insert(&mut self, value: Bytes, score: i64) -> bool {
        match self.members.insert(value.clone(), score) {
            Some(old) if old == score => return false,
            Some(old) => self.unlink(old, value.as_ref()),
            None => {}
        }
        let bucket = self.by_score.entry(score).or_default();
        match bucket.binary_search(&value) {
            Ok(_) => false,
            Err(pos) => {
                bucket.insert(pos, value);
                true
            }
        }
    }

    pub fn remove(&mut self, value: &[u8]) -> bool {
        match self.members.remove(value) {
            Some(score) => {
                self.unlink(score, value);
                true
            }
            None => false,
        }
    }

    fn unlink(&mut self, score: i64, value: &[u8]) {
        if let Some(bucket) = self.by_score.get_mut(&score) {
            if let Ok(pos) = bucket.binary_search_by(|m| m.as_ref().cmp(value)) {
                bucket.remove(pos);
            }
            if bucket.is_empty() {
                self.by_score.remove(&score);
            }
        }
    }

    pub fn score(&self, value: &[u8]) -> Option<i64> {
        self.members.get(value).copied()
    }

    pub fn contains(&self, value: &[u8]) -> bool {
        self.members.contains_key(value)
    }

    /// Adds `delta` to the value's score, treating an absent value as zero.
    /// Saturates at the i64 boundaries.
    pub fn increment(&mut self, value: Bytes, delta: i64) -> i64 {
        let next = self
            .score(value.as_ref())
            .unwrap_or(0)
            .saturating_add(delta);
        self.insert(value, next);
        next
    }

    /// Zero-based position of the value in the given direction, counting by
    /// score with value ties broken byte-lexicographically.
    pub fn rank(&self, value: &[u8], order: Order) -> Option<usize> {
        let score = self.score(value)?;
        let bucket = self.by_score.get(&score)?;
        let pos = bucket.binary_search_by(|m| m.as_ref().cmp(value)).ok()?;
        let before: usize = self.by_score.range(..score).map(|(_, b)| b.len()).sum();
        let ascending = before + pos;
        match order {
            Order::Ascending => Some(ascending),
            Order::Descending => Some(self.len() - 1 - ascending),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Element> + '_ {
        self.by_score.iter().flat_map(|(&score, bucket)| {
            bucket.iter().map(move |v| Element {
                value: v.clone(),
                score,
            })
        })
    }

    fn iter_desc(&self) -> impl Iterator<Item = Element> + '_ {
        self.by_score.iter().rev().flat_map(|(&score, bucket)| {
            bucket.iter().rev().map(move |v| Element {
                value: v.clone(),
                score,
            })
        })
    }

    /// Extracts the elements inside an absolute, already-resolved rank
    /// window, traversing in the given order.
    pub fn range_by_rank(&self, window: Range<usize>, order: Order) -> Vec<Element> {
        let take = window.len();
        match order {
            Order::Ascending => self.iter().skip(window.start).take(take).collect(),
            Order::Descending => self.iter_desc().skip(window.start).take(take).collect(),
        }
    }

    /// Elements with score in `[min, max]` (either side unbounded when
    /// absent), ordered in the given direction, then offset and truncated.
    pub fn range_by_score(
        &self,
        min: Option<i64>,
        max: Option<i64>,
        offset: usize,
        count: Option<usize>,
        order: Order,
    ) -> Vec<Element> {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Vec::new();
            }
        }
        let bounds = (
            min.map_or(Bound::Unbounded, Bound::Included),
            max.map_or(Bound::Unbounded, Bound::Included),
        );
        let count = count.unwrap_or(usize::MAX);
        let matched = self.by_score.range(bounds);
        match order {
            Order::Ascending => matched
                .flat_map(|(&score, bucket)| {
                    bucket.iter().map(move |v| Element {
                        value: v.clone(),
                        score,
                    })
                })
                .skip(offset)
                .take(count)
                .collect(),
            Order::Descending => matched
                .rev()
                .flat_map(|(&score, bucket)| {
                    bucket.iter().rev().map(move |v| Element {
                        value: v.clone(),
                        score,
                    })
                })
                .skip(offset)
                .take(count)
                .collect(),
        }
    }
}
