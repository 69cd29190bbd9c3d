use crate::sorted_set::Element;

/// Outcome of a range fetch. An absent or expired collection is a miss; an
/// existing collection whose resolved window matches nothing is a hit with no
/// elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortedSetFetch {
    Hit { elements: Vec<Element> },
    Miss,
}

impl SortedSetFetch {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }

    /// Elements of a hit, in the order the query asked for.
    pub fn elements(&self) -> Option<&[Element]> {
        match self {
            Self::Hit { elements } => Some(elements),
            Self::Miss => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortedSetGetRank {
    Hit { rank: u64 },
    Miss,
}

impl SortedSetGetRank {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }

    pub fn rank(&self) -> Option<u64> {
        match self {
            Self::Hit { rank } => Some(*rank),
            Self::Miss => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortedSetGetScore {
    Hit { score: i64 },
    Miss,
}

impl SortedSetGetScore {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }

    pub fn score(&self) -> Option<i64> {
        match self {
            Self::Hit { score } => Some(*score),
            Self::Miss => None,
        }
    }
}

/// Scores for a batch of values. A hit carries only the values that were
/// present, in request order; asking about absent values is not an error.
/// Only an absent collection is a miss.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortedSetGetScores {
    Hit { elements: Vec<Element> },
    Miss,
}

impl SortedSetGetScores {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }

    pub fn elements(&self) -> Option<&[Element]> {
        match self {
            Self::Hit { elements } => Some(elements),
            Self::Miss => None,
        }
    }
}
