#![deny(clippy::uninlined_format_args)]
#![deny(clippy::to_string_in_format_args)]
//! Embeddable sorted set collection engine with TTL expiration.
//!
//! Collections of (value, score) pairs are keyed by cache name and collection
//! name. Elements are ordered ascending by score with value ties broken
//! byte-lexicographically; queries address that order by rank window or by
//! score bounds, in either direction. Every mutating call carries a
//! [`CollectionTtl`] policy, and a collection past its expiration, or one
//! whose last element was removed, is indistinguishable from one that never
//! existed.
//!
//! [`SortedSetEngine`] is the public surface: typed per-operation methods
//! plus an [`SortedSetEngine::execute`] dispatch for request-handling layers.

mod engine;
mod error;
mod rank;
mod response;
mod sorted_set;
mod store;

pub use engine::{
    FetchByRankOptions, FetchByScoreOptions, Operation, Response, SortedSetEngine,
};
pub use error::InvalidArgumentError;
pub use response::{SortedSetFetch, SortedSetGetRank, SortedSetGetScore, SortedSetGetScores};
pub use sorted_set::{Element, Order, SortedSet};
pub use store::{CollectionKey, CollectionTtl, SortedSetStore, StoreConfig};
