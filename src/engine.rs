use bytes::Bytes;
use tracing::trace;

use crate::error::InvalidArgumentError;
use crate::rank::{resolve_window, validate_rank_range};
use crate::response::{SortedSetFetch, SortedSetGetRank, SortedSetGetScore, SortedSetGetScores};
use crate::sorted_set::{Element, Order};
use crate::store::{CollectionKey, CollectionTtl, SortedSetStore, StoreConfig};

/// Options for [`SortedSetEngine::fetch_by_rank`]. Ranks may be negative to
/// count from the end of the ordered sequence.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchByRankOptions {
    pub start_rank: Option<i64>,
    pub end_rank: Option<i64>,
    pub order: Order,
}

/// Options for [`SortedSetEngine::fetch_by_score`]. Score bounds are
/// inclusive; offset and count page through the filtered result in the
/// requested order.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchByScoreOptions {
    pub min_score: Option<i64>,
    pub max_score: Option<i64>,
    pub offset: Option<i64>,
    pub count: Option<i64>,
    pub order: Order,
}

/// One request against the engine, as built by a request-handling layer.
#[derive(Clone, Debug)]
pub enum Operation {
    FetchByRank {
        cache: String,
        set_name: Bytes,
        options: FetchByRankOptions,
    },
    FetchByScore {
        cache: String,
        set_name: Bytes,
        options: FetchByScoreOptions,
    },
    GetRank {
        cache: String,
        set_name: Bytes,
        value: Bytes,
        order: Order,
    },
    GetScore {
        cache: String,
        set_name: Bytes,
        value: Bytes,
    },
    GetScores {
        cache: String,
        set_name: Bytes,
        values: Vec<Bytes>,
    },
    PutElement {
        cache: String,
        set_name: Bytes,
        value: Bytes,
        score: i64,
        ttl: Option<CollectionTtl>,
    },
    PutElements {
        cache: String,
        set_name: Bytes,
        elements: Vec<(Bytes, i64)>,
        ttl: Option<CollectionTtl>,
    },
    RemoveElement {
        cache: String,
        set_name: Bytes,
        value: Bytes,
    },
    RemoveElements {
        cache: String,
        set_name: Bytes,
        values: Vec<Bytes>,
    },
    IncrementScore {
        cache: String,
        set_name: Bytes,
        value: Bytes,
        amount: Option<i64>,
        ttl: Option<CollectionTtl>,
    },
    Delete {
        cache: String,
        set_name: Bytes,
    },
}

/// Typed result of [`SortedSetEngine::execute`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Fetch(SortedSetFetch),
    GetRank(SortedSetGetRank),
    GetScore(SortedSetGetScore),
    GetScores(SortedSetGetScores),
    Put,
    Remove,
    Increment { score: i64 },
    Delete { deleted: bool },
}

/// Executes sorted set operations against a backing collection store.
///
/// Every operation validates its arguments before any index access, so a
/// rejected call never has side effects and an invalid argument is reported
/// even when the collection does not exist.
pub struct SortedSetEngine {
    store: SortedSetStore,
}

impl Default for SortedSetEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SortedSetEngine {
    pub fn new() -> Self {
        Self {
            store: SortedSetStore::new(),
        }
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            store: SortedSetStore::with_config(config),
        }
    }

    pub fn store(&self) -> &SortedSetStore {
        &self.store
    }

    /// Dispatches any operation through one entry point.
    pub fn execute(&self, operation: Operation) -> Result<Response, InvalidArgumentError> {
        trace!(operation = ?operation, "executing");
        match operation {
            Operation::FetchByRank {
                cache,
                set_name,
                options,
            } => self
                .fetch_by_rank(&cache, set_name, options)
                .map(Response::Fetch),
            Operation::FetchByScore {
                cache,
                set_name,
                options,
            } => self
                .fetch_by_score(&cache, set_name, options)
                .map(Response::Fetch),
            Operation::GetRank {
                cache,
                set_name,
                value,
                order,
            } => self
                .get_rank(&cache, set_name, value, order)
                .map(Response::GetRank),
            Operation::GetScore {
                cache,
                set_name,
                value,
            } => self
                .get_score(&cache, set_name, value)
                .map(Response::GetScore),
            Operation::GetScores {
                cache,
                set_name,
                values,
            } => self
                .get_scores(&cache, set_name, values)
                .map(Response::GetScores),
            Operation::PutElement {
                cache,
                set_name,
                value,
                score,
                ttl,
            } => self
                .put_element(&cache, set_name, value, score, ttl)
                .map(|()| Response::Put),
            Operation::PutElements {
                cache,
                set_name,
                elements,
                ttl,
            } => self
                .put_elements(&cache, set_name, elements, ttl)
                .map(|()| Response::Put),
            Operation::RemoveElement {
                cache,
                set_name,
                value,
            } => self
                .remove_element(&cache, set_name, value)
                .map(|()| Response::Remove),
            Operation::RemoveElements {
                cache,
                set_name,
                values,
            } => self
                .remove_elements(&cache, set_name, values)
                .map(|()| Response::Remove),
            Operation::IncrementScore {
                cache,
                set_name,
                value,
                amount,
                ttl,
            } => self
                .increment_score(&cache, set_name, value, amount, ttl)
                .map(|score| Response::Increment { score }),
            Operation::Delete { cache, set_name } => self
                .delete(&cache, set_name)
                .map(|deleted| Response::Delete { deleted }),
        }
    }

    /// Elements inside the requested rank window, in the requested order.
    pub fn fetch_by_rank(
        &self,
        cache: &str,
        set_name: impl Into<Bytes>,
        options: FetchByRankOptions,
    ) -> Result<SortedSetFetch, InvalidArgumentError> {
        let key = collection_key(cache, set_name.into())?;
        validate_rank_range(options.start_rank, options.end_rank)?;
        let hit = self.store.read(&key, |set| {
            let window = resolve_window(options.start_rank, options.end_rank, set.len());
            set.range_by_rank(window, options.order)
        });
        Ok(match hit {
            Some(elements) => SortedSetFetch::Hit { elements },
            None => SortedSetFetch::Miss,
        })
    }

    /// Elements whose score falls in the requested bounds, ordered, then
    /// offset and truncated.
    pub fn fetch_by_score(
        &self,
        cache: &str,
        set_name: impl Into<Bytes>,
        options: FetchByScoreOptions,
    ) -> Result<SortedSetFetch, InvalidArgumentError> {
        let key = collection_key(cache, set_name.into())?;
        if let (Some(min), Some(max)) = (options.min_score, options.max_score) {
            if min > max {
                return Err(InvalidArgumentError::MinScoreAboveMaxScore);
            }
        }
        let offset = match options.offset {
            None => 0,
            Some(o) if o >= 0 => o as usize,
            Some(_) => return Err(InvalidArgumentError::NegativeOffset),
        };
        let count = match options.count {
            None => None,
            Some(c) if c > 0 => Some(c as usize),
            Some(_) => return Err(InvalidArgumentError::NonPositiveCount),
        };
        let hit = self.store.read(&key, |set| {
            set.range_by_score(
                options.min_score,
                options.max_score,
                offset,
                count,
                options.order,
            )
        });
        Ok(match hit {
            Some(elements) => SortedSetFetch::Hit { elements },
            None => SortedSetFetch::Miss,
        })
    }

    /// Zero-based rank of the value, counted in the requested direction.
    pub fn get_rank(
        &self,
        cache: &str,
        set_name: impl Into<Bytes>,
        value: impl Into<Bytes>,
        order: Order,
    ) -> Result<SortedSetGetRank, InvalidArgumentError> {
        let key = collection_key(cache, set_name.into())?;
        let value = value.into();
        validate_value(&value)?;
        let rank = self
            .store
            .read(&key, |set| set.rank(value.as_ref(), order))
            .flatten();
        Ok(match rank {
            Some(rank) => SortedSetGetRank::Hit { rank: rank as u64 },
            None => SortedSetGetRank::Miss,
        })
    }

    pub fn get_score(
        &self,
        cache: &str,
        set_name: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Result<SortedSetGetScore, InvalidArgumentError> {
        let key = collection_key(cache, set_name.into())?;
        let value = value.into();
        validate_value(&value)?;
        let score = self
            .store
            .read(&key, |set| set.score(value.as_ref()))
            .flatten();
        Ok(match score {
            Some(score) => SortedSetGetScore::Hit { score },
            None => SortedSetGetScore::Miss,
        })
    }

    /// Scores for each requested value. Values that are not present are
    /// simply left out of the hit.
    pub fn get_scores<V>(
        &self,
        cache: &str,
        set_name: impl Into<Bytes>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<SortedSetGetScores, InvalidArgumentError>
    where
        V: Into<Bytes>,
    {
        let key = collection_key(cache, set_name.into())?;
        let values: Vec<Bytes> = values.into_iter().map(Into::into).collect();
        for value in &values {
            validate_value(value)?;
        }
        let hit = self.store.read(&key, |set| {
            values
                .iter()
                .filter_map(|v| {
                    set.score(v.as_ref()).map(|score| Element {
                        value: v.clone(),
                        score,
                    })
                })
                .collect::<Vec<_>>()
        });
        Ok(match hit {
            Some(elements) => SortedSetGetScores::Hit { elements },
            None => SortedSetGetScores::Miss,
        })
    }

    /// Stores one element, creating the collection when needed.
    pub fn put_element(
        &self,
        cache: &str,
        set_name: impl Into<Bytes>,
        value: impl Into<Bytes>,
        score: i64,
        ttl: Option<CollectionTtl>,
    ) -> Result<(), InvalidArgumentError> {
        let key = collection_key(cache, set_name.into())?;
        let value = value.into();
        validate_value(&value)?;
        let ttl = ttl.unwrap_or_else(|| self.store.default_ttl());
        self.store.write(&key, ttl, |set| {
            set.insert(value, score);
        });
        Ok(())
    }

    /// Stores a batch of elements. The whole batch is validated up front and
    /// applied under one collection lock, so readers see all of it or none.
    pub fn put_elements<V>(
        &self,
        cache: &str,
        set_name: impl Into<Bytes>,
        elements: impl IntoIterator<Item = (V, i64)>,
        ttl: Option<CollectionTtl>,
    ) -> Result<(), InvalidArgumentError>
    where
        V: Into<Bytes>,
    {
        let key = collection_key(cache, set_name.into())?;
        let elements: Vec<(Bytes, i64)> = elements
            .into_iter()
            .map(|(v, s)| (v.into(), s))
            .collect();
        for (value, _) in &elements {
            validate_value(value)?;
        }
        let ttl = ttl.unwrap_or_else(|| self.store.default_ttl());
        self.store.write(&key, ttl, |set| {
            for (value, score) in elements {
                set.insert(value, score);
            }
        });
        Ok(())
    }

    /// Removes one value. Succeeds whether or not the value, or the
    /// collection, exists; never creates a collection and never touches TTL.
    pub fn remove_element(
        &self,
        cache: &str,
        set_name: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Result<(), InvalidArgumentError> {
        let key = collection_key(cache, set_name.into())?;
        let value = value.into();
        validate_value(&value)?;
        self.store.update(&key, |set| {
            set.remove(value.as_ref());
        });
        Ok(())
    }

    /// Removes a batch of values under one collection lock.
    pub fn remove_elements<V>(
        &self,
        cache: &str,
        set_name: impl Into<Bytes>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<(), InvalidArgumentError>
    where
        V: Into<Bytes>,
    {
        let key = collection_key(cache, set_name.into())?;
        let values: Vec<Bytes> = values.into_iter().map(Into::into).collect();
        for value in &values {
            validate_value(value)?;
        }
        self.store.update(&key, |set| {
            for value in &values {
                set.remove(value.as_ref());
            }
        });
        Ok(())
    }

    /// Adds `amount` (1 when unspecified) to the value's score, creating the
    /// collection and the value as needed, and returns the new score.
    pub fn increment_score(
        &self,
        cache: &str,
        set_name: impl Into<Bytes>,
        value: impl Into<Bytes>,
        amount: Option<i64>,
        ttl: Option<CollectionTtl>,
    ) -> Result<i64, InvalidArgumentError> {
        let key = collection_key(cache, set_name.into())?;
        let value = value.into();
        validate_value(&value)?;
        let ttl = ttl.unwrap_or_else(|| self.store.default_ttl());
        let delta = amount.unwrap_or(1);
        Ok(self.store.write(&key, ttl, |set| set.increment(value, delta)))
    }

    /// Removes the whole collection, as the cache-entry deletion path does.
    /// Returns whether a live collection was deleted.
    pub fn delete(
        &self,
        cache: &str,
        set_name: impl Into<Bytes>,
    ) -> Result<bool, InvalidArgumentError> {
        let key = collection_key(cache, set_name.into())?;
        Ok(self.store.delete(&key))
    }

    pub fn exists(
        &self,
        cache: &str,
        set_name: impl Into<Bytes>,
    ) -> Result<bool, InvalidArgumentError> {
        let key = collection_key(cache, set_name.into())?;
        Ok(self.store.exists(&key))
    }

    /// Number of elements, or None when the collection is absent.
    pub fn length(
        &self,
        cache: &str,
        set_name: impl Into<Bytes>,
    ) -> Result<Option<usize>, InvalidArgumentError> {
        let key = collection_key(cache, set_name.into())?;
        Ok(self.store.len(&key))
    }
}

fn collection_key(cache: &str, set_name: Bytes) -> Result<CollectionKey, InvalidArgumentError> {
    if cache.trim().is_empty() {
        return Err(InvalidArgumentError::BlankCacheName);
    }
    if set_name.iter().all(u8::is_ascii_whitespace) {
        return Err(InvalidArgumentError::BlankSortedSetName);
    }
    Ok(CollectionKey::new(cache, set_name))
}

fn validate_value(value: &Bytes) -> Result<(), InvalidArgumentError> {
    if value.is_empty() {
        return Err(InvalidArgumentError::EmptyValue);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected_before_store_access() {
        let engine = SortedSetEngine::new();
        assert_eq!(
            engine.put_element("", "s", "v", 1, None),
            Err(InvalidArgumentError::BlankCacheName)
        );
        assert_eq!(
            engine.put_element("   ", "s", "v", 1, None),
            Err(InvalidArgumentError::BlankCacheName)
        );
        assert_eq!(
            engine.put_element("cache", "  ", "v", 1, None),
            Err(InvalidArgumentError::BlankSortedSetName)
        );
        assert_eq!(
            engine.fetch_by_rank("cache", "", FetchByRankOptions::default()),
            Err(InvalidArgumentError::BlankSortedSetName)
        );
        assert_eq!(engine.store().collection_count(), 0);
    }

    #[test]
    fn empty_value_is_rejected() {
        let engine = SortedSetEngine::new();
        assert_eq!(
            engine.put_element("cache", "s", "", 1, None),
            Err(InvalidArgumentError::EmptyValue)
        );
        assert_eq!(
            engine.increment_score("cache", "s", "", None, None),
            Err(InvalidArgumentError::EmptyValue)
        );
        assert_eq!(
            engine.get_score("cache", "s", ""),
            Err(InvalidArgumentError::EmptyValue)
        );
        assert_eq!(engine.store().collection_count(), 0);
    }

    #[test]
    fn batch_validation_applies_nothing() {
        let engine = SortedSetEngine::new();
        let result = engine.put_elements("cache", "s", vec![("ok", 1), ("", 2)], None);
        assert_eq!(result, Err(InvalidArgumentError::EmptyValue));
        assert!(!engine.exists("cache", "s").unwrap());
    }

    #[test]
    fn invalid_ranks_report_error_even_on_absent_collection() {
        let engine = SortedSetEngine::new();
        let options = FetchByRankOptions {
            start_rank: Some(5),
            end_rank: Some(3),
            ..Default::default()
        };
        assert_eq!(
            engine.fetch_by_rank("cache", "missing", options),
            Err(InvalidArgumentError::StartRankNotBeforeEndRank)
        );
    }

    #[test]
    fn execute_round_trips_each_operation_shape() {
        let engine = SortedSetEngine::new();
        let put = engine
            .execute(Operation::PutElement {
                cache: "cache".into(),
                set_name: Bytes::from_static(b"s"),
                value: Bytes::from_static(b"v"),
                score: 7,
                ttl: None,
            })
            .unwrap();
        assert_eq!(put, Response::Put);

        let score = engine
            .execute(Operation::GetScore {
                cache: "cache".into(),
                set_name: Bytes::from_static(b"s"),
                value: Bytes::from_static(b"v"),
            })
            .unwrap();
        assert_eq!(score, Response::GetScore(SortedSetGetScore::Hit { score: 7 }));

        let deleted = engine
            .execute(Operation::Delete {
                cache: "cache".into(),
                set_name: Bytes::from_static(b"s"),
            })
            .unwrap();
        assert_eq!(deleted, Response::Delete { deleted: true });
    }
}
