use std::ops::Range;

use crate::error::InvalidArgumentError;

/// Checks a raw start/end rank pair before any clamping is applied.
///
/// Rejection requires both bounds and matching signs: a non-negative pair
/// must satisfy `start < end`, and an all-negative pair must satisfy the same
/// in raw terms. Mixed-sign pairs cannot be compared without the collection
/// size and are never rejected here.
pub(crate) fn validate_rank_range(
    start_rank: Option<i64>,
    end_rank: Option<i64>,
) -> Result<(), InvalidArgumentError> {
    let (Some(start), Some(end)) = (start_rank, end_rank) else {
        return Ok(());
    };
    if start >= 0 && end >= 0 && start >= end {
        return Err(InvalidArgumentError::StartRankNotBeforeEndRank);
    }
    if start < 0 && end < 0 && start >= end {
        return Err(InvalidArgumentError::NegativeStartRankNotBeforeNegativeEndRank);
    }
    Ok(())
}

/// Resolves a validated rank pair to an absolute half-open window over a
/// sequence of `len` elements.
///
/// Negative ranks count from the end; an absent start means the front, an
/// absent end means the back. The caller traverses the sequence in whichever
/// direction the query asked for, so the window itself is direction-blind.
/// A window that is out of bounds or crosses after resolution is empty.
pub(crate) fn resolve_window(
    start_rank: Option<i64>,
    end_rank: Option<i64>,
    len: usize,
) -> Range<usize> {
    let n = len as i64;
    let start = match start_rank {
        None => 0,
        Some(r) if r >= 0 => r,
        Some(r) => (n + r).max(0),
    };
    let end = match end_rank {
        None => n,
        Some(r) if r >= 0 => r.min(n),
        Some(r) => n + r,
    };
    if start >= end || start >= n {
        return 0..0;
    }
    start as usize..end as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_bounds_cover_everything() {
        assert_eq!(resolve_window(None, None, 8), 0..8);
        assert_eq!(resolve_window(None, None, 0), 0..0);
    }

    #[test]
    fn positive_bounds_clamp_to_len() {
        assert_eq!(resolve_window(Some(4), None, 8), 4..8);
        assert_eq!(resolve_window(None, Some(3), 8), 0..3);
        assert_eq!(resolve_window(Some(5), Some(100), 8), 5..8);
    }

    #[test]
    fn out_of_bounds_start_is_empty() {
        assert_eq!(resolve_window(Some(10), None, 8), 0..0);
        assert_eq!(resolve_window(Some(8), None, 8), 0..0);
    }

    #[test]
    fn negative_start_counts_from_end() {
        assert_eq!(resolve_window(Some(-5), None, 8), 3..8);
        assert_eq!(resolve_window(Some(-20), None, 8), 0..8);
    }

    #[test]
    fn negative_end_counts_from_end() {
        assert_eq!(resolve_window(None, Some(-2), 8), 0..6);
        assert_eq!(resolve_window(Some(-5), Some(-2), 8), 3..6);
        assert_eq!(resolve_window(None, Some(-20), 8), 0..0);
    }

    #[test]
    fn mixed_signs_resolve_without_error() {
        assert!(validate_rank_range(Some(2), Some(-1)).is_ok());
        assert_eq!(resolve_window(Some(2), Some(-1), 8), 2..7);
        assert!(validate_rank_range(Some(-2), Some(1)).is_ok());
        assert_eq!(resolve_window(Some(-2), Some(1), 8), 0..0);
    }

    #[test]
    fn crossed_positive_pair_is_rejected() {
        assert_eq!(
            validate_rank_range(Some(5), Some(3)),
            Err(InvalidArgumentError::StartRankNotBeforeEndRank)
        );
        assert_eq!(
            validate_rank_range(Some(3), Some(3)),
            Err(InvalidArgumentError::StartRankNotBeforeEndRank)
        );
    }

    #[test]
    fn crossed_negative_pair_is_rejected_with_its_own_message() {
        assert_eq!(
            validate_rank_range(Some(-3), Some(-5)),
            Err(InvalidArgumentError::NegativeStartRankNotBeforeNegativeEndRank)
        );
        assert_eq!(
            validate_rank_range(Some(-3), Some(-3)),
            Err(InvalidArgumentError::NegativeStartRankNotBeforeNegativeEndRank)
        );
    }

    #[test]
    fn single_bound_is_never_rejected() {
        assert!(validate_rank_range(Some(5), None).is_ok());
        assert!(validate_rank_range(None, Some(-5)).is_ok());
    }
}
