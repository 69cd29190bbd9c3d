use bytes::Bytes;
use rankset::{Order, SortedSet};

fn b(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

fn names(elements: &[rankset::Element]) -> Vec<String> {
    elements
        .iter()
        .map(|e| String::from_utf8(e.value.to_vec()).unwrap())
        .collect()
}

#[test]
fn lexicographic_order_for_equal_scores() {
    let mut set = SortedSet::default();
    set.insert(b("b"), 1);
    set.insert(b("a"), 1);
    set.insert(b("c"), 1);
    let all = set.range_by_rank(0..3, Order::Ascending);
    assert_eq!(names(&all), ["a", "b", "c"]);
}

#[test]
fn ties_straddling_other_scores() {
    let mut set = SortedSet::default();
    for (v, s) in [("mid2", 5), ("low", 1), ("mid1", 5), ("high", 9)] {
        set.insert(b(v), s);
    }
    let all = set.range_by_rank(0..4, Order::Ascending);
    assert_eq!(names(&all), ["low", "mid1", "mid2", "high"]);
    assert_eq!(set.rank(b"mid1", Order::Ascending), Some(1));
    assert_eq!(set.rank(b"mid2", Order::Ascending), Some(2));
    assert_eq!(set.rank(b"mid2", Order::Descending), Some(1));
}

#[test]
fn duplicate_insert_reports_no_change() {
    let mut set = SortedSet::default();
    assert!(set.insert(b("a"), 7));
    assert!(!set.insert(b("a"), 7));
    assert_eq!(set.len(), 1);
}

#[test]
fn windows_against_a_known_layout() {
    let mut set = SortedSet::default();
    for (i, v) in ["m0", "m1", "m2", "m3", "m4"].iter().enumerate() {
        set.insert(b(v), i as i64);
    }
    assert_eq!(names(&set.range_by_rank(3..5, Order::Ascending)), ["m3", "m4"]);
    assert_eq!(names(&set.range_by_rank(0..2, Order::Descending)), ["m4", "m3"]);
    assert!(set.range_by_rank(0..0, Order::Ascending).is_empty());
}
