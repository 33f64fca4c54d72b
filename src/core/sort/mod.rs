//! # Sort Module
//!
//! Orders a selection before numbering.
//!
//! Natural ordering splits a name into runs of digits and runs of
//! everything else, so `file2` sorts before `file10` and `IMG_001` before
//! `IMG_010`. The sequence index of an item is its position after sorting,
//! which is why preview and execution must sort the same way.

use crate::core::media::MediaItem;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How a selection is ordered before numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
    /// Natural order of the current names
    #[default]
    Natural,
    /// Newest first
    DateModifiedDescending,
    /// Largest first
    SizeDescending,
    /// Keep the selection order
    OriginalOrder,
}

/// A maximal run of digits or of non-digits
#[derive(Debug, PartialEq, Eq)]
enum Run<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn split_runs(name: &str) -> Vec<Run<'_>> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut in_digits: Option<bool> = None;

    for (i, ch) in name.char_indices() {
        let digit = ch.is_ascii_digit();
        match in_digits {
            Some(current) if current != digit => {
                runs.push(make_run(&name[start..i], current));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(digit);
    }

    if let Some(current) = in_digits {
        runs.push(make_run(&name[start..], current));
    }
    runs
}

fn make_run(text: &str, digits: bool) -> Run<'_> {
    if digits {
        Run::Digits(text)
    } else {
        Run::Text(text)
    }
}

/// Compare two digit strings as unbounded integers
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_text(a: &str, b: &str) -> Ordering {
    let a = a.chars().flat_map(char::to_lowercase);
    let b = b.chars().flat_map(char::to_lowercase);
    a.cmp(b)
}

/// Natural-order comparison of two names.
///
/// Digit runs compare numerically, text runs case-insensitively, and a
/// digit run sorts before a text run at the same position. When every
/// compared run is equal, the name with fewer runs comes first.
pub fn natural_compare(a: &str, b: &str) -> Ordering {
    let left = split_runs(a);
    let right = split_runs(b);

    for (l, r) in left.iter().zip(right.iter()) {
        let ordering = match (l, r) {
            (Run::Digits(x), Run::Digits(y)) => compare_numeric(x, y),
            (Run::Digits(_), Run::Text(_)) => Ordering::Less,
            (Run::Text(_), Run::Digits(_)) => Ordering::Greater,
            (Run::Text(x), Run::Text(y)) => compare_text(x, y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    left.len().cmp(&right.len())
}

/// Sort names in natural order (stable)
pub fn natural_sort<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| natural_compare(a.as_ref(), b.as_ref()));
}

/// Order items for numbering. All strategies are stable, so ties keep
/// their selection order.
pub fn sort_items(items: &mut [MediaItem], strategy: SortStrategy) {
    match strategy {
        SortStrategy::Natural => items.sort_by(|a, b| natural_compare(&a.name, &b.name)),
        SortStrategy::DateModifiedDescending => items.sort_by(|a, b| b.modified.cmp(&a.modified)),
        SortStrategy::SizeDescending => items.sort_by(|a, b| b.size.cmp(&a.size)),
        SortStrategy::OriginalOrder => {}
    }
}

/// Owned convenience over `sort_items`
pub fn sorted(mut items: Vec<MediaItem>, strategy: SortStrategy) -> Vec<MediaItem> {
    sort_items(&mut items, strategy);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn split_runs_alternates_digits_and_text() {
        assert_eq!(
            split_runs("file10b2"),
            vec![
                Run::Text("file"),
                Run::Digits("10"),
                Run::Text("b"),
                Run::Digits("2")
            ]
        );
        assert!(split_runs("").is_empty());
    }

    #[test]
    fn numbers_compare_numerically() {
        let mut names = vec!["file2", "file10", "file1"];
        natural_sort(&mut names);
        assert_eq!(names, vec!["file1", "file2", "file10"]);
    }

    #[test]
    fn zero_padded_names_keep_sequence() {
        let mut names = vec!["IMG_010", "IMG_002", "IMG_001"];
        natural_sort(&mut names);
        assert_eq!(names, vec!["IMG_001", "IMG_002", "IMG_010"]);
        assert_eq!(natural_compare("002", "10"), Ordering::Less);
    }

    #[test]
    fn huge_numbers_do_not_overflow() {
        let a = "shot99999999999999999999999999";
        let b = "shot100000000000000000000000000";
        assert_eq!(natural_compare(a, b), Ordering::Less);
    }

    #[test]
    fn text_is_case_insensitive_and_sort_is_stable() {
        assert_eq!(natural_compare("a", "A"), Ordering::Equal);
        let mut names = vec!["b", "a", "A"];
        natural_sort(&mut names);
        assert_eq!(names, vec!["a", "A", "b"]);
    }

    #[test]
    fn digit_run_sorts_before_text_run() {
        assert_eq!(natural_compare("1abc", "abc"), Ordering::Less);
        assert_eq!(natural_compare("b", "2"), Ordering::Greater);
    }

    #[test]
    fn fewer_runs_sort_first_when_prefix_equal() {
        assert_eq!(natural_compare("file", "file1"), Ordering::Less);
        assert_eq!(natural_compare("", "a"), Ordering::Less);
        assert_eq!(natural_compare("", ""), Ordering::Equal);
    }

    #[test]
    fn ordering_is_antisymmetric_and_transitive() {
        let names = ["a1", "a01b", "A2", "a10", "b", "1", "", "a1b2", "a1B3"];
        for x in &names {
            for y in &names {
                assert_eq!(natural_compare(x, y), natural_compare(y, x).reverse());
                for z in &names {
                    if natural_compare(x, y) != Ordering::Greater
                        && natural_compare(y, z) != Ordering::Greater
                    {
                        assert_ne!(natural_compare(x, z), Ordering::Greater);
                    }
                }
            }
        }
    }

    fn item(name: &str, size: u64, age_secs: u64) -> MediaItem {
        MediaItem::new(
            format!("/photos/{}", name),
            size,
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000 - age_secs),
        )
    }

    fn names(items: &[MediaItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn strategies_order_items() {
        let items = vec![item("b10.jpg", 5, 30), item("b2.jpg", 50, 10), item("a.jpg", 20, 20)];

        assert_eq!(
            names(&sorted(items.clone(), SortStrategy::Natural)),
            vec!["a.jpg", "b2.jpg", "b10.jpg"]
        );
        assert_eq!(
            names(&sorted(items.clone(), SortStrategy::DateModifiedDescending)),
            vec!["b2.jpg", "a.jpg", "b10.jpg"]
        );
        assert_eq!(
            names(&sorted(items.clone(), SortStrategy::SizeDescending)),
            vec!["b2.jpg", "a.jpg", "b10.jpg"]
        );
        assert_eq!(
            names(&sorted(items, SortStrategy::OriginalOrder)),
            vec!["b10.jpg", "b2.jpg", "a.jpg"]
        );
    }
}
