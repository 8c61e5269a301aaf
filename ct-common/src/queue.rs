//! Pending-transfer queue removal.
//!
//! Entries are removed by swap-remove (overwrite with the last element, then
//! shrink) in descending index order, so removing a high index never moves an
//! element that is still waiting to be removed. The resulting order is part of
//! the protocol: anyone replaying ledger events must use the same rule.

use std::collections::HashSet;

use crate::error::{Error, Result};

/// Check an index set against a queue of length `len`: at most `max` indexes,
/// no duplicates, every index `< len`.
pub fn validate_indexes(indexes: &[usize], len: usize, max: usize) -> Result<()> {
    if indexes.len() > max {
        return Err(Error::TooManyIndexes {
            count: indexes.len(),
            max,
        });
    }
    let mut seen = HashSet::with_capacity(indexes.len());
    for &index in indexes {
        if !seen.insert(index) {
            return Err(Error::DuplicateIndex(index));
        }
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
    }
    Ok(())
}

/// Borrow the selected entries in ascending index order.
pub fn select_ascending<'a, T>(items: &'a [T], indexes: &[usize]) -> Result<Vec<&'a T>> {
    validate_indexes(indexes, items.len(), usize::MAX)?;
    let mut sorted = indexes.to_vec();
    sorted.sort_unstable();
    Ok(sorted.into_iter().map(|i| &items[i]).collect())
}

/// Remove `indexes` from `items` by descending swap-remove.
///
/// Returns the removed entries in ascending original-index order. `items` is
/// left untouched when the index set is invalid.
pub fn swap_remove_descending<T>(items: &mut Vec<T>, indexes: &[usize]) -> Result<Vec<T>> {
    validate_indexes(indexes, items.len(), usize::MAX)?;
    let mut sorted = indexes.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let mut removed: Vec<T> = sorted.into_iter().map(|i| items.swap_remove(i)).collect();
    removed.reverse();
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn removing_first_and_last_of_three_keeps_middle() {
        let mut queue = vec!['a', 'b', 'c'];
        let removed = swap_remove_descending(&mut queue, &[0, 2]).unwrap();
        assert_eq!(queue, vec!['b']);
        assert_eq!(removed, vec!['a', 'c']);
    }

    #[test]
    fn order_follows_swap_remove_not_original_order() {
        let mut queue = vec![0, 1, 2, 3, 4];
        swap_remove_descending(&mut queue, &[1]).unwrap();
        assert_eq!(queue, vec![0, 4, 2, 3]);

        let mut queue = vec![0, 1, 2, 3, 4];
        swap_remove_descending(&mut queue, &[0, 1]).unwrap();
        // remove 1 -> [0,4,2,3]; remove 0 -> [3,4,2]
        assert_eq!(queue, vec![3, 4, 2]);
    }

    #[test]
    fn submitted_order_does_not_matter() {
        let mut a = vec![10, 11, 12, 13];
        let mut b = a.clone();
        swap_remove_descending(&mut a, &[0, 2]).unwrap();
        swap_remove_descending(&mut b, &[2, 0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_sets_leave_queue_untouched() {
        let mut queue = vec![1, 2, 3];
        assert_eq!(
            swap_remove_descending(&mut queue, &[1, 1]),
            Err(Error::DuplicateIndex(1))
        );
        assert_eq!(
            swap_remove_descending(&mut queue, &[0, 3]),
            Err(Error::IndexOutOfBounds { index: 3, len: 3 })
        );
        assert_eq!(queue, vec![1, 2, 3]);
    }

    #[test]
    fn validate_enforces_batch_limit() {
        assert_eq!(
            validate_indexes(&[0, 1, 2], 5, 2),
            Err(Error::TooManyIndexes { count: 3, max: 2 })
        );
        assert!(validate_indexes(&[], 0, 2).is_ok());
    }

    #[test]
    fn select_ascending_sorts_by_index() {
        let queue = ['a', 'b', 'c', 'd'];
        let picked = select_ascending(&queue, &[3, 0, 2]).unwrap();
        assert_eq!(picked, vec![&'a', &'c', &'d']);
    }

    fn queue_and_indexes() -> impl Strategy<Value = (Vec<u32>, Vec<usize>)> {
        (0usize..16).prop_flat_map(|len| {
            (
                Just((0..len as u32).collect::<Vec<_>>()),
                proptest::sample::subsequence((0..len).collect::<Vec<_>>(), 0..=len)
                    .prop_shuffle(),
            )
        })
    }

    /// Straightforward model of the removal rule.
    fn model(mut items: Vec<u32>, indexes: &[usize]) -> Vec<u32> {
        let mut sorted = indexes.to_vec();
        sorted.sort_unstable();
        for &i in sorted.iter().rev() {
            let last = items.len() - 1;
            items[i] = items[last];
            items.truncate(last);
        }
        items
    }

    proptest! {
        #[test]
        fn removal_keeps_exactly_the_unselected_entries((items, indexes) in queue_and_indexes()) {
            let original = items.clone();
            let mut queue = items;
            let removed = swap_remove_descending(&mut queue, &indexes).unwrap();

            prop_assert_eq!(queue.len(), original.len() - indexes.len());
            prop_assert_eq!(removed.len(), indexes.len());

            let mut kept: Vec<u32> = queue.clone();
            kept.sort_unstable();
            let mut expected: Vec<u32> = original
                .iter()
                .enumerate()
                .filter(|(i, _)| !indexes.contains(i))
                .map(|(_, v)| *v)
                .collect();
            expected.sort_unstable();
            prop_assert_eq!(kept, expected);

            prop_assert_eq!(queue, model(original, &indexes));
        }
    }
}
