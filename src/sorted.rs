// sorted.rs - In-place quicksort and binary search for sorted cell-ID lists

use std::cmp::Ordering;

/// Sort a slice in place with a median-of-three quicksort.
///
/// Backs the sample cell-ID lists, which stay small (tens to a few thousand
/// entries), so recursion depth is never a concern.
pub fn quicksort<T: Ord>(data: &mut [T]) {
    if data.len() > 1 {
        let pivot = partition(data);
        let (left, right) = data.split_at_mut(pivot);
        quicksort(left);
        quicksort(&mut right[1..]);
    }
}

/// Partition around a median-of-three pivot and return its final index.
fn partition<T: Ord>(data: &mut [T]) -> usize {
    let last = data.len() - 1;
    let pivot = choose_pivot(data);
    data.swap(pivot, last);
    let mut next = 0;
    for i in 0..last {
        if data[i] <= data[last] {
            data.swap(next, i);
            next += 1;
        }
    }
    data.swap(next, last);
    next
}

/// Median of the first, middle and last elements. Leaves those three sorted
/// among themselves and returns the middle index.
fn choose_pivot<T: Ord>(data: &mut [T]) -> usize {
    let last = data.len() - 1;
    let center = last / 2;
    if data[0] > data[center] {
        data.swap(0, center);
    }
    if data[0] > data[last] {
        data.swap(0, last);
    }
    if data[center] > data[last] {
        data.swap(center, last);
    }
    center
}

/// Search a sorted slice for `item`. Returns the index of one occurrence, or
/// `None` if the item is absent.
pub fn binary_search<T: Ord>(data: &[T], item: &T) -> Option<usize> {
    let mut lo = 0;
    let mut hi = data.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match data[mid].cmp(item) {
            Ordering::Equal => return Some(mid),
            Ordering::Less => lo = mid + 1,
            Ordering::Greater => hi = mid,
        }
    }
    None
}
