//! Unit-tests for the quicksort / binary-search utility backing the sample
//! cell-ID lists.

use ising::sorted::{binary_search, quicksort};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

#[test]
fn test_quicksort_matches_std_sort() {
    let mut rng = ChaCha20Rng::seed_from_u64(1);

    let mut data: Vec<u32> = (0..500).collect();
    data.shuffle(&mut rng);

    let mut expected = data.clone();
    expected.sort();

    quicksort(&mut data);
    assert_eq!(data, expected, "quicksort disagrees with std sort");
}

#[test]
fn test_quicksort_duplicates_and_edge_lengths() {
    let mut empty: Vec<i32> = vec![];
    quicksort(&mut empty);
    assert!(empty.is_empty());

    let mut single = vec![42];
    quicksort(&mut single);
    assert_eq!(single, vec![42]);

    let mut dups = vec![3, 1, 3, 1, 3, 1, 2, 2];
    quicksort(&mut dups);
    assert_eq!(dups, vec![1, 1, 1, 2, 2, 3, 3, 3]);

    let mut reversed: Vec<i32> = (0..64).rev().collect();
    quicksort(&mut reversed);
    let sorted: Vec<i32> = (0..64).collect();
    assert_eq!(reversed, sorted);
}

#[test]
fn test_binary_search_finds_every_member() {
    let data: Vec<u32> = (0..200).map(|i| i * 3).collect();

    for (i, &item) in data.iter().enumerate() {
        let idx = binary_search(&data, &item);
        assert_eq!(idx, Some(i), "member {item} not found at its index");
    }

    // Values strictly between members are absent.
    assert_eq!(binary_search(&data, &1), None);
    assert_eq!(binary_search(&data, &598), None);
    assert_eq!(binary_search(&data, &10_000), None);

    let empty: Vec<u32> = vec![];
    assert_eq!(binary_search(&empty, &0), None);
}
