//! Row alignment by entity key.
//!
//! Rows fetched for different reference dates are joined by entity key. An
//! entity missing from the side being aligned is dropped rather than
//! null-filled, and when a key repeats the first occurrence wins.

use std::collections::HashMap;
use std::hash::Hash;

/// Indexes `rows` by `key`. The first row for each key wins.
pub fn index_by<K, T, F>(rows: impl IntoIterator<Item = T>, key: F) -> HashMap<K, T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut index = HashMap::new();
    for row in rows {
        index.entry(key(&row)).or_insert(row);
    }
    index
}

/// Pairs every row of `primary` with the row of `other` sharing its key.
///
/// Keeps `primary` order; rows without a partner are dropped.
pub fn align<'a, K, T, U, F>(
    primary: &'a [T],
    other: &'a HashMap<K, U>,
    key: F,
) -> Vec<(&'a T, &'a U)>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    primary
        .iter()
        .filter_map(|row| other.get(&key(row)).map(|partner| (row, partner)))
        .collect()
}

/// Sums `value` per `key`, keeping first-appearance order of keys.
pub fn sum_by_key<K, T, F, V>(rows: impl IntoIterator<Item = T>, key: F, value: V) -> Vec<(K, f64)>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
    V: Fn(&T) -> f64,
{
    let mut sums: Vec<(K, f64)> = Vec::new();
    let mut positions: HashMap<K, usize> = HashMap::new();
    for row in rows {
        let k = key(&row);
        let v = value(&row);
        match positions.get(&k) {
            Some(&i) => sums[i].1 += v,
            None => {
                positions.insert(k.clone(), sums.len());
                sums.push((k, v));
            }
        }
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_occurrence_wins() {
        let index = index_by(vec![("A", 1), ("B", 2), ("A", 3)], |r| r.0);
        assert_eq!(index.len(), 2);
        assert_eq!(index["A"], ("A", 1));
    }

    #[test]
    fn test_align_drops_unmatched() {
        let today = vec![("A", 100.0), ("B", 50.0), ("C", 10.0)];
        let yesterday = index_by(vec![("C", 9.0), ("A", 90.0)], |r| r.0);
        let pairs = align(&today, &yesterday, |r| r.0);
        let keys: Vec<&str> = pairs.iter().map(|(t, _)| t.0).collect();
        assert_eq!(keys, ["A", "C"]);
        assert_eq!(pairs[0].1.1, 90.0);
    }

    #[test]
    fn test_sum_by_key() {
        let rows = vec![("B", 1.0), ("A", 2.0), ("B", 3.0)];
        assert_eq!(sum_by_key(rows, |r| r.0, |r| r.1), vec![("B", 4.0), ("A", 2.0)]);
    }
}
