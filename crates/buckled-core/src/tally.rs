//! Frequency counting with first-seen tie order.

use std::collections::HashMap;

/// Count occurrences and return the `limit` most frequent values.
///
/// Ties keep the order in which values were first seen, so results are
/// deterministic for the same input sequence.
pub fn top_by_count<I, S>(items: I, limit: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for item in items {
        let key = item.as_ref();
        match counts.get_mut(key) {
            Some(c) => *c += 1,
            None => {
                counts.insert(key.to_string(), 1);
                order.push(key.to_string());
            }
        }
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|k| {
            let c = counts.get(&k).copied().unwrap_or(0);
            (k, c)
        })
        .collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

/// Like [`top_by_count`] but returns only the values.
pub fn top_values<I, S>(items: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    top_by_count(items, limit).into_iter().map(|(k, _)| k).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_ties() {
        let items = ["b", "a", "c", "a", "b", "d"];
        let top = top_by_count(items, 3);
        assert_eq!(
            top,
            vec![("b".to_string(), 2), ("a".to_string(), 2), ("c".to_string(), 1)]
        );
    }

    #[test]
    fn test_empty_and_limit() {
        assert!(top_values(Vec::<String>::new(), 5).is_empty());
        assert_eq!(top_values(["x", "y"], 1), vec!["x".to_string()]);
    }
}
