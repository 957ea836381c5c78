use std::collections::BTreeMap;

use serde::Serialize;

use lotto539_db::models::Draw;

use crate::history::History;
use crate::stats::FrequencyTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairEntry {
    pub a: u8,
    pub b: u8,
    pub count: u32,
}

/// Comptage des paires non ordonnées, clés canoniques `(a, b)` avec `a < b`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairCounts {
    pub draws: usize,
    counts: BTreeMap<(u8, u8), u32>,
}

impl PairCounts {
    pub fn from_draws(draws: &[Draw]) -> Self {
        let mut counts = BTreeMap::new();
        for draw in draws {
            let nums = &draw.numbers;
            for i in 0..nums.len() {
                for j in (i + 1)..nums.len() {
                    *counts.entry(canonical(nums[i], nums[j])).or_insert(0) += 1;
                }
            }
        }
        Self {
            draws: draws.len(),
            counts,
        }
    }

    /// Ordre des arguments indifférent.
    pub fn get(&self, a: u8, b: u8) -> u32 {
        self.counts.get(&canonical(a, b)).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = PairEntry> + '_ {
        self.counts
            .iter()
            .map(|(&(a, b), &count)| PairEntry { a, b, count })
    }

    /// Les `n` paires les plus fréquentes, à égalité par paire croissante.
    pub fn top(&self, n: usize) -> Vec<PairEntry> {
        let mut entries: Vec<PairEntry> = self.iter().collect();
        entries.sort_by(|x, y| y.count.cmp(&x.count).then((x.a, x.b).cmp(&(y.a, y.b))));
        entries.truncate(n);
        entries
    }
}

fn canonical(a: u8, b: u8) -> (u8, u8) {
    if a <= b { (a, b) } else { (b, a) }
}

pub fn pair_counts(history: &History, trailing_span: usize) -> PairCounts {
    PairCounts::from_draws(history.trailing(trailing_span))
}

/// Numéros du tirage suivant chaque sortie de `seed_number`.
/// `draws` du tableau retourné = nombre de tirages suivants comptabilisés.
pub fn successor_counts(history: &History, seed_number: u8) -> FrequencyTable {
    let mut table = FrequencyTable::empty();
    for pair in history.draws().windows(2) {
        if pair[0].contains(seed_number) {
            table.add_draw(&pair[1]);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{history_from, make_test_history};

    #[test]
    fn test_ten_pairs_per_draw() {
        let history = make_test_history(25);
        let pairs = pair_counts(&history, 25);
        assert_eq!(pairs.total(), 250);
        assert_eq!(pairs.draws, 25);
    }

    #[test]
    fn test_canonical_keys_only() {
        let history = history_from(&[[9, 3, 27, 14, 1], [3, 9, 10, 11, 12]]);
        let pairs = pair_counts(&history, 10);
        assert!(pairs.iter().all(|e| e.a < e.b));
        assert_eq!(pairs.get(3, 9), 2);
        assert_eq!(pairs.get(9, 3), 2);
        assert_eq!(pairs.get(1, 27), 1);
        assert_eq!(pairs.get(1, 12), 0);
    }

    #[test]
    fn test_trailing_span_capped() {
        let history = make_test_history(5);
        assert_eq!(pair_counts(&history, 100).total(), 50);
        assert_eq!(pair_counts(&history, 2).total(), 20);
        assert!(pair_counts(&History::default(), 30).is_empty());
    }

    #[test]
    fn test_top_pairs_order() {
        let history = history_from(&[
            [1, 2, 3, 4, 5],
            [1, 2, 6, 7, 8],
            [1, 2, 3, 9, 10],
        ]);
        let top = pair_counts(&history, 3).top(2);
        assert_eq!(top[0], PairEntry { a: 1, b: 2, count: 3 });
        assert_eq!(top[1], PairEntry { a: 1, b: 3, count: 2 });
    }

    #[test]
    fn test_successor_counts() {
        let history = history_from(&[
            [1, 2, 3, 4, 5],
            [6, 7, 8, 9, 10],
            [1, 11, 12, 13, 14],
            [6, 15, 16, 17, 18],
            [1, 20, 21, 22, 23],
        ]);
        let succ = successor_counts(&history, 1);
        // Le dernier tirage contenant 1 n'a pas de suivant.
        assert_eq!(succ.draws, 2);
        assert_eq!(succ.get(6), 2);
        assert_eq!(succ.get(7), 1);
        assert_eq!(succ.get(15), 1);
        assert_eq!(succ.get(1), 0);
        assert_eq!(succ.total(), 10);
    }

    #[test]
    fn test_successor_counts_unknown_seed() {
        let history = make_test_history(30);
        assert_eq!(successor_counts(&history, 39).total(), 0);
    }
}
