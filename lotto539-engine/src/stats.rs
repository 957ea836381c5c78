use serde::Serialize;

use lotto539_db::models::{Draw, POOL_SIZE};

use crate::history::History;

/// Nombre d'apparitions de chaque numéro sur un ensemble de tirages.
/// `counts[n - 1]` correspond au numéro `n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyTable {
    pub draws: usize,
    counts: Vec<u32>,
}

impl FrequencyTable {
    pub fn empty() -> Self {
        Self {
            draws: 0,
            counts: vec![0; POOL_SIZE as usize],
        }
    }

    pub fn from_draws(draws: &[Draw]) -> Self {
        let mut table = Self::empty();
        for draw in draws {
            table.add_draw(draw);
        }
        table
    }

    pub(crate) fn add_draw(&mut self, draw: &Draw) {
        self.draws += 1;
        for &n in &draw.numbers {
            let idx = (n - 1) as usize;
            if idx < self.counts.len() {
                self.counts[idx] += 1;
            }
        }
    }

    pub fn get(&self, number: u8) -> u32 {
        match number {
            1..=POOL_SIZE => self.counts[(number - 1) as usize],
            _ => 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &c)| ((i + 1) as u8, c))
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Les 39 numéros, fréquence décroissante puis numéro croissant.
    pub fn ranked(&self) -> Vec<(u8, u32)> {
        let mut ranked: Vec<(u8, u32)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }

    /// Numéros vus au moins une fois, dans l'ordre de `ranked`.
    pub fn present(&self) -> Vec<(u8, u32)> {
        self.ranked().into_iter().filter(|&(_, c)| c > 0).collect()
    }

    /// Numéros jamais vus, par ordre croissant.
    pub fn absent(&self) -> Vec<u8> {
        self.iter().filter(|&(_, c)| c == 0).map(|(n, _)| n).collect()
    }
}

/// Retard de chaque numéro dans une fenêtre ; `window` pour un numéro absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GapTable {
    pub window: usize,
    gaps: Vec<usize>,
}

impl GapTable {
    pub fn from_draws(draws: &[Draw]) -> Self {
        let window = draws.len();
        let mut gaps = vec![window; POOL_SIZE as usize];
        for (skipped, draw) in draws.iter().rev().enumerate() {
            for &n in &draw.numbers {
                let idx = (n - 1) as usize;
                if idx < gaps.len() && gaps[idx] == window {
                    gaps[idx] = skipped;
                }
            }
        }
        Self { window, gaps }
    }

    pub fn get(&self, number: u8) -> usize {
        match number {
            1..=POOL_SIZE => self.gaps[(number - 1) as usize],
            _ => self.window,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.gaps
            .iter()
            .enumerate()
            .map(|(i, &g)| ((i + 1) as u8, g))
    }
}

pub fn frequency(history: &History, end: usize, window_size: usize) -> FrequencyTable {
    FrequencyTable::from_draws(history.window(end, window_size))
}

/// Tirages écoulés depuis la dernière sortie de `number` avant `end`.
/// Jamais sorti : distance jusqu'au début de l'historique.
pub fn gap(history: &History, end: usize, number: u8) -> usize {
    window_gap(history.window(end, end), number)
}

pub fn window_gap(window: &[Draw], number: u8) -> usize {
    window
        .iter()
        .rev()
        .position(|d| d.contains(number))
        .unwrap_or(window.len())
}

pub fn gap_table(history: &History, end: usize, window_size: usize) -> GapTable {
    GapTable::from_draws(history.window(end, window_size))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberTag {
    Hot,
    Cold,
    Normal,
}

impl std::fmt::Display for NumberTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberTag::Hot => write!(f, "HOT"),
            NumberTag::Cold => write!(f, "COLD"),
            NumberTag::Normal => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberStats {
    pub number: u8,
    pub frequency: u32,
    pub gap: usize,
    pub tag: NumberTag,
}

pub fn number_stats(
    history: &History,
    end: usize,
    window_size: usize,
    hot_threshold: u32,
    cold_gap: usize,
) -> Vec<NumberStats> {
    let window = history.window(end, window_size);
    let freq = FrequencyTable::from_draws(window);
    let gaps = GapTable::from_draws(window);

    freq.iter()
        .map(|(number, frequency)| {
            let gap = gaps.get(number);
            let tag = if frequency >= hot_threshold {
                NumberTag::Hot
            } else if gap >= cold_gap {
                NumberTag::Cold
            } else {
                NumberTag::Normal
            };
            NumberStats { number, frequency, gap, tag }
        })
        .collect()
}
