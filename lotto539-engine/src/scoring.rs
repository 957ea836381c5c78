use serde::{Deserialize, Serialize};

use lotto539_db::models::PICK_COUNT;

use crate::error::{EngineResult, validate_selection};
use crate::history::History;
use crate::stats::FrequencyTable;

/// Barème du score heuristique. Les valeurs par défaut forment le barème de référence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub base: i32,
    pub sum_min: u32,
    pub sum_max: u32,
    pub sum_bonus: i32,
    pub sum_penalty: i32,
    pub odd_min: usize,
    pub odd_max: usize,
    pub odd_bonus: i32,
    pub odd_penalty: i32,
    /// Fenêtre de classement chaud/froid.
    pub hot_window: usize,
    /// Sorties minimales dans `hot_window` pour être « chaud ».
    pub hot_threshold: u32,
    pub hot_min: usize,
    pub hot_max: usize,
    pub hot_bonus: i32,
    pub no_hot_penalty: i32,
    pub too_hot_penalty: i32,
    pub history_bonus: i32,
    /// Retard à partir duquel un numéro est affiché « froid ».
    pub cold_gap: usize,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            base: 60,
            sum_min: 80,
            sum_max: 120,
            sum_bonus: 10,
            sum_penalty: -10,
            odd_min: 2,
            odd_max: 3,
            odd_bonus: 10,
            odd_penalty: -10,
            hot_window: 30,
            hot_threshold: 5,
            hot_min: 1,
            hot_max: 3,
            hot_bonus: 10,
            no_hot_penalty: -5,
            too_hot_penalty: -5,
            history_bonus: 5,
            cold_gap: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Positive,
    Caution,
    Info,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Positive => write!(f, "OK"),
            Verdict::Caution => write!(f, "ATTENTION"),
            Verdict::Info => write!(f, "INFO"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreReason {
    SumInRange { sum: u32, min: u32, max: u32 },
    SumOutOfRange { sum: u32, min: u32, max: u32 },
    BalancedParity { odd: usize, even: usize },
    UnbalancedParity { odd: usize, even: usize },
    HotMix { hot: usize },
    NoHot,
    TooManyHot { hot: usize },
    SeenBefore { count: usize },
    NeverSeen,
}

impl ScoreReason {
    pub fn verdict(&self) -> Verdict {
        match self {
            ScoreReason::SumInRange { .. }
            | ScoreReason::BalancedParity { .. }
            | ScoreReason::HotMix { .. }
            | ScoreReason::SeenBefore { .. } => Verdict::Positive,
            ScoreReason::SumOutOfRange { .. }
            | ScoreReason::UnbalancedParity { .. }
            | ScoreReason::NoHot
            | ScoreReason::TooManyHot { .. } => Verdict::Caution,
            ScoreReason::NeverSeen => Verdict::Info,
        }
    }
}

impl std::fmt::Display for ScoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreReason::SumInRange { sum, min, max } => {
                write!(f, "Somme {sum} dans la zone dorée ({min}-{max})")
            }
            ScoreReason::SumOutOfRange { sum, min, max } => {
                write!(f, "Somme {sum} hors de la zone dorée ({min}-{max})")
            }
            ScoreReason::BalancedParity { odd, even } => {
                write!(f, "Équilibre pair/impair correct ({odd} impairs, {even} pairs)")
            }
            ScoreReason::UnbalancedParity { odd, even } => {
                write!(f, "Déséquilibre pair/impair ({odd} impairs, {even} pairs)")
            }
            ScoreReason::HotMix { hot } => write!(f, "Bon mélange chaud/froid ({hot} numéros chauds)"),
            ScoreReason::NoHot => write!(f, "Aucun numéro chaud"),
            ScoreReason::TooManyHot { hot } => write!(f, "Trop de numéros chauds ({hot})"),
            ScoreReason::SeenBefore { count } => {
                write!(f, "Combinaison déjà sortie {count} fois dans l'historique")
            }
            ScoreReason::NeverSeen => write!(f, "Combinaison jamais sortie dans l'historique"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreMetrics {
    pub sum: u32,
    pub odd_count: usize,
    pub hot_count: usize,
    pub history_matches: usize,
    /// Affiché seulement, sans effet sur le score.
    pub has_consecutive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    pub numbers: Vec<u8>,
    pub score: u8,
    pub reasons: Vec<ScoreReason>,
    pub metrics: ScoreMetrics,
}

/// Nombre de tirages contenant tous les numéros de `numbers`.
pub fn count_matches(history: &History, numbers: &[u8]) -> usize {
    history
        .draws()
        .iter()
        .filter(|d| d.contains_all(numbers))
        .count()
}

fn has_consecutive(sorted: &[u8]) -> bool {
    sorted.windows(2).any(|w| w[1] == w[0] + 1)
}

pub fn score_candidate(
    history: &History,
    candidate: &[u8],
    weights: &ScoreWeights,
) -> EngineResult<ScoreResult> {
    validate_selection(candidate, PICK_COUNT, PICK_COUNT)?;

    let mut numbers = candidate.to_vec();
    numbers.sort_unstable();

    let mut score = weights.base;
    let mut reasons = Vec::with_capacity(4);

    // 1. Somme
    let sum: u32 = numbers.iter().map(|&n| n as u32).sum();
    let (min, max) = (weights.sum_min, weights.sum_max);
    if (min..=max).contains(&sum) {
        score = score.saturating_add(weights.sum_bonus);
        reasons.push(ScoreReason::SumInRange { sum, min, max });
    } else {
        score = score.saturating_add(weights.sum_penalty);
        reasons.push(ScoreReason::SumOutOfRange { sum, min, max });
    }

    // 2. Parité
    let odd = numbers.iter().filter(|&&n| n % 2 == 1).count();
    let even = numbers.len() - odd;
    if (weights.odd_min..=weights.odd_max).contains(&odd) {
        score = score.saturating_add(weights.odd_bonus);
        reasons.push(ScoreReason::BalancedParity { odd, even });
    } else {
        score = score.saturating_add(weights.odd_penalty);
        reasons.push(ScoreReason::UnbalancedParity { odd, even });
    }

    // 3. Chauds
    let freq = FrequencyTable::from_draws(history.trailing(weights.hot_window));
    let hot = numbers
        .iter()
        .filter(|&&n| freq.get(n) >= weights.hot_threshold)
        .count();
    if (weights.hot_min..=weights.hot_max).contains(&hot) {
        score = score.saturating_add(weights.hot_bonus);
        reasons.push(ScoreReason::HotMix { hot });
    } else if hot == 0 {
        score = score.saturating_add(weights.no_hot_penalty);
        reasons.push(ScoreReason::NoHot);
    } else {
        score = score.saturating_add(weights.too_hot_penalty);
        reasons.push(ScoreReason::TooManyHot { hot });
    }

    // 4. Historique
    let matches = count_matches(history, &numbers);
    if matches > 0 {
        score = score.saturating_add(weights.history_bonus);
        reasons.push(ScoreReason::SeenBefore { count: matches });
    } else {
        reasons.push(ScoreReason::NeverSeen);
    }

    let score = score.clamp(0, 100) as u8;
    log::debug!("score {:?} = {} (somme {}, impairs {}, chauds {})", numbers, score, sum, odd, hot);

    Ok(ScoreResult {
        metrics: ScoreMetrics {
            sum,
            odd_count: odd,
            hot_count: hot,
            history_matches: matches,
            has_consecutive: has_consecutive(&numbers),
        },
        numbers,
        score,
        reasons,
    })
}
