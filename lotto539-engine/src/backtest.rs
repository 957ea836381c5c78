//! Rejeu déterministe d'une stratégie de sélection sur les derniers tirages.
//!
//! Pour chaque position simulée `i`, la fenêtre de fréquences couvre les `window`
//! tirages strictement antérieurs à `i` : aucune fuite du futur.

use serde::{Deserialize, Serialize};

use lotto539_db::models::{Draw, PICK_COUNT, POOL_SIZE};

use crate::error::{EngineError, EngineResult};
use crate::history::History;
use crate::stats::{FrequencyTable, frequency};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Les 5 plus fréquents de la fenêtre.
    Hot,
    /// Les absents de la fenêtre, complétés par les moins fréquents.
    Cold,
    /// 3 impairs et 2 pairs, pris dans l'ordre des fréquences.
    Balanced,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Hot, Strategy::Cold, Strategy::Balanced];

    /// Sélection triée de 5 numéros à partir des fréquences d'une fenêtre.
    pub fn select(&self, freq: &FrequencyTable) -> [u8; PICK_COUNT] {
        let mut selected = match self {
            Strategy::Hot => select_hot(freq),
            Strategy::Cold => select_cold(freq),
            Strategy::Balanced => select_balanced(freq),
        };
        pad_lowest(&mut selected);

        let mut picks = [0u8; PICK_COUNT];
        picks.copy_from_slice(&selected[..PICK_COUNT]);
        picks.sort_unstable();
        picks
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Hot => write!(f, "hot"),
            Strategy::Cold => write!(f, "cold"),
            Strategy::Balanced => write!(f, "balanced"),
        }
    }
}

fn select_hot(freq: &FrequencyTable) -> Vec<u8> {
    freq.present()
        .into_iter()
        .take(PICK_COUNT)
        .map(|(n, _)| n)
        .collect()
}

fn select_cold(freq: &FrequencyTable) -> Vec<u8> {
    let mut selected: Vec<u8> = freq.absent().into_iter().take(PICK_COUNT).collect();
    if selected.len() < PICK_COUNT {
        let mut least = freq.present();
        least.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        selected.extend(
            least
                .into_iter()
                .map(|(n, _)| n)
                .take(PICK_COUNT - selected.len()),
        );
    }
    selected
}

fn select_balanced(freq: &FrequencyTable) -> Vec<u8> {
    const ODD: usize = 3;
    const EVEN: usize = PICK_COUNT - ODD;

    let present = freq.present();
    let odds: Vec<u8> = present.iter().map(|&(n, _)| n).filter(|n| n % 2 == 1).take(ODD).collect();
    let evens: Vec<u8> = present.iter().map(|&(n, _)| n).filter(|n| n % 2 == 0).take(EVEN).collect();

    if odds.len() < ODD || evens.len() < EVEN {
        return select_hot(freq);
    }
    odds.into_iter().chain(evens).collect()
}

/// Complète avec les plus petits numéros inutilisés.
fn pad_lowest(selected: &mut Vec<u8>) {
    let mut candidate = 1u8;
    while selected.len() < PICK_COUNT && candidate <= POOL_SIZE {
        if !selected.contains(&candidate) {
            selected.push(candidate);
        }
        candidate += 1;
    }
}

fn hit_count(picks: &[u8], draw: &Draw) -> usize {
    picks.iter().filter(|&&n| draw.contains(n)).count()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Nombre de tirages rejoués.
    pub span: usize,
    /// Fenêtre de fréquences avant chaque tirage rejoué.
    pub window: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            span: 100,
            window: 30,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.span == 0 || self.window == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "span={} et window={} doivent être > 0",
                self.span, self.window
            )));
        }
        Ok(())
    }

    pub fn required_draws(&self) -> usize {
        self.span.saturating_add(self.window)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacktestResult {
    pub strategy: Strategy,
    /// Première position rejouée.
    pub start: usize,
    pub window: usize,
    /// `histogram[k]` = nombre de tirages avec exactement `k` numéros trouvés.
    pub histogram: [u32; PICK_COUNT + 1],
    pub hits: Vec<u8>,
}

impl BacktestResult {
    pub fn span(&self) -> usize {
        self.hits.len()
    }

    pub fn mean_hits(&self) -> f64 {
        if self.hits.is_empty() {
            return 0.0;
        }
        self.hits.iter().map(|&h| h as f64).sum::<f64>() / self.hits.len() as f64
    }

    /// Part des tirages avec au moins `min_hits` numéros trouvés.
    pub fn hit_rate(&self, min_hits: usize) -> f64 {
        if self.hits.is_empty() {
            return 0.0;
        }
        let n: u32 = self.histogram.iter().skip(min_hits).sum();
        n as f64 / self.hits.len() as f64
    }
}

pub fn run_backtest(
    history: &History,
    strategy: Strategy,
    config: &BacktestConfig,
) -> EngineResult<BacktestResult> {
    config.validate()?;
    history.require(config.required_draws())?;

    let total = history.len();
    let start = total - config.span;
    let mut histogram = [0u32; PICK_COUNT + 1];
    let mut hits = Vec::with_capacity(config.span);

    for (i, draw) in history.draws().iter().enumerate().skip(start) {
        let freq = frequency(history, i, config.window);
        let picks = strategy.select(&freq);
        let found = hit_count(&picks, draw);
        log::debug!("{strategy} #{} : {:?} contre {:?} -> {found}", draw.sequence_id, picks, draw.numbers);
        histogram[found] += 1;
        hits.push(found as u8);
    }

    let result = BacktestResult {
        strategy,
        start,
        window: config.window,
        histogram,
        hits,
    };
    log::info!(
        "backtest {strategy} sur {} tirages : moyenne {:.3}, histogramme {:?}",
        result.span(),
        result.mean_hits(),
        result.histogram
    );
    Ok(result)
}

pub fn compare_strategies(history: &History, config: &BacktestConfig) -> EngineResult<Vec<BacktestResult>> {
    Strategy::ALL
        .iter()
        .map(|&s| run_backtest(history, s, config))
        .collect()
}

/// Sélection de la stratégie pour le prochain tirage, sur les `window` derniers.
pub fn suggest(history: &History, strategy: Strategy, window: usize) -> EngineResult<[u8; PICK_COUNT]> {
    history.require(window.max(1))?;
    let freq = frequency(history, history.len(), window);
    Ok(strategy.select(&freq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{history_from, make_test_draws, make_test_history};

    fn table(rows: &[[u8; 5]]) -> FrequencyTable {
        FrequencyTable::from_draws(history_from(rows).draws())
    }

    #[test]
    fn test_select_by_strategy() {
        let freq = table(&[[1, 2, 3, 4, 5], [1, 3, 5, 7, 9], [1, 3, 5, 7, 11]]);
        // Ordre des fréquences : 1, 3, 5 (3), 7 (2), puis 2, 4, 9, 11 (1).
        assert_eq!(Strategy::Hot.select(&freq), [1, 2, 3, 5, 7]);
        assert_eq!(Strategy::Balanced.select(&freq), [1, 2, 3, 4, 5]);
        assert_eq!(Strategy::Cold.select(&freq), [6, 8, 10, 12, 13]);
    }

    #[test]
    fn test_balanced_follows_frequency_order() {
        let freq = table(&[[1, 2, 3, 4, 38], [5, 7, 9, 36, 38], [1, 3, 11, 36, 38]]);
        // 38 (3), 36 (2) devant 2 et 4 (1) malgré l'ordre numérique.
        assert_eq!(Strategy::Balanced.select(&freq), [1, 3, 5, 36, 38]);
    }

    #[test]
    fn test_balanced_falls_back_to_hot() {
        let freq = table(&[[1, 3, 5, 7, 9], [11, 13, 15, 17, 19], [1, 3, 21, 23, 25]]);
        // Aucun pair disponible.
        assert_eq!(Strategy::Balanced.select(&freq), Strategy::Hot.select(&freq));
        assert_eq!(Strategy::Balanced.select(&freq), [1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_cold_pads_with_least_frequent() {
        let mut rows: Vec<[u8; 5]> = make_test_draws(7).iter().map(|d| d.numbers).collect();
        rows.push([1, 2, 3, 4, 5]);
        let freq = table(&rows);
        // 36..=39 absents ; 6 est le plus petit des moins fréquents.
        assert_eq!(Strategy::Cold.select(&freq), [6, 36, 37, 38, 39]);
    }

    #[test]
    fn test_empty_window_pads_lowest() {
        let freq = FrequencyTable::empty();
        for strategy in Strategy::ALL {
            assert_eq!(strategy.select(&freq), [1, 2, 3, 4, 5], "{strategy}");
        }
    }

    #[test]
    fn test_insufficient_history() {
        let history = make_test_history(50);
        let err = run_backtest(&history, Strategy::Hot, &BacktestConfig::default()).unwrap_err();
        assert_eq!(err, EngineError::InsufficientHistory { required: 130, available: 50 });
    }

    #[test]
    fn test_huge_span_is_insufficient() {
        let config = BacktestConfig { span: usize::MAX, window: 30 };
        let err = run_backtest(&make_test_history(10), Strategy::Hot, &config).unwrap_err();
        assert_eq!(err, EngineError::InsufficientHistory { required: usize::MAX, available: 10 });
    }

    #[test]
    fn test_histogram_sums_to_span() {
        let history = make_test_history(200);
        for result in compare_strategies(&history, &BacktestConfig::default()).unwrap() {
            assert_eq!(result.histogram.iter().sum::<u32>(), 100, "{}", result.strategy);
            assert_eq!(result.span(), 100);
            assert_eq!(result.start, 100);
        }
    }

    #[test]
    fn test_minimum_history_accepted() {
        let history = make_test_history(130);
        let result = run_backtest(&history, Strategy::Cold, &BacktestConfig::default()).unwrap();
        assert_eq!(result.start, 30);
        assert_eq!(result.hits.len(), 100);
    }

    #[test]
    fn test_hot_misses_rotating_blocks() {
        // Les blocs chauds de la fenêtre sont ceux des deux tirages précédents, jamais le suivant.
        let history = make_test_history(160);
        let result = run_backtest(&history, Strategy::Hot, &BacktestConfig::default()).unwrap();
        assert_eq!(result.histogram, [100, 0, 0, 0, 0, 0]);
        assert_eq!(result.mean_hits(), 0.0);
        assert_eq!(result.hit_rate(1), 0.0);
    }

    #[test]
    fn test_no_lookahead() {
        let draws = make_test_draws(140);
        let mut altered = draws.clone();
        altered[139].numbers = [35, 36, 37, 38, 39];

        let config = BacktestConfig::default();
        let a = run_backtest(&History::new(draws).unwrap(), Strategy::Balanced, &config).unwrap();
        let b = run_backtest(&History::new(altered).unwrap(), Strategy::Balanced, &config).unwrap();
        assert_eq!(a.hits[..99], b.hits[..99]);
    }

    #[test]
    fn test_backtest_deterministic() {
        let history = make_test_history(180);
        let config = BacktestConfig { span: 50, window: 30 };
        let a = run_backtest(&history, Strategy::Cold, &config).unwrap();
        let b = run_backtest(&history, Strategy::Cold, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hit_rate() {
        let result = BacktestResult {
            strategy: Strategy::Hot,
            start: 0,
            window: 30,
            histogram: [2, 1, 1, 0, 0, 0],
            hits: vec![0, 0, 1, 2],
        };
        assert_eq!(result.mean_hits(), 0.75);
        assert_eq!(result.hit_rate(1), 0.5);
        assert_eq!(result.hit_rate(2), 0.25);
    }

    #[test]
    fn test_suggest() {
        let history = make_test_history(40);
        let picks = suggest(&history, Strategy::Hot, 30).unwrap();
        assert_eq!(picks, [16, 17, 18, 19, 20]);
        assert!(suggest(&History::default(), Strategy::Hot, 30).is_err());
    }
}
