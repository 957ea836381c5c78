use serde::{Deserialize, Serialize};

use lotto539_db::models::{PICK_COUNT, POOL_SIZE};

use crate::cooccurrence::successor_counts;
use crate::error::{EngineError, EngineResult, validate_selection};
use crate::history::History;
use crate::stats::{FrequencyTable, GapTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// Poids des suiveurs du dernier tirage, dans [0, 2].
    pub affinity_weight: f64,
    /// Poids du bonus de retard, dans [0, 2].
    pub miss_weight: f64,
    /// Fenêtre d'analyse des retards.
    pub window: usize,
    pub gap_min: usize,
    pub gap_max: usize,
    pub gap_bonus: f64,
    pub picks: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            affinity_weight: 1.2,
            miss_weight: 0.3,
            window: 30,
            gap_min: 5,
            gap_max: 12,
            gap_bonus: 50.0,
            picks: PICK_COUNT,
        }
    }
}

impl RecommendConfig {
    pub fn validate(&self) -> EngineResult<()> {
        for (name, value) in [("affinity_weight", self.affinity_weight), ("miss_weight", self.miss_weight)] {
            if !(0.0..=2.0).contains(&value) {
                return Err(EngineError::InvalidConfig(format!("{name}={value} hors de [0, 2]")));
            }
        }
        if self.window == 0 {
            return Err(EngineError::InvalidConfig("window doit être > 0".into()));
        }
        if self.gap_min > self.gap_max {
            return Err(EngineError::InvalidConfig(format!(
                "gap_min={} > gap_max={}",
                self.gap_min, self.gap_max
            )));
        }
        if self.picks == 0 || self.picks > POOL_SIZE as usize {
            return Err(EngineError::InvalidConfig(format!("picks={} hors de [1, 39]", self.picks)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedNumber {
    pub number: u8,
    pub score: f64,
}

/// Classement des 39 numéros : suiveurs du dernier tirage pondérés par
/// `affinity_weight`, plus un bonus fixe quand le retard tombe dans `[gap_min, gap_max]`.
/// Score décroissant, puis numéro croissant.
pub fn rank_numbers(history: &History, config: &RecommendConfig) -> EngineResult<Vec<RankedNumber>> {
    config.validate()?;
    let latest = history.latest().ok_or(EngineError::InsufficientHistory {
        required: 1,
        available: 0,
    })?;

    let mut scores = vec![0.0f64; POOL_SIZE as usize];

    for &seed in &latest.numbers {
        let successors = successor_counts(history, seed);
        for (number, count) in successors.iter() {
            scores[(number - 1) as usize] += count as f64 * config.affinity_weight;
        }
    }

    let gaps = GapTable::from_draws(history.trailing(config.window));
    let bonus = config.gap_bonus * config.miss_weight;
    for (number, gap) in gaps.iter() {
        if (config.gap_min..=config.gap_max).contains(&gap) {
            scores[(number - 1) as usize] += bonus;
        }
    }

    let mut ranked: Vec<RankedNumber> = scores
        .iter()
        .enumerate()
        .map(|(i, &score)| RankedNumber {
            number: (i + 1) as u8,
            score,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.number.cmp(&b.number)));

    log::debug!(
        "classement sur {} tirages, suiveurs de {:?}, fenêtre {}",
        history.len(),
        latest.numbers,
        gaps.window
    );
    Ok(ranked)
}

/// Les `config.picks` premiers du classement.
pub fn recommend(history: &History, config: &RecommendConfig) -> EngineResult<Vec<RankedNumber>> {
    let mut ranked = rank_numbers(history, config)?;
    ranked.truncate(config.picks);
    Ok(ranked)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionPick {
    pub number: u8,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Completion {
    Suggested {
        fixed: Vec<u8>,
        matching_draws: usize,
        picks: Vec<CompletionPick>,
    },
    /// Aucune sortie passée ne contient la combinaison fixée.
    NoHistoricalMatch { fixed: Vec<u8> },
}

/// Complète 1 à 4 numéros fixés avec les numéros les plus souvent sortis à leurs côtés.
pub fn complete(history: &History, fixed: &[u8]) -> EngineResult<Completion> {
    validate_selection(fixed, 1, PICK_COUNT - 1)?;

    let mut fixed_sorted = fixed.to_vec();
    fixed_sorted.sort_unstable();

    let mut companions = FrequencyTable::empty();
    for draw in history.draws().iter().filter(|d| d.contains_all(fixed)) {
        companions.add_draw(draw);
    }

    if companions.draws == 0 {
        log::info!("aucune sortie passée ne contient {:?}", fixed_sorted);
        return Ok(Completion::NoHistoricalMatch { fixed: fixed_sorted });
    }

    let picks = companions
        .present()
        .into_iter()
        .filter(|(n, _)| !fixed.contains(n))
        .take(PICK_COUNT - fixed.len())
        .map(|(number, count)| CompletionPick { number, count })
        .collect();

    Ok(Completion::Suggested {
        fixed: fixed_sorted,
        matching_draws: companions.draws,
        picks,
    })
}
