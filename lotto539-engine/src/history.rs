use chrono::{Days, NaiveDate};
use lotto539_db::models::{Draw, validate_numbers};

use crate::error::{EngineError, EngineResult};

/// Instantané immuable de l'historique, du plus ancien (index 0) au plus récent.
///
/// Les positions sont exprimées par un index de fin exclusif `end` :
/// la fenêtre « finissant à la position p incluse » correspond à `end = p + 1`,
/// et `end = 0` désigne une fenêtre vide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    draws: Vec<Draw>,
}

impl History {
    /// Valide chaque tirage et l'ordre strictement croissant des identifiants.
    pub fn new(draws: Vec<Draw>) -> EngineResult<Self> {
        let mut previous: Option<u32> = None;
        for draw in &draws {
            validate_numbers(&draw.numbers).map_err(|e| EngineError::MalformedHistory {
                sequence_id: draw.sequence_id,
                reason: e.to_string(),
            })?;
            if let Some(prev) = previous {
                if draw.sequence_id <= prev {
                    return Err(EngineError::MalformedHistory {
                        sequence_id: draw.sequence_id,
                        reason: format!("identifiant non croissant (précédent : {prev})"),
                    });
                }
            }
            previous = Some(draw.sequence_id);
        }
        Ok(Self { draws })
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }

    pub fn latest(&self) -> Option<&Draw> {
        self.draws.last()
    }

    /// Les `size` tirages précédant `end` (exclu), tronqués au début de l'historique.
    pub fn window(&self, end: usize, size: usize) -> &[Draw] {
        let end = end.min(self.draws.len());
        let start = end.saturating_sub(size);
        &self.draws[start..end]
    }

    /// Les `size` derniers tirages.
    pub fn trailing(&self, size: usize) -> &[Draw] {
        self.window(self.draws.len(), size)
    }

    pub fn require(&self, required: usize) -> EngineResult<()> {
        if self.draws.len() < required {
            return Err(EngineError::InsufficientHistory {
                required,
                available: self.draws.len(),
            });
        }
        Ok(())
    }
}

/// Historique synthétique à partir du 2024-01-01 : blocs de 5 numéros consécutifs qui tournent sur 7 positions.
pub fn make_test_draws(n: usize) -> Vec<Draw> {
    (0..n)
        .map(|i| {
            let base = (i % 7) as u8;
            Draw {
                sequence_id: (i + 1) as u32,
                date: NaiveDate::default() + Days::new(19_723 + i as u64),
                numbers: [
                    base * 5 + 1,
                    base * 5 + 2,
                    base * 5 + 3,
                    base * 5 + 4,
                    base * 5 + 5,
                ],
            }
        })
        .collect()
}

pub fn make_test_history(n: usize) -> History {
    History { draws: make_test_draws(n) }
}

/// Historique construit à partir de grilles explicites, identifiants 1..=n.
#[cfg(test)]
pub(crate) fn history_from(rows: &[[u8; 5]]) -> History {
    let draws = rows
        .iter()
        .enumerate()
        .map(|(i, numbers)| {
            let date = NaiveDate::default() + Days::new(19_723 + i as u64);
            Draw::new((i + 1) as u32, date, numbers).unwrap()
        })
        .collect();
    History::new(draws).unwrap()
}
