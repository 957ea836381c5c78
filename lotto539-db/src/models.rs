use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Taille de la grille : numéros de 1 à 39.
pub const POOL_SIZE: u8 = 39;
/// Nombre de numéros par tirage.
pub const PICK_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub sequence_id: u32,
    pub date: NaiveDate,
    /// Toujours triés par ordre croissant.
    pub numbers: [u8; PICK_COUNT],
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("attendu {expected} numéros, reçu {got}")]
    WrongCount { expected: usize, got: usize },
    #[error("numéro {0} hors limites (1-39)")]
    OutOfRange(u8),
    #[error("numéro en double : {0}")]
    Duplicate(u8),
}

impl Draw {
    /// Construit un tirage validé, numéros triés.
    pub fn new(sequence_id: u32, date: NaiveDate, numbers: &[u8]) -> Result<Self, DrawError> {
        validate_numbers(numbers)?;
        let mut sorted = [0u8; PICK_COUNT];
        sorted.copy_from_slice(numbers);
        sorted.sort_unstable();
        Ok(Self { sequence_id, date, numbers: sorted })
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }

    /// Vrai si tous les numéros de `subset` figurent dans ce tirage.
    pub fn contains_all(&self, subset: &[u8]) -> bool {
        subset.iter().all(|n| self.contains(*n))
    }
}

pub fn is_valid_number(n: u8) -> bool {
    (1..=POOL_SIZE).contains(&n)
}

/// Vérifie les bornes et l'absence de doublons, sans contrainte de taille.
pub fn check_numbers(numbers: &[u8]) -> Result<(), DrawError> {
    for &n in numbers {
        if !is_valid_number(n) {
            return Err(DrawError::OutOfRange(n));
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                return Err(DrawError::Duplicate(numbers[i]));
            }
        }
    }
    Ok(())
}

pub fn validate_numbers(numbers: &[u8]) -> Result<(), DrawError> {
    if numbers.len() != PICK_COUNT {
        return Err(DrawError::WrongCount {
            expected: PICK_COUNT,
            got: numbers.len(),
        });
    }
    check_numbers(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn test_validate_numbers_ok() {
        assert!(validate_numbers(&[1, 2, 3, 4, 5]).is_ok());
        assert!(validate_numbers(&[39, 38, 37, 36, 35]).is_ok());
    }

    #[test]
    fn test_validate_numbers_out_of_range() {
        assert_eq!(validate_numbers(&[0, 2, 3, 4, 5]), Err(DrawError::OutOfRange(0)));
        assert_eq!(validate_numbers(&[1, 2, 3, 4, 40]), Err(DrawError::OutOfRange(40)));
    }

    #[test]
    fn test_validate_numbers_duplicate() {
        assert_eq!(validate_numbers(&[7, 7, 3, 4, 5]), Err(DrawError::Duplicate(7)));
    }

    #[test]
    fn test_validate_numbers_wrong_count() {
        assert_eq!(
            validate_numbers(&[1, 2, 3, 4]),
            Err(DrawError::WrongCount { expected: 5, got: 4 })
        );
        assert!(validate_numbers(&[1, 2, 3, 4, 5, 6]).is_err());
    }

    #[test]
    fn test_check_numbers_partial() {
        assert!(check_numbers(&[3, 9]).is_ok());
        assert!(check_numbers(&[]).is_ok());
        assert!(check_numbers(&[3, 3]).is_err());
    }

    #[test]
    fn test_draw_new_sorts() {
        let draw = Draw::new(12, date(), &[30, 4, 17, 1, 22]).unwrap();
        assert_eq!(draw.numbers, [1, 4, 17, 22, 30]);
        assert_eq!(draw.sequence_id, 12);
    }

    #[test]
    fn test_draw_contains_all() {
        let draw = Draw::new(1, date(), &[1, 2, 3, 4, 5]).unwrap();
        assert!(draw.contains_all(&[5, 1]));
        assert!(draw.contains_all(&[]));
        assert!(!draw.contains_all(&[1, 6]));
    }
}
