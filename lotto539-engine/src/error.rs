use lotto539_db::models::DrawError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Tirage invalide ou ordre des identifiants rompu. Jamais réparé.
    #[error("historique malformé au tirage {sequence_id} : {reason}")]
    MalformedHistory { sequence_id: u32, reason: String },

    /// Pas assez de tirages pour le calcul demandé.
    #[error("historique insuffisant : {required} tirages requis, {available} disponibles")]
    InsufficientHistory { required: usize, available: usize },

    #[error("sélection de {got} numéros, attendu entre {min} et {max}")]
    EmptySelection { min: usize, max: usize, got: usize },

    #[error("sélection invalide : {0}")]
    InvalidSelection(DrawError),

    #[error("configuration invalide : {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Les erreurs « pas assez de données » ne doivent pas interrompre une session.
    pub fn is_insufficient(&self) -> bool {
        matches!(self, EngineError::InsufficientHistory { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Valide une sélection de `min..=max` numéros distincts dans [1,39].
pub(crate) fn validate_selection(numbers: &[u8], min: usize, max: usize) -> EngineResult<()> {
    if numbers.len() < min || numbers.len() > max {
        return Err(EngineError::EmptySelection {
            min,
            max,
            got: numbers.len(),
        });
    }
    lotto539_db::models::check_numbers(numbers).map_err(EngineError::InvalidSelection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_selection_size() {
        assert!(validate_selection(&[1, 2, 3, 4, 5], 5, 5).is_ok());
        assert_eq!(
            validate_selection(&[1, 2, 3], 5, 5),
            Err(EngineError::EmptySelection { min: 5, max: 5, got: 3 })
        );
        assert!(validate_selection(&[], 1, 4).is_err());
    }

    #[test]
    fn test_validate_selection_numbers() {
        assert_eq!(
            validate_selection(&[1, 2, 3, 4, 40], 5, 5),
            Err(EngineError::InvalidSelection(DrawError::OutOfRange(40)))
        );
        assert_eq!(
            validate_selection(&[9, 9], 1, 4),
            Err(EngineError::InvalidSelection(DrawError::Duplicate(9)))
        );
    }

    #[test]
    fn test_is_insufficient() {
        assert!(EngineError::InsufficientHistory { required: 130, available: 50 }.is_insufficient());
        assert!(!EngineError::InvalidConfig("x".into()).is_insufficient());
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::InsufficientHistory { required: 130, available: 50 };
        assert!(err.to_string().contains("130"));
        assert!(err.to_string().contains("50"));
    }
}
