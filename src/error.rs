use thiserror::Error;

/// A malformed order-by fragment. Positions are byte offsets into the
/// fragment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FragmentSyntaxError {
    #[error("unexpected `{found}` at position {position}, expected {expected}")]
    UnexpectedToken {
        found: String,
        position: usize,
        expected: &'static str,
    },
    #[error("unexpected end of fragment at position {position}, expected {expected}")]
    UnexpectedEnd {
        position: usize,
        expected: &'static str,
    },
    #[error("unterminated quoted literal starting at position {position}")]
    UnterminatedQuote { position: usize },
    #[error("unbalanced parentheses in call to `{name}` opened at position {position}")]
    UnbalancedParens { name: String, position: usize },
    #[error("nesting deeper than {max_depth} levels at position {position}")]
    NestingTooDeep { max_depth: usize, position: usize },
}

impl FragmentSyntaxError {
    pub fn position(&self) -> usize {
        match self {
            FragmentSyntaxError::UnexpectedToken { position, .. }
            | FragmentSyntaxError::UnexpectedEnd { position, .. }
            | FragmentSyntaxError::UnterminatedQuote { position }
            | FragmentSyntaxError::UnbalancedParens { position, .. }
            | FragmentSyntaxError::NestingTooDeep { position, .. } => *position,
        }
    }
}

/// Failure to translate a whole order-by fragment; keeps the fragment text
/// for mapping-validation reports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unable to translate order-by fragment `{fragment}`: {source}")]
pub struct TranslationError {
    pub fragment: String,
    #[source]
    pub source: FragmentSyntaxError,
}

impl TranslationError {
    pub fn new(fragment: &str, source: FragmentSyntaxError) -> Self {
        Self {
            fragment: fragment.to_string(),
            source,
        }
    }
}

/// Raised by a column mapper that could not look a reference up. The
/// translator treats it exactly like an unknown reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot map `{reference}`: {reason}")]
pub struct MappingError {
    pub reference: String,
    pub reason: String,
}

impl MappingError {
    pub fn new(reference: &str, reason: impl Into<String>) -> Self {
        Self {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }
}
