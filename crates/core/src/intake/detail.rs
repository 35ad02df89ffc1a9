//! Rejects submissions too vague to classify usefully.

use regex_lite::Regex;

use crate::config::{ConfigError, IntakeConfig};
use crate::ticket::{TicketSubmission, ValidationError};

const VAGUE_SUGGESTION: &str =
    "Example: 'My Outlook is not opening' or 'I cannot connect to the WiFi'";
const THIN_SUGGESTION: &str =
    "Include what you are trying to do, what error you see, and what you already tried.";

/// Words this short ("on", "is", "a") carry no detail.
const MEANINGFUL_WORD_CHARS: usize = 3;

/// Minimum-detail rule applied before a submission reaches the classifier.
///
/// A description that is only a greeting or a form placeholder is rejected
/// outright. Title and description together must also reach a minimum length
/// and word count, so a short title can be carried by a fuller description
/// and the other way round.
#[derive(Debug, Clone)]
pub struct DetailRule {
    vague: Regex,
    min_chars: usize,
    min_words: usize,
}

impl DetailRule {
    pub fn from_config(intake: &IntakeConfig) -> Result<Self, ConfigError> {
        let vague = Regex::new(&format!("(?i)^(?:{})$", intake.vague_descriptions)).map_err(|e| {
            ConfigError::ValidationError(format!(
                "intake.vague_descriptions is not a valid pattern: {}",
                e
            ))
        })?;

        Ok(Self {
            vague,
            min_chars: intake.min_detail_chars,
            min_words: intake.min_meaningful_words,
        })
    }

    pub fn check(&self, submission: &TicketSubmission) -> Result<(), ValidationError> {
        let title = submission.title();
        let description = submission.description();

        if self.vague.is_match(description) {
            return Err(ValidationError::new(
                "description",
                "is too vague, describe the technical problem",
            )
            .with_suggestion(VAGUE_SUGGESTION));
        }

        let chars = title.chars().count() + description.chars().count();
        if chars < self.min_chars {
            return Err(ValidationError::new(
                "description",
                format!(
                    "title and description together need at least {} characters",
                    self.min_chars
                ),
            )
            .with_suggestion(VAGUE_SUGGESTION));
        }

        let words = title
            .split_whitespace()
            .chain(description.split_whitespace())
            .filter(|w| w.chars().count() >= MEANINGFUL_WORD_CHARS)
            .count();
        if words < self.min_words {
            return Err(ValidationError::new(
                "description",
                format!("needs more detail, at least {} meaningful words", self.min_words),
            )
            .with_suggestion(THIN_SUGGESTION));
        }

        Ok(())
    }
}
