//! Authoring checks for content entities.

use validator::ValidationError;

use crate::dao::models::AnswerOptionEntity;

/// Minimum number of choices a question must offer.
pub const MIN_OPTIONS: usize = 2;

/// Validates the option list of a question: at least [`MIN_OPTIONS`] labelled options, exactly one
/// of which is marked correct.
///
/// # Examples
///
/// ```ignore
/// validate_options(&[right, wrong])        // Ok
/// validate_options(&[wrong, wrong])        // Err - no correct option
/// validate_options(&[right, right, wrong]) // Err - several correct options
/// ```
pub fn validate_options(options: &[AnswerOptionEntity]) -> Result<(), ValidationError> {
    if options.len() < MIN_OPTIONS {
        let mut err = ValidationError::new("too_few_options");
        err.message = Some(
            format!(
                "A question needs at least {MIN_OPTIONS} options (got {})",
                options.len()
            )
            .into(),
        );
        return Err(err);
    }

    if let Some(position) = options
        .iter()
        .position(|option| option.label.trim().is_empty())
    {
        let mut err = ValidationError::new("empty_option_label");
        err.message = Some(format!("Option {position} has an empty label").into());
        return Err(err);
    }

    match options.iter().filter(|option| option.is_correct).count() {
        1 => Ok(()),
        0 => {
            let mut err = ValidationError::new("no_correct_option");
            err.message = Some("No option is marked correct; the question can never score".into());
            Err(err)
        }
        count => {
            let mut err = ValidationError::new("multiple_correct_options");
            err.message = Some(format!("{count} options are marked correct (expected 1)").into());
            Err(err)
        }
    }
}
