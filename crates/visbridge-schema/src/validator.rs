use jsonschema::Validator;
use serde_json::Value;
use visbridge_message::Kind;

use crate::error::{Result, SchemaError};

/// Extra errors reported after the first one.
const MAX_EXTRA_ERRORS: usize = 3;

pub(crate) fn validate_value(kind: Kind, value: &Value, validator: &Validator) -> Result<()> {
    let mut errors = validator.iter_errors(value);
    let Some(first) = errors.next() else {
        return Ok(());
    };

    let message = std::iter::once(first)
        .chain(errors.take(MAX_EXTRA_ERRORS))
        .map(|err| err.to_string())
        .collect::<Vec<_>>()
        .join("; ");

    Err(SchemaError::ValidationFailed { kind, message })
}
