use super::WaitError;
use crate::types::Dynamic;

/// Maps a probed value to the status string compared against target and
/// pending sets. Booleans become `"true"`/`"false"`, integers their decimal
/// form and strings are used verbatim.
pub fn classify(attribute: &str, value: &Dynamic) -> Result<String, WaitError> {
    match value {
        Dynamic::Bool(b) => Ok(b.to_string()),
        Dynamic::Int(i) => Ok(i.to_string()),
        Dynamic::String(s) => Ok(s.clone()),
        other => Err(WaitError::UnsupportedAttributeType {
            attribute: attribute.to_string(),
            kind: other.kind().to_string(),
        }),
    }
}
