use crate::error::DbError;

/// PostgreSQL truncates identifiers longer than `NAMEDATALEN - 1` bytes.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Quote `value` as a PostgreSQL identifier, doubling embedded quotes.
pub fn quote_identifier(value: &str) -> Result<String, DbError> {
    let reason = if value.is_empty() {
        Some("must not be empty")
    } else if value.len() > MAX_IDENTIFIER_LEN {
        Some("longer than 63 bytes")
    } else if value.contains('\0') {
        Some("contains a NUL byte")
    } else {
        None
    };

    if let Some(reason) = reason {
        return Err(DbError::InvalidIdentifier {
            value: value.to_string(),
            reason,
        });
    }

    Ok(format!("\"{}\"", value.replace('"', "\"\"")))
}

/// Render an encoding name as a string literal for `CREATE DATABASE ... ENCODING`.
pub fn encoding_literal(value: &str) -> Result<String, DbError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(DbError::InvalidEncoding(value.to_string()));
    }
    Ok(format!("'{}'", value))
}
