//! Keyspace name handling.

use crate::error::{Error, Result};

/// Checks if given name is a bare word or a double-quoted word, consisting of ASCII letters,
/// digits and underscores.
pub fn is_valid_keyspace_name(name: &str) -> bool {
    let unquoted = unquote(name).unwrap_or(name);
    !unquoted.is_empty()
        && unquoted
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn validate_keyspace_name(name: &str) -> Result<()> {
    if is_valid_keyspace_name(name) {
        Ok(())
    } else {
        Err(Error::InvalidKeyspaceName(name.to_string()))
    }
}

/// Returns the name the server will report for given keyspace identifier: quoted names keep
/// their case, bare ones are case-folded.
pub fn keyspace_identity(name: &str) -> String {
    match unquote(name) {
        Some(unquoted) => unquoted.to_string(),
        None => name.to_lowercase(),
    }
}

/// Quotes a keyspace name reported by the server, so it can be used verbatim in a query.
pub fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn unquote(name: &str) -> Option<&str> {
    name.strip_prefix('"')
        .and_then(|name| name.strip_suffix('"'))
}
