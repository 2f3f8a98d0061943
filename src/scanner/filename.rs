//! Filename parsing: method identity and numeric hyperparameters.
//!
//! `PFL_Ta8_cf20` parses to method `PFL` with parameters `Ta=8, cf=20`.

use crate::error::NameError;
use crate::models::Parameters;
use tracing::debug;

/// Default token delimiter inside result filenames.
pub const DEFAULT_DELIMITER: char = '_';

/// Method identity parsed from a filename stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub method: String,
    pub parameters: Parameters,
}

/// Parse a filename stem (no extension) into method and parameters.
///
/// The first token is the method. Every later token must be a run of ASCII
/// letters followed by a run of ASCII digits spanning the whole token; other
/// tokens are dropped. A repeated parameter name keeps the last value.
pub fn parse_filename(stem: &str, delimiter: char) -> Result<ParsedName, NameError> {
    let mut tokens = stem.split(delimiter);

    let method = tokens.next().unwrap_or_default();
    if method.is_empty() {
        return Err(NameError::EmptyMethod(stem.to_string()));
    }

    let mut parameters = Parameters::new();
    for token in tokens {
        match split_param_token(token) {
            Some((name, value)) => {
                if let Some(previous) = parameters.insert(name, value) {
                    debug!(
                        "Parameter '{}' repeated in '{}': {} replaced by {}",
                        name, stem, previous, value
                    );
                }
            }
            None => debug!("Ignoring non-parameter token '{}' in '{}'", token, stem),
        }
    }

    Ok(ParsedName {
        method: method.to_string(),
        parameters,
    })
}

/// Split `Ta8` into `("Ta", "8")`; `None` unless the token is letters then digits.
fn split_param_token(token: &str) -> Option<(&str, &str)> {
    let letters = token.bytes().take_while(u8::is_ascii_alphabetic).count();
    let (name, value) = token.split_at(letters);

    if name.is_empty() || value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some((name, value))
}
