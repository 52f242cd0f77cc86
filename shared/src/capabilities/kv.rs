use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_KEY_LENGTH: usize = 512;
pub const MAX_VALUE_SIZE: usize = 10 * 1024 * 1024;

const USER_DATA_PREFIX: &str = "userdata";

/// A validated key in the user-data area of the shell's key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KvKey(String);

impl KvKey {
    pub fn user_data(name: &str) -> Result<Self, KvError> {
        if let Some(reason) = rejection(name) {
            return Err(KvError::InvalidKey {
                key: name.escape_default().take(64).collect(),
                reason,
            });
        }
        Ok(Self(format!("{USER_DATA_PREFIX}:{name}")))
    }

    /// The key as the shell's store sees it.
    pub fn raw(&self) -> String {
        self.0.clone()
    }
}

fn rejection(name: &str) -> Option<&'static str> {
    if name.trim().is_empty() {
        Some("blank key")
    } else if name.len() > MAX_KEY_LENGTH {
        Some("key too long")
    } else if name.contains("..") || name.starts_with(['/', '\\']) {
        Some("key looks like a path")
    } else if name.chars().any(|c| c.is_control() && c != '\t') {
        Some("key has control characters")
    } else {
        None
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KvError {
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("value of {size} bytes is over the {max} byte limit")]
    ValueTooLarge { size: usize, max: usize },

    #[error("storage error: {message}")]
    Storage { message: String },
}

/// Refuses values the shell store is not expected to hold.
pub fn check_value_size(value: &[u8]) -> Result<(), KvError> {
    if value.len() > MAX_VALUE_SIZE {
        return Err(KvError::ValueTooLarge {
            size: value.len(),
            max: MAX_VALUE_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_key_is_prefixed() {
        let key = KvKey::user_data("favorite_cities").unwrap();
        assert_eq!(key.raw(), "userdata:favorite_cities");
    }

    #[test]
    fn blank_keys_rejected() {
        for name in ["", "   "] {
            assert!(matches!(
                KvKey::user_data(name),
                Err(KvError::InvalidKey {
                    reason: "blank key",
                    ..
                })
            ));
        }
    }

    #[test]
    fn long_key_rejected() {
        let name = "k".repeat(MAX_KEY_LENGTH + 1);
        assert!(KvKey::user_data(&name).is_err());
        assert!(KvKey::user_data(&name[1..]).is_ok());
    }

    #[test]
    fn path_like_keys_rejected() {
        assert!(KvKey::user_data("a/../b").is_err());
        assert!(KvKey::user_data("/root").is_err());
        assert!(KvKey::user_data("\\root").is_err());
        assert!(KvKey::user_data("cities/v1").is_ok());
    }

    #[test]
    fn control_characters_rejected() {
        assert!(KvKey::user_data("a\0b").is_err());
        assert!(KvKey::user_data("a\nb").is_err());
        assert!(KvKey::user_data("a\tb").is_ok());
    }

    #[test]
    fn value_size_limit() {
        assert!(check_value_size(&[0u8; 16]).is_ok());
        let big = vec![0u8; MAX_VALUE_SIZE + 1];
        assert_eq!(
            check_value_size(&big),
            Err(KvError::ValueTooLarge {
                size: MAX_VALUE_SIZE + 1,
                max: MAX_VALUE_SIZE,
            })
        );
    }
}
