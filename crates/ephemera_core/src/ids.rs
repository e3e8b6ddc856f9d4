//! Short URL-safe identifier and storage-key generation.

use crate::constants::ID_LENGTH;
use chrono::{DateTime, Utc};
use rand::Rng;

/// URL-safe alphabet (`A-Z`, `a-z`, `0-9`, `_`, `-`).
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Produces unique URL-safe tokens.
///
/// Implementations must be safe to share across request tasks.
pub trait TokenGenerator: Send + Sync {
    /// Return a fresh token of exactly `length` characters.
    fn new_token(&self, length: usize) -> String;
}

/// Token generator backed by the thread-local CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokens;

impl TokenGenerator for RandomTokens {
    fn new_token(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

/// Generate a public content id.
pub fn new_id(tokens: &dyn TokenGenerator) -> String {
    tokens.new_token(ID_LENGTH)
}

/// Generate a blob storage key, prefixed with the creation second so keys sort
/// roughly by age in the blob directory.
pub fn new_storage_key(tokens: &dyn TokenGenerator, now: DateTime<Utc>) -> String {
    format!("{}-{}", now.timestamp(), tokens.new_token(ID_LENGTH))
}

/// Return `true` when `value` only contains characters from the URL-safe
/// alphabet.
pub fn is_url_safe(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tokens_have_requested_length_and_alphabet() {
        let tokens = RandomTokens;
        for length in [1, 11, 32] {
            let token = tokens.new_token(length);
            assert_eq!(token.len(), length);
            assert!(is_url_safe(&token), "token: {}", token);
        }
    }

    #[test]
    fn ids_do_not_collide_in_practice() {
        let tokens = RandomTokens;
        let ids: HashSet<String> = (0..2_000).map(|_| new_id(&tokens)).collect();
        assert_eq!(ids.len(), 2_000);
    }

    #[test]
    fn storage_key_is_distinct_from_id_and_url_safe() {
        let tokens = RandomTokens;
        let now = Utc::now();
        let key = new_storage_key(&tokens, now);
        assert!(key.starts_with(&format!("{}-", now.timestamp())));
        assert!(is_url_safe(&key), "key: {}", key);
        assert_eq!(key.len(), now.timestamp().to_string().len() + 1 + ID_LENGTH);
    }

    #[test]
    fn is_url_safe_rejects_path_characters() {
        assert!(!is_url_safe(""));
        assert!(!is_url_safe("../etc"));
        assert!(!is_url_safe("a/b"));
        assert!(!is_url_safe("a b"));
        assert!(is_url_safe("abc_DEF-123"));
    }
}
