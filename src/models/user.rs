use serde::{Deserialize, Serialize};

use crate::constants::MAX_USERNAME_LENGTH;

/// User record stored in redb
/// Uses Unix timestamp for compact storage with bincode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Argon2id hash in PHC string format (embeds its own salt)
    pub password_hash: String,
    /// When the user was created (Unix timestamp)
    pub created_at: i64,
}

/// User model for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

impl User {
    /// Validate username format: 1-64 chars of `[A-Za-z0-9_.-]`
    pub fn validate_username(username: &str) -> bool {
        !username.is_empty()
            && username.len() <= MAX_USERNAME_LENGTH
            && username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(User::validate_username("alice"));
        assert!(User::validate_username("bob_the-builder.2"));

        // Empty
        assert!(!User::validate_username(""));

        // Too long
        assert!(!User::validate_username(&"a".repeat(65)));
        assert!(User::validate_username(&"a".repeat(64)));

        // Invalid characters
        assert!(!User::validate_username("alice smith"));
        assert!(!User::validate_username("al/ice"));
    }

    #[test]
    fn test_user_record_serialization() {
        let record = UserRecord {
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            created_at: 1733788800,
        };

        let bytes = bincode::serialize(&record).unwrap();
        let deserialized: UserRecord = bincode::deserialize(&bytes).unwrap();

        assert_eq!(record.password_hash, deserialized.password_hash);
        assert_eq!(record.created_at, deserialized.created_at);
    }
}
