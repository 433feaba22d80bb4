use redb::{Database, ReadableTable};

use crate::db::tables;
use crate::error::{AppError, Result};
use crate::models::{LoginThrottle, User, UserRecord};
use crate::security::{
    hash_password, is_strong_password, verify_absent_password, verify_password,
};

/// Create a user with a salted password hash
///
/// Fails with `UserAlreadyExists` if the username is taken and `WeakPassword`
/// if the password does not meet the policy. Blocking: call from
/// `spawn_blocking`.
pub fn register(db: &Database, username: &str, password: &str, now: i64) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(tables::USERS)?;

        if table.get(username)?.is_some() {
            tracing::info!("Registration rejected, user exists: {}", username);
            return Err(AppError::UserAlreadyExists);
        }

        if !is_strong_password(password) {
            return Err(AppError::WeakPassword);
        }

        let record = UserRecord {
            password_hash: hash_password(password).map_err(AppError::PasswordHash)?,
            created_at: now,
        };
        let bytes = bincode::serialize(&record)?;
        table.insert(username, bytes.as_slice())?;
    }
    write_txn.commit()?;

    tracing::info!("New user registered: {}", username);
    Ok(())
}

/// Whether `username` is taken
pub fn exists(db: &Database, username: &str) -> Result<bool> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(tables::USERS)?;
    let found = table.get(username)?.is_some();
    Ok(found)
}

/// Verify a username/password pair
///
/// Unknown users and wrong passwords both yield `InvalidCredentials`. Failed
/// attempts are counted per username; once the window's budget is spent every
/// attempt fails with `RateLimitExceeded` until the window resets.
pub fn authenticate(db: &Database, username: &str, password: &str, now: i64) -> Result<User> {
    let write_txn = db.begin_write()?;
    let verified = {
        let mut attempts = write_txn.open_table(tables::LOGIN_ATTEMPTS)?;
        let mut throttle = match attempts.get(username)? {
            Some(bytes) => bincode::deserialize(bytes.value()).unwrap_or_else(|e| {
                tracing::warn!("Discarding unreadable login throttle for {}: {}", username, e);
                LoginThrottle::new(now)
            }),
            None => LoginThrottle::new(now),
        };
        throttle.check(now)?;

        let users = write_txn.open_table(tables::USERS)?;
        let record: Option<UserRecord> = users
            .get(username)?
            .map(|b| bincode::deserialize(b.value()))
            .transpose()?;
        drop(users);

        // Unknown usernames get no throttle row, only the same hashing work
        let Some(record) = record else {
            verify_absent_password(password);
            tracing::warn!("Failed login for unknown user: {}", username);
            return Err(AppError::InvalidCredentials);
        };

        let verified =
            verify_password(password, &record.password_hash).map_err(AppError::PasswordHash)?;

        if verified {
            attempts.remove(username)?;
        } else {
            throttle.record_failure(now);
            let bytes = bincode::serialize(&throttle)?;
            attempts.insert(username, bytes.as_slice())?;
        }
        verified
    };
    write_txn.commit()?;

    if !verified {
        tracing::warn!("Failed login for user: {}", username);
        return Err(AppError::InvalidCredentials);
    }

    Ok(User {
        username: username.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_FAILED_LOGINS_PER_WINDOW;
    use crate::db::init_tables;
    use tempfile::TempDir;

    fn test_db(dir: &TempDir) -> Database {
        let db = Database::create(dir.path().join("users.db")).unwrap();
        init_tables(&db).unwrap();
        db
    }

    #[test]
    fn test_register_then_authenticate() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        register(&db, "alice", "Abcdef1!", 0).unwrap();

        let user = authenticate(&db, "alice", "Abcdef1!", 1).unwrap();
        assert_eq!(user.username, "alice");

        assert!(matches!(
            authenticate(&db, "alice", "Abcdef1?", 2),
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&db, "alice", "abcdef1!", 3),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_register_duplicate() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        register(&db, "alice", "Abcdef1!", 0).unwrap();
        assert!(matches!(
            register(&db, "alice", "Other1!x", 0),
            Err(AppError::UserAlreadyExists)
        ));

        assert!(exists(&db, "alice").unwrap());
        assert!(!exists(&db, "bob").unwrap());

        // Original password still works
        assert!(authenticate(&db, "alice", "Abcdef1!", 1).is_ok());
    }

    #[test]
    fn test_register_weak_password() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        assert!(matches!(
            register(&db, "bob", "abcdefg1", 0),
            Err(AppError::WeakPassword)
        ));
        assert!(matches!(
            authenticate(&db, "bob", "abcdefg1", 1),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unknown_user() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        assert!(matches!(
            authenticate(&db, "nobody", "Abcdef1!", 0),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unknown_users_leave_no_throttle_rows() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        for i in 0..20 {
            assert!(matches!(
                authenticate(&db, &format!("ghost{i}"), "x", 0),
                Err(AppError::InvalidCredentials)
            ));
        }

        let read_txn = db.begin_read().unwrap();
        let attempts = read_txn.open_table(tables::LOGIN_ATTEMPTS).unwrap();
        assert_eq!(attempts.iter().unwrap().count(), 0);
    }

    #[test]
    fn test_failed_logins_throttled_and_cleared() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        register(&db, "carol", "Abcdef1!", 0).unwrap();

        for _ in 0..MAX_FAILED_LOGINS_PER_WINDOW {
            assert!(matches!(
                authenticate(&db, "carol", "wrong", 10),
                Err(AppError::InvalidCredentials)
            ));
        }

        // Even the right password is refused while throttled
        assert!(matches!(
            authenticate(&db, "carol", "Abcdef1!", 11),
            Err(AppError::RateLimitExceeded)
        ));

        // After the window, a successful login clears the counter
        let later = 11 + crate::constants::LOGIN_WINDOW_SECS;
        assert!(authenticate(&db, "carol", "Abcdef1!", later).is_ok());
        assert!(matches!(
            authenticate(&db, "carol", "wrong", later),
            Err(AppError::InvalidCredentials)
        ));
        assert!(authenticate(&db, "carol", "Abcdef1!", later).is_ok());
    }
}
