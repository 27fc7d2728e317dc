//! crates/lingo_core/src/accounts.rs
//!
//! Registration and credential lookup. Password hashing itself lives with the
//! web adapter; the core only deals in already-hashed strings.

use crate::domain::{User, UserCredentials};
use crate::error::{CoreError, CoreResult};
use crate::ports::{PortError, RecordStore};

/// Trims surrounding whitespace; the trimmed name is the record key.
pub fn normalize_user_name(raw: &str) -> CoreResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CoreError::EmptyName);
    }
    Ok(name.to_string())
}

pub async fn register(
    store: &dyn RecordStore,
    raw_name: &str,
    password_hash: &str,
) -> CoreResult<User> {
    let user_name = normalize_user_name(raw_name)?;
    if store.user_exists(&user_name).await? {
        return Err(CoreError::NameTaken);
    }
    // Two registrations can race past the check above; the store decides.
    store
        .create_user(&user_name, password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => CoreError::NameTaken,
            other => CoreError::Retrieval(other),
        })
}

pub async fn find_credentials(
    store: &dyn RecordStore,
    raw_name: &str,
) -> CoreResult<UserCredentials> {
    let user_name = normalize_user_name(raw_name).map_err(|_| CoreError::UnknownAccount)?;
    store
        .get_user(&user_name)
        .await?
        .ok_or(CoreError::UnknownAccount)
}
