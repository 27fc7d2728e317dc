//! crates/lingo_core/src/error.rs
//!
//! Errors produced by the core services.

use crate::ports::PortError;

/// Why an add-friend request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendRejection {
    Empty,
    SelfReference,
    Duplicate,
    NotFound,
}

impl FriendRejection {
    pub fn code(self) -> &'static str {
        match self {
            FriendRejection::Empty => "empty",
            FriendRejection::SelfReference => "self",
            FriendRejection::Duplicate => "duplicate",
            FriendRejection::NotFound => "not-found",
        }
    }
}

impl std::fmt::Display for FriendRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The record store was unreachable or handed back something unusable.
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] PortError),

    #[error("Rejected: {0}")]
    Validation(FriendRejection),

    #[error("User name is already taken")]
    NameTaken,

    #[error("User name must not be empty")]
    EmptyName,

    #[error("Account not found")]
    UnknownAccount,

    #[error("Wrong password")]
    WrongPassword,
}

pub type CoreResult<T> = Result<T, CoreError>;
