// Repository layer: each collaborator lives in its own file with `impl ChatRepository`.
//
// accounts.rs  - the account directory (registration, login, contact listing)
// messages.rs  - the message store (append-only conversation history)

use sqlx::sqlite::SqlitePool;

mod accounts;
mod messages;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use accounts::{hash_password, verify_password};

#[derive(Clone)]
pub struct ChatRepository {
    pub(crate) pool: SqlitePool,
}

impl ChatRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}
