//! Account/profile repository.
//!
//! # Invariants
//! - `config` holds at most one row (`id = 1`) pointing at the last used
//!   account.
//! - A dangling `last_used_id` reads as "no account", not as an error.

use crate::model::account::Account;
use crate::repo::{ensure_tables, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const CONFIG_ROW_ID: i64 = 1;

/// Repository interface for local profiles.
pub trait AccountRepository {
    fn list_accounts(&self) -> RepoResult<Vec<Account>>;
    /// Inserts or fully replaces the account with the same id.
    fn save_account(&self, account: &Account) -> RepoResult<()>;
    /// Creates and stores an account with a generated id.
    fn create_account(&self, username: &str, avatar_path: &str) -> RepoResult<Account>;
    /// Marks `account_id` as the last used profile.
    fn switch_account(&self, account_id: &str) -> RepoResult<()>;
    fn last_used_account(&self) -> RepoResult<Option<Account>>;
}

/// SQLite-backed account repository.
pub struct SqliteAccountRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountRepository<'conn> {
    /// Constructs a repository from a bootstrapped connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["accounts", "config"])?;
        Ok(Self { conn })
    }

    fn get_account(&self, account_id: &str) -> RepoResult<Option<Account>> {
        let account = self
            .conn
            .query_row(
                "SELECT id, username, avatar_path FROM accounts WHERE id = ?1;",
                [account_id],
                parse_account_row,
            )
            .optional()?;
        Ok(account)
    }
}

impl AccountRepository for SqliteAccountRepository<'_> {
    fn list_accounts(&self) -> RepoResult<Vec<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, avatar_path
             FROM accounts
             ORDER BY username COLLATE NOCASE ASC, id ASC;",
        )?;
        let accounts = stmt
            .query_map([], parse_account_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    fn save_account(&self, account: &Account) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO accounts (id, username, avatar_path) VALUES (?1, ?2, ?3);",
            params![
                account.id.as_str(),
                account.username.as_str(),
                account.avatar_path.as_str(),
            ],
        )?;
        Ok(())
    }

    fn create_account(&self, username: &str, avatar_path: &str) -> RepoResult<Account> {
        let account = Account::new(username, avatar_path);
        self.save_account(&account)?;
        Ok(account)
    }

    fn switch_account(&self, account_id: &str) -> RepoResult<()> {
        if self.get_account(account_id)?.is_none() {
            return Err(RepoError::NotFound(format!("account {account_id}")));
        }

        self.conn.execute(
            "INSERT OR REPLACE INTO config (id, last_used_id) VALUES (?1, ?2);",
            params![CONFIG_ROW_ID, account_id],
        )?;
        Ok(())
    }

    fn last_used_account(&self) -> RepoResult<Option<Account>> {
        let last_used: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT last_used_id FROM config WHERE id = ?1;",
                [CONFIG_ROW_ID],
                |row| row.get(0),
            )
            .optional()?;

        match last_used.flatten() {
            Some(account_id) => self.get_account(&account_id),
            None => Ok(None),
        }
    }
}

fn parse_account_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get("id")?,
        username: row.get("username")?,
        avatar_path: row.get("avatar_path")?,
    })
}
