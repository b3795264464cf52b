// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User repository: usernames and password hashes.
//
// File layout (`users.json`), one object per user:
//   [
//     { "username": "front-desk", "password": "$argon2id$v=19$..." }
//   ]
//
// The file-backed repository re-reads the file on every lookup, so edits
// made by `printgate users ...` while the server is running take effect on
// the next request.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use printgate_core::error::{PrintgateError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// A stored user. `password_hash` is a PHC string, never a plaintext password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(rename = "password")]
    pub password_hash: String,
}

/// Storage for user records.
pub trait UserRepository: Send + Sync {
    /// Look up a user by name.
    fn find(&self, username: &str) -> Result<Option<User>>;

    /// Insert a user, or replace the hash of an existing one.
    /// Returns `true` if the user already existed.
    fn upsert(&self, user: User) -> Result<bool>;

    /// Remove a user. Returns `true` if the user existed.
    fn remove(&self, username: &str) -> Result<bool>;

    /// All users, in stored order.
    fn list(&self) -> Result<Vec<User>>;
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// Users persisted as a JSON array on disk.
pub struct JsonFileUserRepository {
    path: PathBuf,
    /// Serialises read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileUserRepository {
    /// Use `path` as the users file. A missing file reads as an empty list.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Like [`new`](Self::new), but create an empty users file if none exists.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("users file does not exist, creating an empty one");
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, "[]")?;
        }
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<User>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "users file not found, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|e| {
            PrintgateError::UserStore(format!("{}: {}", self.path.display(), e))
        })
    }

    fn save(&self, users: &[User]) -> Result<()> {
        let data = serde_json::to_string_pretty(users)?;
        std::fs::write(&self.path, data)?;
        debug!(path = %self.path.display(), count = users.len(), "users file saved");
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| PrintgateError::UserStore("users file lock poisoned".into()))
    }
}

impl UserRepository for JsonFileUserRepository {
    fn find(&self, username: &str) -> Result<Option<User>> {
        Ok(self.load()?.into_iter().find(|u| u.username == username))
    }

    fn upsert(&self, user: User) -> Result<bool> {
        let _guard = self.lock()?;
        let mut users = self.load()?;
        let existed = match users.iter_mut().find(|u| u.username == user.username) {
            Some(existing) => {
                existing.password_hash = user.password_hash;
                true
            }
            None => {
                users.push(user);
                false
            }
        };
        self.save(&users)?;
        Ok(existed)
    }

    fn remove(&self, username: &str) -> Result<bool> {
        let _guard = self.lock()?;
        let mut users = self.load()?;
        let before = users.len();
        users.retain(|u| u.username != username);
        if users.len() == before {
            return Ok(false);
        }
        self.save(&users)?;
        Ok(true)
    }

    fn list(&self) -> Result<Vec<User>> {
        self.load()
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// Process-local users, for tests and throwaway deployments.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<BTreeMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find(&self, username: &str) -> Result<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| PrintgateError::UserStore("user map lock poisoned".into()))?;
        Ok(users.get(username).cloned())
    }

    fn upsert(&self, user: User) -> Result<bool> {
        let mut users = self
            .users
            .write()
            .map_err(|_| PrintgateError::UserStore("user map lock poisoned".into()))?;
        Ok(users.insert(user.username.clone(), user).is_some())
    }

    fn remove(&self, username: &str) -> Result<bool> {
        let mut users = self
            .users
            .write()
            .map_err(|_| PrintgateError::UserStore("user map lock poisoned".into()))?;
        Ok(users.remove(username).is_some())
    }

    fn list(&self) -> Result<Vec<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| PrintgateError::UserStore("user map lock poisoned".into()))?;
        Ok(users.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, hash: &str) -> User {
        User {
            username: name.into(),
            password_hash: hash.into(),
        }
    }

    #[test]
    fn file_repo_upsert_find_remove() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileUserRepository::open_or_create(dir.path().join("users.json")).unwrap();
        assert!(repo.list().unwrap().is_empty());

        assert!(!repo.upsert(user("alice", "h1")).unwrap());
        assert!(repo.upsert(user("alice", "h2")).unwrap());
        assert_eq!(repo.find("alice").unwrap().unwrap().password_hash, "h2");
        assert_eq!(repo.list().unwrap().len(), 1);

        assert!(repo.remove("alice").unwrap());
        assert!(!repo.remove("alice").unwrap());
        assert!(repo.find("alice").unwrap().is_none());
    }

    #[test]
    fn file_uses_password_field_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        let repo = JsonFileUserRepository::open_or_create(&path).unwrap();
        repo.upsert(user("bob", "$argon2id$x")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["username"], "bob");
        assert_eq!(raw[0]["password"], "$argon2id$x");
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileUserRepository::new(dir.path().join("absent.json"));
        assert!(repo.find("anyone").unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "{not json").unwrap();
        let repo = JsonFileUserRepository::new(&path);
        assert!(matches!(repo.list(), Err(PrintgateError::UserStore(_))));
    }

    #[test]
    fn in_memory_repo() {
        let repo = InMemoryUserRepository::new();
        repo.upsert(user("carol", "h")).unwrap();
        assert!(repo.find("carol").unwrap().is_some());
        assert!(repo.remove("carol").unwrap());
        assert!(repo.list().unwrap().is_empty());
    }
}
