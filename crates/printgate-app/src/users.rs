// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `printgate users`: add, delete and list accounts in the users file.
//
// The running server re-reads the file on every lookup, so changes take
// effect without a restart. A deleted user's token is rejected on its next
// use.

use std::path::Path;

use printgate_core::error::{PrintgateError, Result};
use printgate_security::{JsonFileUserRepository, User, UserRepository, hash_password};
use tracing::info;

use crate::cli::UserCommand;

pub fn run(file: &Path, action: UserCommand) -> Result<()> {
    let repo = JsonFileUserRepository::open_or_create(file)?;
    for line in apply(&repo, action)? {
        println!("{line}");
    }
    Ok(())
}

/// Apply `action` and return the lines to show the operator.
fn apply(repo: &dyn UserRepository, action: UserCommand) -> Result<Vec<String>> {
    match action {
        UserCommand::Add { username, password } => {
            if username.trim().is_empty() || password.is_empty() {
                return Err(PrintgateError::UserStore(
                    "username and password must not be empty".into(),
                ));
            }
            let existed = repo.upsert(User {
                username: username.clone(),
                password_hash: hash_password(&password)?,
            })?;
            info!(username = %username, existed, "user saved");
            let verb = if existed { "Updated" } else { "Added" };
            Ok(vec![format!("{verb} user {username}")])
        }
        UserCommand::Delete { username } => {
            if repo.remove(&username)? {
                info!(username = %username, "user deleted");
                Ok(vec![format!(
                    "Deleted user {username}; their token is no longer accepted"
                )])
            } else {
                Ok(vec![format!("No such user: {username}")])
            }
        }
        UserCommand::List => {
            let users = repo.list()?;
            if users.is_empty() {
                return Ok(vec!["No users".to_string()]);
            }
            Ok(users.into_iter().map(|u| u.username).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printgate_security::verify_password;

    fn add(repo: &dyn UserRepository, name: &str, pw: &str) -> Vec<String> {
        apply(
            repo,
            UserCommand::Add {
                username: name.into(),
                password: pw.into(),
            },
        )
        .unwrap()
    }

    #[test]
    fn add_hashes_and_update_reports() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileUserRepository::open_or_create(dir.path().join("users.json")).unwrap();

        assert_eq!(add(&repo, "till-1", "pw1"), vec!["Added user till-1"]);
        assert_eq!(add(&repo, "till-1", "pw2"), vec!["Updated user till-1"]);

        let user = repo.find("till-1").unwrap().unwrap();
        assert_ne!(user.password_hash, "pw2");
        assert!(verify_password("pw2", &user.password_hash));
    }

    #[test]
    fn list_never_shows_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileUserRepository::open_or_create(dir.path().join("users.json")).unwrap();
        assert_eq!(apply(&repo, UserCommand::List).unwrap(), vec!["No users"]);

        add(&repo, "alice", "a");
        add(&repo, "bob", "b");
        let lines = apply(&repo, UserCommand::List).unwrap();
        assert_eq!(lines, vec!["alice", "bob"]);
    }

    #[test]
    fn delete_reports_missing_user() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileUserRepository::open_or_create(dir.path().join("users.json")).unwrap();
        add(&repo, "alice", "a");

        let gone = apply(&repo, UserCommand::Delete { username: "alice".into() }).unwrap();
        assert!(gone[0].starts_with("Deleted user alice"));
        let missing = apply(&repo, UserCommand::Delete { username: "alice".into() }).unwrap();
        assert_eq!(missing, vec!["No such user: alice"]);
    }

    #[test]
    fn empty_password_rejected() {
        let repo = printgate_security::InMemoryUserRepository::new();
        let err = apply(
            &repo,
            UserCommand::Add {
                username: "alice".into(),
                password: String::new(),
            },
        );
        assert!(err.is_err());
    }
}
