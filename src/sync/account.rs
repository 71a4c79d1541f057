use crate::persistence::{account_file, atomic_write, read_file};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Signed-in principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

impl User {
    /// Stable id per address, so signing back in finds the same tasks
    pub fn from_email(email: &str) -> Self {
        let email = email.trim().to_lowercase();
        let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("mailto:{}", email).as_bytes());
        Self { id, email }
    }

    /// Principal for throwaway in-memory sessions
    pub fn guest() -> Self {
        Self {
            id: Uuid::nil(),
            email: "guest".to_string(),
        }
    }
}

/// Read the current account, `None` when signed out
pub fn load_account(dir: &Path) -> Result<Option<User>> {
    let content = read_file(account_file(dir))?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    let user: User = serde_json::from_str(&content).context("Malformed account.json")?;
    Ok(Some(user))
}

/// Record `email` as the signed-in account
pub fn sign_in(dir: &Path, email: &str) -> Result<User> {
    let email = email.trim();
    if !looks_like_email(email) {
        anyhow::bail!("'{}' is not a valid e-mail address", email);
    }

    let user = User::from_email(email);
    let json = serde_json::to_string_pretty(&user)?;
    atomic_write(account_file(dir), &json)?;
    Ok(user)
}

/// Forget the signed-in account; tasks stay on disk
pub fn sign_out(dir: &Path) -> Result<bool> {
    let path = account_file(dir);
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    Ok(true)
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_signed_out_by_default() {
        let temp_dir = tempdir().unwrap();
        assert_eq!(load_account(temp_dir.path()).unwrap(), None);
    }

    #[test]
    fn test_sign_in_and_out() {
        let temp_dir = tempdir().unwrap();

        let user = sign_in(temp_dir.path(), " Sam@Example.com ").unwrap();
        assert_eq!(user.email, "sam@example.com");
        assert_eq!(load_account(temp_dir.path()).unwrap(), Some(user));

        assert!(sign_out(temp_dir.path()).unwrap());
        assert_eq!(load_account(temp_dir.path()).unwrap(), None);
        assert!(!sign_out(temp_dir.path()).unwrap());
    }

    #[test]
    fn test_same_email_same_id() {
        assert_eq!(
            User::from_email("sam@example.com").id,
            User::from_email("SAM@example.com").id
        );
        assert_ne!(
            User::from_email("sam@example.com").id,
            User::from_email("alex@example.com").id
        );
    }

    #[test]
    fn test_rejects_malformed_email() {
        let temp_dir = tempdir().unwrap();

        for bad in ["", "sam", "@example.com", "sam@example", "sam @example.com"] {
            let err = sign_in(temp_dir.path(), bad).unwrap_err();
            assert!(err.to_string().contains("not a valid e-mail"));
        }
        assert_eq!(load_account(temp_dir.path()).unwrap(), None);
    }
}
