// src/auth/magic.rs
use crate::errors::ServerError;
use rusqlite::Connection;

use crate::auth::token::{generate_token, hash_token};
use crate::db::users as db_users;

#[derive(Debug, Clone)]
pub struct MagicLinkConfig {
    /// TTL for magic links in seconds.
    pub ttl_secs: i64,
    /// Relative path used when building links.
    pub magic_path: String,
}

impl Default for MagicLinkConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 15 * 60,
            magic_path: "/auth/magic".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedMagicLink {
    pub email: String,
    pub user_id: i64,
    /// Raw token (never store this in DB).
    pub token: String,
    pub expires_at: i64,
    /// Relative URL like "/auth/magic?token=..."
    pub link: String,
}

pub struct MagicLinkService {
    cfg: MagicLinkConfig,
}

impl MagicLinkService {
    pub fn new(cfg: MagicLinkConfig) -> Self {
        Self { cfg }
    }

    /// Trim + lowercase, minimal sanity check.
    pub fn normalize_email(email: &str) -> Result<String, ServerError> {
        let e = email.trim().to_lowercase();
        if e.is_empty() || !e.contains('@') || e.starts_with('@') || e.ends_with('@') {
            return Err(ServerError::BadRequest("invalid email".into()));
        }
        Ok(e)
    }

    /// Signup and login share this path: the user is created on first request.
    /// Delivery is the caller's job.
    pub fn request_link(
        &self,
        conn: &Connection,
        email: &str,
        name: Option<&str>,
        now: i64,
    ) -> Result<IssuedMagicLink, ServerError> {
        let email = Self::normalize_email(email)?;
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default());
        let user_id = db_users::get_or_create_user(conn, &email, name, now)?;

        let token = generate_token();
        let expires_at = now + self.cfg.ttl_secs;
        db_users::insert_magic_link(conn, user_id, &hash_token(&token), now, expires_at)?;

        Ok(IssuedMagicLink {
            link: format!("{}?token={}", self.cfg.magic_path, token),
            email,
            user_id,
            token,
            expires_at,
        })
    }

    /// Single-use: a second redeem of the same token is Unauthorized.
    pub fn redeem(&self, conn: &mut Connection, token: &str, now: i64) -> Result<i64, ServerError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ServerError::BadRequest("missing token".into()));
        }

        let Some(user_id) = db_users::consume_magic_link(conn, &hash_token(token), now)? else {
            return Err(ServerError::Unauthorized("invalid or expired link".into()));
        };

        db_users::touch_last_login(conn, user_id, now)?;
        Ok(user_id)
    }
}
