//! Session lifecycle: check credentials against the customer directory,
//! persist the resulting token + user, and re-derive the signed-in user on
//! demand. All functions take their store/client handle explicitly; there is
//! no process-wide session state.

use crate::error::{AppError, AppResult, AuthField};
use crate::models::UserPublic;
use crate::services::{directory, ApiClient};
use crate::storage::SessionStore;

use super::token;

/// Storage keys shared by store/load/clear. The literal values match the
/// web client, so sessions it stored keep working.
pub const TOKEN_KEY: &str = "spending_insights_token";
pub const USER_KEY: &str = "spending_insights_user";

/// What a successful login hands back to the caller. Nothing is persisted
/// yet; pass the parts to [store_session].
#[derive(Debug, Clone)]
pub struct AuthSuccess {
    pub user: UserPublic,
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

/// Check `email`/`password` against the customer directory and mint a
/// session token.
///
/// The directory ships plaintext passwords and the comparison here is plain
/// string equality; see DESIGN.md for why that is kept as-is.
pub async fn authenticate(
    client: &ApiClient,
    email: &str,
    password: &str,
) -> AppResult<AuthSuccess> {
    if email.trim().is_empty() {
        return Err(AppError::Validation {
            field: AuthField::Email,
            message: "Email is required".to_string(),
        });
    }
    if password.is_empty() {
        return Err(AppError::Validation {
            field: AuthField::Password,
            message: "Password is required".to_string(),
        });
    }

    // A directory failure must not reveal which lookup step broke; the
    // detail goes to the log only.
    let users = directory::fetch_users(client).await.map_err(|e| {
        tracing::error!("user directory fetch failed: {e}");
        AppError::AuthenticationFailed
    })?;

    let user = users
        .into_iter()
        .find(|u| u.email.eq_ignore_ascii_case(email))
        .ok_or(AppError::EmailNotFound)?;

    if user.password != password {
        return Err(AppError::InvalidPassword);
    }

    let token = token::issue(&user.id);
    tracing::debug!("issued session token for user {}", user.id);

    Ok(AuthSuccess {
        user: user.into(),
        token,
        expires_in: token::TOKEN_VALIDITY_HOURS * 3600,
    })
}

/// Persist a session. Both keys are written; a failed write surfaces as
/// [AppError::StorageWrite] with the cause attached.
pub fn store_session(
    store: &mut dyn SessionStore,
    user: &UserPublic,
    token: &str,
) -> AppResult<()> {
    let user_json = serde_json::to_string(user)
        .map_err(|e| AppError::StorageWrite(std::io::Error::other(e)))?;

    store.set(TOKEN_KEY, token).map_err(AppError::StorageWrite)?;
    store
        .set(USER_KEY, &user_json)
        .map_err(AppError::StorageWrite)?;
    Ok(())
}

/// The user behind the stored session, or `None`.
///
/// Any defect in the stored session (undecodable token, expired token,
/// unreadable user record, token minted for a different user) clears both
/// keys so the bad state cannot survive into the next call. Never errors.
pub fn current_user(store: &mut dyn SessionStore) -> Option<UserPublic> {
    let token = store.get(TOKEN_KEY)?;
    let user_json = store.get(USER_KEY)?;

    let Some(data) = token::validate(&token) else {
        clear_session(store);
        return None;
    };

    let user: UserPublic = match serde_json::from_str(&user_json) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("stored session user is unreadable: {e}");
            clear_session(store);
            return None;
        }
    };

    if data.user_id != user.id {
        tracing::warn!("session token does not match the stored user, clearing session");
        clear_session(store);
        return None;
    }

    Some(user)
}

/// Drop the stored session. Safe to call when no session exists.
pub fn clear_session(store: &mut dyn SessionStore) {
    store.remove(TOKEN_KEY);
    store.remove(USER_KEY);
}

/// Whether a valid session is currently stored.
pub fn is_authenticated(store: &mut dyn SessionStore) -> bool {
    current_user(store).is_some()
}
