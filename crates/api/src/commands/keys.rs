//! `key add`, `key remove`, `key switch`, `key list` and `key info`.

use serde::Deserialize;
use tyria_core::account::{Account, TokenInfo};
use tyria_core::card::{MessageCard, Reply};
use tyria_core::credentials::{looks_like_api_key, Credential, KeyRing, KeyRingError, MAX_KEYS};
use tyria_core::error::ApiError;
use tyria_core::permissions::{self, Permission};
use tyria_db::repositories::UserRepo;
use tyria_gateway::Auth;
use validator::Validate;

use super::{CommandError, Invocation, NoArgs};
use crate::state::AppState;

pub const INVALID_KEY: &str = "The key is invalid.";

#[derive(Debug, Deserialize, Validate)]
pub struct AddArgs {
    #[validate(length(min = 1, max = 200))]
    pub token: String,
}

/// One-based position in the user's key list.
#[derive(Debug, Deserialize, Validate)]
pub struct IndexArgs {
    #[validate(range(min = 1, max = 15))]
    pub index: usize,
}

fn describe(credential: &Credential) -> String {
    let perms = if credential.permissions.is_empty() {
        "none".to_string()
    } else {
        permissions::join(&credential.permissions)
    };
    format!(
        "Name: {}\nKey: `{}`\nPermissions: {perms}",
        credential.label,
        credential.masked_token()
    )
}

fn missing_field(card: MessageCard, credential: &Credential) -> MessageCard {
    let missing = credential.missing(&Permission::ALL);
    if missing.is_empty() {
        card
    } else {
        card.field("Missing permissions", permissions::join(&missing), false)
    }
}

/// Validate a token with the publisher and store it as the active key.
///
/// Nothing is written unless both `tokeninfo` and `account` succeed.
pub async fn add(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let args: AddArgs = inv.args()?;
    let token = args.token.trim();
    if !looks_like_api_key(token) {
        return Ok(Reply::text(INVALID_KEY));
    }

    let mut ring = UserRepo::key_ring(&state.pool, inv.user_id).await?;
    if ring.keys().iter().any(|k| k.token == token) {
        return Err(KeyRingError::Duplicate.into());
    }
    if ring.len() >= MAX_KEYS {
        return Err(KeyRingError::Full.into());
    }

    let auth = Auth::Token(token);
    let fetched = tokio::try_join!(
        state.gateway.call::<TokenInfo>("tokeninfo", auth, &[], None),
        state.gateway.call::<Account>("account", auth, &[], None),
    );
    let (info, account) = match fetched {
        Ok(pair) => pair,
        Err(ApiError::InvalidKey) => return Ok(Reply::text(INVALID_KEY)),
        Err(e) => return Err(e.into()),
    };

    let credential = Credential {
        token: token.to_string(),
        account_name: account.name.clone(),
        label: info.name.clone(),
        permissions: info.granted(),
    };
    let card = MessageCard::new("Key added")
        .description(format!("Your key for **{}** is now active.", account.name))
        .field("Key", describe(&credential), false);
    let card = missing_field(card, &credential);

    ring.add(credential)?;
    UserRepo::save_key_ring(&state.pool, inv.user_id, ring).await?;
    tracing::info!(user_id = inv.user_id, account = %account.name, "API key stored");
    Ok(card.into())
}

pub async fn remove(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let args: IndexArgs = inv.args()?;
    let mut ring = UserRepo::key_ring(&state.pool, inv.user_id).await?;
    let removed = ring.remove(args.index - 1)?;
    let now_active = ring.active().map(|k| k.account_name.clone());
    UserRepo::save_key_ring(&state.pool, inv.user_id, ring).await?;
    tracing::info!(user_id = inv.user_id, account = %removed.account_name, "API key removed");

    let mut text = format!("Removed the key for **{}**.", removed.account_name);
    if let Some(active) = now_active {
        text.push_str(&format!(" The active key is now the one for **{active}**."));
    }
    Ok(Reply::text(text))
}

pub async fn switch(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let args: IndexArgs = inv.args()?;
    let mut ring = UserRepo::key_ring(&state.pool, inv.user_id).await?;
    let account = ring.activate(args.index - 1)?.account_name.clone();
    UserRepo::save_key_ring(&state.pool, inv.user_id, ring).await?;
    Ok(Reply::text(format!("Switched to the key for **{account}**.")))
}

pub fn list_card(ring: &KeyRing) -> MessageCard {
    let active = ring.active().map(|k| k.token.as_str());
    let mut card = MessageCard::new("Your keys")
        .footer(format!("{}/{MAX_KEYS} keys stored", ring.len()));
    for (i, key) in ring.keys().iter().enumerate() {
        let marker = if Some(key.token.as_str()) == active { " (active)" } else { "" };
        card = card.field(
            format!("{}. {}{marker}", i + 1, key.account_name),
            describe(key),
            false,
        );
    }
    card
}

pub async fn list(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let _: NoArgs = inv.args()?;
    let ring = UserRepo::key_ring(&state.pool, inv.user_id).await?;
    if ring.is_empty() {
        return Err(ApiError::NoCredential.into());
    }
    Ok(list_card(&ring).into())
}

pub async fn info(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let _: NoArgs = inv.args()?;
    let ring = UserRepo::key_ring(&state.pool, inv.user_id).await?;
    let active = ring.active().ok_or(ApiError::NoCredential)?;
    let card = MessageCard::new(active.account_name.clone()).field("Active key", describe(active), false);
    Ok(missing_field(card, active).into())
}
