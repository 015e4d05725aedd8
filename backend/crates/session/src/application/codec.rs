//! Token Codec
//!
//! Mints and verifies the signed access/refresh token pair. Both tokens are
//! HS256 JWTs signed with the shared secret; each embeds the device
//! fingerprint computed at mint time, so a token replayed from another
//! device fails verification even with a valid signature.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use platform::client::RequestContext;
use platform::crypto::constant_time_eq;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::{SessionConfig, TOKEN_TYPE};
use crate::domain::entity::User;
use crate::error::{SessionError, SessionResult};

/// Claims embedded in every access token.
///
/// Identity claims (name, roles, security stamp) ride along so authorization
/// does not need a user lookup; `dvc` is the device fingerprint binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the user's internal UUID
    pub sub: String,
    /// Display name
    pub name: String,
    /// Role codes (e.g. `"user"`, `"admin"`)
    pub roles: Vec<String>,
    /// Security stamp at mint time
    pub sst: String,
    /// Device fingerprint at mint time
    pub dvc: String,
    /// Unique token id (UUID v4) for audit/revocation
    pub jti: String,
    /// Issuer: scheme + host the minting request was addressed to
    pub iss: String,
    /// Audience: the caller's Origin/Referer host
    pub aud: String,
    /// Issued-at (UTC Unix timestamp)
    pub iat: i64,
    /// Expiration (UTC Unix timestamp)
    pub exp: i64,
}

/// Claims embedded in a refresh token: minimal identity plus the device
/// binding, no roles or stamp.
///
/// `deny_unknown_fields` keeps an access token from passing as a refresh
/// token; the extra identity claims make deserialization fail outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    pub sub: String,
    pub dvc: String,
    pub jti: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly minted session, returned to the caller on sign-in/refresh.
///
/// Transient: the store persists only the token digests, never this struct.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Scheme name, `Bearer`
    pub token_type: String,
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
    /// Decoded claims of the access token
    pub claims: AccessClaims,
}

/// Why a token failed codec-level verification.
///
/// Deliberately a tagged result instead of an error type: these are normal
/// request outcomes, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// Bad signature, wrong issuer/audience, or unparsable
    Malformed,
    /// Structurally valid but past its expiry
    Expired,
    /// Minted for a different device fingerprint
    DeviceMismatch,
}

impl From<TokenRejection> for SessionError {
    fn from(rejection: TokenRejection) -> Self {
        match rejection {
            TokenRejection::Malformed => SessionError::TokenRejected,
            TokenRejection::Expired => SessionError::TokenExpired,
            TokenRejection::DeviceMismatch => SessionError::DeviceMismatch,
        }
    }
}

/// Builds and parses the signed token pair.
#[derive(Clone)]
pub struct TokenCodec {
    config: Arc<SessionConfig>,
}

impl TokenCodec {
    pub fn new(config: Arc<SessionConfig>) -> Self {
        Self { config }
    }

    /// Mint an access/refresh pair for `user`, bound to the device in `ctx`.
    ///
    /// `now` is passed in rather than read from the clock so callers (and
    /// tests) control the mint instant.
    pub fn mint_session(
        &self,
        user: &User,
        ctx: &RequestContext,
        now: DateTime<Utc>,
    ) -> SessionResult<SessionInfo> {
        let issuer = ctx
            .issuer
            .clone()
            .unwrap_or_else(|| self.config.issuer.clone());
        let audience = ctx
            .audience
            .clone()
            .unwrap_or_else(|| self.config.audience.clone());

        let access_expires_at = now + self.config.access_token_ttl;
        let refresh_expires_at = now + self.config.refresh_token_ttl;

        let access_claims = AccessClaims {
            sub: user.user_id.to_string(),
            name: user.user_name.clone(),
            roles: vec![user.user_role.code().to_string()],
            sst: user.security_stamp.as_str().to_string(),
            dvc: ctx.device_id.clone(),
            jti: Uuid::new_v4().to_string(),
            iss: issuer.clone(),
            aud: audience.clone(),
            iat: now.timestamp(),
            exp: access_expires_at.timestamp(),
        };

        let refresh_claims = RefreshClaims {
            sub: user.user_id.to_string(),
            dvc: ctx.device_id.clone(),
            jti: Uuid::new_v4().to_string(),
            iss: issuer,
            aud: audience,
            iat: now.timestamp(),
            exp: refresh_expires_at.timestamp(),
        };

        let key = EncodingKey::from_secret(self.config.token_secret.as_bytes());
        let access_token = encode(&Header::default(), &access_claims, &key)?;
        let refresh_token = encode(&Header::default(), &refresh_claims, &key)?;

        tracing::debug!(
            user_id = %user.user_id,
            jti = %access_claims.jti,
            access_expires_at = %access_expires_at,
            "Minted session token pair"
        );

        Ok(SessionInfo {
            token_type: TOKEN_TYPE.to_string(),
            access_token,
            access_expires_at,
            refresh_token,
            refresh_expires_at,
            claims: access_claims,
        })
    }

    /// Verify an access token against signature, issuer, audience, expiry
    /// (zero clock-skew tolerance) and the current device fingerprint.
    pub fn verify_access(
        &self,
        token: &str,
        ctx: &RequestContext,
    ) -> Result<AccessClaims, TokenRejection> {
        let data = decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.config.token_secret.as_bytes()),
            &self.validation(ctx),
        )
        .map_err(|e| self.rejection_for(token, e))?;

        let claims = data.claims;
        if claims.sub.is_empty() {
            tracing::error!(token = %token, "Token carries no subject claim");
            return Err(TokenRejection::Malformed);
        }
        self.check_device(&claims.dvc, ctx)?;
        Ok(claims)
    }

    /// Verify a refresh token. Same rules as access tokens, minimal claims.
    pub fn verify_refresh(
        &self,
        token: &str,
        ctx: &RequestContext,
    ) -> Result<RefreshClaims, TokenRejection> {
        let data = decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.config.token_secret.as_bytes()),
            &self.validation(ctx),
        )
        .map_err(|e| self.rejection_for(token, e))?;

        let claims = data.claims;
        if claims.sub.is_empty() {
            tracing::error!(token = %token, "Token carries no subject claim");
            return Err(TokenRejection::Malformed);
        }
        self.check_device(&claims.dvc, ctx)?;
        Ok(claims)
    }

    /// Standard validation rules: HS256, zero leeway, issuer and audience
    /// pinned to the current request (with configured fallbacks).
    fn validation(&self, ctx: &RequestContext) -> Validation {
        let issuer = ctx.issuer.as_deref().unwrap_or(&self.config.issuer);
        let audience = ctx.audience.as_deref().unwrap_or(&self.config.audience);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation
    }

    fn check_device(&self, claimed: &str, ctx: &RequestContext) -> Result<(), TokenRejection> {
        if claimed.is_empty() {
            tracing::error!("Token carries no device claim");
            return Err(TokenRejection::Malformed);
        }
        if !constant_time_eq(claimed.as_bytes(), ctx.device_id.as_bytes()) {
            tracing::warn!(
                ip = ?ctx.ip_address,
                "Token presented from a device other than the one it was minted for"
            );
            return Err(TokenRejection::DeviceMismatch);
        }
        Ok(())
    }

    /// Collapse any decode failure into a rejection; nothing propagates to
    /// the request pipeline. The offending token is logged for diagnostics.
    fn rejection_for(&self, token: &str, err: jsonwebtoken::errors::Error) -> TokenRejection {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                tracing::debug!(token = %token, "Token expired");
                TokenRejection::Expired
            }
            kind => {
                tracing::error!(token = %token, error = ?kind, "Token failed verification");
                TokenRejection::Malformed
            }
        }
    }
}
