//! Stateless signed tokens binding a numeric id to an expiry.
//!
//! Wire format: URL-safe base64 of `"{id}:{expiry_unix_ts}:{hex_hmac_sha256}"`,
//! where the HMAC covers `"{purpose}:{id}:{expiry_unix_ts}"`. QR attendance
//! tokens carry an activity id and session cookies a user id. The purpose tag
//! is signed but not transmitted, so a token only verifies under the signer it
//! was issued for, even when both signers share a secret.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::db::unix_timestamp;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_QR_TOKEN_TTL_SECS: i64 = 900;
pub const MIN_QR_TOKEN_TTL_SECS: i64 = 60;
pub const MAX_QR_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

const MAX_TOKEN_LEN: usize = 256;
const SIGNATURE_HEX_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
#[error("signing key rejected: {0}")]
pub struct SigningKeyError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    Qr,
    Session,
}

impl TokenPurpose {
    pub fn tag(self) -> &'static str {
        match self {
            TokenPurpose::Qr => "qr",
            TokenPurpose::Session => "session",
        }
    }
}

#[derive(Clone)]
pub struct TokenSigner {
    mac: HmacSha256,
    purpose: TokenPurpose,
}

impl TokenSigner {
    pub fn new(secret: &[u8], purpose: TokenPurpose) -> Result<Self, SigningKeyError> {
        if secret.is_empty() {
            return Err(SigningKeyError("empty secret".to_string()));
        }
        let mac =
            HmacSha256::new_from_slice(secret).map_err(|e| SigningKeyError(e.to_string()))?;
        Ok(Self { mac, purpose })
    }

    pub fn qr(secret: &[u8]) -> Result<Self, SigningKeyError> {
        Self::new(secret, TokenPurpose::Qr)
    }

    pub fn session(secret: &[u8]) -> Result<Self, SigningKeyError> {
        Self::new(secret, TokenPurpose::Session)
    }

    /// Token for `subject_id` valid until `now + ttl_secs`.
    pub fn issue_at(&self, subject_id: i64, ttl_secs: i64, now: i64) -> String {
        let expires_at = now.saturating_add(ttl_secs);
        let payload = format!("{}:{}", subject_id, expires_at);
        let signature = self.signature_hex(&payload);
        URL_SAFE_NO_PAD.encode(format!("{}:{}", payload, signature))
    }

    pub fn issue(&self, subject_id: i64, ttl_secs: i64) -> String {
        self.issue_at(subject_id, ttl_secs, unix_timestamp())
    }

    /// Issues a QR token for an activity. Activities that have not been
    /// persisted yet have no id and get no token.
    pub fn issue_for_activity(&self, activity_id: Option<i64>, ttl_secs: i64) -> Option<String> {
        activity_id.map(|id| self.issue(id, ttl_secs))
    }

    /// Returns the subject id when the token is well formed, authentic and
    /// `now` is strictly before its expiry.
    pub fn verify_at(&self, token: &str, now: i64) -> Option<i64> {
        let claims = self.decode(token)?;
        if claims.expires_at <= now {
            return None;
        }
        Some(claims.subject_id)
    }

    pub fn verify(&self, token: &str) -> Option<i64> {
        self.verify_at(token, unix_timestamp())
    }

    /// Expiry embedded in an authentic token, ignoring the clock.
    pub fn expires_at(&self, token: &str) -> Option<i64> {
        self.decode(token).map(|c| c.expires_at)
    }

    fn decode(&self, token: &str) -> Option<TokenClaims> {
        let token = token.trim();
        if token.is_empty() || token.len() > MAX_TOKEN_LEN {
            return None;
        }
        // Accept padded tokens as well as the unpadded form we emit.
        let raw = URL_SAFE_NO_PAD.decode(token.trim_end_matches('=')).ok()?;
        let raw = String::from_utf8(raw).ok()?;

        let mut parts = raw.split(':');
        let (Some(id_part), Some(exp_part), Some(sig_part), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };

        if !is_decimal(id_part) || !is_decimal(exp_part) || sig_part.len() != SIGNATURE_HEX_LEN {
            return None;
        }
        let subject_id: i64 = id_part.parse().ok()?;
        let expires_at: i64 = exp_part.parse().ok()?;

        let expected = self.signature_hex(&format!("{}:{}", id_part, exp_part));
        if !bool::from(expected.as_bytes().ct_eq(sig_part.as_bytes())) {
            return None;
        }

        Some(TokenClaims {
            subject_id,
            expires_at,
        })
    }

    fn signature_hex(&self, payload: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(self.purpose.tag().as_bytes());
        mac.update(b":");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

struct TokenClaims {
    subject_id: i64,
    expires_at: i64,
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.len() <= 19 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Clamps a requested QR window into the allowed range.
pub fn clamp_qr_ttl(requested: Option<i64>, default: i64) -> i64 {
    requested
        .unwrap_or(default)
        .clamp(MIN_QR_TOKEN_TTL_SECS, MAX_QR_TOKEN_TTL_SECS)
}
