//! JWT (JSON Web Token) issuance and verification

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identity claims embedded in every token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUser {
    /// Identity ID
    pub id: Uuid,
    /// Display name at the time of login
    pub name: String,
    /// Email at the time of login
    pub email: String,
}

/// JWT claims for session tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JwtClaims {
    /// Subject (identity ID)
    pub sub: String,
    /// Embedded identity
    pub user: TokenUser,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl JwtClaims {
    /// Fails when `issued_at + validity` is past the last representable instant.
    pub fn new(
        user: TokenUser,
        issued_at: DateTime<Utc>,
        validity: Duration,
    ) -> Result<Self, JwtError> {
        let exp = issued_at.checked_add_signed(validity).ok_or_else(|| {
            JwtError::InvalidTtl(format!(
                "expiry overflows when adding {}s",
                validity.num_seconds()
            ))
        })?;

        Ok(Self {
            sub: user.id.to_string(),
            user,
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
        })
    }

    /// A token is still valid during the second named by `exp`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.exp
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// JWT errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT encoding error: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid token lifetime: {0}")]
    InvalidTtl(String),
}

/// A freshly signed token together with the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: JwtClaims,
}

/// Signs session tokens with a symmetric HS256 secret
///
/// The lifetime is fixed when the issuer is built; callers cannot pick
/// their own expiry per request.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, JwtError> {
        if ttl <= Duration::zero() {
            return Err(JwtError::InvalidTtl(format!(
                "lifetime must be positive, got {}s",
                ttl.num_seconds()
            )));
        }
        if Utc::now().checked_add_signed(ttl).is_none() {
            return Err(JwtError::InvalidTtl(format!(
                "lifetime of {}s is too long",
                ttl.num_seconds()
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: TokenUser) -> Result<IssuedToken, JwtError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: TokenUser, now: DateTime<Utc>) -> Result<IssuedToken, JwtError> {
        let claims = JwtClaims::new(user, now, self.ttl)?;
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken { token, claims })
    }
}

/// JWT validator
#[derive(Clone)]
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    /// Create a new JWT validator using HMAC-SHA256 (symmetric secret)
    ///
    /// Validates:
    /// - Signature (HS256 only, other algorithms are refused)
    /// - Presence of `sub` and `exp`
    /// - Expiration, with zero leeway, against the caller's clock
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in validate_at so the clock can be supplied
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, JwtError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    pub fn validate_at(&self, token: &str, now: i64) -> Result<JwtClaims, JwtError> {
        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

        let claims = token_data.claims;

        if claims.sub != claims.user.id.to_string() {
            return Err(JwtError::InvalidToken(
                "subject does not match embedded user".to_string(),
            ));
        }

        if claims.is_expired_at(now) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }
}

/// Parse a token lifetime such as `7d`, `12h`, `30m`, `45s` or bare seconds
pub fn parse_ttl(input: &str) -> Result<Duration, JwtError> {
    let input = input.trim();
    let invalid = || JwtError::InvalidTtl(format!("cannot parse '{}'", input));

    let (digits, unit) = match input.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&input[..idx], Some(c)),
        Some(_) => (input, None),
        None => return Err(invalid()),
    };

    let value: i64 = digits.trim().parse().map_err(|_| invalid())?;
    if value <= 0 {
        return Err(JwtError::InvalidTtl(format!(
            "lifetime must be positive, got '{}'",
            input
        )));
    }

    let ttl = match unit.map(|u| u.to_ascii_lowercase()) {
        None | Some('s') => Duration::try_seconds(value),
        Some('m') => Duration::try_minutes(value),
        Some('h') => Duration::try_hours(value),
        Some('d') => Duration::try_days(value),
        Some(_) => return Err(invalid()),
    };

    ttl.ok_or_else(|| JwtError::InvalidTtl(format!("lifetime '{}' is out of range", input)))
}
