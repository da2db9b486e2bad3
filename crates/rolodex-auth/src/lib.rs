//! Credential hashing and bearer token handling for rolodex
//!
//! - [`password`]: Argon2id hashing with a fixed work factor
//! - [`jwt`]: HS256 token issuance and verification

pub mod jwt;
pub mod password;

pub use jwt::{parse_ttl, IssuedToken, JwtClaims, JwtError, JwtValidator, TokenIssuer, TokenUser};
pub use password::{hash_password, verify_password, PasswordError};
