//! Input normalization and validation for request bodies and queries

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::ApiError;
use crate::models::PaginationQuery;

pub const MISSING_FIELDS: &str = "All fields are mandatory!";

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;
const CITY_MAX_CHARS: usize = 100;
const PASSWORD_MIN_CHARS: usize = 6;
const PHONE_DIGITS: usize = 10;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Return the trimmed value, or `None` when absent or blank
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Fail with the shared "mandatory" message when any field is blank
pub fn require<'a, const N: usize>(
    fields: [Option<&'a str>; N],
) -> Result<[&'a str; N], ApiError> {
    let mut out = [""; N];
    for (slot, field) in out.iter_mut().zip(fields) {
        *slot = present(field).ok_or_else(|| ApiError::validation(MISSING_FIELDS))?;
    }
    Ok(out)
}

pub fn name(value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    let len = value.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(ApiError::validation(format!(
            "Name must be between {} and {} characters",
            NAME_MIN_CHARS, NAME_MAX_CHARS
        )));
    }
    Ok(value.to_string())
}

/// Trim, lowercase and check the address shape
pub fn email(value: &str) -> Result<String, ApiError> {
    let value = value.trim().to_lowercase();
    if !EMAIL_RE.is_match(&value) {
        return Err(ApiError::validation("Please provide a valid email address"));
    }
    Ok(value)
}

pub fn password(value: &str) -> Result<(), ApiError> {
    if value.chars().count() < PASSWORD_MIN_CHARS {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters long",
            PASSWORD_MIN_CHARS
        )));
    }
    Ok(())
}

pub fn phone(value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.len() != PHONE_DIGITS || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::validation(format!(
            "Phone number must be exactly {} digits",
            PHONE_DIGITS
        )));
    }
    Ok(value.to_string())
}

pub fn city(value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation("City is required"));
    }
    if value.chars().count() > CITY_MAX_CHARS {
        return Err(ApiError::validation(format!(
            "City must be at most {} characters",
            CITY_MAX_CHARS
        )));
    }
    Ok(value.to_string())
}

/// Resolved `(page, limit)`
pub fn page(query: &PaginationQuery) -> Result<(u64, u64), ApiError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    if page < 1 {
        return Err(ApiError::validation("Page must be at least 1"));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    // The row offset must fit a signed 64-bit SQL integer
    let offset = (page - 1).checked_mul(limit);
    if !offset.is_some_and(|offset| i64::try_from(offset).is_ok()) {
        return Err(ApiError::validation("Page out of range"));
    }

    Ok((page, limit))
}
