//! Database entities

pub mod contact;
pub mod managed_user;
pub mod user;

