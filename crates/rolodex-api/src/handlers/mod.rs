//! Route handlers

pub mod analytics;
pub mod auth;
pub mod contacts;
pub mod system;
pub mod users;

pub use analytics::*;
pub use auth::*;
pub use contacts::*;
pub use system::*;
pub use users::*;

use crate::models::Pagination;

fn pagination(page: u64, limit: u64, total: u64) -> Pagination {
    Pagination {
        page,
        limit,
        total,
        total_pages: total.div_ceil(limit),
    }
}
