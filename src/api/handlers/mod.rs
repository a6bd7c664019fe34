pub mod components;
pub mod data;
pub mod exports;
pub mod health;
pub mod ingredients;
pub mod meals;

use crate::api::error::AppError;
use crate::services::fetcher::MAX_PAGE_SIZE;
use serde::Deserialize;

pub const DEFAULT_TAKE: u64 = 100;
pub const MAX_TAKE: u64 = MAX_PAGE_SIZE;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: String,
}

/// `?skip=&take=` cursor. Both are optional on the wire.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub skip: Option<u64>,
    pub take: Option<u64>,
}

impl PageQuery {
    pub fn window(&self) -> Result<(u64, u64), AppError> {
        let take = self.take.unwrap_or(DEFAULT_TAKE);
        if take == 0 || take > MAX_TAKE {
            return Err(AppError::BadRequest(format!(
                "take must be between 1 and {}",
                MAX_TAKE
            )));
        }
        Ok((self.skip.unwrap_or(0), take))
    }
}
