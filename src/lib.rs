pub mod cell;
pub mod client;
pub mod credentials;
pub mod error;
pub mod facade;
pub mod flatten;
pub mod models;
pub mod pager;
pub mod table;

#[cfg(test)]
mod testing;

pub use cell::Cell;
pub use client::{Auth, JiraApi, JiraClient, JiraConfig};
pub use credentials::{Credentials, DEFAULT_CREDENTIALS_FILE};
pub use error::Error;
pub use models::*;

// Facade re-exports
pub use facade::{COMMENT_INDEX, FrameOptions, ISSUE_INDEX, JiraFrame};

// Tabular model re-exports
pub use flatten::{AllowList, COMMENT_COLUMNS, FIELD_COLUMNS, Flatten, ISSUE_COLUMNS};
pub use table::Table;

// Paging re-exports
pub use pager::{DEFAULT_PAGE_SIZE, IssuePager};
