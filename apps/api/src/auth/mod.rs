//! Authentication: one session model: opaque bearer tokens backed by the `sessions` table.

pub mod crypto;
pub mod db;
pub mod extractor;
pub mod handlers;

pub use extractor::CurrentUser;
