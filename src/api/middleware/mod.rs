//! API middleware.

pub mod user;
