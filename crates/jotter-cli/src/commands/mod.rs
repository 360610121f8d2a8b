pub mod auth_cmd;
pub mod common;
pub mod completions;
pub mod create;
pub mod delete;
pub mod list;
