pub mod client;
pub mod groups;
pub mod members;
pub mod models;
pub mod retry;
