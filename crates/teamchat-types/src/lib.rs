pub mod api;
pub mod events;
pub mod mention;
pub mod models;

/// Author name used for every row written by the assistant.
pub const ASSISTANT_NAME: &str = "Claude";

/// Substring (compared case-insensitively) that addresses the assistant.
pub const MENTION_TOKEN: &str = "@claude";
