/// API data models for Taskdeck
///
/// This module contains the records exchanged with the remote API and the
/// input types the client builds requests from.
///
/// # Models
///
/// - `user`: the authenticated principal
/// - `task`: task records, creation/update inputs, and wire payloads

pub mod task;
pub mod user;
