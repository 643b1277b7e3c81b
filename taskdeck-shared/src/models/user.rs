/// User model
///
/// This module provides the User record representing the authenticated
/// principal. The record is issued by the API on login and persisted
/// verbatim in the client's credential storage so a session can be
/// restored across process restarts.
///
/// # Wire format
///
/// ```json
/// {
///   "id": "42",
///   "email": "user@example.com"
/// }
/// ```
///
/// The id is an opaque server-assigned string; the client never fabricates
/// or rewrites it.

use serde::{Deserialize, Serialize};

/// User record as issued by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned user ID
    pub id: String,

    /// Email address the account was registered with
    pub email: String,
}
