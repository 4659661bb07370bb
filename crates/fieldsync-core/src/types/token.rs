//! Authentication token pair.

use serde::{Deserialize, Serialize};

/// The access/refresh token pair plus the profile fields returned by the
/// login and refresh endpoints.
///
/// Owned exclusively by the auth gateway: replaced wholesale on login or
/// refresh, cleared wholesale on logout or unrecoverable refresh failure.
/// At most one valid pair exists at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Bearer token attached to every authenticated request.
    pub access_token: String,
    /// Token exchanged for a new pair when the access token is rejected.
    pub refresh_token: String,
    /// Authenticated user identifier.
    pub user_id: String,
    /// User email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role (e.g. `"supervisor"`, `"manager"`).
    pub role: String,
}
