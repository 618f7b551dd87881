//! JWT claims.

use serde::{Deserialize, Serialize};

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    /// Token id, used for revocation
    pub jti: String,
    /// `access` or `refresh`
    pub typ: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl Claims {
    pub fn is_access(&self) -> bool {
        self.typ == TOKEN_TYPE_ACCESS
    }

    pub fn is_refresh(&self) -> bool {
        self.typ == TOKEN_TYPE_REFRESH
    }

    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }

    /// Seconds until expiry, zero once expired.
    pub fn remaining_seconds(&self, now: i64) -> u64 {
        (self.exp - now).max(0) as u64
    }
}
