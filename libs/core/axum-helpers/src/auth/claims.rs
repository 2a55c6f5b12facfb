use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Decoded access-token payload.
///
/// Only the fields the service reads are typed; everything else the provider adds
/// is ignored on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Subject (user id at the provider)
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiry, seconds since the epoch
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Authorized party: the client the token was issued to
    #[serde(default)]
    pub azp: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_access: Option<RoleSet>,
    #[serde(default)]
    pub resource_access: HashMap<String, RoleSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoleSet {
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    /// Client identifier stamped onto records the caller creates.
    pub fn client_id(&self) -> Option<&str> {
        self.azp.as_deref()
    }

    /// Human-readable name: `preferred_username`, falling back to `sub`.
    pub fn username(&self) -> &str {
        self.preferred_username
            .as_deref()
            .or(self.sub.as_deref())
            .unwrap_or_default()
    }

    /// Roles granted for `client_id`. Realm-wide roles never satisfy a permission gate.
    pub fn roles<'a>(&'a self, client_id: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.resource_access
            .get(client_id)
            .map(|set| set.roles.as_slice())
            .unwrap_or_default()
            .iter()
            .map(String::as_str)
    }

    pub fn has_role(&self, client_id: &str, role: &str) -> bool {
        self.roles(client_id).any(|granted| granted == role)
    }

    /// First entry of `required` the token does not grant.
    pub fn first_missing_role<'r>(&self, client_id: &str, required: &'r [String]) -> Option<&'r str> {
        required
            .iter()
            .map(String::as_str)
            .find(|role| !self.has_role(client_id, role))
    }
}
