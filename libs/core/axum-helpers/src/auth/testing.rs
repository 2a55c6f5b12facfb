//! Token fixtures for tests in this and downstream crates (`features = ["test-support"]`).
//!
//! Tokens are signed with a throwaway RSA key pair checked in under `auth/testdata`.

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use super::claims::{Claims, RoleSet};
use super::config::OidcConfig;
use super::keys::StaticKeySource;
use super::verifier::TokenVerifier;

pub const SIGNING_PRIVATE_PEM: &str = include_str!("testdata/signing_key.pem");
pub const SIGNING_PUBLIC_PEM: &str = include_str!("testdata/signing_key.pub.pem");
pub const ROTATED_PRIVATE_PEM: &str = include_str!("testdata/rotated_key.pem");
pub const ROTATED_PUBLIC_PEM: &str = include_str!("testdata/rotated_key.pub.pem");

/// `resource_access` entry [`claims_for`] puts roles under.
pub const TEST_CLIENT_ID: &str = "backend";

/// The bare base64 body of a PEM key, as the realm endpoint publishes it.
pub fn realm_public_key(pem: &str) -> String {
    pem.lines()
        .filter(|line| !line.starts_with("-----"))
        .collect()
}

/// Claims for `azp = client`, valid for an hour, with `roles` on [`TEST_CLIENT_ID`].
pub fn claims_for(client: &str, username: &str, roles: &[&str]) -> Claims {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let mut resource_access = HashMap::new();
    resource_access.insert(
        TEST_CLIENT_ID.to_string(),
        RoleSet {
            roles: roles.iter().map(|r| r.to_string()).collect(),
        },
    );

    Claims {
        sub: Some(format!("{}-id", username)),
        exp: now + 3600,
        iat: Some(now),
        iss: None,
        azp: Some(client.to_string()),
        preferred_username: Some(username.to_string()),
        email: None,
        scope: Some("openid profile".to_string()),
        realm_access: None,
        resource_access,
    }
}

pub fn sign_with(private_pem: &str, claims: &Claims) -> String {
    let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("fixture key parses");
    encode(&Header::new(Algorithm::RS256), claims, &key).expect("fixture token encodes")
}

/// Sign with the fixture key [`static_verifier`] trusts.
pub fn sign(claims: &Claims) -> String {
    sign_with(SIGNING_PRIVATE_PEM, claims)
}

/// `Authorization` header value for a token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// A verifier trusting the fixture signing key, checking roles on `client_id`.
pub fn static_verifier(client_id: &str) -> Arc<TokenVerifier> {
    let keys = StaticKeySource::from_rsa_pem(SIGNING_PUBLIC_PEM.as_bytes())
        .expect("fixture public key parses");
    let config = OidcConfig::new("http://localhost/realms/test", client_id);
    Arc::new(TokenVerifier::new(Arc::new(keys), &config))
}
