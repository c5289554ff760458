use serde::{Deserialize, Serialize};

/// Access token claims issued by the identity provider. Only `sub` is used
/// to identify the caller.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
}
