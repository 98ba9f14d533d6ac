use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims carried by every issued token: the public user view plus the
/// standard registered claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub email: String,
    pub name: String,
    pub exp: usize,  // expiration time
    pub iat: usize,  // issued at
    pub iss: String, // issuer
    pub aud: String, // audience
}
