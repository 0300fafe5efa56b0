use serde::{Deserialize, Serialize};
use services::Actor;

/// JWT claims issued by the campus identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
    pub admin: bool,
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.0.sub,
            admin: self.0.admin,
        }
    }
}
