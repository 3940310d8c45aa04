//! `AdminCaller` extractor: resolves the Bearer token into a [`Caller`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use offload_worker::Caller;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller behind a request. Requests without the configured admin
/// token come through as anonymous and are refused by the triggers.
#[derive(Debug, Clone)]
pub struct AdminCaller(pub Caller);

impl std::ops::Deref for AdminCaller {
    type Target = Caller;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AdminCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);

        let caller = match (token, state.admin_token.as_deref()) {
            (Some(presented), Some(expected)) if constant_time_eq(presented, expected) => {
                let name = parts
                    .headers
                    .get("x-forwarded-for")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("admin");
                Caller::admin(name)
            }
            _ => Caller::anonymous(),
        };

        Ok(AdminCaller(caller))
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
