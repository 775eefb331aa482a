use axum::http::{header, HeaderMap};

/// Header accepted as an alternative to `Authorization: Bearer`.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Credentials presented with a request, extracted by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub admin_token: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            admin_token: Some(token.into()),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);
        let explicit = headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim);

        Self {
            admin_token: bearer
                .or(explicit)
                .filter(|token| !token.is_empty())
                .map(str::to_string),
        }
    }
}

/// Session collaborator deciding whether a caller is an authenticated admin.
pub trait AdminGate: Send + Sync {
    fn is_authenticated_admin(&self, context: &RequestContext) -> bool;
}

/// Gate comparing the presented token against one configured secret.
/// Without a configured secret every request is refused.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenGate {
    token: Option<String>,
}

impl StaticTokenGate {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|token| !token.trim().is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }
}

impl AdminGate for StaticTokenGate {
    fn is_authenticated_admin(&self, context: &RequestContext) -> bool {
        match (&self.token, &context.admin_token) {
            (Some(expected), Some(presented)) => constant_time_eq(expected, presented),
            _ => false,
        }
    }
}

fn constant_time_eq(left: &str, right: &str) -> bool {
    let (left, right) = (left.as_bytes(), right.as_bytes());
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
