use edgeguard_auth::VerifiedClaims;
use edgeguard_core::{AppError, AppResult, UserId};

/// Authenticated caller for a request.
///
/// Built only from [`VerifiedClaims`]; inserted by the access-token
/// middleware and present for every protected route.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedSubject {
    user_id: UserId,
    email: Option<String>,
    role: Option<String>,
    claims: VerifiedClaims,
}

impl AuthenticatedSubject {
    #[track_caller]
    pub fn from_claims(claims: VerifiedClaims) -> AppResult<Self> {
        let user_id = claims
            .subject()
            .and_then(|sub| sub.parse::<UserId>().ok())
            .ok_or_else(|| AppError::unauthorized("Invalid token subject"))?;

        let text = |key: &str| claims.payload.get(key).and_then(|v| v.as_str()).map(str::to_string);
        let email = text("email");
        let role = text("role");

        Ok(Self {
            user_id,
            email,
            role,
            claims,
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn claims(&self) -> &VerifiedClaims {
        &self.claims
    }
}
