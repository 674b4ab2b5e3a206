use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode};

use edgeguard_core::UserId;

use crate::app::dto::{RefreshRequest, RefreshSchema, RegisterRequest, RegisterSchema, RegisteredUser, UserView};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::AuthenticatedSubject;
use crate::envelope::ResponseEnvelope;
use crate::extract::Valid;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Valid<RegisterSchema>,
) -> ApiResult<(StatusCode, ResponseEnvelope<RegisteredUser>)> {
    let body: RegisterRequest = body.body_as()?;

    let user = UserView {
        id: UserId::new(),
        email: Some(body.email),
        name: body.name,
        role: Some(body.role),
    };
    let tokens = services.issue_tokens(&user.to_payload())?;

    Ok((
        StatusCode::CREATED,
        ResponseEnvelope::success("User registered", RegisteredUser { user, tokens }),
    ))
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    body: Valid<RefreshSchema>,
) -> ApiResult<ResponseEnvelope<edgeguard_auth::IssuedTokens>> {
    let body: RefreshRequest = body.body_as()?;
    let tokens = services.tokens.rotate(&body.refresh_token)?;
    Ok(ResponseEnvelope::success("Tokens refreshed", tokens))
}

pub async fn me(Extension(subject): Extension<AuthenticatedSubject>) -> ResponseEnvelope<UserView> {
    ResponseEnvelope::success("OK", UserView::from_subject(&subject))
}
