use axum::extract::Extension;

use edgeguard_core::{AppError, UserId};
use edgeguard_validation::Section;

use crate::app::dto::{UserIdParamSchema, UserView};
use crate::app::errors::ApiResult;
use crate::context::AuthenticatedSubject;
use crate::envelope::ResponseEnvelope;
use crate::extract::Valid;

/// Users are not persisted: the only user a caller can see is themselves.
pub async fn get_user(
    Extension(subject): Extension<AuthenticatedSubject>,
    req: Valid<UserIdParamSchema>,
) -> ApiResult<ResponseEnvelope<UserView>> {
    let id: UserId = req
        .str(Section::Params, "id")
        .ok_or_else(|| AppError::internal("validated id param missing"))?
        .parse()?;

    if id != subject.user_id() {
        return Err(AppError::not_found("User not found").into());
    }
    Ok(ResponseEnvelope::success("OK", UserView::from_subject(&subject)))
}
