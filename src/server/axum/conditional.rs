use axum::extract::FromRequestParts;
use http::{header, request::Parts};

use crate::server::{error::APIError, IfNoneMatch};

impl<S> FromRequestParts<S> for IfNoneMatch
where
	S: Send + Sync,
{
	type Rejection = APIError;

	async fn from_request_parts(parts: &mut Parts, _app: &S) -> Result<Self, Self::Rejection> {
		match parts.headers.get(header::IF_NONE_MATCH).map(|h| h.to_str()) {
			Some(Ok(h)) => Ok(IfNoneMatch(Some(h.to_owned()))),
			Some(Err(_)) => Err(APIError::InvalidConditionalHeader),
			None => Ok(IfNoneMatch(None)),
		}
	}
}
