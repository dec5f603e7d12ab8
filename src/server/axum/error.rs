use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;

use crate::server::error::APIError;

impl IntoResponse for APIError {
	fn into_response(self) -> Response {
		let message = self.to_string();
		let status_code = match self {
			APIError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
			APIError::Io(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
			APIError::NotFound => StatusCode::NOT_FOUND,
			APIError::CorruptedRecord(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
			APIError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
			APIError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
			APIError::InvalidPresetNumber(_) => StatusCode::BAD_REQUEST,
			APIError::InvalidConditionalHeader => StatusCode::BAD_REQUEST,
			APIError::DeviceUnreachable(_, _) => StatusCode::BAD_GATEWAY,
			APIError::DeviceCommandFailed { .. } => StatusCode::BAD_GATEWAY,
			APIError::RemoteServicesUnavailable(_) => StatusCode::BAD_GATEWAY,
		};

		if status_code.is_server_error() {
			error!("{message}");
		}

		(status_code, message).into_response()
	}
}
