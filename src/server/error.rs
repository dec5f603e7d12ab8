use std::path::PathBuf;
use thiserror::Error;

use crate::app;

#[derive(Error, Debug)]
pub enum APIError {
	#[error("Internal server error")]
	Internal,
	#[error("File I/O error for `{0}`:\n\n{1}")]
	Io(PathBuf, std::io::Error),
	#[error("Resource not found")]
	NotFound,
	#[error("Stored record `{0}` is corrupted:\n\n{1}")]
	CorruptedRecord(PathBuf, quick_xml::DeError),
	#[error("Could not parse request body:\n\n{0}")]
	MalformedRequest(quick_xml::DeError),
	#[error("Invalid identifier: `{0}`")]
	InvalidIdentifier(String),
	#[error("Invalid preset number: `{0}`")]
	InvalidPresetNumber(String),
	#[error("If-None-Match header is not valid text")]
	InvalidConditionalHeader,
	#[error("Could not reach device `{0}`:\n\n{1}")]
	DeviceUnreachable(String, String),
	#[error("Device `{host}` rejected `{command}`: {reason}\n\n{output}")]
	DeviceCommandFailed {
		host: String,
		command: String,
		reason: String,
		output: String,
	},
	#[error("Could not enable remote services in any of {0:?}")]
	RemoteServicesUnavailable(Vec<String>),
}

impl From<app::Error> for APIError {
	fn from(error: app::Error) -> APIError {
		match error {
			app::Error::ThreadJoining(_) => APIError::Internal,

			app::Error::Io(p, e) => APIError::Io(p, e),
			app::Error::ConfigDeserialization(_) => APIError::Internal,

			app::Error::NotFound(_) => APIError::NotFound,
			app::Error::Parse(p, e) => APIError::CorruptedRecord(p, e),
			app::Error::MalformedRequest(e) => APIError::MalformedRequest(e),
			app::Error::InvalidIdentifier(i) => APIError::InvalidIdentifier(i),
			app::Error::InvalidPresetNumber(n) => APIError::InvalidPresetNumber(n),

			app::Error::DeviceInfoQuery(h, r) => APIError::DeviceUnreachable(h, r),
			app::Error::Connectivity(h, r) => APIError::DeviceUnreachable(h, r),
			app::Error::RemoteCommand {
				host,
				command,
				reason,
				output,
			} => APIError::DeviceCommandFailed {
				host,
				command,
				reason,
				output,
			},
			app::Error::RemoteServicesUnavailable(l) => APIError::RemoteServicesUnavailable(l),
		}
	}
}
