use serde::Serialize;

pub mod ingress_dto;
pub mod system_dto;

/// Envelope for every JSON response of the API.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub is_successful: bool,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            is_successful: true,
            data: Some(data),
        }
    }
}
