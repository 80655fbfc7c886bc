//! Request validation ahead of the inference core

use crate::error::ApiError;
use churn_lib::ChurnRequest;

/// Reject field values the type system does not already rule out
pub fn validate_request(request: &ChurnRequest) -> Result<(), ApiError> {
    if !(0.0..=1.0).contains(&request.skip_rate) {
        return Err(ApiError::Validation(format!(
            "skip_rate must be between 0.0 and 1.0, got {}",
            request.skip_rate
        )));
    }
    Ok(())
}
