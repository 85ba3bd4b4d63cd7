use serde::{Deserialize, Serialize};

use crate::assign::AssignmentResult;
use crate::error::AssignError;

/// Shown instead of the real cause when storage or roster access fails
pub const GENERIC_FAILURE: &str = "Something went wrong while running the assigner. Please try again.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunData {
    pub assigned_data: AssignmentResult,
    pub name: String,
}

/// `{success: true, data}` or `{success: false, message}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RunData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RunResponse {
    pub fn ok(data: RunData) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Logs the outcome and converts it to the response shape
    pub fn from_result(result: Result<RunData, AssignError>, assigner_id: &str, class_id: &str) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) if e.is_infrastructure() => {
                tracing::error!(assigner_id, class_id, error = %e, "Assigner run failed");
                Self::failure(GENERIC_FAILURE)
            }
            Err(e) => {
                tracing::info!(assigner_id, class_id, reason = %e, "Assigner run rejected");
                Self::failure(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::StoreError;
    use serde_json::json;

    #[test]
    fn success_shape() {
        let response = RunResponse::ok(RunData {
            assigned_data: AssignmentResult::new(),
            name: "Jobs".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": true, "data": {"assignedData": {}, "name": "Jobs"}})
        );
    }

    #[test]
    fn infrastructure_errors_are_hidden() {
        let err = AssignError::Persistence(StoreError::NotFound("a1".to_string()));
        let response = RunResponse::from_result(Err(err), "a1", "c1");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": false, "message": GENERIC_FAILURE})
        );
    }

    #[test]
    fn validation_errors_are_shown() {
        let response = RunResponse::from_result(Err(AssignError::Auth), "a1", "c1");
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("You must be signed in to run an assigner"));
    }
}
