use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use validator::ValidationErrors;

/// Messages per field, keyed by the field's public name (`asset`, `message`, ...).
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{message}")]
    Forbidden { message: String, location: String },
    #[error("{message}")]
    Validation { message: String, fields: FieldErrors },
    #[error("{message}")]
    Unprocessable { message: String, location: String },
    #[error("{0}")]
    Conflict(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    /// A 403 that sends the client back to the landing page.
    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden {
            message: message.into(),
            location: "/".to_string(),
        }
    }

    /// A 422 whose message is `prefix` followed by every field's full messages.
    pub fn invalid(prefix: &str, fields: FieldErrors) -> Self {
        let details = full_messages(&fields).join(", ");
        AppError::Validation {
            message: format!("{prefix} {details}").trim_end().to_string(),
            fields,
        }
    }

    /// A 422 for a body that could not be read as JSON of the expected shape.
    pub fn malformed_body(prefix: &str, rejection: &JsonRejection) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert("base".to_string(), vec![rejection.body_text()]);
        AppError::Validation {
            message: format!("{prefix} {}", rejection.body_text()),
            fields,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, location, fields) = match self {
            AppError::DatabaseError(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                    None,
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None, None),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                msg,
                Some("/auth/login".to_string()),
                None,
            ),
            AppError::Forbidden { message, location } => {
                (StatusCode::FORBIDDEN, message, Some(location), None)
            }
            AppError::Validation { message, fields } => {
                (StatusCode::UNPROCESSABLE_ENTITY, message, None, Some(fields))
            }
            AppError::Unprocessable { message, location } => {
                (StatusCode::UNPROCESSABLE_ENTITY, message, Some(location), None)
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, None, None),
            AppError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error,
            location,
            fields,
        });

        (status, body).into_response()
    }
}

/// Converts derive-validator output into field errors keyed by public name.
///
/// `asset_id` becomes `asset`; each message falls back to the validator code.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut fields = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let key = field.trim_end_matches("_id").to_string();
        let messages = fields.entry(key).or_default();
        for err in errs.iter() {
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| err.code.to_string());
            messages.push(message);
        }
    }
    fields
}

/// Rails-style full messages: "Asset can't be blank".
pub fn full_messages(fields: &FieldErrors) -> Vec<String> {
    fields
        .iter()
        .flat_map(|(field, messages)| {
            let name = humanize(field);
            messages
                .iter()
                .map(move |message| format!("{name} {message}"))
        })
        .collect()
}

fn humanize(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(required(message = "can't be blank"))]
        asset_id: Option<i32>,
        #[validate(length(max = 3, message = "is too long"))]
        display_name: Option<String>,
    }

    #[test]
    fn field_errors_use_public_names() {
        let form = Form {
            asset_id: None,
            display_name: Some("abcd".to_string()),
        };
        let fields = field_errors(&form.validate().unwrap_err());

        assert_eq!(fields["asset"], vec!["can't be blank"]);
        assert_eq!(fields["display_name"], vec!["is too long"]);
    }

    #[test]
    fn invalid_joins_full_messages_after_prefix() {
        let mut fields = FieldErrors::new();
        fields.insert("asset".to_string(), vec!["can't be blank".to_string()]);
        fields.insert("message".to_string(), vec!["is too long".to_string()]);

        match AppError::invalid("Could not submit track.", fields) {
            AppError::Validation { message, .. } => assert_eq!(
                message,
                "Could not submit track. Asset can't be blank, Message is too long"
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn conflict_is_a_json_409() {
        use http_body_util::BodyExt;

        let response = AppError::Conflict("already added".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "already added" }));
    }

    #[test]
    fn forbidden_points_back_home() {
        let response = AppError::forbidden("Only DJs can manage submissions.").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
