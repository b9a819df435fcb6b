//! Success envelopes
//!
//! Successful responses are `{ "success": true, "data": ... }`, or
//! `{ "success": true, "message": "..." }` for operations with no payload.

use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct MessageEnvelope {
    pub success: bool,
    pub message: String,
}

/// `200 OK` with a data payload
pub fn ok<T: Serialize>(data: T) -> Json<DataEnvelope<T>> {
    Json(DataEnvelope {
        success: true,
        data,
    })
}

/// `201 Created` with a data payload
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<DataEnvelope<T>>) {
    (StatusCode::CREATED, ok(data))
}

/// `200 OK` with a message only
pub fn message(message: impl Into<String>) -> Json<MessageEnvelope> {
    Json(MessageEnvelope {
        success: true,
        message: message.into(),
    })
}
