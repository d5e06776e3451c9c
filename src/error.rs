use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// Failures surfaced by the storage collaborators.
///
/// The conditional variants (`RoomFull`, `AlreadyBooked`) are produced by the
/// atomic check-and-create path in the booking store; the service maps them
/// onto the admission taxonomy.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room is at capacity")]
    RoomFull,
    #[error("user already holds a booking")]
    AlreadyBooked,
    #[error("room not found")]
    RoomMissing,
    #[error("booking not found")]
    BookingMissing,
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("blocking task was canceled")]
    Canceled,
}

/// Closed admission-error taxonomy. Every operation of the booking service
/// returns one of these kinds; the boundary maps each to a bare HTTP status.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("referenced entity absent")]
    NotFound,
    #[error("booking policy violation")]
    Forbidden,
    #[error("not authorized for this booking")]
    Unauthorized,
    #[error("malformed request")]
    BadRequest,
    #[error("internal error: {0}")]
    Internal(#[from] StoreError),
}

impl ResponseError for BookingError {
    fn status_code(&self) -> StatusCode {
        match self {
            BookingError::NotFound => StatusCode::NOT_FOUND,
            BookingError::Forbidden => StatusCode::FORBIDDEN,
            BookingError::Unauthorized => StatusCode::UNAUTHORIZED,
            BookingError::BadRequest => StatusCode::BAD_REQUEST,
            BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Rejections carry no body, only the status.
    fn error_response(&self) -> HttpResponse {
        if let BookingError::Internal(source) = self {
            log::error!("booking operation failed: {:?}", source);
        }
        HttpResponse::new(self.status_code())
    }
}
