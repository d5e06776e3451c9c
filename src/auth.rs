use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};

use crate::error::BookingError;

/// Trusted user identity for a request.
///
/// Token verification happens upstream (the auth gateway), which forwards the
/// resolved user id in the `x-user-id` header. A missing or non-positive id
/// rejects the request before any handler runs.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: i32,
}

impl FromRequest for AuthenticatedUser {
    type Error = BookingError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user_id = req
            .headers()
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i32>().ok())
            .filter(|id| *id > 0);

        ready(match user_id {
            Some(user_id) => Ok(AuthenticatedUser { user_id }),
            None => Err(BookingError::Unauthorized),
        })
    }
}
