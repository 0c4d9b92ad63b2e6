use axum::response::IntoResponse;
use axum_macros::FromRequest;
use serde::Serialize;

/// `axum::Json` whose rejections become [`crate::Error`], so malformed bodies
/// get the same JSON error shape as every other failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(crate::Error))]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    fn into_response(self) -> axum::response::Response {
        axum::Json(self.0).into_response()
    }
}
