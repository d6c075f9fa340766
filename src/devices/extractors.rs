use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const DEVICE_KEY_HEADER: &str = "x-device-key";

/// Device key carried in the `X-Device-Key` header, if any. Absence is not
/// a rejection: older firmware still sends the key in the body.
pub struct DeviceKeyHeader(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for DeviceKeyHeader
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(DEVICE_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Ok(DeviceKeyHeader(key))
    }
}
