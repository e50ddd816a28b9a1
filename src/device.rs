//! Client device classification from the `User-Agent` header.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::convert::Infallible;
use woothee::parser::Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
    /// Crawlers, appliances, unrecognized or missing user agents.
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Desktop => "desktop",
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Unknown => "unknown",
        }
    }
}

/// Classify a raw user-agent string.
pub fn classify(user_agent: &str) -> DeviceType {
    let Some(result) = Parser::new().parse(user_agent) else {
        return DeviceType::Unknown;
    };

    match result.category {
        "pc" => DeviceType::Desktop,
        "smartphone" | "mobilephone" => {
            // Android tablets omit the "Mobile" token that phones send
            if result.os == "iPad" || (result.os == "Android" && !user_agent.contains("Mobile")) {
                DeviceType::Tablet
            } else {
                DeviceType::Mobile
            }
        }
        _ => DeviceType::Unknown,
    }
}

pub fn device_type(headers: &HeaderMap) -> DeviceType {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map_or(DeviceType::Unknown, classify)
}

/// Phones and tablets.
pub fn is_mobile(headers: &HeaderMap) -> bool {
    matches!(device_type(headers), DeviceType::Mobile | DeviceType::Tablet)
}

/// Everything that is not mobile, unknown devices included.
pub fn is_desktop(headers: &HeaderMap) -> bool {
    !is_mobile(headers)
}

/// Extractor exposing the requesting device to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device(pub DeviceType);

impl Device {
    pub fn is_mobile(&self) -> bool {
        matches!(self.0, DeviceType::Mobile | DeviceType::Tablet)
    }

    pub fn is_desktop(&self) -> bool {
        !self.is_mobile()
    }
}

impl<S> FromRequestParts<S> for Device
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Device(device_type(&parts.headers)))
    }
}
