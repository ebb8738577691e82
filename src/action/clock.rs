//! `get_current_time` action: local clock lookup for a city or IANA zone.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::CourierError;
use crate::tools::{ToolArguments, ToolDeclaration, ToolHandler, ToolParameters};

pub const GET_CURRENT_TIME: &str = "get_current_time";

/// Resolves a location to its time zone and reports the local time there.
#[derive(Debug, Clone, Copy)]
pub struct CurrentTimeAction {
    now: fn() -> DateTime<Utc>,
}

impl Default for CurrentTimeAction {
    fn default() -> Self {
        Self { now: Utc::now }
    }
}

impl CurrentTimeAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed clock.
    pub fn with_clock(now: fn() -> DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn declaration() -> ToolDeclaration {
        ToolDeclaration::new(
            GET_CURRENT_TIME,
            "Get the current time in a given location",
            ToolParameters::object()
                .string("location", "The city name, e.g. San Francisco", true)
                .build(),
        )
    }
}

#[async_trait]
impl ToolHandler for CurrentTimeAction {
    async fn invoke(&self, args: &ToolArguments) -> Result<serde_json::Value, CourierError> {
        let location = args.get_str("location")?;
        let tz = resolve_zone(location).ok_or_else(|| {
            CourierError::tool(GET_CURRENT_TIME, format!("Unknown location: {location}"))
        })?;
        let local = (self.now)().with_timezone(&tz);
        Ok(serde_json::json!({
            "location": location,
            "timezone": tz.name(),
            "current_time": local.to_rfc3339(),
        }))
    }
}

fn resolve_zone(location: &str) -> Option<Tz> {
    let key = location.trim().to_lowercase();
    let zone = match key.as_str() {
        "san francisco" | "los angeles" | "seattle" => Some(Tz::America__Los_Angeles),
        "new york" | "boston" | "washington" => Some(Tz::America__New_York),
        "chicago" => Some(Tz::America__Chicago),
        "london" => Some(Tz::Europe__London),
        "paris" => Some(Tz::Europe__Paris),
        "berlin" => Some(Tz::Europe__Berlin),
        "stockholm" => Some(Tz::Europe__Stockholm),
        "tokyo" => Some(Tz::Asia__Tokyo),
        "sydney" => Some(Tz::Australia__Sydney),
        "utc" => Some(Tz::UTC),
        _ => None,
    };
    zone.or_else(|| location.trim().parse::<Tz>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn resolves_known_cities() {
        let action = CurrentTimeAction::with_clock(fixed);
        let out = action
            .invoke(&ToolArguments::new(serde_json::json!({ "location": "Tokyo" })))
            .await
            .unwrap();
        assert_eq!(out["timezone"], "Asia/Tokyo");
        assert_eq!(out["current_time"], "2024-08-01T21:00:00+09:00");
    }

    #[tokio::test]
    async fn accepts_iana_zone_names() {
        let action = CurrentTimeAction::with_clock(fixed);
        let out = action
            .invoke(&ToolArguments::new(serde_json::json!({ "location": "Europe/Paris" })))
            .await
            .unwrap();
        assert_eq!(out["current_time"], "2024-08-01T14:00:00+02:00");
    }

    #[tokio::test]
    async fn unknown_location_is_an_error() {
        let err = CurrentTimeAction::new()
            .invoke(&ToolArguments::new(serde_json::json!({ "location": "Atlantis" })))
            .await
            .unwrap_err();
        assert_eq!(err.tool_message(), "Unknown location: Atlantis");
    }
}
