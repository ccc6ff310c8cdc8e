// Bridge codec - JSON payloads exchanged with the data provider
use crate::domain::activity::ActivityRegion;
use crate::domain::error::GraphError;
use crate::domain::tier::DateGranularity;
use crate::domain::time_point::{TimeDomain, TimePoint, TimestampMs};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const DATE_KEY: &str = "date";

/// Accepted date layouts, most precise first.
const PARSE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S:%3fZ",
    "%Y-%m-%d %H:%M:%SZ",
    "%Y-%m-%d %H:%MZ",
];

/// A decoded `{startDate, endDate, points}` response.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPayload {
    pub range: TimeDomain,
    pub points: Vec<TimePoint>,
}

impl DataPayload {
    pub fn empty(range: TimeDomain) -> Self {
        Self {
            range,
            points: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDataPayload {
    start_date: Option<Value>,
    end_date: Option<Value>,
    points: Option<Vec<Map<String, Value>>>,
}

#[derive(Debug, Deserialize)]
struct RawActivity {
    #[serde(rename = "type")]
    kind: String,
    start: String,
    end: String,
    #[serde(flatten)]
    stats: Map<String, Value>,
}

pub fn format_date(time_ms: TimestampMs, granularity: DateGranularity) -> String {
    DateTime::<Utc>::from_timestamp_millis(time_ms)
        .map(|t| t.format(granularity.format()).to_string())
        .unwrap_or_default()
}

pub fn parse_date(text: &str) -> Option<TimestampMs> {
    let text = text.trim();
    PARSE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|t| t.timestamp_millis())
        })
}

fn date_value(value: &Value) -> Option<TimestampMs> {
    match value {
        Value::String(text) => parse_date(text),
        Value::Number(number) => number.as_i64(),
        _ => None,
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Decodes a data response. Points are sorted by time; field names are
/// lower-cased so `{"Date": .., "Close": ..}` and `{"date": .., "close": ..}`
/// decode alike. Non-numeric fields are ignored.
pub fn decode_data_payload(json: &str) -> Result<DataPayload, GraphError> {
    if json.trim().is_empty() {
        return Err(GraphError::MalformedResponse("empty payload".to_string()));
    }

    let raw: RawDataPayload = serde_json::from_str(json)
        .map_err(|e| GraphError::MalformedResponse(format!("invalid json: {}", e)))?;

    let (Some(start), Some(end), Some(raw_points)) = (raw.start_date, raw.end_date, raw.points)
    else {
        return Err(GraphError::MalformedResponse(
            "missing startDate, endDate or points".to_string(),
        ));
    };

    let start_ms = date_value(&start)
        .ok_or_else(|| GraphError::MalformedResponse(format!("invalid startDate: {}", start)))?;
    let end_ms = date_value(&end)
        .ok_or_else(|| GraphError::MalformedResponse(format!("invalid endDate: {}", end)))?;

    let mut points = Vec::with_capacity(raw_points.len());
    for raw_point in raw_points {
        let mut time_ms = None;
        let mut fields = BTreeMap::new();

        for (key, value) in raw_point {
            let key = key.to_lowercase();
            if key == DATE_KEY {
                time_ms = date_value(&value);
            } else if let Some(number) = numeric_value(&value) {
                fields.insert(key, number);
            }
        }

        let time_ms = time_ms.ok_or_else(|| {
            GraphError::MalformedResponse("point without a valid date".to_string())
        })?;
        points.push(TimePoint::new(time_ms, fields));
    }

    if !points.is_sorted_by_key(|p| p.time_ms) {
        tracing::debug!("Sorting {} out-of-order points", points.len());
        points.sort_by_key(|p| p.time_ms);
    }

    Ok(DataPayload {
        range: TimeDomain::new(start_ms, end_ms),
        points,
    })
}

/// Decodes `[{"type": "walk", "start": "2015-03-03 07:30:09Z", "end": .., "steps": 617.0}]`.
pub fn decode_activities(json: &str) -> Result<Vec<ActivityRegion>, GraphError> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }

    let raw: Vec<RawActivity> = serde_json::from_str(json)
        .map_err(|e| GraphError::MalformedResponse(format!("invalid activity json: {}", e)))?;

    raw.into_iter()
        .map(|activity| {
            let start_ms = parse_date(&activity.start).ok_or_else(|| {
                GraphError::MalformedResponse(format!("invalid activity start: {}", activity.start))
            })?;
            let end_ms = parse_date(&activity.end).ok_or_else(|| {
                GraphError::MalformedResponse(format!("invalid activity end: {}", activity.end))
            })?;
            let stats = activity
                .stats
                .iter()
                .filter_map(|(k, v)| numeric_value(v).map(|n| (k.clone(), n)))
                .collect();

            Ok(ActivityRegion::new(activity.kind, start_ms, end_ms, stats))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2015-03-03 00:00Z
    const MARCH_3: i64 = 1_425_340_800_000;

    #[test]
    fn test_format_date_granularities() {
        let t = MARCH_3 + 7 * 3_600_000 + 30 * 60_000 + 9_000 + 250;
        assert_eq!(format_date(t, DateGranularity::Minute), "2015-03-03 07:30Z");
        assert_eq!(format_date(t, DateGranularity::Second), "2015-03-03 07:30:09Z");
        assert_eq!(
            format_date(t, DateGranularity::Millisecond),
            "2015-03-03 07:30:09:250Z"
        );
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2015-03-03 00:00Z"), Some(MARCH_3));
        assert_eq!(parse_date("2015-03-03 00:00:30Z"), Some(MARCH_3 + 30_000));
        assert_eq!(parse_date("2015-03-03 00:00:30:500Z"), Some(MARCH_3 + 30_500));
        assert_eq!(parse_date("2015-03-03T00:01:00Z"), Some(MARCH_3 + 60_000));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_decode_sorts_and_lowercases() {
        let json = r#"{
            "startDate": "2015-03-03 00:00Z",
            "endDate": "2015-03-04 00:00Z",
            "points": [
                {"Date": "2015-03-03 00:02Z", "Close": "12.5", "label": "x"},
                {"date": "2015-03-03 00:01Z", "heart_rate": 72}
            ]
        }"#;

        let payload = decode_data_payload(json).unwrap();
        assert_eq!(payload.range, TimeDomain::new(MARCH_3, MARCH_3 + 86_400_000));
        assert_eq!(payload.points.len(), 2);
        assert_eq!(payload.points[0].time_ms, MARCH_3 + 60_000);
        assert_eq!(payload.points[0].value("heart_rate"), Some(72.0));
        assert_eq!(payload.points[1].value("close"), Some(12.5));
        assert_eq!(payload.points[1].value("label"), None);
    }

    #[test]
    fn test_malformed_payloads_are_rejected() {
        for json in [
            "",
            "not json",
            r#"{"startDate": "2015-03-03 00:00Z", "points": []}"#,
            r#"{"startDate": "2015-03-03 00:00Z", "endDate": "2015-03-04 00:00Z"}"#,
            r#"{"startDate": "soon", "endDate": "2015-03-04 00:00Z", "points": []}"#,
            r#"{"startDate": 0, "endDate": 1, "points": [{"steps": 3}]}"#,
        ] {
            assert!(
                matches!(decode_data_payload(json), Err(GraphError::MalformedResponse(_))),
                "accepted {:?}",
                json
            );
        }
    }

    #[test]
    fn test_numeric_range_dates_are_accepted() {
        let payload =
            decode_data_payload(r#"{"startDate": 1000, "endDate": 2000, "points": []}"#).unwrap();
        assert_eq!(payload, DataPayload::empty(TimeDomain::new(1000, 2000)));
    }

    #[test]
    fn test_decode_activities() {
        let json = r#"[{
            "type": "walk",
            "start": "2015-03-03 07:30:09Z",
            "end": "2015-03-03 07:40:47Z",
            "calories": 88.7,
            "steps": 617.0
        }]"#;

        let activities = decode_activities(json).unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].kind, "walk");
        assert_eq!(activities[0].id, "activity-2015-03-03 07:30Z");
        assert_eq!(activities[0].stats.get("steps"), Some(&617.0));
        assert_eq!(activities[0].end_ms - activities[0].start_ms, 638_000);
    }
}
