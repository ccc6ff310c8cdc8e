// Fixture data provider - Serves recorded samples from JSON files
use crate::application::data_provider::{ActivityRequest, DataProvider, DataRequest};
use crate::domain::tier::DateGranularity;
use crate::domain::time_point::TimePoint;
use crate::infrastructure::bridge_codec::{decode_data_payload, format_date, parse_date};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

const ALL_METRICS: &str = "*";

#[derive(Debug, Clone, Default)]
pub struct FixtureProvider {
    points: Vec<TimePoint>,
    activities: Vec<Map<String, Value>>,
    latency: Duration,
}

impl FixtureProvider {
    pub fn new(points: Vec<TimePoint>, activities: Vec<Map<String, Value>>) -> Self {
        Self {
            points,
            activities,
            latency: Duration::ZERO,
        }
    }

    /// Delays every answer, to exercise out-of-order responses.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn from_files(data_path: &str, activities_path: Option<&str>) -> Result<Self> {
        let data = std::fs::read_to_string(data_path)
            .with_context(|| format!("Failed to read fixture data {}", data_path))?;
        let payload = decode_data_payload(&data)
            .with_context(|| format!("Invalid fixture data {}", data_path))?;

        let activities: Vec<Map<String, Value>> = match activities_path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read fixture activities {}", path))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Invalid fixture activities {}", path))?
            }
            None => Vec::new(),
        };

        tracing::info!(
            "Loaded {} fixture points and {} activities",
            payload.points.len(),
            activities.len()
        );
        Ok(Self::new(payload.points, activities))
    }

    /// Averages each field over equal-size buckets, keeping the middle
    /// timestamp of every bucket.
    fn downsample_points(points: &[TimePoint], max_points: usize) -> Vec<TimePoint> {
        if max_points == 0 || points.len() <= max_points {
            return points.to_vec();
        }

        let bucket_size = (points.len() as f64 / max_points as f64).ceil() as usize;
        let mut downsampled = Vec::with_capacity(max_points);

        for chunk in points.chunks(bucket_size) {
            let mid_idx = chunk.len() / 2;
            let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
            for point in chunk {
                for (name, value) in &point.fields {
                    let entry = sums.entry(name.clone()).or_insert((0.0, 0));
                    entry.0 += value;
                    entry.1 += 1;
                }
            }

            let fields = sums
                .into_iter()
                .map(|(name, (sum, count))| (name, sum / count as f64))
                .collect();
            downsampled.push(TimePoint::new(chunk[mid_idx].time_ms, fields));
        }

        downsampled
    }

    fn select_metrics(point: &TimePoint, metrics: &[String]) -> Map<String, Value> {
        let all = metrics.iter().any(|m| m == ALL_METRICS);
        point
            .fields
            .iter()
            .filter(|(name, _)| all || metrics.iter().any(|m| m.eq_ignore_ascii_case(name)))
            .map(|(name, value)| (name.clone(), json!(value)))
            .collect()
    }
}

fn parse_range(start: &str, end: &str) -> Result<(i64, i64)> {
    let start_ms = parse_date(start).with_context(|| format!("Invalid startDate: {}", start))?;
    let end_ms = parse_date(end).with_context(|| format!("Invalid endDate: {}", end))?;
    Ok((start_ms, end_ms))
}

#[async_trait]
impl DataProvider for FixtureProvider {
    async fn load_data(&self, request: &DataRequest) -> Result<String> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let (start_ms, end_ms) = parse_range(&request.start_date, &request.end_date)?;
        let lower = self.points.partition_point(|p| p.time_ms < start_ms);
        let upper = self.points.partition_point(|p| p.time_ms <= end_ms);
        let in_range = &self.points[lower..upper.max(lower)];

        let points: Vec<Value> =
            Self::downsample_points(in_range, request.num_of_points as usize)
                .iter()
                .map(|point| {
                    let mut record = Self::select_metrics(point, &request.metrics);
                    record.insert(
                        "date".to_string(),
                        json!(format_date(point.time_ms, DateGranularity::Second)),
                    );
                    Value::Object(record)
                })
                .collect();

        tracing::debug!(
            "Fixture answered {} of {} points for {} - {}",
            points.len(),
            in_range.len(),
            request.start_date,
            request.end_date
        );

        Ok(json!({
            "startDate": request.start_date,
            "endDate": request.end_date,
            "points": points,
        })
        .to_string())
    }

    async fn load_activities(&self, request: &ActivityRequest) -> Result<String> {
        let (start_ms, end_ms) = parse_range(&request.start_date, &request.end_date)?;

        let overlapping: Vec<&Map<String, Value>> = self
            .activities
            .iter()
            .filter(|activity| {
                let bound = |key: &str| activity.get(key).and_then(Value::as_str).and_then(parse_date);
                match (bound("start"), bound("end")) {
                    (Some(start), Some(end)) => end >= start_ms && start <= end_ms,
                    _ => false,
                }
            })
            .collect();

        Ok(serde_json::to_string(&overlapping)?)
    }
}
