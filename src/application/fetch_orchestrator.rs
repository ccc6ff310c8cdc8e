// Fetch orchestrator - Tagged range requests and staleness tracking
use crate::application::data_provider::{ActivityRequest, DataRequest};
use crate::domain::activity::ActivityRegion;
use crate::domain::error::GraphError;
use crate::domain::tier::{DateGranularity, DownsamplingTier};
use crate::domain::time_point::{Dataset, DatasetTag, TimeDomain};
use crate::infrastructure::bridge_codec::{
    decode_activities, decode_data_payload, format_date, DataPayload,
};
use std::collections::HashMap;

const ALL_METRICS: &str = "*";

/// Request slots; every tier shares one slot so a newer tier request
/// supersedes an older one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Reduced,
    Full,
    Tier,
}

impl From<DatasetTag> for Slot {
    fn from(tag: DatasetTag) -> Self {
        match tag {
            DatasetTag::Reduced => Slot::Reduced,
            DatasetTag::Full => Slot::Full,
            DatasetTag::Tier(_) => Slot::Tier,
        }
    }
}

/// What a response was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub tag: DatasetTag,
    pub generation: u64,
    pub range: TimeDomain,
    pub issued_at_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityTicket {
    pub generation: u64,
    pub range: TimeDomain,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchPlan {
    /// Completed locally without calling the provider.
    Immediate(FetchTicket, DataPayload),
    Dispatch(FetchTicket, DataRequest),
}

impl FetchPlan {
    pub fn ticket(&self) -> FetchTicket {
        match self {
            FetchPlan::Immediate(ticket, _) | FetchPlan::Dispatch(ticket, _) => *ticket,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Loaded(Dataset),
    /// A valid response without points for the requested range.
    Empty(TimeDomain),
}

#[derive(Debug, Default)]
pub struct FetchOrchestrator {
    generations: HashMap<Slot, u64>,
    activity_generation: u64,
    current_tier: Option<DownsamplingTier>,
    latency_ms: HashMap<Slot, i64>,
}

impl FetchOrchestrator {
    pub fn new(current_tier: Option<DownsamplingTier>) -> Self {
        Self {
            current_tier,
            ..Self::default()
        }
    }

    pub fn current_tier(&self) -> Option<&DownsamplingTier> {
        self.current_tier.as_ref()
    }

    pub fn set_current_tier(&mut self, tier: DownsamplingTier) {
        self.current_tier = Some(tier);
    }

    /// Supersedes every request in flight.
    pub fn invalidate(&mut self) {
        for slot in [Slot::Reduced, Slot::Full, Slot::Tier] {
            self.bump(slot);
        }
        self.activity_generation += 1;
    }

    fn bump(&mut self, slot: Slot) -> u64 {
        let generation = self.generations.entry(slot).or_insert(0);
        *generation += 1;
        *generation
    }

    fn generation(&self, slot: Slot) -> u64 {
        self.generations.get(&slot).copied().unwrap_or(0)
    }

    /// Plans a range request. `metrics: None` asks for every series;
    /// `Some(&[])` asks for none and completes locally with no points.
    /// A reduced request starts a new two-phase load and supersedes any
    /// full or tier request still in flight.
    pub fn request_range(
        &mut self,
        range: TimeDomain,
        metrics: Option<&[String]>,
        point_count: u32,
        tag: DatasetTag,
        granularity: DateGranularity,
        now_ms: i64,
    ) -> FetchPlan {
        let slot = Slot::from(tag);
        if slot == Slot::Reduced {
            self.bump(Slot::Full);
            self.bump(Slot::Tier);
        }
        let ticket = FetchTicket {
            tag,
            generation: self.bump(slot),
            range,
            issued_at_ms: now_ms,
        };

        let metrics = match metrics {
            Some([]) => {
                tracing::debug!("No metrics requested for {} fetch, completing locally", tag);
                return FetchPlan::Immediate(ticket, DataPayload::empty(range));
            }
            Some(metrics) => metrics.to_vec(),
            None => vec![ALL_METRICS.to_string()],
        };

        let request = DataRequest {
            start_date: format_date(range.start_ms, granularity),
            end_date: format_date(range.end_ms, granularity),
            metrics,
            num_of_points: point_count,
        };

        tracing::debug!(
            "Requesting {} data {} - {} ({} points, generation {})",
            tag,
            request.start_date,
            request.end_date,
            point_count,
            ticket.generation
        );

        FetchPlan::Dispatch(ticket, request)
    }

    pub fn ensure_current(&self, ticket: &FetchTicket) -> Result<(), GraphError> {
        let current = self.generation(Slot::from(ticket.tag));
        if ticket.generation != current {
            return Err(GraphError::StaleResponse {
                tag: ticket.tag,
                generation: ticket.generation,
                current,
            });
        }
        Ok(())
    }

    /// Validates and decodes a provider response.
    pub fn accept(
        &mut self,
        ticket: &FetchTicket,
        json: &str,
        now_ms: i64,
    ) -> Result<FetchOutcome, GraphError> {
        self.ensure_current(ticket)?;
        let payload = decode_data_payload(json)?;
        self.accept_payload(ticket, payload, now_ms)
    }

    pub fn accept_payload(
        &mut self,
        ticket: &FetchTicket,
        payload: DataPayload,
        now_ms: i64,
    ) -> Result<FetchOutcome, GraphError> {
        self.ensure_current(ticket)?;

        let latency = now_ms - ticket.issued_at_ms;
        self.latency_ms.insert(Slot::from(ticket.tag), latency);
        tracing::debug!(
            "{} fetch returned {} points in {} ms",
            ticket.tag,
            payload.points.len(),
            latency
        );

        if payload.points.is_empty() {
            return Ok(FetchOutcome::Empty(ticket.range));
        }

        let dataset = Dataset::new(ticket.range, ticket.tag, payload.points)?;
        Ok(FetchOutcome::Loaded(dataset))
    }

    /// Latency of the last accepted response for the tag's slot.
    pub fn last_latency_ms(&self, tag: DatasetTag) -> Option<i64> {
        self.latency_ms.get(&Slot::from(tag)).copied()
    }

    pub fn request_activities(&mut self, range: TimeDomain) -> (ActivityTicket, ActivityRequest) {
        self.activity_generation += 1;
        let ticket = ActivityTicket {
            generation: self.activity_generation,
            range,
        };
        let request = ActivityRequest {
            start_date: format_date(range.start_ms, DateGranularity::Minute),
            end_date: format_date(range.end_ms, DateGranularity::Minute),
        };
        (ticket, request)
    }

    pub fn accept_activities(
        &self,
        ticket: &ActivityTicket,
        json: &str,
    ) -> Result<Vec<ActivityRegion>, GraphError> {
        if ticket.generation != self.activity_generation {
            return Err(GraphError::StaleActivities {
                generation: ticket.generation,
                current: self.activity_generation,
            });
        }
        decode_activities(json)
    }
}
