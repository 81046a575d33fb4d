use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::stores::{CallRecord, CallResults};

pub const DEFAULT_OUTCOME: &str = "In-Transit Update";

/// Call details given to the extractor alongside the transcript
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallContext {
    pub driver_name: Option<String>,
    pub load_number: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

impl From<&CallRecord> for CallContext {
    fn from(call: &CallRecord) -> Self {
        Self {
            driver_name: call.driver_name.clone(),
            load_number: call.load_number.clone(),
            origin: call.origin.clone(),
            destination: call.destination.clone(),
        }
    }
}

/// Turns a formatted transcript into structured call results
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        call_id: &str,
        transcript: &str,
        context: &CallContext,
    ) -> Result<CallResults>;
}

/// Results recorded when there is nothing to extract from, or extraction failed
pub fn default_results(call_id: &str) -> CallResults {
    CallResults {
        call_id: call_id.to_string(),
        call_outcome: DEFAULT_OUTCOME.to_string(),
        is_emergency: false,
        ..Default::default()
    }
}

const EMERGENCY_WORDS: &[&str] = &[
    "accident", "crash", "crashed", "collision", "blowout", "breakdown", "engine", "medical",
    "sick", "hurt", "injured", "ambulance", "emergency", "help", "911", "fire", "smoke",
    "burning",
];

const EMERGENCY_TYPES: &[(&str, &[&str])] = &[
    ("Accident", &["accident", "crash", "crashed", "collision", "hit"]),
    ("Breakdown", &["blowout", "flat", "tire", "breakdown", "engine", "mechanical"]),
    (
        "Medical",
        &["medical", "sick", "hurt", "injured", "ambulance", "heart", "chest", "breathing"],
    ),
];

const ARRIVAL_PHRASES: &[&str] = &["arrived", "at the dock", "at destination"];
const DRIVING_PHRASES: &[&str] = &["driving", "on the road", "en route"];

/// Keyword-based extractor used when no model-backed extractor is wired in
#[derive(Debug, Clone, Default)]
pub struct DefaultExtractor;

impl DefaultExtractor {
    pub fn new() -> Self {
        Self
    }

    fn words(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect()
    }

    fn has_any(words: &[String], candidates: &[&str]) -> bool {
        words.iter().any(|w| candidates.contains(&w.as_str()))
    }

    fn emergency_type(words: &[String]) -> &'static str {
        EMERGENCY_TYPES
            .iter()
            .find(|(_, triggers)| Self::has_any(words, triggers))
            .map(|(kind, _)| *kind)
            .unwrap_or("Other")
    }
}

#[async_trait]
impl Extractor for DefaultExtractor {
    async fn extract(
        &self,
        call_id: &str,
        transcript: &str,
        _context: &CallContext,
    ) -> Result<CallResults> {
        // Only what the caller said decides the outcome
        let spoken: String = transcript
            .split("\n\n")
            .filter_map(|turn| turn.strip_prefix("USER: "))
            .collect::<Vec<_>>()
            .join(" ");
        let words = Self::words(&spoken);
        let lower = spoken.to_lowercase();

        let mut raw = Map::new();

        if Self::has_any(&words, EMERGENCY_WORDS) {
            let kind = Self::emergency_type(&words);
            raw.insert("call_outcome".into(), json!("Emergency Escalation"));
            raw.insert("emergency_type".into(), json!(kind));
            raw.insert("escalation_status".into(), json!("Pending Review"));

            return Ok(CallResults {
                call_id: call_id.to_string(),
                call_outcome: "Emergency Escalation".to_string(),
                is_emergency: true,
                emergency_type: Some(kind.to_string()),
                confidence_score: Some(0.85),
                raw_extraction: raw,
                ..Default::default()
            });
        }

        let (outcome, status) = if ARRIVAL_PHRASES.iter().any(|p| lower.contains(p)) {
            ("Arrival Confirmation", "Arrived")
        } else if DRIVING_PHRASES.iter().any(|p| lower.contains(p)) {
            ("In-Transit Update", "Driving")
        } else {
            ("Unknown", "Unknown")
        };
        let pod = lower.contains("pod") || lower.contains("proof of delivery");

        raw.insert("call_outcome".into(), json!(outcome));
        raw.insert("driver_status".into(), json!(status));
        raw.insert("pod_reminder_acknowledged".into(), Value::Bool(pod));

        Ok(CallResults {
            call_id: call_id.to_string(),
            call_outcome: outcome.to_string(),
            is_emergency: false,
            driver_status: Some(status.to_string()),
            confidence_score: Some(0.9),
            pod_reminder_acknowledged: pod,
            raw_extraction: raw,
            ..Default::default()
        })
    }
}
