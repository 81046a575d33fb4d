//! Operational cost of a voice call
//!
//! `CostEstimator::calculate` turns a session's provider choices and usage
//! into a per-service breakdown. It is pure: the same request always yields
//! the same breakdown. Usage the providers never reported is estimated from
//! the call duration and tagged as such.

mod prices;

pub use prices::{PriceTable, TokenPrice, DEFAULT_MODEL};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::session::{ProviderSelection, SessionRecord, TransportKind};

/// Estimated speech characters per minute of call
pub const CHARS_PER_MINUTE: f64 = 300.0;
/// Estimated dialogue tokens per minute of call
pub const TOKENS_PER_MINUTE: f64 = 400.0;
/// Share of dialogue tokens attributed to input when only a total is known
pub const INPUT_TOKEN_SHARE: f64 = 0.6;

#[derive(Error, Debug, PartialEq)]
pub enum CostError {
    #[error("Invalid call duration: {0}")]
    InvalidDuration(f64),
}

/// A usage figure, tagged with where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum Measure {
    /// Reported by a provider during the call
    Metered(u64),
    /// Derived from the call duration or a metered total
    Estimated(u64),
}

impl Measure {
    pub fn value(&self) -> u64 {
        match self {
            Measure::Metered(v) | Measure::Estimated(v) => *v,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, Measure::Estimated(_))
    }
}

/// Usage figures the breakdown was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageBasis {
    pub chars: Measure,
    pub input_tokens: Measure,
    pub output_tokens: Measure,
}

/// Cost of one service for one call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCost {
    pub service_name: String,
    pub model: Option<String>,
    pub units: f64,
    pub unit_type: String,
    pub cost_per_unit: f64,
    pub cost_usd: f64,
}

/// Complete cost breakdown for a call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub recognition: ServiceCost,
    pub synthesis: ServiceCost,
    pub dialogue: ServiceCost,
    pub transport: ServiceCost,
    pub total_cost_usd: f64,
    pub duration_seconds: f64,
    pub usage: UsageBasis,
}

/// Inputs to a cost calculation
#[derive(Debug, Clone)]
pub struct CostRequest {
    pub recognition: ProviderSelection,
    pub synthesis: ProviderSelection,
    pub dialogue: ProviderSelection,
    pub transport: TransportKind,
    pub duration_seconds: f64,
    pub total_chars: Option<u64>,
    pub total_tokens: Option<u64>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

impl CostRequest {
    /// Build a request from a finished session's config and metrics
    pub fn for_session(record: &SessionRecord) -> Self {
        let config = &record.pipeline_config;
        let metrics = &record.metrics;
        Self {
            recognition: config.recognition.clone(),
            synthesis: config.synthesis.clone(),
            dialogue: config.dialogue.clone(),
            transport: config.transport,
            duration_seconds: metrics.duration_seconds.unwrap_or(0.0),
            total_chars: metrics.chars_spoken,
            total_tokens: metrics.total_tokens(),
            input_tokens: metrics.input_tokens,
            output_tokens: metrics.output_tokens,
        }
    }
}

/// Prices calls against a fixed `PriceTable`
#[derive(Debug, Clone, Default)]
pub struct CostEstimator {
    prices: PriceTable,
}

impl CostEstimator {
    pub fn new(prices: PriceTable) -> Self {
        Self { prices }
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub fn calculate(&self, request: &CostRequest) -> Result<CostBreakdown, CostError> {
        let duration = request.duration_seconds;
        if !duration.is_finite() || duration < 0.0 {
            return Err(CostError::InvalidDuration(duration));
        }

        let minutes = duration / 60.0;
        let usage = resolve_usage(request, minutes);

        let recognition = self.recognition_cost(&request.recognition, minutes);
        let synthesis = self.synthesis_cost(&request.synthesis, usage.chars.value());
        let dialogue = self.dialogue_cost(
            &request.dialogue,
            usage.input_tokens.value(),
            usage.output_tokens.value(),
        );
        let transport = self.transport_cost(request.transport, minutes);

        let total_cost_usd =
            recognition.cost_usd + synthesis.cost_usd + dialogue.cost_usd + transport.cost_usd;

        info!(
            "Cost breakdown: STT=${:.4}, TTS=${:.4}, LLM=${:.4}, Transport=${:.4}, Total=${:.4}",
            recognition.cost_usd,
            synthesis.cost_usd,
            dialogue.cost_usd,
            transport.cost_usd,
            total_cost_usd
        );

        Ok(CostBreakdown {
            recognition,
            synthesis,
            dialogue,
            transport,
            total_cost_usd,
            duration_seconds: duration,
            usage,
        })
    }

    fn recognition_cost(&self, selection: &ProviderSelection, minutes: f64) -> ServiceCost {
        let price = self
            .prices
            .recognition(&selection.provider, selection.model.as_deref());
        ServiceCost {
            service_name: selection.provider.clone(),
            model: selection.model.clone(),
            units: minutes,
            unit_type: "minutes".to_string(),
            cost_per_unit: price,
            cost_usd: minutes * price,
        }
    }

    fn synthesis_cost(&self, selection: &ProviderSelection, chars: u64) -> ServiceCost {
        let price = self
            .prices
            .synthesis(&selection.provider, selection.model.as_deref());
        ServiceCost {
            service_name: selection.provider.clone(),
            model: selection.model.clone(),
            units: chars as f64,
            unit_type: "characters".to_string(),
            cost_per_unit: price,
            cost_usd: chars as f64 * price,
        }
    }

    fn dialogue_cost(
        &self,
        selection: &ProviderSelection,
        input_tokens: u64,
        output_tokens: u64,
    ) -> ServiceCost {
        let model = selection.model.as_deref().unwrap_or_default();
        let price = self.prices.dialogue(&selection.provider, model);

        let input_cost = input_tokens as f64 / 1000.0 * price.input_per_1k;
        let output_cost = output_tokens as f64 / 1000.0 * price.output_per_1k;
        let cost_usd = input_cost + output_cost;
        let total_tokens = input_tokens + output_tokens;
        let blended_per_1k = if total_tokens > 0 {
            cost_usd / total_tokens as f64 * 1000.0
        } else {
            0.0
        };

        ServiceCost {
            service_name: selection.provider.clone(),
            model: selection.model.clone(),
            units: total_tokens as f64,
            unit_type: "tokens".to_string(),
            cost_per_unit: blended_per_1k,
            cost_usd,
        }
    }

    fn transport_cost(&self, kind: TransportKind, minutes: f64) -> ServiceCost {
        let price = self.prices.transport(kind);
        ServiceCost {
            service_name: kind.to_string(),
            model: None,
            units: minutes,
            unit_type: "minutes".to_string(),
            cost_per_unit: price,
            cost_usd: minutes * price,
        }
    }
}

fn resolve_usage(request: &CostRequest, minutes: f64) -> UsageBasis {
    let chars = match request.total_chars {
        Some(chars) => Measure::Metered(chars),
        None => Measure::Estimated((minutes * CHARS_PER_MINUTE) as u64),
    };

    let (input_tokens, output_tokens) = match (request.input_tokens, request.output_tokens) {
        (Some(input), Some(output)) => (Measure::Metered(input), Measure::Metered(output)),
        _ => {
            let total = request
                .total_tokens
                .or_else(|| match (request.input_tokens, request.output_tokens) {
                    (None, None) => None,
                    (i, o) => Some(i.unwrap_or(0) + o.unwrap_or(0)),
                })
                .unwrap_or((minutes * TOKENS_PER_MINUTE) as u64);
            let input = (total as f64 * INPUT_TOKEN_SHARE).round() as u64;
            (Measure::Estimated(input), Measure::Estimated(total - input))
        }
    };

    UsageBasis {
        chars,
        input_tokens,
        output_tokens,
    }
}
