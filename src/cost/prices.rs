// Published list prices (USD), January 2026.

use std::collections::BTreeMap;

use crate::session::TransportKind;

/// Key used for a provider's price when the selected model has no entry
pub const DEFAULT_MODEL: &str = "default";

/// Recognition fallback when the provider is unknown (per minute)
pub const FALLBACK_RECOGNITION_PER_MINUTE: f64 = 0.01;
/// Synthesis fallback when the provider is unknown (per character)
pub const FALLBACK_SYNTHESIS_PER_CHAR: f64 = 0.00002;
/// Dialogue fallback input price (per 1K tokens)
pub const FALLBACK_DIALOGUE_INPUT_PER_1K: f64 = 0.001;
/// Dialogue fallback output price (per 1K tokens)
pub const FALLBACK_DIALOGUE_OUTPUT_PER_1K: f64 = 0.002;

/// Input/output price pair for a dialogue model, per 1K tokens
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenPrice {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

/// Price tables keyed by provider tag, then model.
///
/// Ordered maps keep lookups and substring matching deterministic.
#[derive(Debug, Clone)]
pub struct PriceTable {
    pub recognition_per_minute: BTreeMap<String, BTreeMap<String, f64>>,
    pub synthesis_per_char: BTreeMap<String, BTreeMap<String, f64>>,
    pub dialogue_per_1k: BTreeMap<String, BTreeMap<String, TokenPrice>>,
    pub transport_per_minute: BTreeMap<TransportKind, f64>,
}

fn models<T: Copy>(entries: &[(&str, T)]) -> BTreeMap<String, T> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn tokens(input_per_1k: f64, output_per_1k: f64) -> TokenPrice {
    TokenPrice {
        input_per_1k,
        output_per_1k,
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        let mut recognition_per_minute = BTreeMap::new();
        recognition_per_minute.insert(
            "deepgram".to_string(),
            models(&[("nova-2", 0.0043), ("base", 0.0125), (DEFAULT_MODEL, 0.0043)]),
        );
        recognition_per_minute.insert(
            "azure_speech".to_string(),
            models(&[(DEFAULT_MODEL, 1.00 / 60.0)]),
        );
        recognition_per_minute.insert(
            "assemblyai".to_string(),
            models(&[(DEFAULT_MODEL, 0.015)]),
        );

        let mut synthesis_per_char = BTreeMap::new();
        synthesis_per_char.insert(
            "cartesia".to_string(),
            models(&[("sonic", 0.000015), (DEFAULT_MODEL, 0.000015)]),
        );
        synthesis_per_char.insert(
            "eleven_labs".to_string(),
            models(&[
                ("turbo_v2_5", 0.0003),
                ("turbo_v2", 0.0003),
                ("multilingual_v2", 0.0003),
                (DEFAULT_MODEL, 0.0003),
            ]),
        );
        synthesis_per_char.insert(
            "azure_tts".to_string(),
            models(&[("neural", 0.000016), (DEFAULT_MODEL, 0.000016)]),
        );

        let mut dialogue_per_1k = BTreeMap::new();
        dialogue_per_1k.insert(
            "openai".to_string(),
            models(&[
                ("gpt-4o", tokens(0.0025, 0.01)),
                ("gpt-4o-mini", tokens(0.00015, 0.0006)),
                ("gpt-4-turbo", tokens(0.01, 0.03)),
            ]),
        );
        dialogue_per_1k.insert(
            "anthropic".to_string(),
            models(&[
                ("claude-3-5-sonnet-20241022", tokens(0.003, 0.015)),
                ("claude-3-5-haiku-20241022", tokens(0.001, 0.005)),
            ]),
        );

        // Sockets are served in-process and carry no per-minute fee.
        let mut transport_per_minute = BTreeMap::new();
        transport_per_minute.insert(TransportKind::Room, 0.0015);

        Self {
            recognition_per_minute,
            synthesis_per_char,
            dialogue_per_1k,
            transport_per_minute,
        }
    }
}

impl PriceTable {
    /// Per-minute recognition price: exact model, then provider default
    pub fn recognition(&self, provider: &str, model: Option<&str>) -> f64 {
        lookup_with_default(&self.recognition_per_minute, provider, model)
            .unwrap_or(FALLBACK_RECOGNITION_PER_MINUTE)
    }

    /// Per-character synthesis price: exact model, then provider default
    pub fn synthesis(&self, provider: &str, model: Option<&str>) -> f64 {
        lookup_with_default(&self.synthesis_per_char, provider, model)
            .unwrap_or(FALLBACK_SYNTHESIS_PER_CHAR)
    }

    /// Dialogue price: exact model, then the longest key that is a substring
    /// of the model (or contains it), then the fixed fallback rate
    pub fn dialogue(&self, provider: &str, model: &str) -> TokenPrice {
        let Some(provider_prices) = self.dialogue_per_1k.get(provider) else {
            return tokens(FALLBACK_DIALOGUE_INPUT_PER_1K, FALLBACK_DIALOGUE_OUTPUT_PER_1K);
        };

        if let Some(price) = provider_prices.get(model) {
            return *price;
        }

        provider_prices
            .iter()
            .filter(|(key, _)| {
                !model.is_empty() && (model.contains(key.as_str()) || key.contains(model))
            })
            .max_by_key(|(key, _)| key.len())
            .map(|(_, price)| *price)
            .unwrap_or_else(|| {
                tokens(FALLBACK_DIALOGUE_INPUT_PER_1K, FALLBACK_DIALOGUE_OUTPUT_PER_1K)
            })
    }

    /// Per-minute transport price; kinds without an entry are free
    pub fn transport(&self, kind: TransportKind) -> f64 {
        self.transport_per_minute.get(&kind).copied().unwrap_or(0.0)
    }
}

fn lookup_with_default(
    table: &BTreeMap<String, BTreeMap<String, f64>>,
    provider: &str,
    model: Option<&str>,
) -> Option<f64> {
    let provider_prices = table.get(provider)?;
    model
        .and_then(|m| provider_prices.get(m))
        .or_else(|| provider_prices.get(DEFAULT_MODEL))
        .copied()
}
