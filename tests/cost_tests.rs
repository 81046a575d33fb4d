use voice_sessions::cost::{CostError, CostEstimator, CostRequest, Measure};
use voice_sessions::session::{ProviderSelection, TransportKind};

fn request(duration_seconds: f64, transport: TransportKind) -> CostRequest {
    CostRequest {
        recognition: ProviderSelection::new("deepgram", Some("nova-2")),
        synthesis: ProviderSelection::new("cartesia", Some("sonic")),
        dialogue: ProviderSelection::new("openai", Some("gpt-4o")),
        transport,
        duration_seconds,
        total_chars: None,
        total_tokens: None,
        input_tokens: None,
        output_tokens: None,
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_estimates_usage_from_duration() {
    let breakdown = CostEstimator::default()
        .calculate(&request(600.0, TransportKind::Room))
        .unwrap();

    assert_eq!(breakdown.usage.chars, Measure::Estimated(3000));
    assert_eq!(breakdown.usage.input_tokens, Measure::Estimated(2400));
    assert_eq!(breakdown.usage.output_tokens, Measure::Estimated(1600));

    // 10 min deepgram nova-2
    assert!(approx(breakdown.recognition.cost_usd, 10.0 * 0.0043));
    // 3000 chars cartesia sonic
    assert!(approx(breakdown.synthesis.cost_usd, 3000.0 * 0.000015));
    // 2.4K in + 1.6K out gpt-4o
    assert!(approx(breakdown.dialogue.cost_usd, 2.4 * 0.0025 + 1.6 * 0.01));
    assert!(approx(breakdown.dialogue.units, 4000.0));
    // 10 min room
    assert!(approx(breakdown.transport.cost_usd, 10.0 * 0.0015));

    let sum = breakdown.recognition.cost_usd
        + breakdown.synthesis.cost_usd
        + breakdown.dialogue.cost_usd
        + breakdown.transport.cost_usd;
    assert!(approx(breakdown.total_cost_usd, sum));
}

#[test]
fn test_calculation_is_deterministic() {
    let estimator = CostEstimator::default();
    let req = request(187.5, TransportKind::Room);

    let first = serde_json::to_string(&estimator.calculate(&req).unwrap()).unwrap();
    let second = serde_json::to_string(&estimator.calculate(&req).unwrap()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_metered_usage_is_used() {
    let mut req = request(60.0, TransportKind::Room);
    req.total_chars = Some(1200);
    req.input_tokens = Some(500);
    req.output_tokens = Some(300);
    req.total_tokens = Some(800);

    let breakdown = CostEstimator::default().calculate(&req).unwrap();

    assert_eq!(breakdown.usage.chars, Measure::Metered(1200));
    assert_eq!(breakdown.usage.input_tokens, Measure::Metered(500));
    assert_eq!(breakdown.usage.output_tokens, Measure::Metered(300));
    assert!(approx(breakdown.dialogue.cost_usd, 0.5 * 0.0025 + 0.3 * 0.01));
}

#[test]
fn test_metered_total_is_split() {
    let mut req = request(60.0, TransportKind::Room);
    req.total_tokens = Some(1000);

    let breakdown = CostEstimator::default().calculate(&req).unwrap();

    assert_eq!(breakdown.usage.input_tokens, Measure::Estimated(600));
    assert_eq!(breakdown.usage.output_tokens, Measure::Estimated(400));
}

#[test]
fn test_socket_transport_is_free() {
    let breakdown = CostEstimator::default()
        .calculate(&request(300.0, TransportKind::Socket))
        .unwrap();

    assert_eq!(breakdown.transport.cost_usd, 0.0);
    assert_eq!(breakdown.transport.service_name, "socket");
}

#[test]
fn test_zero_duration_costs_nothing() {
    let breakdown = CostEstimator::default()
        .calculate(&request(0.0, TransportKind::Socket))
        .unwrap();

    assert_eq!(breakdown.total_cost_usd, 0.0);
    assert_eq!(breakdown.usage.chars, Measure::Estimated(0));
}

#[test]
fn test_invalid_duration_rejected() {
    let estimator = CostEstimator::default();

    assert_eq!(
        estimator.calculate(&request(-1.0, TransportKind::Room)),
        Err(CostError::InvalidDuration(-1.0))
    );
    assert!(estimator
        .calculate(&request(f64::NAN, TransportKind::Room))
        .is_err());
}

#[test]
fn test_price_fallbacks() {
    let estimator = CostEstimator::default();
    let prices = estimator.prices();

    // Unknown model falls back to the provider default
    assert_eq!(prices.recognition("deepgram", Some("nova-9")), 0.0043);
    assert_eq!(prices.synthesis("eleven_labs", None), 0.0003);
    // Unknown provider falls back to the fixed rate
    assert_eq!(prices.recognition("whisperer", None), 0.01);
    assert_eq!(prices.synthesis("mystery", None), 0.00002);

    // Dated model ids match the longest known key
    let mini = prices.dialogue("openai", "gpt-4o-mini-2024-07-18");
    assert_eq!(mini.input_per_1k, 0.00015);
    let unknown = prices.dialogue("openai", "o1-preview");
    assert_eq!((unknown.input_per_1k, unknown.output_per_1k), (0.001, 0.002));
}
