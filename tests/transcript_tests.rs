use voice_sessions::pipeline::ContextMessage;
use voice_sessions::prompt::{fill_placeholders, CallRequest};
use voice_sessions::session::{Role, TranscriptEntry};
use voice_sessions::transcript::{format_transcript, message_counts, recover};

fn msg(role: Role, content: &str) -> ContextMessage {
    ContextMessage {
        role,
        content: content.to_string(),
    }
}

#[test]
fn test_capture_wins_over_context() {
    let captured = vec![
        TranscriptEntry::new(Role::User, "hi"),
        TranscriptEntry::new(Role::Assistant, "hello"),
    ];
    let context = vec![
        msg(Role::System, "prompt"),
        msg(Role::User, "hi"),
        msg(Role::Assistant, "hello"),
        msg(Role::User, "are you there"),
    ];

    let transcript = recover(&captured, &context);

    assert_eq!(transcript, captured);
}

#[test]
fn test_recovers_from_context_in_order() {
    let context = vec![
        msg(Role::System, "prompt"),
        msg(Role::User, "where are you"),
        msg(Role::Assistant, "  "),
        msg(Role::Assistant, "on I-80"),
    ];

    let transcript = recover(&[], &context);
    let turns: Vec<(Role, &str)> = transcript
        .iter()
        .map(|e| (e.role, e.content.as_str()))
        .collect();

    assert_eq!(
        turns,
        vec![(Role::User, "where are you"), (Role::Assistant, "on I-80")]
    );
}

#[test]
fn test_format_and_counts() {
    let transcript = vec![
        TranscriptEntry::new(Role::Assistant, "Hi Mike, how's the load?"),
        TranscriptEntry::new(Role::User, "Rolling fine"),
    ];

    assert_eq!(
        format_transcript(&transcript),
        "ASSISTANT: Hi Mike, how's the load?\n\nUSER: Rolling fine"
    );

    let counts = message_counts(&transcript);
    assert_eq!((counts.user, counts.assistant, counts.total), (1, 1, 2));
}

#[test]
fn test_placeholders_filled_with_defaults() {
    let request = CallRequest {
        call_id: "call-1".to_string(),
        driver_name: Some("Mike".to_string()),
        load_number: Some("  ".to_string()),
        ..Default::default()
    };

    let prompt = fill_placeholders(
        "Hi {{driver_name}}, checking on {{load_number}} from {{origin}} to {{destination}}, due {{expected_eta}}. {{unknown}}",
        &request,
    );

    assert_eq!(
        prompt,
        "Hi Mike, checking on your load from the origin to the destination, due the expected time. {{unknown}}"
    );
}
