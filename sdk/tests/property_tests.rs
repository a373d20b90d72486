use proptest::prelude::*;
use sdk::errors::{EngineError, RoundtableErrorExt};
use sdk::types::{Message, Speaker};

// User hints are static strings and never echo the underlying error detail.
proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "\\PC*") {
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::LLMProvider(error_str.clone()),
            EngineError::Io(std::io::Error::new(std::io::ErrorKind::Other, error_str.clone())),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            if error_str.len() > 12 {
                prop_assert!(!hint.contains(error_str.as_str()));
            }
        }
    }
}

// Any label parses to a speaker that renders the same label, and only the
// reserved labels map to the non-participant speakers.
proptest! {
    #[test]
    fn test_speaker_label_round_trip(label in "[A-Za-z][A-Za-z0-9_ ]{0,24}") {
        let speaker = Speaker::from_label(&label);
        prop_assert_eq!(speaker.label(), label.as_str());

        let is_reserved = label == "user" || label == "System";
        prop_assert_eq!(speaker.participant().is_none(), is_reserved);
    }
}

// Transcript entries always expose the `role` / `message` keys.
proptest! {
    #[test]
    fn test_message_transcript_shape(
        label in "[A-Za-z]{1,16}",
        content in "\\PC{0,64}",
        sequence in 0..10_000u64,
    ) {
        let msg = Message::new(Speaker::from_label(&label), content.clone(), sequence);
        let json = serde_json::to_value(&msg).expect("serialize message");

        prop_assert_eq!(json["role"].as_str(), Some(label.as_str()));
        prop_assert_eq!(json["message"].as_str(), Some(content.as_str()));
        prop_assert_eq!(json["sequence"].as_u64(), Some(sequence));
    }
}
