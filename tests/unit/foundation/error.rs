use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        FlowError::MissingTerminal
            .to_string()
            .contains("structural error:")
    );
    assert!(
        FlowError::cycle(["a", "b"])
            .to_string()
            .contains("cycle detected through nodes [a, b]")
    );
    assert!(FlowError::invalid("x").to_string().contains("invalid flow:"));
    assert!(
        FlowError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn codes_are_stable() {
    assert_eq!(FlowError::MissingTerminal.code(), "MISSING_TERMINAL_NODE");
    assert_eq!(FlowError::cycle(["a"]).code(), "CYCLE_DETECTED");
    assert_eq!(
        FlowError::unknown_node_type("n1", "hexagon").code(),
        "UNKNOWN_NODE_TYPE"
    );
    assert_eq!(FlowError::NoValidScenes.code(), "NO_VALID_SCENES");
}

#[test]
fn user_facing_translation_keeps_code_message_and_hints() {
    let err = FlowError::NoValidScenes;
    let ui = UserFacingError::from(&err);
    assert_eq!(ui.code, "NO_VALID_SCENES");
    assert_eq!(ui.message, err.to_string());
    assert!(!ui.suggestions.is_empty());
    assert!(ui.to_string().starts_with("[NO_VALID_SCENES]"));
}

#[test]
fn resource_errors_share_the_boundary_shape() {
    let ui = UserFacingError::resource(
        "STORAGE_QUOTA_EXCEEDED",
        "storage quota exceeded",
        ["Delete unused assets"],
    );
    assert_eq!(ui.code, "STORAGE_QUOTA_EXCEEDED");
    assert_eq!(ui.suggestions, vec!["Delete unused assets".to_owned()]);
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FlowError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.code(), "INTERNAL_ERROR");
}
