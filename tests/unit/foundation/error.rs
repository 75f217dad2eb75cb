use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PipelineError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        PipelineError::unsupported("x")
            .to_string()
            .contains("unsupported:")
    );
    assert!(
        PipelineError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PipelineError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.is_unsupported());
}

#[test]
fn unsupported_is_detectable() {
    assert!(PipelineError::unsupported("hue").is_unsupported());
    assert!(!PipelineError::validation("short buffer").is_unsupported());
}
