use std::sync::Arc;
use swirl::error::{Result, SwirlError};

#[test]
fn test_error_types() {
    let err = SwirlError::AgentUnavailable {
        node: "node-1".to_string(),
        address: "10.0.0.5:2375".to_string(),
        source: Arc::new(SwirlError::Backend("connection refused".to_string())),
    };

    assert!(err.to_string().contains("node-1"));
    assert!(err.to_string().contains("10.0.0.5:2375"));
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn test_shared_error_is_transparent() {
    let result: Result<()> = Err(SwirlError::Shared(Arc::new(SwirlError::ConfigError(
        "bad".to_string(),
    ))));
    assert_eq!(result.unwrap_err().to_string(), "Configuration error: bad");
}

#[test]
fn test_version_const() {
    assert!(!swirl::VERSION.is_empty());
}
