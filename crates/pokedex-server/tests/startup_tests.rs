//! Startup tests
//!
//! Provisioning failures reach the binary as one anyhow chain.

use pokedex_core::Error;
use pokedex_server::{provision_model, ServerConfig};

#[tokio::test]
async fn test_provisioning_failure_is_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServerConfig::default();
    config.model.url = None;
    config.model.dir = dir.path().to_path_buf();
    config.model.file_name = "resnet34.safetensors".to_string();

    let err = provision_model(&config).await.err().unwrap();

    let report = format!("{:#}", err);
    assert!(report.starts_with("model provisioning failed: "), "{}", report);
    assert_eq!(report.matches("model provisioning failed").count(), 1);
    assert_eq!(report.matches("Model file not found").count(), 1);

    let root = err.root_cause().downcast_ref::<Error>().unwrap();
    assert!(matches!(root, Error::Config(_)));
}

#[tokio::test]
async fn test_invalid_model_config_is_reported() {
    let mut config = ServerConfig::default();
    config.model.file_name = "learner.pkl".to_string();

    let err = provision_model(&config).await.err().unwrap();

    let report = format!("{:#}", err);
    assert!(report.starts_with("invalid model configuration: "), "{}", report);
}
