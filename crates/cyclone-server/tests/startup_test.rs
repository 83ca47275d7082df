//! Startup behavior: the service refuses to start without a model.

use cyclone_server::config::Config;
use cyclone_server::state::AppState;

fn temp_path(name: &str) -> String {
    std::env::temp_dir()
        .join(format!("cyclone-test-{}-{}", uuid::Uuid::new_v4(), name))
        .to_string_lossy()
        .to_string()
}

#[test]
fn missing_model_is_fatal() {
    let mut config = Config::from_env();
    config.model_path = temp_path("missing.json");

    let err = AppState::from_config(config).err().expect("startup should fail");
    assert!(err.to_string().contains("Could not load model file"));
}

#[test]
fn invalid_model_is_fatal() {
    let mut config = Config::from_env();
    config.model_path = temp_path("bad.json");
    std::fs::write(&config.model_path, r#"{"format_version": 1, "labels": [], "estimator": {"type": "random_forest", "trees": []}}"#)
        .unwrap();

    assert!(AppState::from_config(config.clone()).is_err());
    let _ = std::fs::remove_file(&config.model_path);
}

#[test]
fn missing_tracks_are_not_fatal() {
    let mut config = Config::from_env();
    config.model_path = temp_path("model.json");
    config.tracks_path = temp_path("tracks.zip");
    std::fs::write(
        &config.model_path,
        r#"{
            "format_version": 1,
            "labels": ["safe", "cyclone"],
            "estimator": {
                "type": "logistic",
                "coefficients": [[0.0, 0.0, 0.0], [0.0, 0.0, -0.1]],
                "intercepts": [0.0, 98.0]
            }
        }"#,
    )
    .unwrap();

    let state = AppState::from_config(config.clone()).expect("startup");
    assert!(state.tracks.is_empty());
    assert_eq!(state.pipeline.classifier().labels().len(), 2);
    let _ = std::fs::remove_file(&config.model_path);
}

#[test]
fn demo_model_loads() {
    let mut config = Config::from_env();
    config.model_path = format!("{}/../../demos/cyclone_model.json", env!("CARGO_MANIFEST_DIR"));
    config.tracks_path = temp_path("tracks.zip");

    let state = AppState::from_config(config).expect("demo model should load");
    assert_eq!(state.pipeline.classifier().labels().len(), 4);
}
