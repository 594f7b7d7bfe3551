//! End-to-end tests: publish to a mocked hub, load back, and verify the
//! offline fallback and custom-class paths.

use std::collections::BTreeMap;

use quarry_extract::{
    register_for_auto_class, AutoFeatureExtractor, ExtractError, ExtractResult, ExtractorConfig,
    FeatureExtractor, SequenceFeatureExtractor, TrustRemoteCode, EXTRACTOR_TYPE_KEY,
};
use quarry_hub::{HubClient, HubConfig, RepoGuard, RepoId};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn hub_config(mock_server: &MockServer, temp_dir: &TempDir) -> HubConfig {
    HubConfig {
        url: mock_server.uri(),
        token: Some("test-token".to_string()),
        cache_dir: Some(temp_dir.path().join("cache")),
        max_retries: 0,
        ..Default::default()
    }
}

async fn mount_publish_mocks(mock_server: &MockServer, owner: &str, name: &str) {
    Mock::given(method("POST"))
        .and(path("/repos/create"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "owner": owner,
            "name": name,
        })))
        .mount(mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!(
            "/repos/{}/{}/upload/extractor_config.json",
            owner, name
        )))
        .respond_with(ResponseTemplate::new(200))
        .mount(mock_server)
        .await;
}

/// The body of the configuration upload the mock hub received.
async fn uploaded_config(mock_server: &MockServer) -> ExtractorConfig {
    let requests = mock_server
        .received_requests()
        .await
        .expect("request recording enabled");
    let upload = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .expect("no upload request received");
    let body = String::from_utf8(upload.body.clone()).expect("upload body not utf-8");
    ExtractorConfig::from_json_str(&body).expect("upload body not a valid configuration")
}

/// Re-serve a previously uploaded configuration on the resolve endpoint.
async fn mount_resolve(mock_server: &MockServer, owner: &str, name: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/repos/{}/{}/resolve/extractor_config.json",
            owner, name
        )))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_push_and_load_roundtrip() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let hub = hub_config(&mock_server, &temp_dir);
    let repo = RepoId::parse("alice/test-extractor")?;

    mount_publish_mocks(&mock_server, "alice", "test-extractor").await;

    let extractor = SequenceFeatureExtractor {
        feature_size: 80,
        sampling_rate: 22_050,
        padding_value: -1.0,
        do_normalize: false,
        return_attention_mask: true,
        ..Default::default()
    };
    extractor.push_to_hub(&repo, &hub).await?;

    let published = uploaded_config(&mock_server).await;
    assert!(extractor.to_config().fields_subset_of(&published));

    mount_resolve(
        &mock_server,
        "alice",
        "test-extractor",
        &published.to_json_string()?,
    )
    .await;

    let loaded = SequenceFeatureExtractor::from_pretrained("alice/test-extractor", &hub).await?;
    assert!(extractor.to_config().fields_subset_of(&loaded.to_config()));
    assert_eq!(loaded, extractor);
    Ok(())
}

#[tokio::test]
async fn test_push_under_organization_namespace() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let hub = hub_config(&mock_server, &temp_dir);
    let repo = RepoId::parse("valid-org/test-extractor-org")?;

    mount_publish_mocks(&mock_server, "valid-org", "test-extractor-org").await;

    let extractor = SequenceFeatureExtractor::default();
    extractor.push_to_hub(&repo, &hub).await?;

    let published = uploaded_config(&mock_server).await;
    mount_resolve(
        &mock_server,
        "valid-org",
        "test-extractor-org",
        &published.to_json_string()?,
    )
    .await;

    let loaded =
        SequenceFeatureExtractor::from_pretrained("valid-org/test-extractor-org", &hub).await?;
    assert!(extractor.to_config().fields_subset_of(&loaded.to_config()));
    assert_eq!(loaded, extractor);
    Ok(())
}

#[tokio::test]
async fn test_save_pretrained_with_push_under_organization_namespace() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let hub = hub_config(&mock_server, &temp_dir);
    let repo = RepoId::parse("valid-org/test-extractor-org")?;
    let save_dir = temp_dir.path().join("saved-org");

    mount_publish_mocks(&mock_server, "valid-org", "test-extractor-org").await;

    let extractor = SequenceFeatureExtractor {
        sampling_rate: 44_100,
        ..Default::default()
    };
    extractor
        .save_pretrained_with_push(&save_dir, &repo, &hub)
        .await?;

    let published = uploaded_config(&mock_server).await;
    assert!(extractor.to_config().fields_subset_of(&published));

    mount_resolve(
        &mock_server,
        "valid-org",
        "test-extractor-org",
        &published.to_json_string()?,
    )
    .await;

    let loaded =
        SequenceFeatureExtractor::from_pretrained("valid-org/test-extractor-org", &hub).await?;
    assert!(extractor.to_config().fields_subset_of(&loaded.to_config()));
    assert_eq!(loaded, extractor);
    Ok(())
}

#[tokio::test]
async fn test_save_pretrained_with_push() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let hub = hub_config(&mock_server, &temp_dir);
    let repo = RepoId::parse("alice/test-extractor")?;
    let save_dir = temp_dir.path().join("saved");

    mount_publish_mocks(&mock_server, "alice", "test-extractor").await;

    let extractor = SequenceFeatureExtractor {
        sampling_rate: 8_000,
        ..Default::default()
    };
    extractor
        .save_pretrained_with_push(&save_dir, &repo, &hub)
        .await?;

    // Saved locally and uploaded with identical content.
    let local = SequenceFeatureExtractor::from_pretrained(
        save_dir.to_str().expect("utf-8 path"),
        &hub,
    )
    .await?;
    assert_eq!(local, extractor);

    let published = uploaded_config(&mock_server).await;
    assert!(extractor.to_config().fields_subset_of(&published));
    assert_eq!(published, extractor.to_config());
    Ok(())
}

#[tokio::test]
async fn test_from_pretrained_falls_back_to_cache_when_hub_is_down() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let hub = hub_config(&mock_server, &temp_dir);

    let extractor = SequenceFeatureExtractor {
        feature_size: 42,
        ..Default::default()
    };
    let body = extractor.to_config().to_json_string().unwrap();

    // First load succeeds; the entry expires immediately so the second
    // load must go back to the network.
    let ok_mock = Mock::given(method("GET"))
        .and(path("/repos/alice/tiny/resolve/extractor_config.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("cache-control", "max-age=0"),
        )
        .expect(1)
        .mount_as_scoped(&mock_server)
        .await;

    let first = SequenceFeatureExtractor::from_pretrained("alice/tiny", &hub)
        .await
        .expect("first load failed");
    assert_eq!(first, extractor);

    drop(ok_mock);

    // The hub now returns 500 for everything; the cached copy is served.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let second = SequenceFeatureExtractor::from_pretrained("alice/tiny", &hub)
        .await
        .expect("fallback load failed");
    assert_eq!(second, first);
}

// ==================== Custom class publishing ====================

#[derive(Debug, Clone, PartialEq)]
struct CustomFeatureExtractor {
    inner: SequenceFeatureExtractor,
}

impl CustomFeatureExtractor {
    fn from_config(config: &ExtractorConfig) -> ExtractResult<Box<dyn FeatureExtractor>> {
        Ok(Box::new(Self {
            inner: SequenceFeatureExtractor::from_config(config)?,
        }))
    }
}

impl FeatureExtractor for CustomFeatureExtractor {
    fn type_name(&self) -> &str {
        "CustomFeatureExtractor"
    }

    fn to_config(&self) -> ExtractorConfig {
        let mut config = self.inner.to_config();
        config.set(
            EXTRACTOR_TYPE_KEY,
            serde_json::Value::String(self.type_name().to_string()),
        );
        config
    }
}

fn register_custom() {
    register_for_auto_class(
        "CustomFeatureExtractor",
        "custom_feature_extraction.CustomFeatureExtractor",
        CustomFeatureExtractor::from_config,
    );
}

#[tokio::test]
async fn test_push_custom_class_stamps_auto_map() {
    register_custom();

    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let hub = hub_config(&mock_server, &temp_dir);
    let repo = RepoId::parse("alice/test-dynamic-extractor").unwrap();

    mount_publish_mocks(&mock_server, "alice", "test-dynamic-extractor").await;

    let extractor = CustomFeatureExtractor {
        inner: SequenceFeatureExtractor::default(),
    };
    quarry_extract::push_extractor(&extractor, &repo, &hub)
        .await
        .expect("push failed");

    let published = uploaded_config(&mock_server).await;

    let mut expected = BTreeMap::new();
    expected.insert(
        "AutoFeatureExtractor".to_string(),
        "custom_feature_extraction.CustomFeatureExtractor".to_string(),
    );
    assert_eq!(published.auto_map(), Some(expected));
    assert_eq!(published.extractor_type(), Some("CustomFeatureExtractor"));
}

#[tokio::test]
async fn test_load_custom_class_requires_trust() {
    register_custom();

    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let hub = hub_config(&mock_server, &temp_dir);

    let extractor = CustomFeatureExtractor {
        inner: SequenceFeatureExtractor::default(),
    };
    let body = quarry_extract::publishable_config(&extractor)
        .to_json_string()
        .unwrap();
    mount_resolve(&mock_server, "alice", "test-dynamic-extractor", &body).await;

    // Default: refuse to resolve the custom class.
    let denied = AutoFeatureExtractor::from_pretrained(
        "alice/test-dynamic-extractor",
        &hub,
        TrustRemoteCode::Deny,
    )
    .await;
    assert!(matches!(
        denied,
        Err(ExtractError::UntrustedRemoteCode { .. })
    ));

    // Opted in: resolves through the registry to the custom class.
    let loaded = AutoFeatureExtractor::from_pretrained(
        "alice/test-dynamic-extractor",
        &hub,
        TrustRemoteCode::Allow,
    )
    .await
    .expect("trusted load failed");
    assert_eq!(loaded.type_name(), "CustomFeatureExtractor");
}

#[tokio::test]
async fn test_repo_guard_cleans_up_after_push() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let hub = hub_config(&mock_server, &temp_dir);
    let repo = RepoId::parse("alice/scratch").unwrap();

    mount_publish_mocks(&mock_server, "alice", "scratch").await;

    Mock::given(method("DELETE"))
        .and(path("/repos/alice/scratch"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HubClient::new(hub.clone()).unwrap();
    let guard = RepoGuard::new(client, repo.clone());

    let extractor = SequenceFeatureExtractor::default();
    extractor.push_to_hub(&repo, &hub).await.expect("push failed");

    // Explicit teardown; must not surface any error.
    guard.cleanup().await;
}
