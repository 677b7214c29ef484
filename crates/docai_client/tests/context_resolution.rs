mod common;

use std::time::Duration;

use docai_client::{
    ClientError, ClientSettings, ContextPatch, DocAiClient, EnvironmentAccessor, ErrorKind,
    FnProvider, PlatformAccessor, StaticAccessor, StaticProvider, WikiInfo,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{accepted, succeeded, CountingProvider, RecordingTransport};

async fn mount_auth(server: &MockServer, code: &str, open_id: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/addon/auth"))
        .and(body_json(json!({ "code": code })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "open_id": open_id })))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn document_token_is_cached_after_first_resolution() {
    let server = MockServer::start().await;
    let provider = CountingProvider::new("doccnCustom");
    let client = common::builder(&server)
        .doc_token_provider(provider.clone())
        .build()
        .unwrap();

    let first = client.context().resolve_document_token().await.unwrap();
    let second = client.context().resolve_document_token().await.unwrap();

    assert_eq!(first, "doccnCustom");
    assert_eq!(second, "doccnCustom");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn concurrent_first_resolutions_agree() {
    let server = MockServer::start().await;
    let provider = CountingProvider::with_delay("doccnRace", Duration::from_millis(20));
    let client = common::builder(&server)
        .doc_token_provider(provider.clone())
        .build()
        .unwrap();

    let (a, b) = tokio::join!(
        client.context().resolve_document_token(),
        client.context().resolve_document_token()
    );

    assert_eq!(a.unwrap(), "doccnRace");
    assert_eq!(b.unwrap(), "doccnRace");
    assert!((1..=2).contains(&provider.calls()));
    assert_eq!(
        client.context().snapshot().document_token.get().map(String::as_str),
        Some("doccnRace")
    );
}

#[tokio::test]
async fn identity_is_exchanged_once_and_survives_clear_context() {
    let server = MockServer::start().await;
    mount_auth(&server, "code-1", "ou_1", 1).await;
    let codes = CountingProvider::new("code-1");
    let docs = CountingProvider::new("doccnA");
    let client = common::builder(&server)
        .code_provider(codes.clone())
        .doc_token_provider(docs.clone())
        .build()
        .unwrap();

    assert_eq!(client.context().resolve_user_identity().await.unwrap(), "ou_1");
    client.context().resolve_document_token().await.unwrap();

    client.clear_context();

    assert_eq!(client.context().resolve_user_identity().await.unwrap(), "ou_1");
    assert_eq!(codes.calls(), 1);
    assert!(!client.context().snapshot().document_token.is_resolved());

    client.context().resolve_document_token().await.unwrap();
    assert_eq!(docs.calls(), 2);
}

#[tokio::test]
async fn set_context_bypasses_lazy_resolution() {
    let server = MockServer::start().await;
    let docs = CountingProvider::new("doccnLazy");
    let client = common::builder(&server)
        .doc_token_provider(docs.clone())
        .build()
        .unwrap();

    client
        .context()
        .set_context(ContextPatch::new().document_token("doccnManual").wiki_node_token("wikcnManual"))
        .set_context(ContextPatch::new().wiki_space_id("7001"));

    assert_eq!(client.context().resolve_document_token().await.unwrap(), "doccnManual");
    assert_eq!(
        client.context().wiki(),
        WikiInfo::new(Some("wikcnManual".into()), Some("7001".into()))
    );
    assert_eq!(docs.calls(), 0);
}

#[tokio::test]
async fn platform_accessor_supplies_token_and_wiki() {
    let server = MockServer::start().await;
    let client = common::builder(&server)
        .platform(
            StaticAccessor::new()
                .document_token("wikcnNode")
                .wiki(WikiInfo::new(Some("wikcnNode".into()), Some("7001".into()))),
        )
        .build()
        .unwrap();

    assert_eq!(client.context().resolve_document_token().await.unwrap(), "wikcnNode");
    let cache = client.context().snapshot();
    assert_eq!(cache.wiki_node_token.as_deref(), Some("wikcnNode"));
    assert_eq!(cache.wiki_space_id.as_deref(), Some("7001"));
}

struct FlakyWiki;

#[async_trait::async_trait]
impl PlatformAccessor for FlakyWiki {
    async fn current_document_token(&self) -> Result<Option<String>, ClientError> {
        Ok(Some("doccnA".to_string()))
    }

    async fn wiki_info(&self) -> Result<Option<WikiInfo>, ClientError> {
        Err(ClientError::Configuration("wiki api unavailable".into()))
    }

    async fn login_code(&self) -> Result<Option<String>, ClientError> {
        Ok(None)
    }
}

#[tokio::test]
async fn failed_wiki_lookup_does_not_fail_token_resolution() {
    let server = MockServer::start().await;
    let client = common::builder(&server).platform(FlakyWiki).build().unwrap();

    assert_eq!(client.context().resolve_document_token().await.unwrap(), "doccnA");
    assert!(client.context().wiki().is_empty());
}

#[tokio::test]
async fn wiki_provider_runs_alongside_custom_token_provider() {
    let server = MockServer::start().await;
    let client = common::builder(&server)
        .doc_token_provider(StaticProvider::new("wikcnNode".to_string()))
        .wiki_info_provider(FnProvider::new(|| async {
            Ok(WikiInfo::new(Some("wikcnNode".into()), Some("7002".into())))
        }))
        .build()
        .unwrap();

    client.context().resolve_document_token().await.unwrap();
    assert_eq!(client.context().wiki().space_id.as_deref(), Some("7002"));
}

#[tokio::test]
async fn missing_sources_are_configuration_errors() {
    let server = MockServer::start().await;
    let client = common::builder(&server).build().unwrap();

    let token_err = client.context().resolve_document_token().await.unwrap_err();
    let identity_err = client.context().resolve_user_identity().await.unwrap_err();

    assert_eq!(token_err.kind(), ErrorKind::Configuration);
    assert_eq!(identity_err.kind(), ErrorKind::Configuration);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_resolutions_are_configuration_errors() {
    let server = MockServer::start().await;
    let client = common::builder(&server)
        .doc_token_provider(StaticProvider::new(String::new()))
        .platform(StaticAccessor::new().login_code(""))
        .build()
        .unwrap();

    let token_err = client.context().resolve_document_token().await.unwrap_err();
    let identity_err = client.context().resolve_user_identity().await.unwrap_err();

    assert_eq!(token_err.kind(), ErrorKind::Configuration);
    assert_eq!(identity_err.kind(), ErrorKind::Configuration);
    assert!(!client.context().snapshot().document_token.is_resolved());
}

#[tokio::test]
async fn failed_token_resolution_caches_no_wiki_coordinates() {
    let server = MockServer::start().await;
    let client = common::builder(&server)
        .doc_token_provider(StaticProvider::new(String::new()))
        .wiki_info_provider(StaticProvider::new(WikiInfo::new(
            Some("wikcnStale".into()),
            Some("9".into()),
        )))
        .build()
        .unwrap();

    let err = client.context().resolve_document_token().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(client.context().wiki().is_empty());
    assert!(!client.context().snapshot().document_token.is_resolved());
}

#[tokio::test]
async fn lookup_finishing_after_document_switch_is_discarded() {
    let server = MockServer::start().await;
    let docs = CountingProvider::with_delay("doccnOld", Duration::from_millis(50));
    let client = common::builder(&server)
        .doc_token_provider(docs.clone())
        .build()
        .unwrap();

    let (resolved, ()) = tokio::join!(client.context().resolve_document_token(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        client
            .clear_context()
            .set_context(ContextPatch::new().document_token("doccnNew"));
    });

    assert_eq!(resolved.unwrap(), "doccnNew");
    assert_eq!(client.context().resolve_document_token().await.unwrap(), "doccnNew");
    assert_eq!(docs.calls(), 1);
}

#[tokio::test]
async fn lookup_interrupted_by_clear_resolves_again() {
    let server = MockServer::start().await;
    let docs = CountingProvider::with_delay("doccnA", Duration::from_millis(50));
    let client = common::builder(&server)
        .doc_token_provider(docs.clone())
        .build()
        .unwrap();

    let (resolved, ()) = tokio::join!(client.context().resolve_document_token(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        client.clear_context();
    });

    assert_eq!(resolved.unwrap(), "doccnA");
    assert_eq!(docs.calls(), 2);
    assert!(client.context().snapshot().document_token.is_resolved());
}

#[tokio::test]
async fn identity_exchange_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/addon/auth"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad code"))
        .mount(&server)
        .await;
    let client = common::builder(&server)
        .code_provider(StaticProvider::new("expired".to_string()))
        .build()
        .unwrap();

    let err = client.context().resolve_user_identity().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(!client.context().snapshot().user_identity.is_resolved());
}

#[tokio::test]
async fn environment_accessor_reads_prefixed_variables() {
    std::env::set_var("DOCAI_ENVTEST_DOC_TOKEN", "doccnEnv");
    std::env::set_var("DOCAI_ENVTEST_WIKI_SPACE_ID", "7003");
    std::env::set_var("DOCAI_ENVTEST_LOGIN_CODE", "code-env");
    let accessor = EnvironmentAccessor::with_prefix("DOCAI_ENVTEST");

    assert_eq!(accessor.current_document_token().await.unwrap().as_deref(), Some("doccnEnv"));
    assert_eq!(accessor.login_code().await.unwrap().as_deref(), Some("code-env"));
    assert_eq!(
        accessor.wiki_info().await.unwrap(),
        Some(WikiInfo::new(None, Some("7003".into())))
    );
    assert_eq!(
        EnvironmentAccessor::with_prefix("DOCAI_ENVTEST_UNSET")
            .current_document_token()
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn process_without_token_source_makes_no_http_call() {
    let transport = RecordingTransport::new();
    let client = DocAiClient::builder(ClientSettings::default())
        .transport(transport.clone())
        .build()
        .unwrap();

    let err = client.process("idea_expand", Some("draft idea")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn process_resolves_context_and_extracts_outcome() {
    let server = MockServer::start().await;
    mount_auth(&server, "code-1", "ou_1", 1).await;
    Mock::given(method("POST"))
        .and(path("/api/addon/process"))
        .and(body_json(json!({
            "token": "doxcnA",
            "user_id": "ou_1",
            "mode": "idea_expand",
            "content": "draft idea",
            "trigger_source": "docs_addon"
        })))
        .respond_with(accepted("t1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/addon/tasks/t1"))
        .respond_with(succeeded(
            "t1",
            json!({ "child_doc_url": "https://x/doc1", "child_doc_token": "doc1" }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::builder(&server)
        .doc_token_provider(StaticProvider::new("doxcnA".to_string()))
        .code_provider(StaticProvider::new("code-1".to_string()))
        .build()
        .unwrap();

    let outcome = client.idea_expand(Some("draft idea")).await.unwrap();

    assert_eq!(outcome.child_doc_url.as_deref(), Some("https://x/doc1"));
    assert_eq!(outcome.child_doc_token.as_deref(), Some("doc1"));
    assert_eq!(outcome.error, None);
    assert!(outcome.succeeded());
}

#[tokio::test]
async fn repeated_calls_reuse_resolved_context() {
    let server = MockServer::start().await;
    mount_auth(&server, "code-1", "ou_1", 1).await;
    Mock::given(method("POST"))
        .and(path("/api/addon/process"))
        .respond_with(accepted("t1"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/addon/tasks/t1"))
        .respond_with(succeeded("t1", json!({})))
        .mount(&server)
        .await;

    let docs = CountingProvider::new("doxcnA");
    let codes = CountingProvider::new("code-1");
    let client = common::builder(&server)
        .doc_token_provider(docs.clone())
        .code_provider(codes.clone())
        .build()
        .unwrap();

    client.research(None).await.unwrap();
    client.process("summarize", Some("fragment")).await.unwrap();

    assert_eq!(docs.calls(), 1);
    assert_eq!(codes.calls(), 1);
}

#[tokio::test]
async fn process_sends_cached_wiki_coordinates() {
    let server = MockServer::start().await;
    mount_auth(&server, "code-1", "ou_1", 1).await;
    Mock::given(method("POST"))
        .and(path("/api/addon/process"))
        .and(body_json(json!({
            "token": "wikcnNode",
            "user_id": "ou_1",
            "mode": "research",
            "trigger_source": "docs_addon",
            "wiki_node_token": "wikcnNode",
            "wiki_space_id": "7001"
        })))
        .respond_with(accepted("t1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/addon/tasks/t1"))
        .respond_with(succeeded("t1", json!({ "container_url": "https://x/space" })))
        .mount(&server)
        .await;

    let client = common::builder(&server)
        .platform(
            StaticAccessor::new()
                .document_token("wikcnNode")
                .wiki(WikiInfo::new(Some("wikcnNode".into()), Some("7001".into())))
                .login_code("code-1"),
        )
        .build()
        .unwrap();

    let outcome = client.research(Some("")).await.unwrap();
    assert_eq!(outcome.container_url.as_deref(), Some("https://x/space"));
}

#[tokio::test]
async fn save_posts_note_and_returns_links() {
    let server = MockServer::start().await;
    mount_auth(&server, "code-1", "ou_1", 1).await;
    Mock::given(method("POST"))
        .and(path("/api/addon/save"))
        .and(body_json(json!({
            "content": "meeting notes",
            "title": "Notes",
            "token": "doxcnA",
            "user_id": "ou_1"
        })))
        .respond_with(accepted("s1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/addon/tasks/s1"))
        .respond_with(succeeded(
            "s1",
            json!({
                "child_doc_url": "https://x/note",
                "child_doc_token": "note1",
                "container_token": "fld1"
            }),
        ))
        .mount(&server)
        .await;

    let client = common::builder(&server)
        .doc_token_provider(StaticProvider::new("doxcnA".to_string()))
        .code_provider(StaticProvider::new("code-1".to_string()))
        .build()
        .unwrap();

    let outcome = client.save("meeting notes", Some("Notes")).await.unwrap();

    assert!(outcome.succeeded());
    assert_eq!(outcome.task_id, "s1");
    assert_eq!(outcome.child_doc_url.as_deref(), Some("https://x/note"));
    assert_eq!(outcome.child_doc_token.as_deref(), Some("note1"));
    assert_eq!(outcome.container_url, None);
    assert_eq!(outcome.error, None);
}
