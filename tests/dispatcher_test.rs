//! Dispatcher behavior against a scripted transport: policy membership,
//! failure taxonomy, and the typed client operations.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use repohub::client::{FailureKind, Outcome, RepoClient, Transport, TransportError};
use repohub::codec::{EntityCodec, Variant};
use repohub::message::{Method, Request, Response};
use repohub::resources::models::{
    AuthenticationLogin, Repository, RepositoryStatus, LOCAL_STATUS_IN_SERVICE,
};

/// Transport that replays scripted results and records every request.
struct MockTransport {
    responses: Mutex<VecDeque<Result<Response, TransportError>>>,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    fn scripted(
        responses: impl IntoIterator<Item = Result<Response, TransportError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn recorded(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Failed("no scripted response".to_string())))
    }
}

fn xml_response(status: u16, body: String) -> Response {
    Response::with_body(status, Variant::Xml, body)
}

fn two_repositories() -> Vec<Repository> {
    vec![
        Repository {
            id: "central".to_string(),
            name: "Central".to_string(),
            repo_type: Some("proxy".to_string()),
            resource_uri: Some("repositories/central".to_string()),
            model_encoding: None,
        },
        Repository {
            id: "releases".to_string(),
            name: "Releases".to_string(),
            repo_type: Some("hosted".to_string()),
            resource_uri: Some("repositories/releases".to_string()),
            model_encoding: None,
        },
    ]
}

#[tokio::test]
async fn list_repositories_parses_two_element_body() {
    let codec = EntityCodec::new();
    let body = codec
        .serialize_list("repositories", &two_repositories(), Variant::Xml)
        .unwrap();
    let transport = MockTransport::scripted([Ok(xml_response(200, body))]);
    let client = RepoClient::new(transport.clone(), Variant::Xml);

    let outcome = client.list_repositories().outcome().await;

    match outcome {
        Outcome::Success { response, entity } => {
            assert_eq!(response.status, 200);
            assert_eq!(entity.len(), 2);
            assert_eq!(entity[0].id, "central");
            assert_eq!(entity[1].name, "Releases");
        }
        Outcome::Failure(failure) => panic!("expected success, got {failure:?}"),
    }

    let recorded = transport.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].method(), Method::Get);
    assert_eq!(recorded[0].path(), "repositories/");
    assert_eq!(recorded[0].headers().get("Accept"), Some("application/xml"));
}

#[tokio::test]
async fn accepted_status_is_success_when_policy_admits_it() {
    let codec = EntityCodec::new();
    let statuses = vec![RepositoryStatus {
        id: "central".to_string(),
        local_status: LOCAL_STATUS_IN_SERVICE.to_string(),
        remote_status: Some("checking".to_string()),
        model_encoding: None,
    }];
    let body = codec
        .serialize_list("repository-statuses", &statuses, Variant::Xml)
        .unwrap();
    let transport = MockTransport::scripted([Ok(xml_response(202, body))]);
    let client = RepoClient::new(transport.clone(), Variant::Xml);

    // repository_statuses runs under {200, 202}.
    let outcome = client.repository_statuses(true).outcome().await;
    assert!(outcome.is_success());
    assert_eq!(outcome.entity().unwrap().len(), 1);

    let recorded = transport.recorded();
    assert_eq!(recorded[0].path(), "repository_statuses");
    assert!(recorded[0].has_query_flag("forceCheck"));
}

#[tokio::test]
async fn status_outside_policy_is_failure_even_when_2xx() {
    // 201 is not a member of {200, 202}: membership is exact.
    let transport = MockTransport::scripted([Ok(xml_response(201, String::new()))]);
    let client = RepoClient::new(transport, Variant::Xml);

    let outcome = client.repository_statuses(false).outcome().await;
    let failure = outcome.failure().expect("201 must not be success");
    assert_eq!(failure.kind(), FailureKind::PolicyMismatch);
    assert_eq!(failure.response.as_ref().unwrap().status, 201);
    assert!(failure.cause.is_none());
}

#[tokio::test]
async fn delete_with_default_policy_rejects_accepted() {
    // Default policy is {200}; a 202 comes back as a policy mismatch with
    // the response attached and no cause, and the body is never parsed.
    let transport = MockTransport::scripted([Ok(Response::new(202))]);
    let client = RepoClient::new(transport.clone(), Variant::Xml);

    let outcome = client.clear_repository_cache("r1").outcome().await;
    let failure = outcome.failure().expect("202 outside default policy");
    assert_eq!(failure.kind(), FailureKind::PolicyMismatch);
    assert!(failure.cause.is_none());
    assert_eq!(failure.response.as_ref().unwrap().status, 202);

    let recorded = transport.recorded();
    assert_eq!(recorded[0].method(), Method::Delete);
    assert_eq!(recorded[0].path(), "data_cache/repositories/r1/content");
}

#[tokio::test]
async fn transport_error_surfaces_without_response() {
    let transport = MockTransport::scripted([Err(TransportError::Timeout)]);
    let client = RepoClient::new(transport, Variant::Xml);

    let outcome = client.list_repositories().outcome().await;
    let failure = outcome.failure().expect("transport failed");
    assert_eq!(failure.kind(), FailureKind::Transport);
    assert!(failure.response.is_none());
    assert!(failure.cause.is_some());
}

#[tokio::test]
async fn entity_strategy_error_becomes_decode_failure_with_response() {
    // Accepted status, unparseable body: the strategy error must surface,
    // never be swallowed, and the response stays attached.
    let transport = MockTransport::scripted([Ok(xml_response(200, "<broken".to_string()))]);
    let client = RepoClient::new(transport, Variant::Xml);

    let outcome = client.list_repositories().outcome().await;
    let failure = outcome.failure().expect("decode must fail");
    assert_eq!(failure.kind(), FailureKind::Decode);
    assert_eq!(failure.response.as_ref().unwrap().status, 200);
    assert!(failure.cause.is_some());
}

#[tokio::test]
async fn login_attaches_basic_header_once_and_extracts_token() {
    let codec = EntityCodec::new();
    let body = codec
        .serialize(
            &AuthenticationLogin {
                auth_token: "granted-token".to_string(),
                model_encoding: None,
            },
            Variant::Xml,
        )
        .unwrap();
    let transport = MockTransport::scripted([Ok(xml_response(200, body))]);
    // Client default is JSON here; login must still go out as XML.
    let client = RepoClient::new(transport.clone(), Variant::Json);

    let outcome = client.login("u", "p").outcome().await;
    let session = outcome.into_result().expect("login should succeed");
    assert_eq!(session.token, "granted-token");

    let recorded = transport.recorded();
    assert_eq!(recorded.len(), 1);
    let request = &recorded[0];
    assert_eq!(request.path(), "authentication/login");
    assert_eq!(request.headers().count("Authorization"), 1);
    assert_eq!(request.headers().get("Authorization"), Some("Basic dTpw"));
    assert_eq!(request.headers().get("Accept"), Some("application/xml"));
}

#[tokio::test]
async fn update_status_round_trips_entity_under_accepted() {
    let codec = EntityCodec::new();
    let status = RepositoryStatus {
        id: "central".to_string(),
        local_status: LOCAL_STATUS_IN_SERVICE.to_string(),
        remote_status: Some("checking".to_string()),
        model_encoding: None,
    };
    let body = codec.serialize(&status, Variant::Xml).unwrap();
    let transport = MockTransport::scripted([Ok(xml_response(202, body))]);
    let client = RepoClient::new(transport.clone(), Variant::Xml);

    let outcome = client
        .update_repository_status(&status)
        .expect("serializable status")
        .outcome()
        .await;
    let entity = outcome.into_result().expect("202 is in the policy");
    assert_eq!(entity.id, "central");

    let recorded = transport.recorded();
    assert_eq!(recorded[0].method(), Method::Put);
    assert_eq!(recorded[0].path(), "repositories/central/status");
    assert!(recorded[0].body().is_some());
}

#[tokio::test]
async fn dispatch_counters_track_calls_and_failures() {
    let transport = MockTransport::scripted([
        Err(TransportError::Timeout),
        Ok(Response::new(200)),
    ]);
    let client = RepoClient::new(transport, Variant::Xml);

    assert!(client.list_repositories().outcome().await.failure().is_some());
    assert!(client.logout().outcome().await.is_success());

    let snapshot = client.metrics().snapshot();
    assert_eq!(snapshot.dispatches, 2);
    assert_eq!(snapshot.dispatch_failures, 1);
}

#[tokio::test]
async fn concurrent_calls_each_resolve_exactly_once() {
    let transport = MockTransport::scripted([
        Ok(Response::new(200)),
        Ok(Response::new(200)),
    ]);
    let client = RepoClient::new(transport.clone(), Variant::Xml);

    let first = client.reindex_repository("a");
    let second = client.rebuild_repository_attributes("b");

    // Both pending calls resolve, independently, with one outcome each.
    let (first, second) = tokio::join!(first.outcome(), second.outcome());
    assert!(first.is_success());
    assert!(second.is_success());
    assert_eq!(transport.recorded().len(), 2);
}
