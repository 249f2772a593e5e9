use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use sched_bridge::{
    ActionCall, Backend, BackendOutcome, BridgeConfig, Credentials, Dispatcher, ErrorKind,
    GetClientsParams, Mode,
};

fn test_credentials() -> Credentials {
    Credentials {
        site_id: -99,
        username: "owner".into(),
        password: "secret".into(),
        api_key: "test-api-key".into(),
        source_name: "TestSource".into(),
        source_password: "source-secret".into(),
    }
}

fn dispatcher(soap: &MockServer, rest: &MockServer) -> Dispatcher {
    let config = BridgeConfig::new(test_credentials())
        .with_soap_base_url(soap.base_url())
        .with_rest_base_url(rest.base_url());
    Dispatcher::new(config)
}

fn clients_envelope() -> String {
    "<soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\">\
     <soap:Body><GetClientsResponse><GetClientsResult>\
     <Status>Success</Status>\
     <Clients><Client><ID>100000123</ID></Client></Clients>\
     </GetClientsResult></GetClientsResponse></soap:Body></soap:Envelope>"
        .to_string()
}

fn mock_token(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST).path("/usertoken/issue");
        then.status(200).json_body(json!({"AccessToken": "tok-123"}));
    });
}

fn get_clients_call() -> ActionCall {
    ActionCall::GetClients(GetClientsParams::default())
}

#[tokio::test]
async fn both_mode_runs_both_backends_and_isolates_failures() {
    let soap = MockServer::start();
    let rest = MockServer::start();

    soap.mock(|when, then| {
        when.method(POST).path("/ClientService.asmx");
        then.status(200).body(clients_envelope());
    });
    mock_token(&rest);
    rest.mock(|when, then| {
        when.method(GET).path("/client/clients");
        then.status(500).json_body(json!({"Error": "exploded"}));
    });

    let comparison = dispatcher(&soap, &rest)
        .dispatch(&get_clients_call(), Mode::Both)
        .await
        .unwrap();

    assert_eq!(comparison.mode, Mode::Both);
    assert_eq!(comparison.per_backend.len(), 2);

    let legacy = &comparison.per_backend[&Backend::Legacy];
    assert!(legacy.is_ok(), "legacy result must survive the rest failure");

    match &comparison.per_backend[&Backend::Rest] {
        BackendOutcome::Error { error, .. } => assert_eq!(error.kind, ErrorKind::Server),
        other => panic!("expected rest failure, got {other:?}"),
    }
}

#[tokio::test]
async fn single_backend_modes_touch_only_their_backend() {
    let soap = MockServer::start();
    let rest = MockServer::start();

    soap.mock(|when, then| {
        when.method(POST).path("/ClientService.asmx");
        then.status(200).body(clients_envelope());
    });
    let rest_mock = rest.mock(|when, then| {
        when.any_request();
        then.status(500);
    });

    let comparison = dispatcher(&soap, &rest)
        .dispatch(&get_clients_call(), Mode::Legacy)
        .await
        .unwrap();

    assert_eq!(comparison.per_backend.len(), 1);
    assert!(comparison.per_backend.contains_key(&Backend::Legacy));
    rest_mock.assert_calls(0);
}

#[tokio::test]
async fn ceiling_timeout_fails_the_whole_invocation() {
    let soap = MockServer::start();
    let rest = MockServer::start();

    soap.mock(|when, then| {
        when.method(POST).path("/ClientService.asmx");
        then.status(200)
            .delay(Duration::from_millis(500))
            .body(clients_envelope());
    });

    let config = BridgeConfig::new(test_credentials())
        .with_soap_base_url(soap.base_url())
        .with_rest_base_url(rest.base_url())
        .with_ceiling_timeout(Duration::from_millis(100));
    let dispatcher = Dispatcher::new(config);

    let err = dispatcher
        .dispatch(&get_clients_call(), Mode::Legacy)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn repeated_dispatches_reuse_the_cached_facade() {
    let soap = MockServer::start();
    let rest = MockServer::start();

    let mock = soap.mock(|when, then| {
        when.method(POST).path("/ClientService.asmx");
        then.status(200).body(clients_envelope());
    });

    let dispatcher = dispatcher(&soap, &rest);
    for _ in 0..3 {
        dispatcher
            .dispatch(&get_clients_call(), Mode::Legacy)
            .await
            .unwrap();
    }
    mock.assert_calls(3);
}

#[tokio::test]
async fn per_call_site_override_binds_a_facade_to_that_site() {
    let soap = MockServer::start();
    let rest = MockServer::start();

    let mock = soap.mock(|when, then| {
        when.method(POST)
            .path("/ClientService.asmx")
            .body_includes("<SiteIDs><int>42</int></SiteIDs>");
        then.status(200).body(clients_envelope());
    });

    let call = ActionCall::GetClients(GetClientsParams {
        email: None,
        site_id: Some(42),
    });
    dispatcher(&soap, &rest)
        .dispatch(&call, Mode::Legacy)
        .await
        .unwrap();
    mock.assert();
}

#[tokio::test]
async fn comparison_echoes_the_request_and_reports_timings() {
    let soap = MockServer::start();
    let rest = MockServer::start();

    soap.mock(|when, then| {
        when.method(POST).path("/ClientService.asmx");
        then.status(200).body(clients_envelope());
    });

    let comparison = dispatcher(&soap, &rest)
        .dispatch(&get_clients_call(), Mode::Legacy)
        .await
        .unwrap();

    let json = serde_json::to_value(&comparison).unwrap();
    assert_eq!(json["action"], "GetClients");
    assert_eq!(json["mode"], "legacy");
    assert!(json["elapsed_ms"].is_u64());
    assert!(json["timestamp"].is_string());
    assert_eq!(
        json["per_backend"]["legacy"]["value"]["type"],
        "clients"
    );
}
