use spyglass::kernel::{ActivityId, Payload};
use spyglass::network::{
    Direction, FailureInfo, Headers, HttpUpdate, LifecycleRegistry, LifecycleStage, NetworkRecord, NetworkType,
    RegistryError, ResponseInfo, SocketEvent, SocketState,
};

fn open(registry: &mut LifecycleRegistry, id: &ActivityId) {
    registry
        .apply(
            id,
            HttpUpdate::Open {
                kind: NetworkType::Xhr,
                method: "GET".to_string(),
                url: "https://example.com/".to_string(),
            },
        )
        .unwrap();
}

fn header(name: &str, value: &str) -> HttpUpdate {
    HttpUpdate::RequestHeader {
        name: name.to_string(),
        value: value.to_string(),
    }
}

#[test]
fn test_header_names_are_case_insensitive() {
    let mut registry = LifecycleRegistry::new();
    let id = ActivityId::from("req-1");
    open(&mut registry, &id);

    registry.apply(&id, header("x-trace", "first")).unwrap();
    let record = registry.apply(&id, header("X-Trace", "second")).unwrap();

    assert_eq!(record.request_headers.len(), 1, "Same name in another case replaces");
    assert_eq!(record.request_headers.get("X-TRACE"), Some("second"));
    let names: Vec<&str> = record.request_headers.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["X-Trace"], "Latest spelling wins");
}

#[test]
fn test_header_after_send_is_kept() {
    let mut registry = LifecycleRegistry::new();
    let id = ActivityId::from("req-2");
    open(&mut registry, &id);
    registry.apply(&id, HttpUpdate::Send { body: None }).unwrap();

    let record = registry.apply(&id, header("X-Late", "1")).unwrap();

    assert_eq!(record.stage, LifecycleStage::Sent, "Header never moves the stage back");
    assert_eq!(record.request_headers.get("x-late"), Some("1"));
}

#[test]
fn test_absent_values_never_clear_known_ones() {
    let mut registry = LifecycleRegistry::new();
    let id = ActivityId::from("req-3");
    open(&mut registry, &id);
    registry
        .apply(
            &id,
            HttpUpdate::Send {
                body: Some(Payload::Text("payload".to_string())),
            },
        )
        .unwrap();
    registry
        .apply(
            &id,
            HttpUpdate::HeadersReceived {
                content_type: Some("text/plain".to_string()),
                size: Some(7),
                headers: "content-type: text/plain\r\n".to_string(),
            },
        )
        .unwrap();

    // A second send without body, and a headers event without details
    registry.apply(&id, HttpUpdate::Send { body: None }).unwrap();
    let record = registry
        .apply(
            &id,
            HttpUpdate::HeadersReceived {
                content_type: None,
                size: None,
                headers: String::new(),
            },
        )
        .unwrap();

    assert_eq!(record.body, Some(Payload::Text("payload".to_string())));
    assert_eq!(record.response_content_type.as_deref(), Some("text/plain"));
    assert_eq!(record.response_size, Some(7));
    assert_eq!(record.stage, LifecycleStage::HeadersReceived);
}

#[test]
fn test_terminal_record_rejects_updates() {
    let mut registry = LifecycleRegistry::new();
    let id = ActivityId::from("req-4");
    open(&mut registry, &id);

    let done = registry
        .apply(
            &id,
            HttpUpdate::Response(ResponseInfo {
                status: Some(500),
                duration: Some(42),
                ..ResponseInfo::default()
            }),
        )
        .unwrap();
    assert_eq!(done.stage, LifecycleStage::Completed);
    assert_eq!(done.duration, Some(42), "Reported duration wins");

    let late = registry.apply(
        &id,
        HttpUpdate::Failure(FailureInfo {
            reason: "late".to_string(),
            timed_out: false,
            timeout: None,
            duration: None,
        }),
    );
    assert_eq!(late, Err(RegistryError::Terminal(id.clone())));

    let record = registry.request(&id).unwrap();
    assert_eq!(record.error, None);
    assert_eq!(record.status, Some(500));
}

#[test]
fn test_first_event_of_any_kind_creates_record() {
    let mut registry = LifecycleRegistry::new();
    let id = ActivityId::from("req-5");

    let record = registry.apply(&id, HttpUpdate::Send { body: None }).unwrap();

    assert_eq!(record.stage, LifecycleStage::Sent);
    assert_eq!(record.url, None);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_duration_falls_back_to_elapsed_since_open() {
    let mut registry = LifecycleRegistry::new();
    let id = ActivityId::from("req-6");
    open(&mut registry, &id);

    let record = registry
        .apply(&id, HttpUpdate::Response(ResponseInfo::default()))
        .unwrap();

    assert!(record.duration.is_some(), "Computed from the open instant");
}

#[test]
fn test_clear_forgets_everything() {
    let mut registry = LifecycleRegistry::new();
    open(&mut registry, &ActivityId::from("a"));
    registry
        .apply_socket(
            &ActivityId::from("ws"),
            SocketEvent::Connect {
                url: "wss://example.com".to_string(),
                protocols: Vec::new(),
            },
        )
        .unwrap();
    assert_eq!(registry.len(), 2);

    registry.clear();

    assert!(registry.is_empty());
    assert_eq!(registry.requests().count(), 0);
    assert_eq!(registry.sockets().count(), 0);
}

#[test]
fn test_socket_error_is_terminal() {
    let mut registry = LifecycleRegistry::new();
    let id = ActivityId::from("ws-1");

    registry
        .apply_socket(
            &id,
            SocketEvent::Message {
                direction: Direction::Received,
                data: Payload::Text("hi".to_string()),
            },
        )
        .unwrap();
    let record = registry.socket(&id).unwrap();
    assert_eq!(record.state, SocketState::Open, "Inbound traffic implies open");

    registry
        .apply_socket(
            &id,
            SocketEvent::Error {
                reason: "abnormal closure".to_string(),
            },
        )
        .unwrap();
    let late = registry.apply_socket(&id, SocketEvent::Open);

    assert_eq!(late, Err(RegistryError::SocketClosed(id.clone())));
    let record = registry.socket(&id).unwrap();
    assert_eq!(record.state, SocketState::Errored);
    assert_eq!(record.error.as_deref(), Some("abnormal closure"));
}

#[test]
fn test_record_serializes_with_host_field_names() {
    let mut registry = LifecycleRegistry::new();
    let id = ActivityId::from("req-7");
    open(&mut registry, &id);
    registry.apply(&id, header("Accept", "*/*")).unwrap();
    registry.apply(&id, header("X-Trace", "abc")).unwrap();
    let record = registry
        .apply(
            &id,
            HttpUpdate::Response(ResponseInfo {
                status: Some(200),
                response_url: Some("https://example.com/".to_string()),
                ..ResponseInfo::default()
            }),
        )
        .unwrap();

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["type"], "xhr");
    assert_eq!(json["responseURL"], "https://example.com/");
    assert_eq!(json["status"], 200);
    assert!(json.get("started").is_none());
    assert!(json["requestHeaders"].is_object(), "Headers travel as a name -> value object");
    assert_eq!(json["requestHeaders"]["Accept"], "*/*");
    assert_eq!(json["requestHeaders"]["X-Trace"], "abc");

    // And come back as a header map
    let restored: NetworkRecord = serde_json::from_value(json).unwrap();
    assert_eq!(restored.request_headers.get("accept"), Some("*/*"));
    assert_eq!(restored.request_headers.len(), 2);
}

#[test]
fn test_headers_deserialize_with_case_insensitive_names() {
    let headers: Headers = serde_json::from_str(r#"{ "accept": "text/html", "Accept": "*/*" }"#).unwrap();

    assert_eq!(headers.len(), 1, "Names differing only in case collapse");
    assert_eq!(headers.get("ACCEPT"), Some("*/*"));
}

#[test]
fn test_closing_socket_accepts_traffic_until_closed() {
    let mut registry = LifecycleRegistry::new();
    let id = ActivityId::from("ws-2");
    registry.apply_socket(&id, SocketEvent::Open).unwrap();

    registry
        .apply_socket(
            &id,
            SocketEvent::Closing {
                code: Some(1000),
                reason: None,
            },
        )
        .unwrap();
    registry.apply_socket(&id, SocketEvent::Open).unwrap();
    let record = registry
        .apply_socket(
            &id,
            SocketEvent::Message {
                direction: Direction::Received,
                data: Payload::Text("bye".to_string()),
            },
        )
        .unwrap();
    assert_eq!(record.state, SocketState::Closing, "Closing never reopens");
    assert_eq!(record.messages.len(), 1);

    let record = registry
        .apply_socket(
            &id,
            SocketEvent::Close {
                code: None,
                reason: Some("done".to_string()),
            },
        )
        .unwrap();
    assert_eq!(record.state, SocketState::Closed);
    assert_eq!(record.close_code, Some(1000), "Absent code keeps the requested one");
    assert_eq!(record.close_reason.as_deref(), Some("done"));
}
