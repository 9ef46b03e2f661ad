use serde_json::json;
use spyglass::console::{BufferSink, Console, ConsoleInterceptor, ConsoleLayer, ConsoleSink, LogKind, LogMessage};
use spyglass::kernel::Payload;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::layer::SubscriberExt;

fn detached() -> (Arc<ConsoleInterceptor>, BufferSink, Arc<Console>) {
    let interceptor = Arc::new(ConsoleInterceptor::new());
    let sink = BufferSink::new();
    let console = Arc::new(Console::with_interceptor(Arc::new(sink.clone()), interceptor.clone()));
    (interceptor, sink, console)
}

fn collect_into(interceptor: &ConsoleInterceptor) -> Arc<Mutex<Vec<LogMessage>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    interceptor.set_callback(move |message: &LogMessage| {
        seen_clone.lock().unwrap().push(message.clone());
    });
    seen
}

struct FailingSink;

impl ConsoleSink for FailingSink {
    fn write(&self, _kind: LogKind, _values: &[Payload]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "destination closed"))
    }
}

#[test]
fn test_one_record_per_call_in_order() {
    let (interceptor, sink, console) = detached();
    let seen = collect_into(&interceptor);
    interceptor.enable_interception();

    console.log(&["first".into(), 1i64.into(), json!({ "k": "v" }).into()]).unwrap();
    console.warn(&["second".into()]).unwrap();
    console.error(&[]).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3, "Exactly one record per logging call");
    assert_eq!(seen[0].kind, LogKind::Log);
    assert_eq!(seen[0].values.len(), 3, "Argument count preserved");
    assert_eq!(seen[0].values[0], Payload::Text("first".to_string()));
    assert_eq!(seen[0].values[2], Payload::Json(json!({ "k": "v" })));
    assert_eq!(seen[1].kind, LogKind::Warn);
    assert_eq!(seen[2].kind, LogKind::Error);
    assert!(seen[2].values.is_empty());

    // Original still ran for every call
    assert_eq!(sink.lines().len(), 3);
}

#[test]
fn test_disabled_forwards_nothing_but_still_writes() {
    let (interceptor, sink, console) = detached();
    let seen = collect_into(&interceptor);

    interceptor.enable_interception();
    interceptor.disable_interception();

    console.log(&["quiet".into()]).unwrap();

    assert!(seen.lock().unwrap().is_empty(), "Disabled interceptor must not forward");
    let lines = sink.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].content, "LOG: quiet");
}

#[test]
fn test_enable_and_disable_are_idempotent() {
    let (interceptor, _sink, console) = detached();
    let seen = collect_into(&interceptor);

    assert!(interceptor.enable_interception());
    assert!(!interceptor.enable_interception(), "Second enable is a no-op");
    assert!(interceptor.is_interceptor_enabled());

    console.info(&["once".into()]).unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1, "Double enable must not double-wrap");

    assert!(interceptor.disable_interception());
    assert!(!interceptor.disable_interception(), "Second disable is a no-op");
    assert!(!interceptor.is_interceptor_enabled());
}

#[test]
fn test_even_toggles_leave_original_entry_point() {
    let interceptor = Arc::new(ConsoleInterceptor::new());
    let original: Arc<dyn ConsoleSink> = Arc::new(BufferSink::new());
    let console = Console::with_interceptor(original.clone(), interceptor.clone());

    for round in 1..=6 {
        if round % 2 == 1 {
            interceptor.enable_interception();
        } else {
            interceptor.disable_interception();
            assert!(Arc::ptr_eq(&console.sink(), &original), "No leaked wrapper after round {}", round);
        }
    }
}

#[test]
fn test_observer_sees_call_before_original_fails() {
    let interceptor = Arc::new(ConsoleInterceptor::new());
    let console = Console::with_interceptor(Arc::new(FailingSink), interceptor.clone());
    let seen = collect_into(&interceptor);
    interceptor.enable_interception();

    let err = console.error(&["boom".into()]).unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::Other, "Original error passes through untouched");
    assert_eq!(err.to_string(), "destination closed");
    assert_eq!(seen.lock().unwrap().len(), 1, "Observer ran before the failing original");
}

#[test]
fn test_panicking_observer_does_not_block_original() {
    let (interceptor, sink, console) = detached();
    interceptor.set_callback(|_message: &LogMessage| panic!("observer exploded"));
    interceptor.enable_interception();

    console.log(&["still written".into()]).unwrap();
    console.log(&["and again".into()]).unwrap();

    assert_eq!(sink.lines().len(), 2, "Observer failure is contained at the wrapper");
}

#[test]
fn test_observer_that_logs_does_not_recurse() {
    let (interceptor, sink, console) = detached();
    let seen = Arc::new(Mutex::new(0usize));

    let seen_clone = seen.clone();
    let console_clone = console.clone();
    interceptor.set_callback(move |_message: &LogMessage| {
        *seen_clone.lock().unwrap() += 1;
        console_clone.log(&["echo from observer".into()]).unwrap();
    });
    interceptor.enable_interception();

    console.log(&["app".into()]).unwrap();

    assert_eq!(*seen.lock().unwrap(), 1, "Nested log must not be observed again");
    let lines = sink.lines();
    assert_eq!(lines.len(), 2, "Nested log still reaches the original");
    assert_eq!(lines[0].content, "LOG: echo from observer");
    assert_eq!(lines[1].content, "LOG: app");
}

#[test]
fn test_callback_swap_applies_to_later_events() {
    let (interceptor, _sink, console) = detached();
    interceptor.enable_interception();

    let first = collect_into(&interceptor);
    console.log(&["a".into()]).unwrap();

    let second = collect_into(&interceptor);
    console.log(&["b".into()]).unwrap();
    console.log(&["c".into()]).unwrap();

    assert_eq!(first.lock().unwrap().len(), 1);
    assert_eq!(second.lock().unwrap().len(), 2);
}

#[test]
fn test_enabled_without_callback_is_harmless() {
    let (interceptor, sink, console) = detached();
    interceptor.enable_interception();

    console.debug(&["no observer".into()]).unwrap();
    assert_eq!(sink.lines().len(), 1);
}

#[test]
fn test_tracing_layer_routes_events_through_console() {
    let (interceptor, sink, console) = detached();
    let seen = collect_into(&interceptor);
    interceptor.enable_interception();

    let subscriber = tracing_subscriber::registry().with(ConsoleLayer::new(console.clone()));
    tracing::subscriber::with_default(subscriber, || {
        tracing::warn!(attempt = 3, "retrying upload");
    });

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].kind, LogKind::Warn);
    assert_eq!(seen[0].values[0], Payload::Text("retrying upload".to_string()));
    assert_eq!(seen[0].values[1], Payload::Json(json!({ "attempt": 3 })));
    assert_eq!(sink.lines().len(), 1);
}

#[test]
fn test_engine_diagnostics_do_not_feed_back_into_observer() {
    let (interceptor, sink, console) = detached();
    let seen = Arc::new(Mutex::new(0usize));

    let seen_clone = seen.clone();
    interceptor.set_callback(move |_message: &LogMessage| {
        *seen_clone.lock().unwrap() += 1;
        // The panic warning is itself a tracing event routed to the console
        panic!("observer failed");
    });

    interceptor.enable_interception();

    let subscriber = tracing_subscriber::registry().with(ConsoleLayer::new(console.clone()));
    tracing::subscriber::with_default(subscriber, || {
        console.log(&["payload".into()]).unwrap();
    });

    assert_eq!(*seen.lock().unwrap(), 1, "Warning about the panic is not observed again");
    let lines = sink.lines();
    assert!(lines.iter().any(|line| line.kind == LogKind::Warn && line.content.contains("observer panicked")));
    assert!(lines.iter().any(|line| line.content == "LOG: payload"));
}

#[test]
fn test_log_message_serializes_in_camel_case() {
    let message = LogMessage::new(LogKind::Warn, vec!["disk almost full".into()]);

    let json = serde_json::to_value(&message).unwrap();

    assert_eq!(json["kind"], "warn");
    assert!(json["capturedAt"].is_u64(), "Same wire convention as network records");
    assert!(json.get("captured_at").is_none());
}
