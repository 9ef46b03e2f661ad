use serde_json::json;
use spyglass::console::Console;
use spyglass::format::{beautify, curl_for, format_log_message, format_request_duration, format_request_method, format_request_status_code};
use spyglass::kernel::{EngineConfig, Payload};
use spyglass::network::{Fetch, FetchRequest, ReadyState, XhrRequest, XhrTransport};
use spyglass::Engine;
use std::convert::Infallible;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// Stands in for the host's request object so the demo runs offline
#[derive(Default)]
struct LoopbackXhr;

impl XhrTransport for LoopbackXhr {
    type Error = Infallible;

    fn open(&mut self, _method: &str, _url: &str) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_request_header(&mut self, _name: &str, _value: &str) -> Result<(), Infallible> {
        Ok(())
    }

    fn send(&mut self, _body: Option<&Payload>) -> Result<(), Infallible> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::var("SPYGLASS_CONFIG") {
        Ok(raw) => EngineConfig::from_json(&raw)?,
        Err(_) => EngineConfig {
            console_auto_enabled: true,
            network_auto_enabled: true,
            ..EngineConfig::default()
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter)?)
        .init();
    tracing::info!("Spyglass booting...");

    let engine = Engine::start(config.clone())?;
    let console = Console::global();

    console.log(&["Hello from the instrumented console".into(), 42i64.into()])?;
    console.warn(&[json!({ "retry": true, "attempt": 2 }).into()])?;

    // 1. XHR-style request, progress driven by hand
    let mut xhr = XhrRequest::new(LoopbackXhr);
    xhr.set_timeout(3_000);
    xhr.open("POST", "https://api.example.com/items?page=2")?;
    xhr.set_request_header("Content-Type", "application/json")?;
    xhr.set_request_header("Authorization", "Bearer demo")?;
    xhr.send(Some(json!({ "name": "it's a widget" }).into()))?;
    xhr.ready_state_changed(ReadyState::HeadersReceived {
        content_type: Some("application/json".to_string()),
        size: Some(27),
        headers: "content-type: application/json\r\n".to_string(),
    });
    xhr.ready_state_changed(ReadyState::Done {
        status: 201,
        response: Some(Payload::Text(r#"{"id":7,"name":"widget"}"#.to_string())),
        response_url: Some("https://api.example.com/items?page=2".to_string()),
        response_type: Some("text".to_string()),
    });

    // 2. Optional live fetch through reqwest
    if let Some(url) = std::env::args().nth(1) {
        let fetch = Fetch::new(reqwest::Client::new());
        let request = FetchRequest::get(&url).timeout(Duration::from_secs(5));
        match fetch.fetch(request).await {
            Ok(response) => tracing::info!("Fetched {} -> {}", url, response.status),
            Err(e) => tracing::warn!("Fetch of {} failed: {}", url, e),
        }
    }

    // 3. Dump what the sessions collected
    for message in engine.console.log_messages() {
        println!("[CONSOLE] {}", format_log_message(message.kind, &message.values));
    }

    for record in engine.network.requests() {
        println!(
            "[NETWORK] {} {} -> {} in {}",
            format_request_method(record.method.as_deref()),
            record.url.as_deref().unwrap_or_default(),
            format_request_status_code(record.status),
            format_request_duration(record.duration)
        );
        if let Some(curl) = curl_for(&record) {
            println!("    {}", curl);
        }
        println!("{}", beautify(record.response.as_ref(), true));
    }

    Ok(())
}
