use crate::kernel::payload::Payload;
use crate::network::types::{Headers, NetworkRecord};

/// Renders a single shell-invocable cURL command.
/// URL and headers go in double quotes, the body in single quotes.
pub fn convert_to_curl(method: &str, url: &str, headers: &Headers, body: Option<&Payload>) -> String {
    let mut command = format!(
        "curl -X {} \"{}\"",
        method.to_uppercase(),
        escape_double_quoted(url)
    );

    for (name, value) in headers.iter() {
        command.push_str(&format!(
            " -H \"{}: {}\"",
            escape_double_quoted(name),
            escape_double_quoted(value)
        ));
    }

    if let Some(body) = body.filter(|body| body.is_truthy()) {
        command.push_str(&format!(" -d '{}'", escape_single_quoted(&body.to_display_string())));
    }

    command
}

/// `None` until the request has a URL.
pub fn curl_for(record: &NetworkRecord) -> Option<String> {
    let url = record.url.as_deref()?;
    let method = record.method.as_deref().unwrap_or("GET");
    Some(convert_to_curl(method, url, &record.request_headers, record.body.as_ref()))
}

fn escape_double_quoted(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn escape_single_quoted(raw: &str) -> String {
    raw.replace('\'', "'\\''")
}
