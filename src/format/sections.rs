use reqwest::Url;
use serde::Serialize;

use crate::network::types::{NetworkRecord, WebSocketRecord};

/// Which detail tabs have anything to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkSections {
    pub is_http: bool,
    pub overview_shown: bool,
    pub headers_shown: bool,
    pub request_shown: bool,
    pub response_shown: bool,
    pub messages_shown: bool,
}

pub fn http_sections(record: &NetworkRecord) -> NetworkSections {
    let url = record.url.as_deref().unwrap_or_default();
    let has_query = Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.query().map(|query| !query.is_empty()))
        .unwrap_or(false);

    NetworkSections {
        is_http: true,
        overview_shown: !url.is_empty(),
        headers_shown: !record.request_headers.is_empty() || record.response_headers.is_some(),
        request_shown: has_query || record.body.as_ref().is_some_and(|body| body.is_truthy()),
        response_shown: record.response.as_ref().is_some_and(|body| body.is_truthy()),
        messages_shown: false,
    }
}

pub fn socket_sections(record: &WebSocketRecord) -> NetworkSections {
    NetworkSections {
        is_http: false,
        overview_shown: record.url.as_deref().is_some_and(|url| !url.is_empty()),
        messages_shown: !record.messages.is_empty(),
        ..NetworkSections::default()
    }
}

/// Decoded query parameters, empty when the URL does not parse.
pub fn query_params(url: &str) -> Vec<(String, String)> {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect(),
        Err(_) => Vec::new(),
    }
}
