//! `URL` objects backed by the url crate

use url::Url;

use crate::error::{Result, TemplateError};
use crate::value::Value;

/// `new URL(input)` or `new URL(input, base)`
pub fn construct_url(args: &[Value]) -> Result<Url> {
    let input = args
        .first()
        .map(Value::to_output_string)
        .unwrap_or_else(|| "undefined".to_string());

    let parsed = match args.get(1) {
        None | Some(Value::Undefined) => Url::parse(&input),
        Some(base) => {
            let base = match base {
                Value::Url(url) => Ok(url.clone()),
                other => Url::parse(&other.to_output_string()),
            };
            base.and_then(|b| b.join(&input))
        }
    };

    parsed.map_err(|e| {
        tracing::debug!("Invalid URL {}: {}", input, e);
        TemplateError::evaluation(format!("Invalid URL: {}", input))
    })
}

/// Property read on a `URL` value
pub fn url_property(url: &Url, key: &str) -> Value {
    let text = match key {
        "href" => url.as_str().to_string(),
        "protocol" => format!("{}:", url.scheme()),
        "host" => match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => String::new(),
        },
        "hostname" => url.host_str().unwrap_or_default().to_string(),
        "port" => url.port().map(|p| p.to_string()).unwrap_or_default(),
        "pathname" => url.path().to_string(),
        "search" => match url.query() {
            Some(q) if !q.is_empty() => format!("?{}", q),
            _ => String::new(),
        },
        "hash" => match url.fragment() {
            Some(f) if !f.is_empty() => format!("#{}", f),
            _ => String::new(),
        },
        "origin" => url.origin().ascii_serialization(),
        "username" => url.username().to_string(),
        "password" => url.password().unwrap_or_default().to_string(),
        _ => return Value::Undefined,
    };
    Value::String(text)
}
