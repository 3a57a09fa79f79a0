//! Swagger definition synthesis for new proxies.
//!
//! The document imported into API Gateway declares two routes, `/` and
//! `/{proxy+}`, both HTTP-proxy integrations to the origin. The client's
//! `X-My-X-Forwarded-For` header is forwarded as `X-Forwarded-For`.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::resource::{PROXY_PLACEHOLDER, WILDCARD_PATH, strip_trailing_slash};

/// Prefix of every generated API title.
pub const TITLE_PREFIX: &str = "fireprox";

/// Cache namespace shared by both integrations.
pub const CACHE_NAMESPACE: &str = "irx7tm";

/// Header clients set to control the forwarded-for value seen by the origin.
pub const FORWARDED_FOR_HEADER: &str = "X-My-X-Forwarded-For";

/// Second-level labels that form part of a public suffix (`example.co.uk`).
const COMPOUND_SUFFIXES: &[&str] = &[
    "ac", "co", "com", "edu", "gov", "ltd", "net", "nhs", "or", "org", "plc", "sch",
];

/// Build the definition for `origin` stamped with the current UTC time.
pub fn build_template(origin: &str) -> Vec<u8> {
    build_template_at(origin, Utc::now())
}

/// Build the definition for `origin` stamped with `timestamp`.
///
/// Output is byte-identical for identical inputs.
pub fn build_template_at(origin: &str, timestamp: DateTime<Utc>) -> Vec<u8> {
    let origin = strip_trailing_slash(origin);
    let title = format!("{TITLE_PREFIX}_{}", registrable_label(origin));
    let version = timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string();

    let root = json!({
        "get": {
            "parameters": parameters(),
            "responses": {},
            "x-amazon-apigateway-integration": integration(&format!("{origin}/")),
        }
    });
    let wildcard = json!({
        "x-amazon-apigateway-any-method": {
            "produces": ["application/json"],
            "parameters": parameters(),
            "responses": {},
            "x-amazon-apigateway-integration":
                integration(&format!("{origin}/{PROXY_PLACEHOLDER}")),
        }
    });

    let mut paths = serde_json::Map::new();
    paths.insert("/".to_owned(), root);
    paths.insert(WILDCARD_PATH.to_owned(), wildcard);

    let doc = json!({
        "swagger": "2.0",
        "info": {
            "version": version,
            "title": title,
        },
        "basePath": "/",
        "schemes": ["https"],
        "paths": paths,
    });

    doc.to_string().into_bytes()
}

fn parameters() -> Value {
    json!([
        {
            "name": "proxy",
            "in": "path",
            "required": true,
            "type": "string",
        },
        {
            "name": FORWARDED_FOR_HEADER,
            "in": "header",
            "required": false,
            "type": "string",
        }
    ])
}

fn integration(uri: &str) -> Value {
    json!({
        "uri": uri,
        "responses": {
            "default": { "statusCode": "200" }
        },
        "requestParameters": {
            "integration.request.path.proxy": "method.request.path.proxy",
            "integration.request.header.X-Forwarded-For":
                format!("method.request.header.{FORWARDED_FOR_HEADER}"),
        },
        "passthroughBehavior": "when_no_match",
        "httpMethod": "ANY",
        "cacheNamespace": CACHE_NAMESPACE,
        "cacheKeyParameters": ["method.request.path.proxy"],
        "type": "http_proxy",
    })
}

/// The registrable-domain label of `origin` (`https://www.example.com` ->
/// `example`). Origins without a scheme are accepted.
pub fn registrable_label(origin: &str) -> String {
    let Some(host) = origin_host(origin) else {
        return String::new();
    };
    if let Some(ip) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        return ip.to_owned();
    }
    if host.parse::<std::net::Ipv4Addr>().is_ok() {
        return host;
    }

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    match labels.as_slice() {
        [] => String::new(),
        [only] => (*only).to_owned(),
        [.., name, second, tld] if tld.len() == 2 && COMPOUND_SUFFIXES.contains(second) => {
            (*name).to_owned()
        }
        [.., name, _tld] => (*name).to_owned(),
    }
}

fn origin_host(origin: &str) -> Option<String> {
    let parsed = url::Url::parse(origin)
        .ok()
        .filter(|u| u.has_host())
        .or_else(|| url::Url::parse(&format!("http://{origin}")).ok())?;
    parsed.host_str().map(str::to_ascii_lowercase)
}
