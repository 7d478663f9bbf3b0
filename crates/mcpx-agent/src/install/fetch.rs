//! `fetch_url`: read a web page for the model, refusing internal targets.
//!
//! Every hop (the initial URL and each redirect) is checked: http/https
//! only, and every address the host resolves to must be public. The checked
//! addresses are pinned into the request so a second DNS answer cannot
//! swap in an internal one.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::redirect::Policy;
use serde_json::{Map, Value};
use url::Url;

use crate::toolbox::ToolExecutor;

/// Longest text handed back to the model.
pub const MAX_TEXT_LENGTH: usize = 8000;

const MAX_REDIRECTS: usize = 5;
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const STRIPPED_ELEMENTS: &[&str] = &["script", "style", "nav", "footer", "header"];

fn blocked_v4(v4: Ipv4Addr) -> Option<&'static str> {
    let [a, b, c, _] = v4.octets();
    if v4.is_loopback() {
        Some("loopback")
    } else if v4.is_private() {
        Some("private")
    } else if v4.is_link_local() {
        Some("link-local")
    } else if a == 0 {
        Some("unspecified")
    } else if v4.is_broadcast() {
        Some("broadcast")
    } else if a >= 240 {
        Some("reserved")
    } else if v4.is_documentation() || (a, b, c) == (192, 0, 0) || (a == 198 && b & 0xfe == 18) {
        Some("private")
    } else {
        None
    }
}

/// Why an address may not be fetched, if it may not.
///
/// IPv6 forms that embed an IPv4 address (mapped, compatible, NAT64) are
/// judged by the embedded address.
pub fn blocked_kind(ip: IpAddr) -> Option<&'static str> {
    match ip {
        IpAddr::V4(v4) => blocked_v4(v4),
        IpAddr::V6(v6) => {
            if v6.is_loopback() {
                return Some("loopback");
            }
            if v6.is_unspecified() {
                return Some("unspecified");
            }
            let segments = v6.segments();
            // ::ffff:a.b.c.d and the deprecated ::a.b.c.d
            if let Some(v4) = v6.to_ipv4() {
                return blocked_v4(v4);
            }
            if segments[..6] == [0x64, 0xff9b, 0, 0, 0, 0] {
                let [.., a, b, c, d] = v6.octets();
                return blocked_v4(Ipv4Addr::new(a, b, c, d));
            }
            let first = segments[0];
            if first & 0xfe00 == 0xfc00 {
                Some("private")
            } else if first & 0xffc0 == 0xfe80 {
                Some("link-local")
            } else if first == 0x2001 && segments[1] == 0x0db8 {
                Some("private")
            } else {
                None
            }
        }
    }
}

/// Check one URL and return the addresses it may be fetched from.
///
/// The error string is the tool result shown to the model.
pub async fn validate_url(url: &Url) -> Result<Vec<SocketAddr>, String> {
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(format!(
            "Blocked URL scheme: '{scheme}'. Only http/https allowed."
        ));
    }

    let Some(host) = url.host_str().filter(|h| !h.is_empty()) else {
        return Err("Missing hostname in URL.".to_string());
    };
    let port = url.port_or_known_default().unwrap_or(80);

    // IPv6 literals come back bracketed from host_str
    let lookup_host = host.trim_start_matches('[').trim_end_matches(']');
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((lookup_host, port))
        .await
        .map_err(|_| format!("Cannot resolve hostname: {host}"))?
        .collect();
    if addrs.is_empty() {
        return Err(format!("Cannot resolve hostname: {host}"));
    }

    for addr in &addrs {
        if let Some(kind) = blocked_kind(addr.ip()) {
            return Err(format!("Blocked: {host} resolves to {kind} IP {}", addr.ip()));
        }
    }
    Ok(addrs)
}

/// Converts HTML to plain text lines.
#[derive(Debug)]
pub struct HtmlText {
    elements: Vec<Regex>,
}

impl HtmlText {
    pub fn new() -> Result<Self, regex::Error> {
        let elements = STRIPPED_ELEMENTS
            .iter()
            .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")))
            .collect::<Result<_, _>>()?;
        Ok(Self { elements })
    }

    /// Drop page chrome and scripts, then markup, keeping one text run per line.
    pub fn to_text(&self, html: &str) -> String {
        let mut text = html.to_string();
        for element in &self.elements {
            text = element.replace_all(&text, "\n").into_owned();
        }

        let mut plain = String::with_capacity(text.len());
        let mut in_tag = false;
        for c in text.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => {
                    in_tag = false;
                    plain.push('\n');
                }
                _ if !in_tag => plain.push(c),
                _ => {}
            }
        }

        plain
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(decode_entities)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn decode_entities(line: &str) -> String {
    line.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// The `fetch_url` executor.
#[derive(Debug)]
pub struct FetchUrl {
    html: HtmlText,
    timeout: Duration,
}

impl FetchUrl {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            html: HtmlText::new()?,
            timeout: FETCH_TIMEOUT,
        })
    }

    /// Fetch `raw_url` and return the text for the model.
    ///
    /// Every outcome is a string: policy refusals and HTTP failures are
    /// reported to the model rather than aborting the agent.
    pub async fn fetch(&self, raw_url: &str) -> String {
        let mut url = match Url::parse(raw_url) {
            Ok(url) => url,
            Err(e) => return format!("Invalid URL: {e}"),
        };

        for _ in 0..=MAX_REDIRECTS {
            let addrs = match validate_url(&url).await {
                Ok(addrs) => addrs,
                Err(refusal) => return refusal,
            };

            let response = match self.get_pinned(&url, &addrs).await {
                Ok(response) => response,
                Err(e) => return format!("Error fetching URL: {e}"),
            };

            if response.status().is_redirection() {
                let next = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(|loc| url.join(loc));
                match next {
                    Some(Ok(next)) => {
                        tracing::debug!(from = %url, to = %next, "Following redirect");
                        url = next;
                        continue;
                    }
                    _ => return "Error fetching URL: redirect without a valid location".to_string(),
                }
            }

            let response = match response.error_for_status() {
                Ok(response) => response,
                Err(e) => return format!("Error fetching URL: {e}"),
            };
            let is_html = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|ct| ct.contains("html"));
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => return format!("Error fetching URL: {e}"),
            };

            let text = if is_html { self.html.to_text(&body) } else { body };
            return truncate_chars(&text, MAX_TEXT_LENGTH);
        }

        "Error fetching URL: too many redirects".to_string()
    }

    async fn get_pinned(
        &self,
        url: &Url,
        addrs: &[SocketAddr],
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(self.timeout);
        if let Some(host) = url.host_str() {
            builder = builder.resolve_to_addrs(host, addrs);
        }
        builder.build()?.get(url.as_str()).send().await
    }
}

#[async_trait]
impl ToolExecutor for FetchUrl {
    async fn execute(&self, arguments: &Map<String, Value>) -> anyhow::Result<String> {
        let url = arguments
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("missing required argument 'url'"))?;
        Ok(self.fetch(url).await)
    }
}
