// src/stats/unemployment.rs
//! State unemployment rates scraped from the BLS "highest to lowest" table.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::error::ApiError;

pub const BLS_URL: &str = "https://www.bls.gov/web/laus/lauhsthl.htm";

/// Column id of the current-month rate in the BLS table.
const RATE_COLUMN: &str = "lauhsthl.h.1.2";

#[derive(Debug, Clone, PartialEq)]
pub struct StateRate {
    pub state: String,
    pub rate: Option<f64>,
}

#[async_trait]
pub trait UnemploymentSource: Send + Sync {
    async fn state_rates(&self) -> Result<Vec<StateRate>>;
    fn name(&self) -> &'static str;
}

pub struct BlsUnemployment {
    http: reqwest::Client,
}

impl BlsUnemployment {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl UnemploymentSource for BlsUnemployment {
    async fn state_rates(&self) -> Result<Vec<StateRate>> {
        let html = self
            .http
            .get(BLS_URL)
            .send()
            .await
            .context("bls get()")?
            .error_for_status()
            .context("bls status")?
            .text()
            .await
            .context("bls .text()")?;
        parse_state_rates(&html)
    }

    fn name(&self) -> &'static str {
        "bls"
    }
}

fn re_state_header() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<th\b([^>]*)>\s*<p\s+class="sub0"\s*>(.*?)</p>"#)
            .unwrap_or_else(|e| unreachable!("state header regex: {e}"))
    })
}

fn re_id_attr() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bid\s*=\s*"([^"]+)""#).unwrap_or_else(|e| unreachable!("id regex: {e}"))
    })
}

fn re_td() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<td\b([^>]*)>(.*?)</td>"#).unwrap_or_else(|e| unreachable!("td regex: {e}"))
    })
}

fn re_headers_attr() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bheaders\s*=\s*"([^"]+)""#)
            .unwrap_or_else(|e| unreachable!("headers regex: {e}"))
    })
}

fn re_tags() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap_or_else(|e| unreachable!("tag regex: {e}")))
}

fn re_number() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"-?\d+(?:\.\d+)?").unwrap_or_else(|e| unreachable!("number regex: {e}"))
    })
}

/// Strip tags, decode entities and collapse whitespace.
fn cell_text(raw: &str) -> String {
    let no_tags = re_tags().replace_all(raw, "");
    let decoded = html_escape::decode_html_entities(&no_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse every state row of the BLS table.
///
/// State names come from `<p class="sub0">` inside each row header; the rate
/// is the `<td>` whose `headers` attribute is `"<row id> lauhsthl.h.1.2"`.
pub fn parse_state_rates(html: &str) -> Result<Vec<StateRate>> {
    let cells = data_cells(html);
    let mut out = Vec::new();

    for caps in re_state_header().captures_iter(html) {
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        let state = cell_text(caps.get(2).map_or("", |m| m.as_str()));
        if state.is_empty() {
            continue;
        }
        let rate = re_id_attr()
            .captures(attrs)
            .and_then(|c| c.get(1))
            .and_then(|id| cells.get(&format!("{} {RATE_COLUMN}", id.as_str())))
            .and_then(|text| {
                re_number()
                    .find(text)
                    .and_then(|m| m.as_str().parse::<f64>().ok())
            });
        out.push(StateRate { state, rate });
    }

    if out.is_empty() {
        return Err(anyhow!("no state rows found in BLS table"));
    }
    Ok(out)
}

/// Text of every `<td>` keyed by its whitespace-normalized `headers` value.
fn data_cells(html: &str) -> HashMap<String, String> {
    re_td()
        .captures_iter(html)
        .filter_map(|c| {
            let attrs = c.get(1)?.as_str();
            let headers = re_headers_attr().captures(attrs)?.get(1)?.as_str();
            let key = headers.split_whitespace().collect::<Vec<_>>().join(" ");
            Some((key, cell_text(c.get(2)?.as_str())))
        })
        .collect()
}

/// `district_of_columbia` / `district of columbia` → `District of Columbia`.
pub fn normalize_state(raw: &str) -> String {
    let spaced = raw.replace('_', " ");
    let mut titled = String::with_capacity(spaced.len());
    let mut prev_alpha = false;
    for ch in spaced.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                titled.extend(ch.to_lowercase());
            } else {
                titled.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            titled.push(ch);
            prev_alpha = false;
        }
    }
    titled.replace(" Of ", " of ")
}

/// Find `state` (already normalized) in the parsed table.
pub fn find_rate(rates: &[StateRate], state: &str) -> Result<f64, ApiError> {
    let Some(row) = rates.iter().find(|r| r.state == state) else {
        let mut msg = format!(
            "Please, introduce a valid US State. You can find a complete list of official names here: {BLS_URL}"
        );
        if let Some(best) = closest_state(rates, state) {
            msg.push_str(&format!(" Did you mean '{best}'?"));
        }
        return Err(ApiError::not_listed(msg));
    };
    row.rate.ok_or_else(|| {
        ApiError::upstream(
            "bls",
            "The labor statistics page did not contain a rate for this state. Please try again later.",
            &anyhow!("missing rate cell for {state}"),
        )
    })
}

fn closest_state<'a>(rates: &'a [StateRate], state: &str) -> Option<&'a str> {
    rates
        .iter()
        .map(|r| (strsim::jaro_winkler(&r.state, state), r.state.as_str()))
        .filter(|(score, _)| *score >= 0.85)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, name)| name)
}
