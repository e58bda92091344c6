use chrono::{DateTime, Local};
use regex::Regex;
use std::sync::OnceLock;

pub const UNHYDRATED_TS: &str = "--:--:--";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Transaction,
    Address,
}

impl ReferenceKind {
    fn path_segment(self) -> &'static str {
        match self {
            ReferenceKind::Transaction => "tx",
            ReferenceKind::Address => "address",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSegment {
    Text(String),
    Reference {
        kind: ReferenceKind,
        value: String,
        href: String,
    },
}

fn hex_reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Alternation is leftmost-first, so a 64-digit hash never degrades to a 40-digit address.
    PATTERN.get_or_init(|| {
        Regex::new(r"0x[a-fA-F0-9]{64}|0x[a-fA-F0-9]{40}").expect("static hex pattern")
    })
}

pub fn explorer_href(explorer_base: &str, kind: ReferenceKind, value: &str) -> String {
    format!(
        "{}/{}/{}",
        explorer_base.trim_end_matches('/'),
        kind.path_segment(),
        value
    )
}

pub fn render_log_text(text: &str, explorer_base: &str) -> Vec<LogSegment> {
    let mut segments = Vec::new();
    let mut last = 0;
    for found in hex_reference_pattern().find_iter(text) {
        if found.start() > last {
            segments.push(LogSegment::Text(text[last..found.start()].to_string()));
        }
        let value = found.as_str();
        let kind = if value.len() == 66 {
            ReferenceKind::Transaction
        } else {
            ReferenceKind::Address
        };
        segments.push(LogSegment::Reference {
            kind,
            value: value.to_string(),
            href: explorer_href(explorer_base, kind, value),
        });
        last = found.end();
    }
    if last < text.len() {
        segments.push(LogSegment::Text(text[last..].to_string()));
    }
    segments
}

pub fn render_segments_markdown(segments: &[LogSegment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            LogSegment::Text(text) => text.clone(),
            LogSegment::Reference { value, href, .. } => format!("[{value}]({href})"),
        })
        .collect()
}

/// RFC 3339 stamps become local `HH:MM:SS`; anything else is shown as-is.
pub fn format_log_ts(ts: &str) -> String {
    if ts == UNHYDRATED_TS {
        return ts.to_string();
    }
    match DateTime::parse_from_rfc3339(ts) {
        Ok(parsed) => parsed.with_timezone(&Local).format("%H:%M:%S").to_string(),
        Err(_) => ts.to_string(),
    }
}

pub fn short_address(value: Option<&str>) -> String {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return "Not set".to_string();
    };
    let chars: Vec<char> = value.chars().collect();
    let head: String = chars.iter().take(6).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{head}...{tail}")
}
