//! Route pattern matching.
//!
//! # Responsibilities
//! - Parse patterns such as `/Items/{Id}/Images/{Type}` and `/web/{Path*}`
//! - Match request paths segment by segment, capturing parameters
//!
//! # Design Decisions
//! - Literal segments compare case-insensitively
//! - Empty segments are ignored, so trailing slashes do not matter
//! - A catch-all parameter may only appear last
//! - No regex to guarantee O(n) matching

use std::fmt;

use crate::routing::handler::PathParams;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Stored lowercased.
    Literal(String),
    Param(String),
    CatchAll(String),
}

/// A compiled route path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split(pattern)
            .map(|seg| match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => match name.strip_suffix('*') {
                    Some(name) => Segment::CatchAll(name.to_string()),
                    None => Segment::Param(name.to_string()),
                },
                None => Segment::Literal(seg.to_ascii_lowercase()),
            })
            .collect();

        let raw = format!("/{}", split(pattern).collect::<Vec<_>>().join("/"));
        Self { raw, segments }
    }

    /// The same pattern under `prefix` (e.g. `/emby`).
    pub fn with_prefix(&self, prefix: &str) -> Self {
        Self::parse(&format!("{}{}", prefix.trim_end_matches('/'), self.raw))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of literal segments; more specific patterns have more.
    pub fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Match `path`, returning captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = split(path).collect();
        let mut params = PathParams::new();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::CatchAll(name) => {
                    let rest = parts.get(index..).unwrap_or_default();
                    params.push(name.as_str(), rest.join("/"));
                    return Some(params);
                }
                Segment::Literal(lit) => {
                    let part = parts.get(index)?;
                    if !part.eq_ignore_ascii_case(lit) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let part = parts.get(index)?;
                    params.push(name.as_str(), *part);
                }
            }
        }

        if parts.len() == self.segments.len() {
            Some(params)
        } else {
            None
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_match_ignores_case_and_trailing_slash() {
        let p = PathPattern::parse("/System/Ping");
        assert!(p.matches("/system/ping").is_some());
        assert!(p.matches("/System/Ping/").is_some());
        assert!(p.matches("/System").is_none());
        assert!(p.matches("/System/Ping/Extra").is_none());
    }

    #[test]
    fn captures_params() {
        let p = PathPattern::parse("/Items/{Id}/Images/{Type}");
        let params = p.matches("/Items/abc123/Images/Primary").unwrap();
        assert_eq!(params.get("id"), Some("abc123"));
        assert_eq!(params.get("Type"), Some("Primary"));
        assert_eq!(p.literal_count(), 2);
    }

    #[test]
    fn catch_all_takes_rest() {
        let p = PathPattern::parse("/web/{Path*}");
        assert_eq!(p.matches("/web/css/site.css").unwrap().get("Path"), Some("css/site.css"));
        assert_eq!(p.matches("/web").unwrap().get("Path"), Some(""));
    }

    #[test]
    fn prefixing() {
        let p = PathPattern::parse("System/Ping/").with_prefix("/emby/");
        assert_eq!(p.as_str(), "/emby/System/Ping");
        assert!(p.matches("/EMBY/system/ping").is_some());
    }
}
