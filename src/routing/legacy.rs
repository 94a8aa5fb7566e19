//! Backward-compatible path handling for old client URLs.
//!
//! # Responsibilities
//! - Redirect bare and legacy root prefixes to the landing page
//! - Tell users of old dashboard bookmarks where the page moved
//! - Map old web client entry pages onto the current one
//!
//! # Design Decisions
//! - Rules are evaluated in a fixed order, first decisive rule wins
//! - Matching ignores ASCII case
//! - Redirect targets are relative, resolved by the browser against the request

use crate::config::SharedConfig;
use crate::dispatch::sanitize::replace_ignore_ascii_case;
use crate::http::InboundRequest;

/// What the gateway should do with a request after legacy rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// Not a legacy URL; keep dispatching.
    Continue,
    /// 302 to the given (possibly relative) location.
    Redirect(String),
    /// 200 HTML page asking the user to update a bookmark to this URL.
    Notice(String),
}

/// Applies the legacy path rules using the live default landing path.
#[derive(Clone)]
pub struct LegacyPathRewriter {
    config: SharedConfig,
}

impl LegacyPathRewriter {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    pub fn rewrite(&self, request: &InboundRequest) -> RewriteOutcome {
        let config = self.config.load();
        let escape_hatch = request.query("r") == Some("0");
        evaluate(
            request.path(),
            request.url().as_str(),
            escape_hatch,
            &config.routing.default_redirect_path,
        )
    }
}

/// The rule set itself. `url` is the full request URL.
pub fn evaluate(path: &str, url: &str, escape_hatch: bool, default_path: &str) -> RewriteOutcome {
    let lower = path.to_ascii_lowercase();

    if lower == "/emby/" || lower == "/mediabrowser/" {
        return RewriteOutcome::Redirect(default_path.to_string());
    }
    if lower == "/emby" || lower == "/mediabrowser" {
        return RewriteOutcome::Redirect(format!("emby/{default_path}"));
    }

    let old_dashboard = lower.contains("mediabrowser/web")
        || (lower.contains("dashboard/") && !lower.contains("web/dashboard"));
    if old_dashboard {
        let updated = replace_ignore_ascii_case(
            &replace_ignore_ascii_case(url, "mediabrowser", "emby"),
            "/dashboard/",
            "/web/",
        );
        if !updated.eq_ignore_ascii_case(url) {
            return RewriteOutcome::Notice(updated);
        }
    }

    match lower.as_str() {
        "/web" | "/" => return RewriteOutcome::Redirect(default_path.to_string()),
        "/web/" => return RewriteOutcome::Redirect(format!("../{default_path}")),
        "" => return RewriteOutcome::Redirect(format!("/{default_path}")),
        _ => {}
    }

    if !escape_hatch {
        if lower.ends_with("/web/dashboard.html") {
            return RewriteOutcome::Redirect("index.html#!/dashboard.html".to_string());
        }
        if lower.ends_with("/web/home.html") {
            return RewriteOutcome::Redirect("index.html".to_string());
        }
    }

    RewriteOutcome::Continue
}

/// HTML body pointing an old bookmark at `url`.
pub fn bookmark_notice(url: &str) -> String {
    let url = escape_html(url);
    format!(
        "<!doctype html><html><head><title>Emby</title></head><body>\
         Please update your Emby bookmark to <a href=\"{url}\">{url}</a></body></html>"
    )
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: &str = "web/index.html";

    fn run(path: &str) -> RewriteOutcome {
        evaluate(path, &format!("http://media.lan:8096{path}"), false, DEFAULT)
    }

    fn redirect(to: &str) -> RewriteOutcome {
        RewriteOutcome::Redirect(to.to_string())
    }

    #[test]
    fn legacy_roots() {
        assert_eq!(run("/emby/"), redirect(DEFAULT));
        assert_eq!(run("/MediaBrowser/"), redirect(DEFAULT));
        assert_eq!(run("/emby"), redirect("emby/web/index.html"));
        assert_eq!(run("/mediabrowser"), redirect("emby/web/index.html"));
    }

    #[test]
    fn web_and_root() {
        assert_eq!(run("/web"), redirect(DEFAULT));
        assert_eq!(run("/web/"), redirect("../web/index.html"));
        assert_eq!(run("/"), redirect(DEFAULT));
        assert_eq!(evaluate("", "http://media.lan", false, DEFAULT), redirect("/web/index.html"));
    }

    #[test]
    fn old_dashboard_bookmarks_get_notice() {
        assert_eq!(
            run("/mediabrowser/web/index.html"),
            RewriteOutcome::Notice("http://media.lan:8096/emby/web/index.html".into())
        );
        assert_eq!(
            run("/emby/dashboard/index.html"),
            RewriteOutcome::Notice("http://media.lan:8096/emby/web/index.html".into())
        );
        // Current dashboard pages are not legacy.
        assert_eq!(run("/emby/web/dashboard/plugins.html"), RewriteOutcome::Continue);
    }

    #[test]
    fn entry_pages_respect_escape_hatch() {
        assert_eq!(run("/emby/web/dashboard.html"), redirect("index.html#!/dashboard.html"));
        assert_eq!(run("/web/home.html"), redirect("index.html"));
        assert_eq!(
            evaluate("/web/home.html", "http://h/web/home.html?r=0", true, DEFAULT),
            RewriteOutcome::Continue
        );
    }

    #[test]
    fn regular_paths_continue() {
        assert_eq!(run("/Items/123"), RewriteOutcome::Continue);
        assert_eq!(run("/emby/System/Info"), RewriteOutcome::Continue);
    }

    #[test]
    fn notice_escapes_url() {
        let body = bookmark_notice("http://h/emby/web/?q=\"><script>");
        assert!(body.contains("&quot;&gt;&lt;script&gt;"));
        assert!(!body.contains("<script>"));
    }
}
