//! Removal of server filesystem paths from client-visible messages.

/// Strips configured filesystem paths out of error messages.
#[derive(Debug, Clone, Default)]
pub struct MessageSanitizer {
    paths: Vec<String>,
}

impl MessageSanitizer {
    /// Create a sanitizer for the given paths. Blank entries are ignored.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut paths: Vec<String> = paths
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.trim().is_empty())
            .collect();
        // Longest first so a nested data path under the install path is removed whole.
        paths.sort_by_key(|p| std::cmp::Reverse(p.len()));
        Self { paths }
    }

    /// Remove every configured path from `message`, ignoring ASCII case.
    pub fn sanitize(&self, message: &str) -> String {
        let mut out = message.to_string();
        for path in &self.paths {
            out = replace_ignore_ascii_case(&out, path, "");
        }
        out
    }
}

/// Replace every occurrence of `needle` in `haystack`, ignoring ASCII case.
pub(crate) fn replace_ignore_ascii_case(haystack: &str, needle: &str, replacement: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    // ASCII lowercasing keeps byte offsets aligned with the original string.
    let lower = haystack.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();

    let mut out = String::with_capacity(haystack.len());
    let mut cursor = 0;
    while let Some(found) = lower[cursor..].find(&needle) {
        let start = cursor + found;
        out.push_str(&haystack[cursor..start]);
        out.push_str(replacement);
        cursor = start + needle.len();
    }
    out.push_str(&haystack[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_paths_case_insensitively() {
        let s = MessageSanitizer::new(["/opt/MediaServer", "/var/lib/mediaserver"]);
        let msg = "Could not find file '/opt/mediaserver/web/x.html' or '/VAR/lib/MediaServer/cache'";
        assert_eq!(s.sanitize(msg), "Could not find file '/web/x.html' or '/cache'");
    }

    #[test]
    fn nested_paths_removed_whole() {
        let s = MessageSanitizer::new(["/srv", "/srv/data"]);
        assert_eq!(s.sanitize("missing /srv/data/item"), "missing /item");
    }

    #[test]
    fn blank_paths_are_ignored() {
        let s = MessageSanitizer::new(["", "  "]);
        assert_eq!(s.sanitize("untouched"), "untouched");
    }
}
