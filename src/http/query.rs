//! Query string helpers.

use url::form_urlencoded;

/// Remove every `key` parameter from `url`, keeping the rest byte-for-byte.
///
/// Names are compared after decoding and ignoring ASCII case. The input is
/// returned unchanged when the key is absent; an emptied query loses its `?`.
pub fn remove_query_string_by_key(url: &str, key: &str) -> String {
    let (without_fragment, fragment) = match url.find('#') {
        Some(index) => (&url[..index], &url[index..]),
        None => (url, ""),
    };
    let Some(q) = without_fragment.find('?') else {
        return url.to_string();
    };
    let (base, query) = (&without_fragment[..q], &without_fragment[q + 1..]);

    let mut removed = false;
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            if pair.is_empty() {
                return false;
            }
            let matches = form_urlencoded::parse(pair.as_bytes())
                .next()
                .map(|(name, _)| name.eq_ignore_ascii_case(key))
                .unwrap_or(false);
            removed |= matches;
            !matches
        })
        .collect();

    if !removed {
        return url.to_string();
    }

    let mut out = String::with_capacity(url.len());
    out.push_str(base);
    if !kept.is_empty() {
        out.push('?');
        out.push_str(&kept.join("&"));
    }
    out.push_str(fragment);
    out
}
