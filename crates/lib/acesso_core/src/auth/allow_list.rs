//! Newline-delimited allow-lists and redirect URI decoding.

/// Entries of a newline-delimited allow-list, skipping blank lines.
///
/// Carriage returns are removed first, so CRLF lists behave like LF lists.
pub fn entries(list: &str) -> Vec<String> {
    list.replace('\r', "")
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `url` exactly equals one of the list's entries.
///
/// No prefix or wildcard matching. A missing list allows nothing.
pub fn contains(list: Option<&str>, url: &str) -> bool {
    list.is_some_and(|list| entries(list).iter().any(|entry| entry == url))
}

/// Form-style decoding: `+` becomes a space, then percent-decoding.
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn decode_form_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// The referer without its query string or fragment.
pub fn strip_query(referer: &str) -> &str {
    let end = referer.find(['?', '#']).unwrap_or(referer.len());
    &referer[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_skip_blank_lines_and_carriage_returns() {
        let list = "https://a.example/cb\r\n\r\n  \nhttps://b.example/cb\n";
        assert_eq!(
            entries(list),
            vec!["https://a.example/cb", "https://b.example/cb"]
        );
    }

    #[test]
    fn contains_is_exact() {
        let list = Some("https://app.example/cb");
        assert!(contains(list, "https://app.example/cb"));
        assert!(!contains(list, "https://app.example/cb/"));
        assert!(!contains(list, "https://app.example"));
        assert!(!contains(list, "https://app.example/cb?x=1"));
        assert!(!contains(None, "https://app.example/cb"));
    }

    #[test]
    fn decodes_percent_and_plus() {
        assert_eq!(
            decode_form_component("https%3A%2F%2Fapp.example%2Fcb"),
            "https://app.example/cb"
        );
        assert_eq!(decode_form_component("a+b%2Bc"), "a b+c");
        assert_eq!(decode_form_component("plain"), "plain");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(decode_form_component("%FF"), "\u{FFFD}");
    }

    #[test]
    fn strip_query_drops_query_and_fragment() {
        assert_eq!(strip_query("https://a.example/p?x=1"), "https://a.example/p");
        assert_eq!(strip_query("https://a.example/p#top"), "https://a.example/p");
        assert_eq!(strip_query("https://a.example/p"), "https://a.example/p");
    }
}
