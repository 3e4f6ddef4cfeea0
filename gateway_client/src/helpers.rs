use url::Url;

/// Longest slice of a non-JSON response body that is kept for diagnostics.
pub const MAX_SNIPPET_LEN: usize = 500;

/// Truncates `text` to at most `MAX_SNIPPET_LEN` bytes without splitting a character.
pub fn snippet(text: &str) -> String {
    if text.len() <= MAX_SNIPPET_LEN {
        return text.to_string();
    }
    let mut end = MAX_SNIPPET_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

/// The gateway's redirect URL carries its order id in the `orderId` query parameter.
pub fn order_id_from_location(location: &str) -> Option<String> {
    let url = Url::parse(location).ok()?;
    url.query_pairs().find(|(k, _)| k == "orderId").map(|(_, v)| v.into_owned()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn snippets_respect_char_boundaries() {
        assert_eq!(snippet("short"), "short");
        let long = "ż".repeat(400);
        let s = snippet(&long);
        assert!(s.len() <= MAX_SNIPPET_LEN);
        assert_eq!(s.chars().count(), 250);
    }

    #[test]
    fn order_id_in_location() {
        assert_eq!(
            order_id_from_location("https://secure.gateway.test/pay/?orderId=WZHF5FFDRJ140731GUEST000P01&token=abc"),
            Some("WZHF5FFDRJ140731GUEST000P01".into())
        );
        assert_eq!(order_id_from_location("https://secure.gateway.test/pay/"), None);
        assert_eq!(order_id_from_location("not a url"), None);
    }
}
