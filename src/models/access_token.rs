//! Personal access tokens used as bearer credentials.
//!
//! A token is handed to the client once as `<id>|<secret>`. Only the SHA-256
//! digest of the secret is stored.

/// A bearer value split into its optional id prefix and secret.
#[derive(Debug, PartialEq, Eq)]
pub struct PresentedToken<'a> {
    pub id: Option<i64>,
    pub secret: &'a str,
}

impl<'a> PresentedToken<'a> {
    /// Parse `<id>|<secret>` or a bare `<secret>`.
    ///
    /// Returns `None` for an empty secret or a non-numeric id prefix.
    pub fn parse(value: &'a str) -> Option<Self> {
        let (id, secret) = match value.split_once('|') {
            Some((id, secret)) => (Some(id.parse::<i64>().ok()?), secret),
            None => (None, value),
        };
        if secret.is_empty() {
            return None;
        }
        Some(Self { id, secret })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_tokens() {
        assert_eq!(
            PresentedToken::parse("42|abcdef"),
            Some(PresentedToken {
                id: Some(42),
                secret: "abcdef"
            })
        );
    }

    #[test]
    fn parses_bare_tokens() {
        assert_eq!(PresentedToken::parse("abcdef").unwrap().id, None);
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(PresentedToken::parse("").is_none());
        assert!(PresentedToken::parse("7|").is_none());
        assert!(PresentedToken::parse("x|abcdef").is_none());
    }
}
