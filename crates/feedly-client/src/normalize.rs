//! Identifier shaping for paths and bodies.
//!
//! Feedly tag and category ids live under the user's namespace
//! (`user/<uid>/tag/<name>`, `user/<uid>/category/<name>`). Bare names are
//! qualified with the session's user id; anything already starting with
//! `user/` is left as is.

use std::borrow::Cow;

const USER_PREFIX: &str = "user/";
const FEED_PREFIX: &str = "feed/";

/// Percent-encode an id for use as a single path segment.
pub fn encode_id(id: &str) -> Cow<'_, str> {
    urlencoding::encode(id)
}

/// Whether the id already carries a `user/` namespace.
pub fn is_qualified(id: &str) -> bool {
    id.starts_with(USER_PREFIX)
}

/// Qualify a tag name and percent-encode the whole id.
pub fn normalize_tag(tag: &str, user_id: &str) -> String {
    if is_qualified(tag) {
        encode_id(tag).into_owned()
    } else {
        encode_id(&format!("{}{}/tag/{}", USER_PREFIX, user_id, tag)).into_owned()
    }
}

/// Qualify a category name. Not encoded; category ids travel in bodies.
pub fn category_id(category: &str, user_id: &str) -> String {
    if is_qualified(category) {
        category.to_string()
    } else {
        format!("{}{}/category/{}", USER_PREFIX, user_id, category)
    }
}

/// Display name of a qualified id: everything after `user/<uid>/`.
pub fn category_name(id: &str) -> Option<&str> {
    let rest = id.strip_prefix(USER_PREFIX)?;
    let (uid, name) = rest.split_once('/')?;
    (!uid.is_empty()).then_some(name)
}

/// Prefix a feed URL with `feed/` when missing.
pub fn feed_id(url: &str) -> Cow<'_, str> {
    if url.starts_with(FEED_PREFIX) {
        Cow::Borrowed(url)
    } else {
        Cow::Owned(format!("{}{}", FEED_PREFIX, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_tag_is_qualified_and_encoded() {
        assert_eq!(normalize_tag("foo", "u-1"), "user%2Fu-1%2Ftag%2Ffoo");
    }

    #[test]
    fn test_qualified_tag_is_encoded_whole() {
        assert_eq!(normalize_tag("user/x/tag/foo", "u-1"), "user%2Fx%2Ftag%2Ffoo");
        assert_eq!(
            normalize_tag("user/x/tag/global.saved", "u-1"),
            "user%2Fx%2Ftag%2Fglobal.saved"
        );
    }

    #[test]
    fn test_tag_with_spaces() {
        assert_eq!(normalize_tag("read later", "u"), "user%2Fu%2Ftag%2Fread%20later");
    }

    #[test]
    fn test_category_id() {
        assert_eq!(category_id("tech", "u-1"), "user/u-1/category/tech");
        assert_eq!(category_id("user/x/category/tech", "u-1"), "user/x/category/tech");
    }

    #[test]
    fn test_category_name() {
        assert_eq!(category_name("user/x/category/tech"), Some("category/tech"));
        assert_eq!(category_name("tech"), None);
        assert_eq!(category_name("user//category"), None);
    }

    #[test]
    fn test_feed_id() {
        assert_eq!(feed_id("http://x.com/rss"), "feed/http://x.com/rss");
        assert_eq!(feed_id("feed/http://x.com/rss"), "feed/http://x.com/rss");
    }

    #[test]
    fn test_encode_id() {
        assert_eq!(
            encode_id("feed/http://x.com/rss?a=1"),
            "feed%2Fhttp%3A%2F%2Fx.com%2Frss%3Fa%3D1"
        );
    }
}
