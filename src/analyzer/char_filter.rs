use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

pub trait CharFilter {
    fn filter<'a>(&self, text: &'a str) -> Cow<'a, str>;
}

#[derive(Debug)]
pub struct BasicCharFilter {}

impl BasicCharFilter {
    pub fn new() -> Self {
        BasicCharFilter {}
    }
}

impl CharFilter for BasicCharFilter {
    fn filter<'a>(&self, text: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(text)
    }
}

lazy_static! {
    static ref TAG_PATTERN: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Replaces markup tags with spaces so token boundaries survive
/// `<p>one</p><p>two</p>`.
#[derive(Debug)]
pub struct HtmlCharFilter {}

impl HtmlCharFilter {
    pub fn new() -> Self {
        HtmlCharFilter {}
    }
}

impl CharFilter for HtmlCharFilter {
    fn filter<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.contains('<') {
            return Cow::Borrowed(text);
        }

        TAG_PATTERN.replace_all(text, " ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_filter_is_identity() {
        let filter = BasicCharFilter::new();
        assert_eq!(filter.filter("a <b> c"), "a <b> c");
    }

    #[test]
    fn html_filter_strips_tags() {
        let filter = HtmlCharFilter::new();
        assert_eq!(
            filter.filter("<html><body>cat<br/>dog</body></html>"),
            "  cat dog  "
        );
    }

    #[test]
    fn html_filter_borrows_plain_text() {
        let filter = HtmlCharFilter::new();
        match filter.filter("plain text") {
            Cow::Borrowed(s) => assert_eq!(s, "plain text"),
            Cow::Owned(_) => panic!("plain text should not allocate"),
        }
    }
}
