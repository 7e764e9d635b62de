use unicode_width::UnicodeWidthStr;

/// Terminal/editor column width of `text` (CJK counts double).
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Widest entry, for aligning a column of names.
pub fn max_width<'a>(items: impl IntoIterator<Item = &'a str>) -> usize {
    items.into_iter().map(display_width).max().unwrap_or(0)
}

/// `text` followed by enough spaces to fill `width` display columns.
pub fn pad_to(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(text));
    let mut out = String::with_capacity(text.len() + fill);
    out.push_str(text);
    out.extend(std::iter::repeat_n(' ', fill));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_width() {
        assert_eq!(display_width("users"), 5);
        assert_eq!(pad_to("id", 5), "id   ");
    }

    #[test]
    fn test_cjk_width() {
        assert_eq!(display_width("ユーザー"), 8);
        assert_eq!(pad_to("名前", 6), "名前  ");
        assert_eq!(max_width(["id", "名前", "email"]), 5);
    }

    #[test]
    fn test_no_truncation() {
        assert_eq!(pad_to("username", 3), "username");
    }
}
