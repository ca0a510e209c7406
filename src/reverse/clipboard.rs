const FRAGMENT_START: &str = "<html><body><!--StartFragment-->";
const FRAGMENT_END: &str = "<!--EndFragment--></body></html>";

/// Wraps an HTML fragment in the Windows `CF_HTML` clipboard format.
///
/// The header records byte offsets into the payload itself: where the HTML starts and ends, and where the fragment
/// between the `StartFragment`/`EndFragment` comments starts and ends. Offsets are zero-padded to eight digits, which
/// keeps the header's own length fixed.
pub fn clipboard_payload(fragment: &str) -> String {
    let header_len = header(0, 0, 0, 0).len();
    let start_html = header_len;
    let start_fragment = start_html + FRAGMENT_START.len();
    let end_fragment = start_fragment + fragment.len();
    let end_html = end_fragment + FRAGMENT_END.len();

    let mut payload = header(start_html, end_html, start_fragment, end_fragment);
    payload.reserve(end_html - header_len);
    payload.push_str(FRAGMENT_START);
    payload.push_str(fragment);
    payload.push_str(FRAGMENT_END);
    payload
}

fn header(start_html: usize, end_html: usize, start_fragment: usize, end_fragment: usize) -> String {
    format!(
        "Version:0.9\r\nStartHTML:{start_html:08}\r\nEndHTML:{end_html:08}\r\nStartFragment:{start_fragment:08}\r\nEndFragment:{end_fragment:08}\r\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset(payload: &str, key: &str) -> usize {
        let line = payload.lines().find(|line| line.starts_with(key)).unwrap();
        line[key.len() + 1..].trim_end().parse().unwrap()
    }

    #[test]
    fn offsets_point_at_markers() {
        let payload = clipboard_payload("<b>안녕</b>");
        let start_html = offset(&payload, "StartHTML");
        let end_html = offset(&payload, "EndHTML");
        let start_fragment = offset(&payload, "StartFragment");
        let end_fragment = offset(&payload, "EndFragment");

        assert!(payload[start_html..].starts_with("<html>"));
        assert_eq!(end_html, payload.len());
        assert_eq!(&payload[start_fragment..end_fragment], "<b>안녕</b>");
    }

    #[test]
    fn header_is_fixed_width() {
        let payload = clipboard_payload("");
        assert!(payload.starts_with("Version:0.9\r\nStartHTML:00000097\r\n"), "{payload}");
        assert_eq!(header(1, 2, 3, 4).len(), header(10_000, 20_000, 30_000, 40_000).len());
    }
}
