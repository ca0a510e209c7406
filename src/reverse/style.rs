use serde::Serialize;

pub const DEFAULT_FONT_FAMILY: &str = "'Malgun Gothic', sans-serif";

/// How header levels map to point sizes: `base - level * step`, clamped to `min..=max`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct HeaderSizing {
    pub base: u32,
    pub step: u32,
    pub min: u32,
    pub max: Option<u32>,
}

impl Default for HeaderSizing {
    fn default() -> Self {
        Self {
            base: 18,
            step: 2,
            min: 12,
            max: None,
        }
    }
}

impl HeaderSizing {
    pub fn font_size(&self, level: u8) -> u32 {
        let size = self.base.saturating_sub(u32::from(level).saturating_mul(self.step)).max(self.min);
        match self.max {
            Some(max) => size.min(max),
            None => size,
        }
    }
}

/// The inline CSS every generated element carries. Word ignores stylesheets on paste, so each tag is styled
/// individually.
pub(crate) struct Styles {
    font_family: String,
    sizing: HeaderSizing,
}

impl Styles {
    pub(crate) fn new(font_family: &str, sizing: HeaderSizing) -> Self {
        Self {
            font_family: font_family.to_string(),
            sizing,
        }
    }

    pub(crate) fn body_open(&self) -> String {
        format!(
            r#"<html><body style="font-weight: normal; font-family: {}; font-size: 11pt;">"#,
            self.font_family
        )
    }

    pub(crate) fn paragraph_open(&self) -> String {
        format!(
            r#"<p style="line-height: 1.1; font-size: 11pt; font-family: {}; color: #000000; font-weight: normal;">"#,
            self.font_family
        )
    }

    pub(crate) fn header(&self, level: u8, content: &str) -> String {
        format!(
            r#"<div style="font-size: {}pt; line-height: 1.1; font-weight: bold; color: #000000; font-family: {};">{content}</div>"#,
            self.sizing.font_size(level),
            self.font_family
        )
    }

    pub(crate) fn list_open(&self) -> &'static str {
        r#"<ul style="margin: 0; padding-left: 20px;">"#
    }

    pub(crate) fn list_item_open(&self) -> String {
        format!(
            r#"<li style="line-height: 1.1; font-size: 11pt; font-family: {};">"#,
            self.font_family
        )
    }

    pub(crate) fn table_open(&self) -> String {
        format!(
            r#"<table border="1" cellspacing="0" cellpadding="5" style="border-collapse: collapse; width: 100%; border: 1px solid black; font-family: {}; font-size: 10pt; line-height: 1.1; margin: 0px; mso-para-margin: 0px; font-weight: normal;">"#,
            self.font_family
        )
    }

    pub(crate) fn header_cell_open(&self) -> &'static str {
        r#"<th style="border: 1px solid black; padding: 5px; background-color: #f2f2f2;">"#
    }

    pub(crate) fn cell_open(&self) -> &'static str {
        r#"<td style="border: 1px solid black; padding: 5px;">"#
    }

    pub(crate) fn rule(&self) -> &'static str {
        r#"<hr style="border:none; border-top:1px solid #000000;">"#
    }

    pub(crate) fn pre_open(&self) -> &'static str {
        r#"<pre style="font-family: Consolas, 'Courier New', monospace; font-size: 10pt; line-height: 1.1; background: #f5f5f5; padding: 6px;">"#
    }

    pub(crate) fn code_open(&self) -> &'static str {
        r#"<code style="font-family: Consolas, 'Courier New', monospace; font-size: 10pt;">"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sizes() {
        let sizing = HeaderSizing::default();
        let sizes: Vec<_> = (1..=6).map(|level| sizing.font_size(level)).collect();
        assert_eq!(sizes, vec![16, 14, 12, 12, 12, 12]);
    }

    #[test]
    fn clamped_to_max() {
        let sizing = HeaderSizing {
            base: 30,
            step: 2,
            min: 12,
            max: Some(20),
        };
        assert_eq!(sizing.font_size(1), 20);
        assert_eq!(sizing.font_size(5), 20);
        assert_eq!(sizing.font_size(6), 18);
    }

    #[test]
    fn huge_step_does_not_underflow() {
        let sizing = HeaderSizing {
            base: 18,
            step: u32::MAX,
            min: 9,
            max: None,
        };
        assert_eq!(sizing.font_size(6), 9);
    }

    #[test]
    fn header_markup() {
        let styles = Styles::new("Arial", HeaderSizing::default());
        assert_eq!(
            styles.header(1, "T"),
            r#"<div style="font-size: 16pt; line-height: 1.1; font-weight: bold; color: #000000; font-family: Arial;">T</div>"#
        );
    }
}
