//! Page shell around a rendered fragment.
//!
//! Output is always wrapped in an `<article>` container. In fragment mode that
//! container is the only addition; in standalone mode it sits inside a full
//! document whose head carries the title and styling.

use std::io::{self, Write};

use html_escape::encode_text;

use crate::title::DEFAULT_TITLE;

/// Stylesheet embedded in standalone pages that do not link their own.
pub const DEFAULT_STYLESHEET: &str = include_str!("../assets/markdown-body.css");

/// How the converted document is presented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageConfiguration {
    standalone: bool,
    stylesheet: Option<String>,
    theme: Option<String>,
}

impl PageConfiguration {
    /// Bare fragment output with the default highlight theme.
    pub fn fragment() -> Self {
        Self::default()
    }

    /// Full HTML document with the built-in stylesheet.
    pub fn standalone() -> Self {
        Self {
            standalone: true,
            ..Self::default()
        }
    }

    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone || self.stylesheet.is_some();
        self
    }

    /// Link an external stylesheet instead of embedding the built-in one.
    /// A non-empty URL forces standalone output.
    pub fn with_stylesheet(mut self, url: impl Into<String>) -> Self {
        self.stylesheet = non_empty(url.into());
        if self.stylesheet.is_some() {
            self.standalone = true;
        }
        self
    }

    /// Highlight theme name; empty selects the built-in default.
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = non_empty(theme.into());
        self
    }

    pub fn is_standalone(&self) -> bool {
        self.standalone
    }

    pub fn stylesheet(&self) -> Option<&str> {
        self.stylesheet.as_deref()
    }

    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

pub struct PageAssembler<'a> {
    config: &'a PageConfiguration,
}

impl<'a> PageAssembler<'a> {
    pub fn new(config: &'a PageConfiguration) -> Self {
        Self { config }
    }

    /// Write `fragment` wrapped for the configured mode. `title` and
    /// `highlight_css` are only used for standalone pages.
    pub fn write<W: Write>(
        &self,
        out: &mut W,
        title: Option<&str>,
        fragment: &str,
        highlight_css: Option<&str>,
    ) -> io::Result<()> {
        if !self.config.standalone {
            out.write_all(b"<article class=\"markdown-body\">\n")?;
            out.write_all(fragment.as_bytes())?;
            out.write_all(b"</article>\n")?;
            return Ok(());
        }

        self.write_header(out, title.unwrap_or(DEFAULT_TITLE), highlight_css)?;
        out.write_all(fragment.as_bytes())?;
        out.write_all(FOOTER.as_bytes())
    }

    fn write_header<W: Write>(
        &self,
        out: &mut W,
        title: &str,
        highlight_css: Option<&str>,
    ) -> io::Result<()> {
        write!(
            out,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n",
            encode_text(title)
        )?;

        match self.config.stylesheet() {
            Some(url) => writeln!(
                out,
                "<link crossorigin=\"anonymous\" media=\"all\" rel=\"stylesheet\" href=\"{}\" />",
                url.replace('"', "&quot;")
            )?,
            None => write!(out, "<style>\n{DEFAULT_STYLESHEET}</style>\n")?,
        }

        if let Some(css) = highlight_css {
            write!(out, "<style>\n{css}</style>\n")?;
        }

        out.write_all(BODY_OPEN.as_bytes())
    }
}

const BODY_OPEN: &str =
    "</head>\n<body>\n<article class=\"markdown-body entry-content\" style=\"padding: 30px;\">\n";

const FOOTER: &str = "</article>\n</body>\n</html>\n";

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(config: &PageConfiguration, title: Option<&str>, css: Option<&str>) -> String {
        let mut out = Vec::new();
        PageAssembler::new(config)
            .write(&mut out, title, "<p>body</p>\n", css)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn fragment_mode_only_adds_article() {
        let html = render(&PageConfiguration::fragment(), Some("ignored"), Some(".x{}"));
        assert_eq!(html, "<article class=\"markdown-body\">\n<p>body</p>\n</article>\n");
    }

    #[test]
    fn standalone_page_embeds_default_stylesheet() {
        let html = render(&PageConfiguration::standalone(), Some("Doc"), None);
        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n"));
        assert!(html.contains("<title>Doc</title>"));
        assert!(html.contains(DEFAULT_STYLESHEET));
        assert!(!html.contains("<link"));
        assert!(html.ends_with(
            "style=\"padding: 30px;\">\n<p>body</p>\n</article>\n</body>\n</html>\n"
        ));
    }

    #[test]
    fn title_is_escaped() {
        let html = render(&PageConfiguration::standalone(), Some("<a> & b"), None);
        assert!(html.contains("<title>&lt;a&gt; &amp; b</title>"));
    }

    #[test]
    fn missing_title_uses_fallback() {
        let html = render(&PageConfiguration::standalone(), None, None);
        assert!(html.contains("<title>untitled</title>"));
    }

    #[test]
    fn stylesheet_link_replaces_builtin_style() {
        let config = PageConfiguration::fragment().with_stylesheet("https://cdn.example/a.css?v=1&x");
        let html = render(&config, Some("Doc"), None);
        assert!(html.contains(
            "<link crossorigin=\"anonymous\" media=\"all\" rel=\"stylesheet\" href=\"https://cdn.example/a.css?v=1&x\" />"
        ));
        assert!(!html.contains(DEFAULT_STYLESHEET));
    }

    #[test]
    fn stylesheet_link_quotes_are_neutralised() {
        let config = PageConfiguration::fragment().with_stylesheet("a\"b.css");
        let html = render(&config, None, None);
        assert!(html.contains("href=\"a&quot;b.css\""));
    }

    #[test]
    fn highlight_css_is_embedded_after_page_style() {
        let config = PageConfiguration::fragment().with_stylesheet("site.css");
        let html = render(&config, None, Some(".hl-code { color: red; }\n"));
        let link = html.find("<link").unwrap();
        let theme = html.find(".hl-code").unwrap();
        assert!(link < theme);
    }

    #[test]
    fn stylesheet_forces_standalone() {
        let config = PageConfiguration::fragment()
            .with_stylesheet("site.css")
            .with_standalone(false);
        assert!(config.is_standalone());

        let config = PageConfiguration::fragment().with_stylesheet("  ");
        assert!(!config.is_standalone());
        assert_eq!(config.stylesheet(), None);
    }

    #[test]
    fn empty_theme_means_default() {
        assert_eq!(PageConfiguration::standalone().with_theme("").theme(), None);
        assert_eq!(
            PageConfiguration::standalone().with_theme("Solarized (dark)").theme(),
            Some("Solarized (dark)")
        );
    }
}
