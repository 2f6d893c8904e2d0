use html_escape::encode_double_quoted_attribute;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{
    css_for_theme_with_class_style, highlighted_html_for_string, ClassStyle, ClassedHTMLGenerator,
};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::warn;

use crate::error::{RenderError, RenderResult};

/// Theme used when no theme, or an unknown one, is requested.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Hook invoked by the converter for every fenced code block.
pub trait CodeHighlighter {
    /// Render `code` as an HTML block. `lang` is the first word of the fence
    /// info string, if any.
    fn highlight(&self, lang: Option<&str>, code: &str) -> RenderResult<String>;

    /// Stylesheet the highlighted markup depends on, if it uses CSS classes.
    fn stylesheet(&self) -> RenderResult<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightMode {
    /// Colours are written as `style` attributes on every span.
    Inline,
    /// Spans carry `hl-*` classes; the page embeds [`CodeHighlighter::stylesheet`].
    Classed,
}

pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
    theme_name: String,
    mode: HighlightMode,
}

impl SyntectHighlighter {
    pub fn new(theme: Option<&str>, mode: HighlightMode) -> Self {
        let mut themes = ThemeSet::load_defaults();
        let theme_name = resolve_theme_name(&themes, theme);
        let theme = themes.themes.remove(&theme_name).unwrap_or_default();

        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme,
            theme_name,
            mode,
        }
    }

    pub fn theme_name(&self) -> &str {
        &self.theme_name
    }

    fn syntax_for(&self, lang: Option<&str>) -> &SyntaxReference {
        lang.and_then(|token| self.syntaxes.find_syntax_by_token(token))
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text())
    }

    fn highlight_classed(&self, syntax: &SyntaxReference, code: &str) -> Result<String, syntect::Error> {
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntaxes, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(generator.finalize())
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn highlight(&self, lang: Option<&str>, code: &str) -> RenderResult<String> {
        let syntax = self.syntax_for(lang);
        let lang_attr = lang.map(encode_double_quoted_attribute);

        let to_error = |source| RenderError::Highlight {
            lang: lang.unwrap_or("plain text").to_string(),
            source,
        };

        let html = match self.mode {
            HighlightMode::Inline => {
                let pre = highlighted_html_for_string(code, &self.syntaxes, syntax, &self.theme)
                    .map_err(to_error)?;
                match lang_attr {
                    Some(lang) => {
                        format!("<div class=\"highlight\" data-lang=\"{lang}\">{pre}</div>\n")
                    }
                    None => format!("<div class=\"highlight\">{pre}</div>\n"),
                }
            }
            HighlightMode::Classed => {
                let spans = self.highlight_classed(syntax, code).map_err(to_error)?;
                let code_open = match lang_attr {
                    Some(lang) => format!("<code class=\"language-{lang}\" data-lang=\"{lang}\">"),
                    None => "<code>".to_string(),
                };
                format!(
                    "<div class=\"highlight\"><pre class=\"hl-code\">{code_open}{spans}</code></pre></div>\n"
                )
            }
        };

        Ok(html)
    }

    fn stylesheet(&self) -> RenderResult<Option<String>> {
        match self.mode {
            HighlightMode::Inline => Ok(None),
            HighlightMode::Classed => css_for_theme_with_class_style(&self.theme, CLASS_STYLE)
                .map(Some)
                .map_err(|source| RenderError::ThemeStylesheet {
                    theme: self.theme_name.clone(),
                    source,
                }),
        }
    }
}

/// Names of the built-in highlight themes.
pub fn theme_names() -> Vec<String> {
    ThemeSet::load_defaults().themes.into_keys().collect()
}

fn resolve_theme_name(themes: &ThemeSet, requested: Option<&str>) -> String {
    match requested.map(str::trim).filter(|name| !name.is_empty()) {
        None => DEFAULT_THEME.to_string(),
        Some(name) if themes.themes.contains_key(name) => name.to_string(),
        Some(name) => {
            warn!(
                theme = name,
                fallback = DEFAULT_THEME,
                "unknown highlight theme, using the default"
            );
            DEFAULT_THEME.to_string()
        }
    }
}
