mod convert;
mod error;
mod highlight;
mod page;
mod slug;
mod title;

pub use convert::{ConvertOptions, MarkdownConverter, PulldownConverter};
pub use error::{RenderError, RenderResult};
pub use highlight::{theme_names, CodeHighlighter, HighlightMode, SyntectHighlighter, DEFAULT_THEME};
pub use page::{PageAssembler, PageConfiguration, DEFAULT_STYLESHEET};
pub use slug::{slugify, HeadingIds};
pub use title::{extract_title, DEFAULT_TITLE};

use std::io::{self, Write};

use tracing::debug;

/// Result of converting one document, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub title: Option<String>,
    pub fragment: String,
    pub highlight_css: Option<String>,
}

/// Converts documents for a fixed page configuration.
pub struct Renderer {
    page: PageConfiguration,
    converter: PulldownConverter<SyntectHighlighter>,
}

impl Renderer {
    pub fn new(page: PageConfiguration, options: ConvertOptions) -> Self {
        let mode = if page.is_standalone() {
            HighlightMode::Classed
        } else {
            HighlightMode::Inline
        };
        let highlighter = SyntectHighlighter::new(page.theme(), mode);
        debug!(
            standalone = page.is_standalone(),
            theme = highlighter.theme_name(),
            "renderer ready"
        );

        Self {
            page,
            converter: PulldownConverter::new(options, highlighter),
        }
    }

    /// Extract the title (standalone pages only) and convert `input`.
    pub fn render(&self, input: &[u8]) -> RenderResult<RenderedDocument> {
        let title = self.page.is_standalone().then(|| extract_title(input));
        if let Some(title) = &title {
            debug!(title = %title, "extracted title");
        }

        let fragment = self.converter.convert(input)?;
        let highlight_css = if self.page.is_standalone() {
            self.converter.highlighter().stylesheet()?
        } else {
            None
        };

        Ok(RenderedDocument {
            title,
            fragment,
            highlight_css,
        })
    }

    pub fn write<W: Write>(&self, document: &RenderedDocument, out: &mut W) -> io::Result<()> {
        PageAssembler::new(&self.page).write(
            out,
            document.title.as_deref(),
            &document.fragment,
            document.highlight_css.as_deref(),
        )
    }

    /// Convenience wrapper producing the complete output in memory.
    pub fn render_to_string(&self, input: &[u8]) -> RenderResult<String> {
        let document = self.render(input)?;
        let mut out = Vec::with_capacity(document.fragment.len() + 4096);
        self.write(&document, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
