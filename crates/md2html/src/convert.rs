use html_escape::encode_double_quoted_attribute;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag};

use crate::error::RenderResult;
use crate::highlight::CodeHighlighter;
use crate::slug::HeadingIds;

/// Markdown features applied on top of CommonMark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Tables, strikethrough, task lists and footnotes.
    pub gfm: bool,
    /// Curly quotes, dashes and ellipses.
    pub smart_punctuation: bool,
    /// Render soft line breaks as `<br />`.
    pub hard_wraps: bool,
    /// Give every heading an `id` derived from its text.
    pub heading_ids: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            smart_punctuation: true,
            hard_wraps: true,
            heading_ids: true,
        }
    }
}

/// Turns raw Markdown into an HTML fragment.
pub trait MarkdownConverter {
    fn convert(&self, input: &[u8]) -> RenderResult<String>;
}

pub struct PulldownConverter<H> {
    options: ConvertOptions,
    highlighter: H,
}

impl<H: CodeHighlighter> PulldownConverter<H> {
    pub fn new(options: ConvertOptions, highlighter: H) -> Self {
        Self {
            options,
            highlighter,
        }
    }

    pub fn highlighter(&self) -> &H {
        &self.highlighter
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.options.gfm {
            options.insert(Options::ENABLE_TABLES);
            options.insert(Options::ENABLE_STRIKETHROUGH);
            options.insert(Options::ENABLE_TASKLISTS);
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.options.smart_punctuation {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        options
    }

    fn rewrite<'a, I>(&self, events: I) -> RenderResult<Vec<Event<'a>>>
    where
        I: Iterator<Item = Event<'a>>,
    {
        let mut output = EventSink::default();
        let mut ids = HeadingIds::new();
        let mut code: Option<FencedCode> = None;

        for event in events {
            if let Some(block) = code.as_mut() {
                match event {
                    Event::End(Tag::CodeBlock(CodeBlockKind::Fenced(_))) => {
                        let html = self
                            .highlighter
                            .highlight(block.lang.as_deref(), &block.text)?;
                        output.push(Event::Html(html.into()));
                        code = None;
                    }
                    Event::Text(text) => block.text.push_str(&text),
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    code = Some(FencedCode::new(&info));
                }
                Event::Start(Tag::Heading(level, id, classes)) if self.options.heading_ids => {
                    output.open_heading(level, id, classes);
                }
                Event::End(Tag::Heading(..)) if output.in_heading() => {
                    output.close_heading(&mut ids);
                }
                Event::SoftBreak if self.options.hard_wraps => output.push(Event::HardBreak),
                other => output.push(other),
            }
        }

        Ok(output.finish())
    }
}

impl<H: CodeHighlighter> MarkdownConverter for PulldownConverter<H> {
    fn convert(&self, input: &[u8]) -> RenderResult<String> {
        let text = std::str::from_utf8(input)?;
        let events = self.rewrite(Parser::new_ext(text, self.parser_options()))?;

        let mut fragment = String::with_capacity(text.len() + text.len() / 2);
        html::push_html(&mut fragment, events.into_iter());
        Ok(fragment)
    }
}

struct FencedCode {
    lang: Option<String>,
    text: String,
}

impl FencedCode {
    fn new(info: &str) -> Self {
        let lang = info
            .split(|c: char| c.is_whitespace() || c == ',')
            .find(|token| !token.is_empty())
            .map(str::to_string);
        Self {
            lang,
            text: String::new(),
        }
    }
}

struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<&'a str>,
    classes: Vec<&'a str>,
    text: String,
    events: Vec<Event<'a>>,
}

/// Collects rewritten events, holding heading content back until its id is known.
#[derive(Default)]
struct EventSink<'a> {
    events: Vec<Event<'a>>,
    heading: Option<PendingHeading<'a>>,
}

impl<'a> EventSink<'a> {
    fn push(&mut self, event: Event<'a>) {
        match self.heading.as_mut() {
            Some(heading) => {
                if let Event::Text(text) | Event::Code(text) = &event {
                    heading.text.push_str(text);
                }
                heading.events.push(event);
            }
            None => self.events.push(event),
        }
    }

    fn in_heading(&self) -> bool {
        self.heading.is_some()
    }

    fn open_heading(&mut self, level: HeadingLevel, id: Option<&'a str>, classes: Vec<&'a str>) {
        self.heading = Some(PendingHeading {
            level,
            id,
            classes,
            text: String::new(),
            events: Vec::new(),
        });
    }

    fn close_heading(&mut self, ids: &mut HeadingIds) {
        let Some(heading) = self.heading.take() else {
            return;
        };

        let id = match heading.id {
            Some(explicit) => {
                ids.reserve(explicit);
                explicit.to_string()
            }
            None => ids.generate(&heading.text),
        };
        let tag = heading_tag(heading.level);

        let mut open = format!("<{tag} id=\"{}\"", encode_double_quoted_attribute(&id));
        if !heading.classes.is_empty() {
            let classes = heading.classes.join(" ");
            open.push_str(&format!(
                " class=\"{}\"",
                encode_double_quoted_attribute(&classes)
            ));
        }
        open.push('>');

        self.events.push(Event::Html(CowStr::from(open)));
        self.events.extend(heading.events);
        self.events
            .push(Event::Html(CowStr::from(format!("</{tag}>\n"))));
    }

    fn finish(mut self) -> Vec<Event<'a>> {
        if let Some(heading) = self.heading.take() {
            self.events.extend(heading.events);
        }
        self.events
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}
