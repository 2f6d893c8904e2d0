mod error;
mod io;
mod profile;

pub use error::{CliError, ExitCode};
pub use io::{print_lines, Input, Output};
pub use profile::{timed, Profiler};

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Arg, ArgAction, CommandFactory, FromArgMatches, Parser};
use md2html::{theme_names, ConvertOptions, PageConfiguration, Renderer};
use md2html_config::{Config, LoadOptions};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "md2html",
    author,
    version,
    about = "Markdown processor: render Markdown as an HTML fragment or a standalone page",
    disable_version_flag = true
)]
pub struct Cli {
    /// Markdown input file (stdin when omitted or '-')
    #[arg(value_name = "INPUTFILE")]
    input: Option<PathBuf>,

    /// HTML output file (stdout when omitted or '-')
    #[arg(value_name = "OUTPUTFILE")]
    output: Option<PathBuf>,

    /// Generate a standalone HTML page (default)
    #[arg(long, overrides_with = "no_page")]
    page: bool,

    /// Emit only the HTML fragment
    #[arg(long = "no-page", overrides_with = "page")]
    no_page: bool,

    /// Link to a CSS stylesheet (implies --page)
    #[arg(long, value_name = "URL")]
    css: Option<String>,

    /// Highlight theme for fenced code blocks; empty selects the default
    #[arg(long, value_name = "NAME")]
    style: Option<String>,

    /// List the available highlight themes and exit
    #[arg(long = "list-styles")]
    list_styles: bool,

    /// Write a pprof CPU profile of the run to a file
    #[arg(long = "cpuprofile", value_name = "PATH")]
    cpuprofile: Option<PathBuf>,

    /// Configuration file applied after any discovered .md2html.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Diagnostic log filter (error, warn, info, debug, trace)
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "warn",
        value_parser = parse_log_filter
    )]
    log_level: String,
}

impl Cli {
    /// Parse arguments, accepting `-v` as well as `--version`.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let command = Cli::command().arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .action(ArgAction::Version)
                .help("Print version"),
        );
        let matches = command.try_get_matches_from(args)?;
        Cli::from_arg_matches(&matches)
    }

    /// Page settings: flags first, then configuration.
    pub fn page_configuration(&self, config: &Config) -> PageConfiguration {
        let standalone = if self.page {
            true
        } else if self.no_page {
            false
        } else {
            config.page.standalone
        };
        let css = self.css.clone().unwrap_or_else(|| config.page.css.clone());
        let theme = self
            .style
            .clone()
            .unwrap_or_else(|| config.highlight.theme.clone());

        PageConfiguration::fragment()
            .with_standalone(standalone)
            .with_stylesheet(css)
            .with_theme(theme)
    }

    fn load_options(&self) -> LoadOptions {
        match &self.config {
            Some(path) => LoadOptions::default().with_override_path(path),
            None => LoadOptions::default(),
        }
    }
}

pub fn convert_options(config: &Config) -> ConvertOptions {
    ConvertOptions {
        gfm: config.render.gfm,
        smart_punctuation: config.render.smart_punctuation,
        hard_wraps: config.render.hard_wraps,
        heading_ids: config.render.heading_ids,
    }
}

/// Entry point for CLI execution. Returns the process exit code.
pub fn run<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_args(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::Failure
            } else {
                ExitCode::Success
            };
        }
    };

    init_tracing(&cli.log_level);

    match execute(&cli) {
        Ok(()) => ExitCode::Success,
        Err(err) => {
            eprintln!("md2html: {err}");
            err.exit_code()
        }
    }
}

/// Read, convert and write one document.
pub fn execute(cli: &Cli) -> Result<(), CliError> {
    if cli.list_styles {
        return print_lines(theme_names());
    }

    let _profiler = Profiler::start(cli.cpuprofile.as_deref());

    let config = Config::load(cli.load_options())?;
    let page = cli.page_configuration(&config);
    debug!(?page, layers = config.sources.layers.len(), "resolved configuration");

    let input = Input::from_arg(cli.input.as_deref());
    let output = Output::from_arg(cli.output.as_deref());

    let source = timed("read", || input.read())?;
    let renderer = timed("setup", || Renderer::new(page, convert_options(&config)));
    let document = timed("convert", || renderer.render(&source))?;
    timed("write", || output.write(&renderer, &document))?;

    Ok(())
}

fn parse_log_filter(value: &str) -> Result<String, String> {
    EnvFilter::try_new(value)
        .map(|_| value.to_string())
        .map_err(|err| format!("invalid log filter: {err}"))
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
