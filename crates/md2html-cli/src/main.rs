fn main() -> std::process::ExitCode {
    md2html_cli::run(std::env::args_os()).into()
}
