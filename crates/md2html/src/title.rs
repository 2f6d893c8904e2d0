/// Title used when the document does not open with a recognisable heading.
pub const DEFAULT_TITLE: &str = "untitled";

/// Guess the document title from its first heading.
///
/// Only the first non-blank line is considered: either an ATX heading of the
/// form `# Title` (a single `#` followed by a space or tab) or a setext heading
/// underlined with a run of `=`. Anything else yields [`DEFAULT_TITLE`].
pub fn extract_title(input: &[u8]) -> String {
    let mut scanner = Scanner::new(input);

    scanner.skip_blank_lines();
    if scanner.at_end() {
        return DEFAULT_TITLE.to_string();
    }

    let line1 = scanner.take_line();

    if line1.len() >= 3 && line1[0] == b'#' && is_blank(line1[1]) {
        return trimmed(&line1[2..]);
    }

    if !scanner.eat(b'=') {
        return DEFAULT_TITLE.to_string();
    }
    while scanner.eat(b'=') {}
    while scanner.eat(b' ') || scanner.eat(b'\t') {}

    if !scanner.at_line_end() {
        return DEFAULT_TITLE.to_string();
    }

    trimmed(line1)
}

struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some(b'\n') | Some(b'\r'))
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_blank_lines(&mut self) {
        while matches!(self.peek(), Some(b'\n') | Some(b'\r')) {
            self.pos += 1;
        }
    }

    /// Returns the current line without its terminator and moves past a
    /// single `\n`, `\r` or `\r\n`.
    fn take_line(&mut self) -> &'a [u8] {
        let start = self.pos;
        while !self.at_line_end() {
            self.pos += 1;
        }
        let line = &self.input[start..self.pos];

        self.eat(b'\r');
        self.eat(b'\n');

        line
    }
}

fn is_blank(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

fn trimmed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
