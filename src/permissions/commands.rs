//! Base command extraction
//!
//! A small quote-aware shell lexer that lists the executable names a command
//! line would invoke. It splits on control operators (`;`, `&&`, `||`, `|`,
//! `&`, newlines), drops leading environment assignments and reserved words,
//! skips redirection targets and heredoc bodies, and recurses into nested
//! substitutions (`$( )`, backticks, `<( )`, `>( )`, `=( )`).
//!
//! Names are reported literally (`/usr/bin/rm` stays `/usr/bin/rm`), in order
//! of first appearance, without duplicates.

use super::substitution::arithmetic_end;

/// Placeholder word for a substitution whose output becomes part of a word
const SUBSTITUTION: &str = "$(...)";

/// Nesting limit; deeper input is reported as an unresolvable name
const MAX_DEPTH: usize = 32;

/// Reported when nesting is too deep to analyze
pub const UNRESOLVED_COMMAND: &str = "<unresolved>";

/// Reserved words that may precede a command in the same simple command
const PREFIX_WORDS: &[&str] = &[
    "!", "{", "if", "then", "else", "elif", "while", "until", "do", "time", "fi", "done",
    "esac", "}",
];

/// Reserved words that open a construct whose words are not commands
const HEADER_WORDS: &[&str] = &["for", "select", "case", "in", "[["];

/// Whether words at command position are collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Commands,
    /// Array literal bodies: words are data, only substitutions execute
    Words,
}

/// Extract the base command names a shell command line invokes
pub fn extract_base_commands(command: &str) -> Vec<String> {
    let mut found = Vec::new();
    let chars: Vec<char> = command.chars().collect();
    scan(&chars, Mode::Commands, &mut found, 0);

    let mut unique: Vec<String> = Vec::with_capacity(found.len());
    for name in found {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

#[derive(Debug, Default)]
struct SimpleCommand {
    words: Vec<String>,
    word: String,
    in_word: bool,
    /// Next completed word is a redirection target or here-string
    skip_next: bool,
    /// Names found in nested substitutions, reported after this command
    nested: Vec<String>,
    /// Heredoc delimiters waiting for the next newline: (delimiter, strip tabs, quoted)
    heredocs: Vec<(String, bool, bool)>,
}

impl SimpleCommand {
    fn push(&mut self, c: char) {
        self.word.push(c);
        self.in_word = true;
    }

    fn push_str(&mut self, s: &str) {
        self.word.push_str(s);
        self.in_word = true;
    }

    fn end_word(&mut self) {
        if !self.in_word {
            return;
        }
        let word = std::mem::take(&mut self.word);
        self.in_word = false;
        if self.skip_next {
            self.skip_next = false;
        } else {
            self.words.push(word);
        }
    }

    /// Current word is a bare file descriptor number (`2` in `2>&1`)
    fn word_is_fd(&self) -> bool {
        self.in_word && !self.word.is_empty() && self.word.chars().all(|c| c.is_ascii_digit())
    }

    /// Current word is an array assignment target (`name` or `name+` before `=(`)
    fn word_is_assignment_target(&self) -> bool {
        let name = self.word.strip_suffix('+').unwrap_or(&self.word);
        if !self.in_word || !is_identifier(name) {
            return false;
        }
        let leading_assignments = self
            .words
            .iter()
            .all(|w| is_assignment(w) || PREFIX_WORDS.contains(&w.as_str()));
        let declared = self.words.first().map(|w| is_declaration(w)).unwrap_or(false);
        leading_assignments || declared
    }

    fn discard_word(&mut self) {
        self.word.clear();
        self.in_word = false;
    }

    fn flush(&mut self, mode: Mode, out: &mut Vec<String>) {
        self.end_word();
        if mode == Mode::Commands {
            if let Some(name) = command_name(&self.words) {
                out.push(name);
            }
        }
        self.drop_words(out);
    }

    /// Forget the current words (case patterns), keeping nested names
    fn drop_words(&mut self, out: &mut Vec<String>) {
        self.discard_word();
        self.words.clear();
        self.skip_next = false;
        out.append(&mut self.nested);
    }
}

fn scan(chars: &[char], mode: Mode, out: &mut Vec<String>, depth: usize) {
    if depth > MAX_DEPTH {
        out.push(UNRESOLVED_COMMAND.to_string());
        return;
    }

    let len = chars.len();
    let mut cmd = SimpleCommand::default();
    let mut open_parens = 0usize;
    let mut i = 0;

    while i < len {
        let c = chars[i];
        match c {
            '\\' => {
                match chars.get(i + 1) {
                    Some('\n') | None => {}
                    Some(&next) => cmd.push(next),
                }
                i += 2;
            }
            '\'' => {
                let end = find_char(chars, i + 1, '\'');
                let text: String = chars[i + 1..end].iter().collect();
                cmd.push_str(&text);
                i = end + 1;
            }
            '"' => {
                cmd.in_word = true;
                i = scan_expansions(
                    chars,
                    i + 1,
                    Some('"'),
                    &mut cmd.word,
                    &mut cmd.nested,
                    depth,
                );
            }
            '`' => {
                let end = find_unescaped(chars, i + 1, '`');
                scan(&chars[i + 1..end], Mode::Commands, &mut cmd.nested, depth + 1);
                cmd.push_str(SUBSTITUTION);
                i = end + 1;
            }
            '$' => {
                i = scan_dollar(chars, i, &mut cmd.word, &mut cmd.nested, depth);
                cmd.in_word = true;
            }
            '<' | '>' if chars.get(i + 1) == Some(&'(') => {
                let end = matching_paren(chars, i + 1);
                scan(
                    &chars[(i + 2).min(end)..end],
                    Mode::Commands,
                    &mut cmd.nested,
                    depth + 1,
                );
                cmd.push_str(SUBSTITUTION);
                i = end + 1;
            }
            '<' | '>' => {
                if cmd.word_is_fd() {
                    cmd.discard_word();
                } else {
                    cmd.end_word();
                }
                i = redirection(chars, i, &mut cmd);
            }
            '&' if chars.get(i + 1) == Some(&'>') => {
                cmd.end_word();
                i += 2;
                if chars.get(i) == Some(&'>') {
                    i += 1;
                }
                cmd.skip_next = true;
            }
            '=' if chars.get(i + 1) == Some(&'(') => {
                let end = matching_paren(chars, i + 1);
                let body = &chars[(i + 2).min(end)..end];
                if cmd.word_is_assignment_target() {
                    // name=( ... ) array literal
                    scan(body, Mode::Words, &mut cmd.nested, depth + 1);
                    cmd.push_str("=(...)");
                } else {
                    scan(body, Mode::Commands, &mut cmd.nested, depth + 1);
                    cmd.push_str(SUBSTITUTION);
                }
                i = end + 1;
            }
            ';' | '\n' => {
                cmd.flush(mode, out);
                i += 1;
                if c == '\n' && !cmd.heredocs.is_empty() {
                    i = skip_heredocs(chars, i, &mut cmd.heredocs, out, depth);
                }
            }
            '|' | '&' => {
                cmd.flush(mode, out);
                i += 1;
                if matches!(chars.get(i), Some('|') | Some('&')) {
                    i += 1;
                }
            }
            '(' if chars.get(i + 1) == Some(&')') => {
                // `name()` function definition header
                cmd.discard_word();
                cmd.words.clear();
                i += 2;
            }
            '(' => {
                cmd.flush(mode, out);
                let arithmetic = match chars.get(i + 1) {
                    Some('(') => arithmetic_end(chars, i + 2),
                    _ => None,
                };
                match arithmetic {
                    // `(( ... ))` arithmetic command
                    Some(end) => {
                        let mut scratch = String::new();
                        scan_expansions(&chars[..end - 2], i + 2, None, &mut scratch, out, depth + 1);
                        i = end;
                    }
                    None => {
                        open_parens += 1;
                        i += 1;
                    }
                }
            }
            ')' => {
                if open_parens == 0 {
                    // `pattern)` inside a case statement
                    cmd.drop_words(out);
                } else {
                    open_parens -= 1;
                    cmd.flush(mode, out);
                }
                i += 1;
            }
            '#' if !cmd.in_word => {
                i = find_char(chars, i, '\n');
            }
            c if c.is_whitespace() => {
                cmd.end_word();
                i += 1;
            }
            _ => {
                cmd.push(c);
                i += 1;
            }
        }
    }

    cmd.flush(mode, out);
}

/// Handle `$`-prefixed forms starting at `start`; returns the next index
fn scan_dollar(
    chars: &[char],
    start: usize,
    word: &mut String,
    out: &mut Vec<String>,
    depth: usize,
) -> usize {
    let len = chars.len();
    if depth > MAX_DEPTH {
        out.push(UNRESOLVED_COMMAND.to_string());
        return len;
    }
    match chars.get(start + 1) {
        Some('(') => {
            if chars.get(start + 2) == Some(&'(') {
                if let Some(end) = arithmetic_end(chars, start + 3) {
                    let mut scratch = String::new();
                    scan_expansions(&chars[..end - 2], start + 3, None, &mut scratch, out, depth + 1);
                    word.push_str("$((...))");
                    return end;
                }
            }
            let end = matching_paren(chars, start + 1);
            scan(&chars[(start + 2).min(end)..end], Mode::Commands, out, depth + 1);
            word.push_str(SUBSTITUTION);
            end + 1
        }
        Some('{') => {
            let end = matching_brace(chars, start + 1);
            // `${x:-$(cmd)}` defaults can hold live substitutions
            let mut scratch = String::new();
            scan_expansions(&chars[..end.min(len)], start + 2, None, &mut scratch, out, depth + 1);
            let text: String = chars[start..(end + 1).min(len)].iter().collect();
            word.push_str(&text);
            end + 1
        }
        Some('\'') => {
            // $'...' ANSI-C quoting, kept undecoded
            let end = find_char(chars, start + 2, '\'');
            word.push('$');
            let text: String = chars[start + 2..end].iter().collect();
            word.push_str(&text);
            end + 1
        }
        _ => {
            word.push('$');
            start + 1
        }
    }
}

/// Scan text where only `\`, `$` and backticks are special (double quotes,
/// unquoted heredoc bodies, arithmetic and parameter bodies). Stops after
/// `terminator` or at the end of `chars`.
fn scan_expansions(
    chars: &[char],
    start: usize,
    terminator: Option<char>,
    word: &mut String,
    out: &mut Vec<String>,
    depth: usize,
) -> usize {
    let len = chars.len();
    let mut i = start;
    while i < len {
        let c = chars[i];
        if Some(c) == terminator {
            return i + 1;
        }
        match c {
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    if !matches!(next, '$' | '`' | '"' | '\\' | '\n') {
                        word.push('\\');
                    }
                    if next != '\n' {
                        word.push(next);
                    }
                }
                i += 2;
            }
            '`' => {
                let end = find_unescaped(chars, i + 1, '`');
                scan(&chars[i + 1..end], Mode::Commands, out, depth + 1);
                word.push_str(SUBSTITUTION);
                i = end + 1;
            }
            '$' => {
                i = scan_dollar(chars, i, word, out, depth);
            }
            _ => {
                word.push(c);
                i += 1;
            }
        }
    }
    len
}

/// Consume a redirection operator at `start` and mark what follows as a target
fn redirection(chars: &[char], start: usize, cmd: &mut SimpleCommand) -> usize {
    let first = chars[start];
    let mut op = String::from(first);
    let mut i = start + 1;

    while let Some(&c) = chars.get(i) {
        let accept = match c {
            '<' | '>' if c == first && op.len() < 3 => true,
            '>' if first == '<' && op.len() == 1 => true,
            '&' if op.len() < 3 => true,
            '|' if first == '>' && op.len() == 1 => true,
            '-' if op == "<<" => true,
            _ => false,
        };
        if !accept {
            break;
        }
        op.push(c);
        i += 1;
    }

    if op == "<<" || op == "<<-" {
        let (delimiter, quoted, next) = heredoc_delimiter(chars, i);
        if !delimiter.is_empty() {
            cmd.heredocs.push((delimiter, op == "<<-", quoted));
        }
        return next;
    }

    // `>&2`, `<&-`: the target is an fd or `-`, still a non-command word
    cmd.skip_next = true;
    i
}

/// Read a heredoc delimiter word; returns (delimiter, quoted, next index)
fn heredoc_delimiter(chars: &[char], start: usize) -> (String, bool, usize) {
    let mut i = start;
    while matches!(chars.get(i), Some(' ') | Some('\t')) {
        i += 1;
    }

    let mut delimiter = String::new();
    let mut quoted = false;
    while let Some(&c) = chars.get(i) {
        match c {
            '\'' | '"' => {
                quoted = true;
                let end = find_char(chars, i + 1, c);
                delimiter.extend(&chars[i + 1..end]);
                i = end + 1;
            }
            '\\' => {
                quoted = true;
                if let Some(&next) = chars.get(i + 1) {
                    delimiter.push(next);
                }
                i += 2;
            }
            c if c.is_whitespace() || matches!(c, ';' | '|' | '&' | '<' | '>' | '(' | ')') => break,
            _ => {
                delimiter.push(c);
                i += 1;
            }
        }
    }

    (delimiter, quoted, i)
}

/// Skip pending heredoc bodies starting at the line at `start`
///
/// Bodies of unquoted delimiters still expand substitutions, so those are
/// scanned for nested commands.
fn skip_heredocs(
    chars: &[char],
    start: usize,
    heredocs: &mut Vec<(String, bool, bool)>,
    out: &mut Vec<String>,
    depth: usize,
) -> usize {
    let len = chars.len();
    let mut i = start;

    for (delimiter, strip_tabs, quoted) in heredocs.drain(..) {
        let body_start = i;
        let mut body_end = len;
        while i < len {
            let line_end = find_char(chars, i, '\n');
            let line: String = chars[i..line_end].iter().collect();
            let line = if strip_tabs {
                line.trim_start_matches('\t')
            } else {
                line.as_str()
            };
            if line == delimiter {
                body_end = i;
                i = line_end + 1;
                break;
            }
            i = line_end + 1;
        }

        if !quoted {
            let mut scratch = String::new();
            scan_expansions(&chars[..body_end.min(len)], body_start, None, &mut scratch, out, depth);
        }
    }

    i.min(len)
}

/// First simple-command word that names an executable
fn command_name(words: &[String]) -> Option<String> {
    let mut words = words.iter();
    while let Some(word) = words.next() {
        if is_assignment(word) || PREFIX_WORDS.contains(&word.as_str()) {
            continue;
        }
        if word == "function" {
            // `function NAME { body; }`: only the name is not a command
            words.next();
            continue;
        }
        if HEADER_WORDS.contains(&word.as_str()) {
            return None;
        }
        return Some(word.clone());
    }
    None
}

/// `NAME=value`, `NAME+=value` or `NAME[idx]=value`
fn is_assignment(word: &str) -> bool {
    let Some(eq) = word.find('=') else {
        return false;
    };
    let target = word[..eq].strip_suffix('+').unwrap_or(&word[..eq]);
    let name = match target.find('[') {
        Some(open) if target.ends_with(']') => &target[..open],
        _ => target,
    };
    is_identifier(name)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Builtins whose `name=(...)` arguments are array declarations
fn is_declaration(word: &str) -> bool {
    matches!(
        word,
        "declare" | "local" | "typeset" | "readonly" | "export"
    )
}

/// Index of the next `target` at or after `start`, or `chars.len()`
fn find_char(chars: &[char], start: usize, target: char) -> usize {
    let start = start.min(chars.len());
    chars[start..]
        .iter()
        .position(|&c| c == target)
        .map(|p| start + p)
        .unwrap_or(chars.len())
}

fn find_unescaped(chars: &[char], start: usize, target: char) -> usize {
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == target => return i,
            _ => i += 1,
        }
    }
    chars.len()
}

/// Index of the `)` matching the `(` at `open`, or `chars.len()`
fn matching_paren(chars: &[char], open: usize) -> usize {
    matching_close(chars, open, '(', ')')
}

fn matching_brace(chars: &[char], open: usize) -> usize {
    matching_close(chars, open, '{', '}')
}

fn matching_close(chars: &[char], open: usize, open_char: char, close_char: char) -> usize {
    let mut depth = 0usize;
    // Paren depths of unfinished `case` statements; their pattern `)` do not close
    let mut cases: Vec<usize> = Vec::new();
    let track_case = open_char == '(';
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '\'' => {
                i = find_char(chars, i + 1, '\'') + 1;
                continue;
            }
            '"' => {
                i = find_unescaped(chars, i + 1, '"') + 1;
                continue;
            }
            'c' if track_case && keyword_at(chars, i, "case") => {
                cases.push(depth);
                i += 4;
                continue;
            }
            'e' if track_case && keyword_at(chars, i, "esac") => {
                if cases.last() == Some(&depth) {
                    cases.pop();
                }
                i += 4;
                continue;
            }
            c if c == open_char => depth += 1,
            c if c == close_char => {
                if cases.last() == Some(&depth) {
                    // `pattern)` of a case inside this span
                    i += 1;
                    continue;
                }
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
        i += 1;
    }
    chars.len()
}

/// Whether the reserved word `word` stands alone at `index`
fn keyword_at(chars: &[char], index: usize, word: &str) -> bool {
    let is_boundary = |c: &char| c.is_whitespace() || matches!(c, ';' | '|' | '&' | '(' | ')');
    let starts = index == 0 || chars.get(index - 1).map(is_boundary).unwrap_or(true);
    let len = word.chars().count();
    starts
        && chars.len() >= index + len
        && chars[index..index + len].iter().copied().eq(word.chars())
        && chars.get(index + len).map(is_boundary).unwrap_or(true)
}
