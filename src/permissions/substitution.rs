//! Dangerous shell construct detection
//!
//! Lexical, not a shell grammar. Each detector looks for one construct that
//! can execute code or leak data beyond what the literal command names
//! suggest. Detection ignores quoting on purpose: a single-quoted
//! `'$(id)'` is inert to the outer shell but live once handed to `bash -c`,
//! `eval` or `ssh`, so it still needs a human.
//!
//! Two shapes look dangerous but are not:
//! - `name=(a b c)` is an array literal. `=(` only counts as zsh process
//!   substitution when it follows start of input, whitespace or a shell
//!   operator, never an identifier character.
//! - `(x) => x` arrow functions in quoted inline scripts. `=>` is one token
//!   and is never read as `=` followed by `(`.

use std::sync::OnceLock;

use regex::Regex;

/// A shell construct that forces human confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DangerousConstruct {
    /// `$( ... )` (arithmetic `$(( ... ))` excluded)
    CommandSubstitution,
    /// `` `...` ``
    BacktickSubstitution,
    /// `${var@P}` prompt expansion or `${var@E}` escape expansion
    TransformExpansion,
    /// `${!name}` indirect expansion
    IndirectExpansion,
    /// `${x=\101}` parameter default hiding characters behind escapes
    EscapedParameterDefault,
    /// zsh `=( ... )` process substitution
    ProcessSubstitution,
    /// `<<< $( ... )` here-string fed by a substitution
    HereStringSubstitution,
    /// zsh glob qualifier with an action clause, e.g. `*(e:'cmd':)`
    GlobQualifierExecution,
}

impl DangerousConstruct {
    /// Plain `$( )` / backtick substitution, whose nested commands can be
    /// checked against an allow-list
    pub fn is_plain_substitution(&self) -> bool {
        matches!(
            self,
            DangerousConstruct::CommandSubstitution | DangerousConstruct::BacktickSubstitution
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            DangerousConstruct::CommandSubstitution => "command substitution $(...)",
            DangerousConstruct::BacktickSubstitution => "backtick command substitution",
            DangerousConstruct::TransformExpansion => "parameter transform expansion ${var@P}",
            DangerousConstruct::IndirectExpansion => "indirect parameter expansion ${!var}",
            DangerousConstruct::EscapedParameterDefault => {
                "parameter default with escape sequences"
            }
            DangerousConstruct::ProcessSubstitution => "zsh process substitution =(...)",
            DangerousConstruct::HereStringSubstitution => "here-string with command substitution",
            DangerousConstruct::GlobQualifierExecution => "glob qualifier with executable clause",
        }
    }
}

impl std::fmt::Display for DangerousConstruct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static shell pattern compiles"))
}

fn transform_expansion() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"\$\{[^}]*@[PE][^}]*\}")
}

fn indirect_expansion() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"\$\{![^}]*\}?")
}

fn escaped_parameter_default() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(
        &CELL,
        r"\$\{[^}]*[=+\-?][^}]*\\(?:[0-7]{3}|x[0-9a-fA-F]{2}|u[0-9a-fA-F]{4})[^}]*\}",
    )
}

fn here_string_substitution() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r#"<<<\s*["']?\s*(?:\$\(|`)"#)
}

/// Only flag-style qualifiers may precede `e` or `+`, so `2*(a+b)` in an
/// inline script is not a qualifier list
fn glob_qualifier_execution() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(
        &CELL,
        r#"[*?]\([./@=%*^\-0-9A-Z]*(?:e[:'"/|{\[<^#@%]|\+[A-Za-z_])"#,
    )
}

/// Whether the command contains any dangerous construct
pub fn contains_dangerous_substitution(command: &str) -> bool {
    !find_dangerous_constructs(command).is_empty()
}

/// All dangerous constructs found in the command, each reported once
pub fn find_dangerous_constructs(command: &str) -> Vec<DangerousConstruct> {
    let chars: Vec<char> = command.chars().collect();
    let mut found = Vec::new();

    if has_command_substitution(&chars) {
        found.push(DangerousConstruct::CommandSubstitution);
    }
    if has_backtick(&chars) {
        found.push(DangerousConstruct::BacktickSubstitution);
    }
    if transform_expansion().is_match(command) {
        found.push(DangerousConstruct::TransformExpansion);
    }
    if indirect_expansion().is_match(command) {
        found.push(DangerousConstruct::IndirectExpansion);
    }
    if escaped_parameter_default().is_match(command) {
        found.push(DangerousConstruct::EscapedParameterDefault);
    }
    if has_zsh_process_substitution(&chars) {
        found.push(DangerousConstruct::ProcessSubstitution);
    }
    if here_string_substitution().is_match(command) {
        found.push(DangerousConstruct::HereStringSubstitution);
    }
    if glob_qualifier_execution().is_match(command) {
        found.push(DangerousConstruct::GlobQualifierExecution);
    }

    found
}

/// `$(` that is not the start of a well-formed `$(( ... ))` arithmetic span
fn has_command_substitution(chars: &[char]) -> bool {
    (0..chars.len().saturating_sub(1)).any(|i| {
        chars[i] == '$'
            && chars[i + 1] == '('
            && !(chars.get(i + 2) == Some(&'(') && arithmetic_end(chars, i + 3).is_some())
    })
}

fn has_backtick(chars: &[char]) -> bool {
    chars
        .iter()
        .enumerate()
        .any(|(i, &c)| c == '`' && !is_escaped(chars, i))
}

/// `=(` after start of input, whitespace or a shell operator
///
/// A redirection character only counts outside quotes, so comparisons like
/// `a>=(b)` inside an inline script stay clean.
fn has_zsh_process_substitution(chars: &[char]) -> bool {
    let quoted = quote_mask(chars);
    (0..chars.len().saturating_sub(1)).any(|i| {
        if chars[i] != '=' || chars[i + 1] != '(' {
            return false;
        }
        match i.checked_sub(1).map(|p| chars[p]) {
            None => true,
            Some(prev) if prev.is_whitespace() => true,
            Some(';' | '|' | '&' | '(') => true,
            Some('<' | '>') => !quoted[i],
            Some(_) => false,
        }
    })
}

/// End index (exclusive) of an arithmetic `$(( ... ))` span whose body
/// starts at `start`, or None if the first unbalanced `)` is not doubled
pub(crate) fn arithmetic_end(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '(' => depth += 1,
            ')' if depth == 0 => {
                return (chars.get(i + 1) == Some(&')')).then_some(i + 2);
            }
            ')' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    None
}

fn is_escaped(chars: &[char], index: usize) -> bool {
    let mut backslashes = 0;
    let mut i = index;
    while i > 0 && chars[i - 1] == '\\' {
        backslashes += 1;
        i -= 1;
    }
    backslashes % 2 == 1
}

/// Per-character flag: inside single or double quotes
fn quote_mask(chars: &[char]) -> Vec<bool> {
    let mut mask = Vec::with_capacity(chars.len());
    let mut single = false;
    let mut double = false;
    let mut escaped = false;

    for &c in chars {
        let in_quotes = single || double;
        if escaped {
            escaped = false;
        } else if c == '\\' && !single {
            escaped = true;
        } else if c == '\'' && !double {
            single = !single;
        } else if c == '"' && !single {
            double = !double;
        }
        mask.push(in_quotes || single || double);
    }

    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn detect(cmd: &str) -> bool {
        contains_dangerous_substitution(cmd)
    }

    #[test]
    fn test_command_substitution() {
        assert!(detect("echo $(whoami)"));
        assert!(detect("echo \"user: $(id -un)\""));
        assert!(detect("echo `whoami`"));
        assert_eq!(
            find_dangerous_constructs("ls `pwd`"),
            vec![DangerousConstruct::BacktickSubstitution]
        );
    }

    #[test]
    fn test_arithmetic_is_not_substitution() {
        assert!(!detect("echo $((1 + 2))"));
        assert!(!detect("i=$(( (i + 1) * 2 ))"));
        // Nested substitution inside arithmetic still counts
        assert!(detect("echo $(( $(wc -l < f) + 1 ))"));
        // Not closed by `))`: bash falls back to command substitution
        assert!(detect("echo $((ls) )"));
    }

    #[test]
    fn test_escaped_backtick_is_literal() {
        assert!(!detect("echo \\`not run\\`"));
    }

    #[test]
    fn test_parameter_transforms() {
        assert!(detect("echo \"${var@P}\""));
        assert!(detect("echo ${PS1@E}"));
        assert!(!detect("echo ${var@Q}"));
        assert!(!detect("echo ${arr[@]}"));
    }

    #[test]
    fn test_indirect_expansion() {
        assert!(detect("echo ${!name}"));
        assert!(detect("echo ${!prefix*}"));
        assert!(!detect("echo $! ${name}"));
    }

    #[test]
    fn test_escaped_parameter_default() {
        assert_eq!(
            find_dangerous_constructs(r"echo ${x=\162\155}"),
            vec![DangerousConstruct::EscapedParameterDefault]
        );
        assert!(detect(r"echo ${y:-\x72\x6d}"));
        assert!(!detect("echo ${x:-default}"));
    }

    #[test]
    fn test_zsh_process_substitution() {
        assert!(detect("=(ls)"));
        assert!(detect("diff =(ls a) =(ls b)"));
        assert!(detect("cat;=(whoami)"));
        assert!(detect("cat <=(whoami)"));
    }

    #[test]
    fn test_array_assignment_is_not_process_substitution() {
        assert!(!detect("arr=(a b c)"));
        assert!(!detect("files=(src/*.rs) && echo ok"));
        assert!(!detect("local -a list=(one two)"));
    }

    #[test]
    fn test_arrow_functions_in_inline_scripts() {
        assert!(!detect("node -e \"const f = (x) => x * 2; console.log(f(2))\""));
        assert!(!detect("node -e 'const f=(x)=>x; [1].map((y)=>f(y))'"));
        assert!(!detect("node -e \"if (a>=(b)) console.log(1)\""));
    }

    #[test]
    fn test_here_string_substitution() {
        let found = find_dangerous_constructs("cat <<< $(whoami)");
        assert!(found.contains(&DangerousConstruct::HereStringSubstitution));
        let found = find_dangerous_constructs("wc -c <<< \"`id`\"");
        assert!(found.contains(&DangerousConstruct::HereStringSubstitution));
        assert!(!detect("cat <<< \"plain text\""));
    }

    #[test]
    fn test_glob_qualifier_execution() {
        assert!(detect("ls *(e:'rm -rf ~':)"));
        assert!(detect("print -l **/*(+myfilter)"));
        assert!(!detect("ls *(.)"));
        assert!(!detect("ls *(om[1,3])"));
    }

    #[test]
    fn test_glob_qualifier_after_flags() {
        assert!(detect("ls *(.e:'touch x':)"));
        assert!(detect("ls *(N+myfilter)"));
        assert!(detect("ls ?(^-e{'rm y'})"));
        assert!(!detect("python3 -c \"print(2*(a+b))\""));
        assert!(!detect("awk '{ s += $1*(x+y) }' data"));
    }

    #[test]
    fn test_plain_commands_are_clean() {
        for cmd in [
            "git status",
            "npm run build && npm test",
            "grep -rn 'TODO' src | head -20",
            "cargo test -- --nocapture 2>&1",
            "echo \"a = b\"",
            "x==(y)",
        ] {
            assert!(!detect(cmd), "flagged: {}", cmd);
        }
    }

    proptest! {
        #[test]
        fn prop_array_literals_are_clean(
            name in "[a-z_][a-z0-9_]{0,10}",
            words in prop::collection::vec("[a-zA-Z0-9_./-]{1,8}", 0..6),
        ) {
            let cmd = format!("{}=({})", name, words.join(" "));
            prop_assert!(!detect(&cmd), "flagged: {}", cmd);
        }

        #[test]
        fn prop_transform_and_indirect_expansions_flagged(
            name in "[A-Za-z_][A-Za-z0-9_]{0,10}",
            form in prop::sample::select(vec!["@P", "@E", "!"]),
            quoted in any::<bool>(),
        ) {
            let expansion = if form == "!" {
                format!("${{!{}}}", name)
            } else {
                format!("${{{}{}}}", name, form)
            };
            let cmd = if quoted {
                format!("echo \"{}\"", expansion)
            } else {
                format!("echo {}", expansion)
            };
            prop_assert!(detect(&cmd), "missed: {}", cmd);
        }
    }

    #[test]
    fn test_constructs_reported_once() {
        let found = find_dangerous_constructs("echo $(a) $(b) $(c)");
        assert_eq!(found, vec![DangerousConstruct::CommandSubstitution]);
        assert!(found[0].is_plain_substitution());
    }
}
