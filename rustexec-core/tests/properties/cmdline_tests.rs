//! Property-based tests for command line rendering

use proptest::prelude::*;
use rustexec_core::cmdline::{EMPTY_ARGUMENT, SECRET_MASK, SPECIAL_CHARS};
use rustexec_core::{CmdLine, CmdLineArgument, OperatingSystemFamily};

// ========== Strategies ==========

fn arb_os() -> impl Strategy<Value = OperatingSystemFamily> {
    prop_oneof![
        Just(OperatingSystemFamily::Windows),
        Just(OperatingSystemFamily::Unix),
        Just(OperatingSystemFamily::Zos),
    ]
}

/// Non-empty text with no character that needs escaping
fn arb_safe_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_./:=,+@%-]{1,24}"
}

/// Text with at least one special character
fn arb_special_text() -> impl Strategy<Value = String> {
    ("[a-z]{0,6}", prop::sample::select(SPECIAL_CHARS.chars().collect::<Vec<_>>()), "[a-z \"';$]{0,6}")
        .prop_map(|(head, special, tail)| format!("{head}{special}{tail}"))
}

/// Reverses Unix backslash escaping
fn unescape_unix(rendered: &str) -> String {
    let mut out = String::new();
    let mut chars = rendered.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Reverses Windows double-quote wrapping
fn unquote_windows(rendered: &str) -> Option<String> {
    let inner = rendered.strip_prefix('"')?.strip_suffix('"')?;
    Some(inner.replace("\"\"", "\""))
}

// ========== Properties ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn safe_text_renders_unchanged(text in arb_safe_text(), os in arb_os(), for_logging in any::<bool>()) {
        let argument = CmdLineArgument::plain(text.clone());
        prop_assert_eq!(argument.render(os, for_logging), text);
    }

    #[test]
    fn secret_is_masked_when_logged(text in ".*", os in arb_os()) {
        let argument = CmdLineArgument::secret(text);
        prop_assert_eq!(argument.render(os, true), SECRET_MASK);
    }

    #[test]
    fn secret_renders_like_plain_for_execution(text in ".{1,24}", os in arb_os()) {
        prop_assert_eq!(
            CmdLineArgument::secret(text.clone()).render(os, false),
            CmdLineArgument::plain(text).render(os, false)
        );
    }

    #[test]
    fn empty_arguments_render_as_empty_quotes(os in arb_os(), for_logging in any::<bool>()) {
        prop_assert_eq!(CmdLineArgument::plain("").render(os, for_logging), EMPTY_ARGUMENT);
        prop_assert_eq!(CmdLineArgument::raw("").render(os, for_logging), EMPTY_ARGUMENT);
        prop_assert_eq!(CmdLineArgument::secret("").render(os, false), EMPTY_ARGUMENT);
    }

    #[test]
    fn unix_escaping_is_reversible(text in arb_special_text()) {
        let rendered = CmdLineArgument::plain(text.clone()).render(OperatingSystemFamily::Unix, false);
        prop_assert_eq!(unescape_unix(&rendered), text);
    }

    #[test]
    fn unix_escapes_every_special_character(text in arb_special_text()) {
        let rendered = CmdLineArgument::plain(text.clone()).render(OperatingSystemFamily::Unix, false);
        let escapes = rendered.matches('\\').count();
        let specials = text.chars().filter(|c| SPECIAL_CHARS.contains(*c)).count();
        let original_backslashes = text.matches('\\').count();
        // Each special gets one backslash; original backslashes appear once more
        prop_assert_eq!(escapes, specials + original_backslashes);
    }

    #[test]
    fn windows_quoting_is_reversible(text in arb_special_text()) {
        let rendered = CmdLineArgument::plain(text.clone()).render(OperatingSystemFamily::Windows, false);
        prop_assert_eq!(unquote_windows(&rendered), Some(text));
    }

    #[test]
    fn nested_safe_argument_is_not_escaped_again(text in arb_safe_text()) {
        let mut inner = CmdLine::new();
        inner.add_argument(text.clone());
        let nested = CmdLineArgument::nested(inner);
        prop_assert_eq!(nested.render(OperatingSystemFamily::Unix, false), text);
    }

    #[test]
    fn raw_is_verbatim(text in ".{1,24}", os in arb_os(), for_logging in any::<bool>()) {
        prop_assert_eq!(CmdLineArgument::raw(text.clone()).render(os, for_logging), text);
    }

    #[test]
    fn arguments_join_with_single_space(args in prop::collection::vec(arb_safe_text(), 1..6), os in arb_os()) {
        let line = CmdLine::build(args.clone());
        prop_assert_eq!(line.render(os, false), args.join(" "));
        prop_assert_eq!(line.len(), args.len());
    }
}

#[test]
fn windows_quote_scenario() {
    let argument = CmdLineArgument::plain(r#"say "hi""#);
    assert_eq!(
        argument.render(OperatingSystemFamily::Windows, false),
        r#""say ""hi""""#
    );
}

#[test]
fn unix_backslash_scenario() {
    let argument = CmdLineArgument::plain("a;b");
    assert_eq!(argument.render(OperatingSystemFamily::Unix, false), "a\\;b");
}
