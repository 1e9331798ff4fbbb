//! Property-based tests for command composition

use proptest::prelude::*;
use rustexec_core::compose::{EscalationSettings, PtySpec, SshConnectionType};
use rustexec_core::{CmdLine, ConnectionContext, OperatingSystemFamily, compose};

// ========== Strategies ==========

fn arb_args() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9_.-]{1,10}", 1..5)
}

fn arb_user() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

fn arb_directory() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9_]{1,8}", 1..4).prop_map(|parts| format!("/{}", parts.join("/")))
}

fn unix() -> ConnectionContext {
    ConnectionContext::new(OperatingSystemFamily::Unix)
}

// ========== Properties ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn direct_connection_is_identity(args in arb_args()) {
        let command = CmdLine::build(args);
        let composed = compose(&command, &unix()).unwrap();
        prop_assert_eq!(&composed.command, &command);
        prop_assert!(!composed.requires_pty());
    }

    #[test]
    fn working_directory_comes_first(args in arb_args(), directory in arb_directory()) {
        let command = CmdLine::build(args.clone());
        let composed = compose(&command, &unix().with_working_directory(directory.clone())).unwrap();
        let rendered = composed.command.render(OperatingSystemFamily::Unix, false);

        prop_assert_eq!(rendered, format!("cd {directory} ; {}", args.join(" ")));
        prop_assert_eq!(command.len(), args.len());
    }

    #[test]
    fn sudo_prefix_names_target_user(args in arb_args(), user in arb_user()) {
        let context = unix()
            .with_connection_type(SshConnectionType::Sudo)
            .with_escalation(EscalationSettings::new(user.clone()));
        let composed = compose(&CmdLine::build(args.clone()), &context).unwrap();
        let rendered = composed.command.render(OperatingSystemFamily::Unix, false);

        prop_assert_eq!(rendered, format!("sudo -u {user} {}", args.join(" ")));
        prop_assert_eq!(composed.command.len(), args.len() + 3);
    }

    #[test]
    fn quoted_escalation_adds_one_argument(args in arb_args(), user in arb_user()) {
        let context = unix()
            .with_connection_type(SshConnectionType::Sudo)
            .with_escalation(EscalationSettings::new(user).with_quote_command(true));
        let composed = compose(&CmdLine::build(args), &context).unwrap();
        prop_assert_eq!(composed.command.len(), 4);
    }

    #[test]
    fn valid_pty_specs_parse(term in "[a-z][a-z0-9]{0,10}", cols in 1u32..500, rows in 1u32..200) {
        let text = format!("{term}:{cols}:{rows}:0:0");
        let spec: PtySpec = text.parse().unwrap();
        prop_assert_eq!(&spec.term, &term);
        prop_assert_eq!(spec.to_string(), text);
    }

    #[test]
    fn malformed_pty_specs_fail(text in "[a-z]{1,6}(:[0-9]{1,3}){0,3}") {
        prop_assert!(text.parse::<PtySpec>().is_err());
    }
}
