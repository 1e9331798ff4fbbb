//! Property-based tests for prompt detection on process output

use std::io::{self, Read};

use proptest::prelude::*;
use rustexec_core::automation::validate_prompt_pattern;
use rustexec_core::{ExecError, PromptPattern, PromptResponder};
use secrecy::SecretString;

/// Returns the scripted chunks one per read, splitting any that overflow the buffer
struct Chunked {
    chunks: Vec<Vec<u8>>,
}

fn chunked(mut chunks: Vec<Vec<u8>>) -> Chunked {
    // An empty read means end of stream
    chunks.retain(|c| !c.is_empty());
    Chunked { chunks }
}

impl Read for Chunked {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.chunks.is_empty() {
            return Ok(0);
        }
        let n = self.chunks[0].len().min(buf.len());
        buf[..n].copy_from_slice(&self.chunks[0][..n]);
        self.chunks[0].drain(..n);
        if self.chunks[0].is_empty() {
            self.chunks.remove(0);
        }
        Ok(n)
    }
}

fn responder(pattern: &str) -> PromptResponder {
    PromptResponder::new(
        PromptPattern::new(pattern).unwrap(),
        SecretString::from("pw"),
    )
}

fn drain(reader: &mut impl Read) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = [0u8; 256];
    loop {
        let n = reader.read(&mut buf).unwrap();
        if n == 0 {
            return out;
        }
        out.extend_from_slice(&buf[..n]);
    }
}

// ========== Strategies ==========

fn arb_noise() -> impl Strategy<Value = String> {
    "[a-z0-9 \n]{0,40}"
}

fn arb_wildcard_pattern() -> impl Strategy<Value = String> {
    ("[a-zA-Z:]{1,12}", prop_oneof![Just('*'), Just('?')])
        .prop_map(|(base, wildcard)| format!("{base}{wildcard}"))
}

// ========== Properties ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prompt_is_answered_exactly_once_for_any_split(
        before in arb_noise(),
        after in arb_noise(),
        split in 0usize..=9,
    ) {
        let prompt = "Password:";
        let text = format!("{before}{prompt} {after}{prompt} ");
        let cut = before.len() + split;
        let chunks = vec![text.as_bytes()[..cut].to_vec(), text.as_bytes()[cut..].to_vec()];

        let mut input = Vec::new();
        let mut reader = responder(prompt).wrap(chunked(chunks), &mut input);
        let passed = drain(&mut reader);

        prop_assert!(reader.has_responded());
        drop(reader);
        prop_assert_eq!(passed, text.as_bytes());
        prop_assert_eq!(input, b"pw\r\n".to_vec());
    }

    #[test]
    fn output_without_prompt_passes_through(text in arb_noise()) {
        let mut input = Vec::new();
        let chunks = vec![text.as_bytes().to_vec()];
        let mut reader = responder("Password:").wrap(chunked(chunks), &mut input);
        let passed = drain(&mut reader);

        prop_assert!(!reader.has_responded());
        drop(reader);
        prop_assert_eq!(passed, text.as_bytes());
        prop_assert!(input.is_empty());
    }

    #[test]
    fn trailing_wildcard_is_rejected(pattern in arb_wildcard_pattern()) {
        prop_assert!(matches!(
            validate_prompt_pattern(&pattern),
            Err(ExecError::InvalidConfiguration(_))
        ));
        prop_assert!(PromptPattern::new(&pattern).is_err());
    }
}

#[test]
fn split_prompt_is_answered_after_second_read() {
    let chunks = vec![b"Passwor".to_vec(), b"d: ".to_vec(), b"Password: ".to_vec()];
    let mut input = Vec::new();
    let mut reader = responder("Password:").wrap(chunked(chunks), &mut input);
    let mut buf = [0u8; 64];

    reader.read(&mut buf).unwrap();
    assert!(!reader.has_responded());
    reader.read(&mut buf).unwrap();
    assert!(reader.has_responded());
    reader.read(&mut buf).unwrap();
    drop(reader);

    assert_eq!(input, b"pw\r\n");
}
