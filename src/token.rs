//! Locating and minting zen-tokens.
//!
//! A zen-token is the durable identifier linking a logical commit to its
//! patch record and pull request across amends. Tokens are minted in exactly
//! one place: the commit-msg hook (`gz hook`). Everything else only reads
//! them back out of commit message trailers.

use crate::types::ZenToken;
use once_cell::sync::Lazy;
use regex::Regex;
use std::hash::{BuildHasher, Hasher, RandomState};

static TOKEN_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^zen-token:(?P<token>[a-f0-9]{8})$").expect("valid regex"));

/// Returns the zen-token carried by `line`, if the line is a trailer.
pub fn find_in_line(line: &str) -> Option<ZenToken> {
    TOKEN_LINE
        .captures(line.trim())
        .map(|captures| ZenToken::new(&captures["token"]))
}

/// Scans a message body line by line for a zen-token trailer.
pub fn find_in_body(body: &str) -> Option<ZenToken> {
    body.lines().find_map(find_in_line)
}

/// Mints a fresh zen-token: 8 lowercase hex characters.
///
/// [RandomState] is randomly seeded per instance, which is all the entropy a
/// collision-resistant short identifier needs here.
pub fn fresh() -> ZenToken {
    let entropy = RandomState::new().build_hasher().finish();
    ZenToken::new(format!("{:08x}", (entropy & 0xffff_ffff) as u32))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn find_in_line_matches_trailer() {
        assert_eq!(
            find_in_line("zen-token:cafe0123"),
            Some(ZenToken::new("cafe0123"))
        );
    }

    #[test]
    fn find_in_line_tolerates_log_indentation() {
        assert_eq!(
            find_in_line("    zen-token:cafe0123"),
            Some(ZenToken::new("cafe0123"))
        );
    }

    #[test]
    fn find_in_line_rejects_wrong_length_and_case() {
        assert_eq!(find_in_line("zen-token:cafe012"), None);
        assert_eq!(find_in_line("zen-token:CAFE0123"), None);
        assert_eq!(find_in_line("token:cafe0123"), None);
    }

    #[test]
    fn find_in_body_scans_all_lines() {
        let body = "Some subject detail.\n\nMore detail.\n\nzen-token:deadbeef";
        assert_eq!(find_in_body(body), Some(ZenToken::new("deadbeef")));
        assert_eq!(find_in_body("no trailer here"), None);
    }

    #[test]
    fn fresh_tokens_are_well_formed() {
        for _ in 0..32 {
            let token = fresh();
            assert!(find_in_line(&format!("zen-token:{token}")).is_some());
        }
    }
}
