//! On-disc name derivation
//!
//! The Primary descriptor can only record `8.3;1` uppercase names, so
//! input names are mangled and uniquified against their siblings.
//! Supplementary/Enhanced descriptors record the original name in their
//! own encoding, truncated to the identifier cap.

use crate::types::MAX_EXTENDED_IDENTIFIER_BYTES;
use crate::utils::strings::{is_d_char, TextEncoding};
use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// Uppercase and replace everything outside the d-character set
fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            let upper = c.to_ascii_uppercase();
            if is_d_char(upper) {
                upper
            } else {
                '_'
            }
        })
        .collect()
}

/// Derive a legacy name for the Primary descriptor, unique among
/// `taken` sibling names
///
/// Files become `BASE.EXT;1` with the base at most 8 and the extension
/// at most 3 characters; directories become a bare name of at most 8
/// characters. Collisions are resolved by appending digits to the base
/// while it is short, else substituting trailing base characters
/// (`BASE0`..`BASE9`, then `BAS00`..).
pub fn derive_legacy_name(name: &str, is_directory: bool, taken: &BTreeSet<String>) -> String {
    if is_directory {
        let base: String = sanitize(name).chars().take(8).collect();
        return uniquify(&base, |b| String::from(b), taken);
    }
    let (raw_base, raw_ext) = match name.rfind('.') {
        Some(dot) => (&name[..dot], &name[dot + 1..]),
        None => (name, ""),
    };
    let ext: String = sanitize(raw_ext).chars().take(3).collect();
    let base: String = sanitize(raw_base)
        .chars()
        .take(8.min(11 - ext.len()))
        .collect();
    uniquify(&base, |b| format!("{b}.{ext};1"), taken)
}

fn uniquify(
    base: &str,
    build: impl Fn(&str) -> String,
    taken: &BTreeSet<String>,
) -> String {
    let candidate = build(base);
    if !taken.contains(&candidate) {
        return candidate;
    }
    let target_len = (base.len() + 1).clamp(1, 8);
    for width in 1..=target_len {
        let prefix: String = base.chars().take(target_len - width).collect();
        let limit = 10usize.pow(width as u32);
        for n in 0..limit {
            let candidate = build(&format!("{prefix}{n:0width$}"));
            if !taken.contains(&candidate) {
                return candidate;
            }
        }
    }
    candidate
}

/// Derive the identifier bytes for a Supplementary/Enhanced descriptor
pub fn derive_extended_identifier(name: &str, encoding: TextEncoding) -> Vec<u8> {
    encoding.encode_truncated(name, MAX_EXTENDED_IDENTIFIER_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_taken() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[test]
    fn test_simple_names() {
        assert_eq!(derive_legacy_name("hello.txt", false, &no_taken()), "HELLO.TXT;1");
        assert_eq!(derive_legacy_name("meta-data", false, &no_taken()), "META_DAT.;1");
        assert_eq!(
            derive_legacy_name("longfilename.extension", false, &no_taken()),
            "LONGFILE.EXT;1"
        );
        assert_eq!(derive_legacy_name("boot", true, &no_taken()), "BOOT");
        assert_eq!(derive_legacy_name("subdirectory", true, &no_taken()), "SUBDIREC");
    }

    #[test]
    fn test_collision_substitutes_digits() {
        let mut taken = no_taken();
        taken.insert(derive_legacy_name("ABCDEFGH.TXT", false, &taken));
        let second = derive_legacy_name("abcdefgh.txt", false, &taken);
        assert_eq!(second, "ABCDEFG0.TXT;1");
        taken.insert(second);
        let third = derive_legacy_name("Abcdefgh.txt", false, &taken);
        assert_eq!(third, "ABCDEFG1.TXT;1");
    }

    #[test]
    fn test_collision_appends_while_short() {
        let mut taken = no_taken();
        taken.insert(String::from("BASE.;1"));
        assert_eq!(derive_legacy_name("base", false, &taken), "BASE0.;1");
        for n in 0..10 {
            taken.insert(format!("BASE{n}.;1"));
        }
        // Appending is exhausted at one digit; trailing characters of
        // the base give way to wider counters.
        assert_eq!(derive_legacy_name("base", false, &taken), "BAS00.;1");
    }

    #[test]
    fn test_extended_identifier_truncation() {
        let long: String = core::iter::repeat('x').take(300).collect();
        let ucs2 = derive_extended_identifier(&long, TextEncoding::Ucs2Be);
        assert!(ucs2.len() <= 207);
        assert!(ucs2.len().is_multiple_of(2));
        let utf8 = derive_extended_identifier(&long, TextEncoding::Utf8);
        assert_eq!(utf8.len(), 207);
    }
}
