// Config Export Builder - Reference Scanner
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Extraction of library script references from free-text fields.
//!
//! A script is invoked from text with a `%[name]` macro, optionally
//! followed by a qualifier introduced by `.` or `/` (`%[Uptime.average]`,
//! `%[CheckDisk/1]`). `%%[` is an escaped literal and is not a reference.

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%\[([A-Za-z0-9:_]+)(?:[./][^\]]*)?\]")
        .expect("Invalid script reference pattern")
});

/// Candidate script names referenced from `text`, in order of first appearance.
pub fn scan_references(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for captures in SCRIPT_REFERENCE.captures_iter(text) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if whole.start() > 0 && text.as_bytes()[whole.start() - 1] == b'%' {
            continue;
        }
        if seen.insert(name.as_str()) {
            names.push(name.as_str().to_string());
        }
    }
    names
}

/// Union of the references found in every field.
pub fn scan_fields<'a, I>(fields: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    fields
        .into_iter()
        .filter(|field| field.contains("%["))
        .flat_map(scan_references)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_reference() {
        assert_eq!(scan_references("Value is %[CheckDisk]"), vec!["CheckDisk"]);
    }

    #[test]
    fn test_escaped_reference_skipped() {
        assert_eq!(
            scan_references("%%[Escaped] but %[Real.sub] matches"),
            vec!["Real"]
        );
    }

    #[test]
    fn test_no_references() {
        assert!(scan_references("No references here").is_empty());
        assert!(scan_references("").is_empty());
    }

    #[test]
    fn test_qualifiers_deduplicated() {
        assert_eq!(scan_references("%[A:b_1/x] and %[A:b_1.y]"), vec!["A:b_1"]);
    }

    #[test]
    fn test_order_of_first_appearance() {
        assert_eq!(
            scan_references("%[Second] %[First] %[Second/2]"),
            vec!["Second", "First"]
        );
    }

    #[test]
    fn test_invalid_name_characters() {
        assert!(scan_references("%[has space]").is_empty());
        assert!(scan_references("%[]").is_empty());
        assert!(scan_references("%[unterminated").is_empty());
    }

    #[test]
    fn test_adjacent_references() {
        assert_eq!(scan_references("%[A]%[B]"), vec!["A", "B"]);
    }

    #[test]
    fn test_scan_fields_union() {
        let names = scan_fields(["%[One]", "plain", "%[Two] %[One.x]", "%%[Three]"]);
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["One".to_string(), "Two".to_string()]
        );
    }
}
