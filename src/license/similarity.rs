//! License text similarity
//!
//! Secondary trust path for the text check: when the scanner's verdict on a
//! linked license file disagrees with the declared tag, the file is compared
//! word by word with the canonical text of the declared license.

use similar::{Algorithm, TextDiff};
use std::time::Duration;

/// Texts at least this similar are accepted as the same license
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.9;

/// Upper bound on diff time for pathological inputs
const DIFF_DEADLINE: Duration = Duration::from_secs(2);

/// Normalized similarity in `[0.0, 1.0]` between two license texts.
///
/// Case and whitespace layout are ignored, so re-wrapped or re-indented copies
/// of a license compare equal.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .timeout(DIFF_DEADLINE)
        .diff_words(a.as_str(), b.as_str());
    f64::from(diff.ratio())
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIT: &str = "Permission is hereby granted, free of charge, to any person obtaining a copy \
        of this software and associated documentation files (the \"Software\"), to deal \
        in the Software without restriction, including without limitation the rights \
        to use, copy, modify, merge, publish, distribute, sublicense, and/or sell \
        copies of the Software.";

    #[test]
    fn test_identical_texts() {
        assert!((text_similarity(MIT, MIT) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rewrapped_text_is_identical() {
        let rewrapped = MIT.replace(", ", ",\n    ").to_uppercase();
        assert!(text_similarity(MIT, &rewrapped) > 0.999);
    }

    #[test]
    fn test_small_edit_stays_above_threshold() {
        let edited = format!("Copyright (c) 2024 Jane Doe\n\n{}", MIT);
        assert!(text_similarity(MIT, &edited) >= DEFAULT_SIMILARITY_THRESHOLD);
    }

    #[test]
    fn test_unrelated_text_is_below_threshold() {
        let other = "This program is free software: you can redistribute it and/or modify \
            it under the terms of the GNU General Public License as published by";
        assert!(text_similarity(MIT, other) < DEFAULT_SIMILARITY_THRESHOLD);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(text_similarity("", ""), 1.0);
        assert_eq!(text_similarity(MIT, "  \n"), 0.0);
    }
}
