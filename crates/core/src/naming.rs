//! Output naming policy.
//!
//! Output files are named `"{track} - {title}.{ext}"`, with the track number
//! zero-padded to two digits and the title reduced to a filesystem- and
//! shell-safe character set.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::metadata::TrackMetadata;

/// Runs of characters outside the allow-list. Letters, digits, parentheses,
/// hyphen, exclamation mark, apostrophe, period, comma and space are kept.
static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| {
    // `"` is left out on purpose (`D"E` becomes `D_E`); `'` stays allowed.
    Regex::new(r"[^a-zA-Z0-9()\-!'., ]+").expect("static pattern is valid")
});

/// Replaces every run of disallowed characters with a single `_`.
///
/// `_` is itself outside the allow-list, so the output never contains two
/// underscores in a row and `sanitize(sanitize(s)) == sanitize(s)`.
pub fn sanitize(s: &str) -> String {
    UNSAFE_CHARS.replace_all(s, "_").into_owned()
}

/// Normalizes a track tag for use as a filename prefix.
///
/// - `"3"` becomes `"03"`, `"12"` and `"105"` are unchanged.
/// - A `"/total"` suffix is dropped: `"3/12"` becomes `"03"`.
/// - Non-numeric values are sanitized but never padded.
/// - An empty tag stays empty.
pub fn pad_track(track: &str) -> String {
    let number = track.split('/').next().unwrap_or_default().trim();
    if number.is_empty() {
        return String::new();
    }
    if number.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>2}", number)
    } else {
        sanitize(number)
    }
}

/// Sanitizes a value used as a single path component (e.g. artist or album
/// in a publish destination). Results that would be empty or a relative
/// directory reference (`.`, `..`) become `_`.
pub fn path_segment(s: &str) -> String {
    let segment = sanitize(s.trim());
    if segment.is_empty() || segment.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        segment
    }
}

/// Derives the output file name for one track.
///
/// `fallback_title` (normally the input file stem) is used when the track
/// has no title tag. Without a track number the `"NN - "` prefix is omitted.
pub fn output_file_name(metadata: &TrackMetadata, fallback_title: &str, extension: &str) -> String {
    let title = match metadata.title.trim() {
        "" => path_segment(fallback_title),
        title => path_segment(title),
    };
    let extension = extension.trim_start_matches('.');

    match pad_track(&metadata.track) {
        track if track.is_empty() => format!("{}.{}", title, extension),
        track => format!("{} - {}.{}", track, title, extension),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_unsafe_chars() {
        assert_eq!(sanitize("B/C"), "B_C");
        assert_eq!(sanitize("D\"E"), "D_E");
        assert_eq!(sanitize("AC/DC: Live"), "AC_DC_ Live");
        assert_eq!(sanitize("a/*?b"), "a_b");
    }

    #[test]
    fn test_sanitize_double_quote_replaced_apostrophe_kept() {
        assert_eq!(sanitize("Say \"Don't\""), "Say _Don't_");
    }

    #[test]
    fn test_sanitize_keeps_allowed_chars() {
        let s = "Don't Stop (Remix) - Pt. 1, Take 2!";
        assert_eq!(sanitize(s), s);
    }

    #[test]
    fn test_sanitize_non_ascii() {
        assert_eq!(sanitize("Björk"), "Bj_rk");
        assert_eq!(sanitize("東京"), "_");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "",
            "plain",
            "B/C",
            "D\"E",
            "a__b",
            "_leading",
            "trailing_",
            "x/_/y",
            "Björk & Ørjan",
            "tab\there",
            "$(rm -rf /)",
            "..",
            "東京/大阪",
        ];
        for s in samples {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once, "not idempotent for {s:?}");
            assert!(!once.contains("__"), "double underscore for {s:?}");
        }
    }

    #[test]
    fn test_pad_track() {
        assert_eq!(pad_track("3"), "03");
        assert_eq!(pad_track("12"), "12");
        assert_eq!(pad_track(""), "");
        assert_eq!(pad_track("105"), "105");
        assert_eq!(pad_track("3/12"), "03");
        assert_eq!(pad_track(" 7 "), "07");
        assert_eq!(pad_track("0"), "00");
        assert_eq!(pad_track("A1"), "A1");
        assert_eq!(pad_track("B"), "B");
        assert_eq!(pad_track("/12"), "");
        assert_eq!(pad_track("side a"), "side a");
        assert_eq!(pad_track("1:2"), "1_2");
    }

    #[test]
    fn test_path_segment_guards_relative_components() {
        assert_eq!(path_segment(".."), "_");
        assert_eq!(path_segment("."), "_");
        assert_eq!(path_segment(""), "_");
        assert_eq!(path_segment("   "), "_");
        assert_eq!(path_segment("../etc"), ".._etc");
        assert_eq!(path_segment("Miles Davis"), "Miles Davis");
        assert_eq!(path_segment("AC/DC"), "AC_DC");
    }

    #[test]
    fn test_output_file_names_for_album() {
        let tracks = [
            TrackMetadata::new("1", "A"),
            TrackMetadata::new("2", "B/C"),
            TrackMetadata::new("10", "D\"E"),
        ];
        let names: Vec<String> = tracks
            .iter()
            .map(|m| output_file_name(m, "unused", "m4a"))
            .collect();
        assert_eq!(names, ["01 - A.m4a", "02 - B_C.m4a", "10 - D_E.m4a"]);
    }

    #[test]
    fn test_output_file_name_fallbacks() {
        let no_track = TrackMetadata::new("", "Hidden Track");
        assert_eq!(output_file_name(&no_track, "x", "m4a"), "Hidden Track.m4a");

        let no_title = TrackMetadata::new("4", "");
        assert_eq!(
            output_file_name(&no_title, "04 untitled", ".opus"),
            "04 - 04 untitled.opus"
        );

        let dots = TrackMetadata::new("5", "..");
        assert_eq!(output_file_name(&dots, "x", "m4a"), "05 - _.m4a");
    }
}
