//! Identity normalization
//!
//! Roster names and submitted names are compared through [`normalize`].
//! Input is composed to NFC first, so decomposed accents typed by some
//! keyboards and web forms compare equal to precomposed ones. Then:
//! 1. runs of two or more whitespace characters collapse to one space, then trim
//! 2. each word is title-cased
//! 3. diacritical marks are stripped
//!
//! Every step is total. Characters that have no unaccented equivalent are
//! passed through as they are.

use crate::model::SubmissionRecord;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical form of a free-text name
pub fn normalize(raw_name: &str) -> String {
    let composed: String = raw_name.nfc().collect();
    let collapsed = collapse_whitespace(&composed);
    let titled = title_case(&collapsed);
    strip_diacritics(&titled)
}

/// Normalize `reported_identity` of every submission in place
///
/// Metric fields are left untouched.
pub fn normalize_submissions(submissions: &mut [SubmissionRecord]) {
    for submission in submissions.iter_mut() {
        submission.reported_identity = normalize(&submission.reported_identity);
    }
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut run = String::new();

    for c in input.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        flush_whitespace_run(&mut out, &mut run);
        out.push(c);
    }
    flush_whitespace_run(&mut out, &mut run);

    out.trim().to_string()
}

fn flush_whitespace_run(out: &mut String, run: &mut String) {
    match run.chars().count() {
        0 => {}
        1 => out.push_str(run),
        _ => out.push(' '),
    }
    run.clear();
}

/// A letter following a non-letter starts a word ("o'brien" -> "O'Brien")
///
/// Combining marks belong to the letter they follow and never end a word.
fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_is_letter = false;

    for c in input.chars() {
        if is_combining_mark(c) {
            out.push(c);
        } else if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }

    out
}

fn strip_diacritics(input: &str) -> String {
    let decomposed: String = input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let mut out = String::with_capacity(decomposed.len());
    for c in decomposed.chars() {
        match transliterate(c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }

    out.nfc().collect()
}

/// Latin letters that carry no combining mark under NFD
fn transliterate(c: char) -> Option<&'static str> {
    let replacement = match c {
        'ø' => "o",
        'Ø' => "O",
        'ł' => "l",
        'Ł' => "L",
        'đ' => "d",
        'Đ' => "D",
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "Ae",
        'œ' => "oe",
        'Œ' => "Oe",
        'ı' => "i",
        _ => return None,
    };
    Some(replacement)
}
