//! Version comparison for dependency resolution.
//!
//! This module implements the native package manager's version ordering
//! (`[epoch:]pkgver[-pkgrel]`) and the requirement check used when matching
//! dependency strings against candidate packages.

use std::cmp::Ordering;

/// Split a full version string into its epoch, pkgver and pkgrel parts.
///
/// Missing epoch is `0`; pkgrel is everything after the last `-` and is
/// optional.
fn split_evr(version: &str) -> (i64, &str, Option<&str>) {
    let (epoch, rest) = match version.split_once(':') {
        Some((epoch, rest)) => (epoch.parse::<i64>().unwrap_or(0), rest),
        None => (0, version),
    };

    match rest.rsplit_once('-') {
        Some((pkgver, pkgrel)) => (epoch, pkgver, Some(pkgrel)),
        None => (epoch, rest, None),
    }
}

/// Compare two version fragments segment-wise.
///
/// Alternating runs of digits and letters are compared pairwise; separator
/// runs count only by their length; numeric segments always beat alphabetic
/// ones; leading zeros are insignificant.
fn compare_segments(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    // the walk is byte-oriented: anything outside ASCII alphanumerics
    // counts as a separator
    let a = a.as_bytes();
    let b = b.as_bytes();
    let mut a_left = 0;
    let mut b_left = 0;

    while a_left < a.len() && b_left < b.len() {
        // skip separator runs on both sides
        let a_sep_start = a_left;
        while a_left < a.len() && !a[a_left].is_ascii_alphanumeric() {
            a_left += 1;
        }
        let b_sep_start = b_left;
        while b_left < b.len() && !b[b_left].is_ascii_alphanumeric() {
            b_left += 1;
        }

        if a_left >= a.len() || b_left >= b.len() {
            break;
        }

        // separator runs of different length decide immediately
        let a_sep = a_left - a_sep_start;
        let b_sep = b_left - b_sep_start;
        if a_sep != b_sep {
            return if a_sep < b_sep {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }

        // grab the next completely numeric or completely alphabetic segment
        let is_numeric = a[a_left].is_ascii_digit();
        let segment_end = |bytes: &[u8], start: usize| {
            let mut end = start;
            while end < bytes.len()
                && (if is_numeric {
                    bytes[end].is_ascii_digit()
                } else {
                    bytes[end].is_ascii_alphabetic()
                })
            {
                end += 1;
            }
            end
        };
        let a_right = segment_end(a, a_left);
        let b_right = segment_end(b, b_left);

        let mut a_seg = &a[a_left..a_right];
        let mut b_seg = &b[b_left..b_right];

        // mismatched segment types: numeric segments are always newer
        if b_seg.is_empty() {
            return if is_numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        if is_numeric {
            while a_seg.first() == Some(&b'0') {
                a_seg = &a_seg[1..];
            }
            while b_seg.first() == Some(&b'0') {
                b_seg = &b_seg[1..];
            }
            // whichever number has more digits wins
            match a_seg.len().cmp(&b_seg.len()) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }

        // byte-wise comparison decides for equal-length numbers and for
        // alphabetic segments; equal segments mean there is more to compare
        match a_seg.cmp(b_seg) {
            Ordering::Equal => {}
            ord => return ord,
        }

        a_left = a_right;
        b_left = b_right;
    }

    let a_leftover = &a[a_left.min(a.len())..];
    let b_leftover = &b[b_left.min(b.len())..];

    // all segments compared identically, only separators differed
    if a_leftover.is_empty() && b_leftover.is_empty() {
        return Ordering::Equal;
    }

    // a remaining alpha string never beats an empty string
    let starts_alpha = |s: &[u8]| s.first().is_some_and(u8::is_ascii_alphabetic);
    if (a_leftover.is_empty() && !starts_alpha(b_leftover)) || starts_alpha(a_leftover) {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// What: Compare two full version strings using the native ordering rule.
///
/// Inputs:
/// - `a`: Left-hand version string (`[epoch:]pkgver[-pkgrel]`).
/// - `b`: Right-hand version string.
///
/// Output:
/// - Returns `Ordering::Less`, `Ordering::Equal` or `Ordering::Greater`.
///
/// Details:
/// - Epoch takes precedence (missing epoch is `0`).
/// - pkgver is compared segment-wise (digits run vs. letters run; numeric
///   beats alphabetic; leading zeros ignored).
/// - pkgrel is only compared when both sides carry one.
///
/// # Example
///
/// ```
/// use aurplan::version::compare;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare("1.2.3", "1.2.4"), Ordering::Less);
/// assert_eq!(compare("1:1.0", "2.0"), Ordering::Greater);
/// assert_eq!(compare("1.2.3-1", "1.2.3-2"), Ordering::Less);
/// assert_eq!(compare("1.0", "1.0-3"), Ordering::Equal);
/// ```
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    let (a_epoch, a_pkgver, a_pkgrel) = split_evr(a);
    let (b_epoch, b_pkgver, b_pkgrel) = split_evr(b);

    match a_epoch.cmp(&b_epoch) {
        Ordering::Equal => {}
        ord => return ord,
    }

    match compare_segments(a_pkgver, b_pkgver) {
        Ordering::Equal => {}
        ord => return ord,
    }

    match (a_pkgrel, b_pkgrel) {
        (Some(a_rel), Some(b_rel)) => compare_segments(a_rel, b_rel),
        _ => Ordering::Equal,
    }
}

/// What: Check whether a version satisfies an operator/version constraint.
///
/// Inputs:
/// - `have`: The version that is available.
/// - `op`: Comparison operator (`<`, `<=`, `=`, `==`, `>=`, `>`) or empty.
/// - `want`: The version the constraint asks for.
///
/// Output:
/// - Returns `true` if the constraint holds, `false` otherwise.
///
/// Details:
/// - An empty operator means "any version".
/// - The operator is interpreted by the characters it contains, so `=` and
///   `==` behave identically.
///
/// # Example
///
/// ```
/// use aurplan::version::satisfies;
///
/// assert!(satisfies("2.0", ">=", "1.5"));
/// assert!(satisfies("1.5", "=", "1.5"));
/// assert!(!satisfies("1.0", ">", "1.5"));
/// assert!(satisfies("0.1", "", ""));
/// ```
#[must_use]
pub fn satisfies(have: &str, op: &str, want: &str) -> bool {
    if op.is_empty() {
        return true;
    }

    match compare(have, want) {
        Ordering::Less => op.contains('<'),
        Ordering::Equal => op.contains('='),
        Ordering::Greater => op.contains('>'),
    }
}
