//! Ordering of CSS property names.
//!
//! A name is split into dash-separated segments. Vendor-prefixed names
//! (`-moz-box-sizing`) move their prefix to the end, so they sort right
//! after the unprefixed property (`box-sizing`). Segments compare with a
//! case-insensitive natural ordering; when one name's segments are a prefix
//! of the other's, the shorter name comes first (`margin` before
//! `margin-top`).

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Comparator for property names, usable with `sort_by`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyCompare;

impl PropertyCompare {
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        compare_property_names(a, b)
    }
}

/// `-prefix-rest-of-name` decodes to `[rest, of, name, prefix]`.
fn decode(name: &str) -> Vec<&str> {
    match name.strip_prefix('-') {
        Some(prefixed) => match prefixed.split_once('-') {
            Some((prefix, rest)) => rest.split('-').chain(std::iter::once(prefix)).collect(),
            None => vec![prefixed, ""],
        },
        None => name.split('-').collect(),
    }
}

pub fn compare_property_names(a: &str, b: &str) -> Ordering {
    let a = decode(a);
    let b = decode(b);
    a.iter()
        .zip(&b)
        .map(|(x, y)| natural_cmp_ignore_case(x, y))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

fn take_number(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}

/// Natural ordering: digit runs compare by numeric value, everything else
/// by lowercase character.
pub fn natural_cmp_ignore_case(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_number(&mut a);
                let right = take_number(&mut b);
                let left = left.trim_start_matches('0');
                let right = right.trim_start_matches('0');
                let order = left.len().cmp(&right.len()).then_with(|| left.cmp(right));
                if order.is_ne() {
                    return order;
                }
            }
            (Some(x), Some(y)) => {
                let order = x.to_lowercase().cmp(y.to_lowercase());
                if order.is_ne() {
                    return order;
                }
                a.next();
                b.next();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_vendor_prefixes() {
        assert_eq!(decode("margin-top"), ["margin", "top"]);
        assert_eq!(decode("-moz-box-sizing"), ["box", "sizing", "moz"]);
        assert_eq!(decode("-webkit"), ["webkit", ""]);
    }

    #[test]
    fn general_before_specific() {
        assert_eq!(compare_property_names("margin", "margin-top"), Ordering::Less);
        assert_eq!(compare_property_names("margin-top", "margin"), Ordering::Greater);
        assert_eq!(compare_property_names("margin", "margin"), Ordering::Equal);
    }

    #[test]
    fn unprefixed_before_prefixed() {
        assert_eq!(
            compare_property_names("box-sizing", "-moz-box-sizing"),
            Ordering::Less
        );
        assert_eq!(
            compare_property_names("-moz-box-sizing", "-o-box-sizing"),
            natural_cmp_ignore_case("moz", "o")
        );
        assert_eq!(
            compare_property_names("-moz-box-sizing", "-o-box-sizing"),
            Ordering::Less
        );
    }

    #[test]
    fn ignores_case() {
        assert_eq!(compare_property_names("Width", "width"), Ordering::Equal);
        assert_eq!(compare_property_names("HEIGHT", "width"), Ordering::Less);
    }

    #[test]
    fn natural_number_order() {
        assert_eq!(natural_cmp_ignore_case("h2", "h10"), Ordering::Less);
        assert_eq!(natural_cmp_ignore_case("h010", "h9"), Ordering::Greater);
        assert_eq!(natural_cmp_ignore_case("abc", "ABD"), Ordering::Less);
    }

    #[test]
    fn sorting_groups_families() {
        let mut names = vec![
            "-o-box-sizing",
            "width",
            "margin-top",
            "-moz-box-sizing",
            "box-sizing",
            "margin",
        ];
        names.sort_by(|a, b| PropertyCompare.compare(a, b));
        assert_eq!(
            names,
            [
                "box-sizing",
                "-moz-box-sizing",
                "-o-box-sizing",
                "margin",
                "margin-top",
                "width"
            ]
        );
    }
}
