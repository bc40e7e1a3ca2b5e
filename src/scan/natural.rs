//! Version-aware ordering of file names.
//!
//! Digit runs compare by numeric value, everything else by code point. The name is split
//! into a base and a collapsed extension (`.tar.gz` is one unit) and the base is compared
//! first, so `IMG_0672.JPG` sorts before `IMG_0672 edited.png`.
//!
//! Literal runs rank above every digit run. This is the same as giving each literal token
//! a numeric key one larger than the biggest number in the input set, without having to
//! scan the set first.

use std::{
    cmp::Ordering,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Digits(&'a str),
    Literal(&'a str),
}

impl Token<'_> {
    fn text(&self) -> &str {
        match self {
            Token::Digits(s) | Token::Literal(s) => s,
        }
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Token::Digits(a), Token::Digits(b)) => cmp_numeric(a, b),
            (Token::Digits(_), Token::Literal(_)) => Ordering::Less,
            (Token::Literal(_), Token::Digits(_)) => Ordering::Greater,
            (Token::Literal(a), Token::Literal(b)) => a.cmp(b),
        }
    }
}

/// Compare two decimal digit strings by value, for any length.
fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn tokenize(s: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut digits = None::<bool>;
    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        match digits {
            Some(d) if d != is_digit => {
                out.push(make_token(&s[start..i], d));
                start = i;
            }
            _ => {}
        }
        digits = Some(is_digit);
    }
    if let Some(d) = digits {
        out.push(make_token(&s[start..], d));
    }
    out
}

fn make_token(s: &str, digits: bool) -> Token<'_> {
    if digits {
        Token::Digits(s)
    } else {
        Token::Literal(s)
    }
}

/// Split `name` into `(base, extension)` where the extension is the run of trailing
/// `.xxx` segments. A segment must contain at least one non-digit so version-like names
/// (`v1.2.10`) keep their numbers in the base.
fn split_extension(name: &str) -> (&str, &str) {
    let mut cut = name.len();
    loop {
        let head = &name[..cut];
        let Some(dot) = head.rfind('.') else {
            break;
        };
        let seg = &head[dot + 1..];
        let is_ext = !seg.is_empty()
            && seg.chars().all(|c| c.is_alphanumeric())
            && seg.chars().any(|c| !c.is_ascii_digit());
        if !is_ext || dot == 0 {
            break;
        }
        cut = dot;
    }
    name.split_at(cut)
}

fn cmp_tokens(a: &[Token<'_>], b: &[Token<'_>]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = x.cmp_key(y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn cmp_raw(a: &[Token<'_>], b: &[Token<'_>]) -> Ordering {
    a.iter().map(Token::text).cmp(b.iter().map(Token::text))
}

/// Natural ordering of two bare file names.
///
/// Raw characters only break a tie once every key matches across the whole name, so
/// `f7a` sorts before `f007x` even though `"007" < "7"` character-wise.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let (a_base, a_ext) = split_extension(a);
    let (b_base, b_ext) = split_extension(b);
    let (a_base, b_base) = (tokenize(a_base), tokenize(b_base));
    let (a_ext, b_ext) = (tokenize(a_ext), tokenize(b_ext));

    cmp_tokens(&a_base, &b_base)
        .then_with(|| cmp_tokens(&a_ext, &b_ext))
        .then_with(|| cmp_raw(&a_base, &b_base))
        .then_with(|| cmp_raw(&a_ext, &b_ext))
}

/// Natural ordering of two paths by file name only; directories never matter.
pub fn compare_paths(a: &Path, b: &Path) -> Ordering {
    let name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    compare_names(&name(a), &name(b))
}

/// Stable in-place natural sort.
pub fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| compare_paths(a, b));
}

#[cfg(test)]
#[path = "../../tests/unit/scan/natural.rs"]
mod tests;
