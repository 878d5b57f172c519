//! Placeholder substitution for compiler/linker command templates.
//!
//! Deliberately dumb: a left-to-right scan for `$name` tokens, bound
//! against a caller-supplied table, longest-key-wins when one binding
//! name is a prefix of another (`$file` vs `$filedir`). This is not a
//! general templating language — no conditionals, no loops, no nested
//! expansion of a binding's own value.

use std::collections::HashMap;

/// Expand every `$name` occurrence in `tmpl` using `bindings`.
///
/// Names are matched longest-first so that `$objfile` doesn't get
/// clipped to `$obj` when both are present in the binding table. A `$`
/// not followed by a known name is copied through literally (this lets
/// link-library templates such as `-l$1` exist alongside the `$name`
/// vocabulary without the engine needing to special-case numeric
/// placeholders).
///
/// # Panics
///
/// Never panics on malformed input; unmatched `$` is passed through
/// verbatim. Panicking is reserved for callers that pass a `bindings`
/// table built incorrectly (e.g. via [`expand_strict`]).
pub fn expand(tmpl: &str, bindings: &HashMap<&str, &str>) -> String {
    let mut keys: Vec<&&str> = bindings.keys().collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

    let mut out = String::with_capacity(tmpl.len());
    let bytes = tmpl.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            if let Some(key) = keys.iter().find(|k| tmpl[i..].starts_with(***k)) {
                out.push_str(bindings[**key]);
                i += key.len();
                continue;
            }
        }
        let ch = tmpl[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Like [`expand`], but panics if any `$name` token remains unresolved
/// once every known binding name has been tried. Used where leaving a
/// placeholder unexpanded would silently corrupt a generated command
/// line rather than merely looking odd (compile/link command
/// synthesis; see [`crate::command`]).
///
/// # Panics
///
/// Panics if the result still contains a `$` immediately followed by an
/// ASCII letter or underscore, which indicates a binding the caller
/// forgot to supply.
pub fn expand_strict(tmpl: &str, bindings: &HashMap<&str, &str>) -> String {
    let out = expand(tmpl, bindings);
    if let Some(pos) = out.find('$') {
        let rest = &out[pos + 1..];
        if rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
            panic!("unresolved template placeholder near: {}", &out[pos..]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn simple_substitution() {
        let b = bindings(&[("$file", "a.c"), ("$objfile", "a.o")]);
        assert_eq!(expand("-c $file -o $objfile", &b), "-c a.c -o a.o");
    }

    #[test]
    fn longest_key_wins() {
        let b = bindings(&[("$file", "a.c"), ("$filedir", "/src")]);
        assert_eq!(expand("$filedir/$file", &b), "/src/a.c");
    }

    #[test]
    fn unknown_dollar_passes_through() {
        let b = bindings(&[("$1", "pthread")]);
        assert_eq!(expand("-l$1", &b), "-lpthread");
    }

    #[test]
    fn preserves_literal_whitespace_runs() {
        let b = bindings(&[("$options", "-O2"), ("$include", "-I/x")]);
        assert_eq!(
            expand("-c  $options  $include -o $objfile $file", &b),
            "-c  -O2  -I/x -o $objfile $file"
        );
    }

    #[test]
    #[should_panic]
    fn expand_strict_panics_on_unresolved() {
        let b = bindings(&[("$file", "a.c")]);
        expand_strict("-c $file -o $objfile", &b);
    }

    #[test]
    fn expand_strict_passes_when_fully_resolved() {
        let b = bindings(&[("$file", "a.c"), ("$objfile", "a.o")]);
        assert_eq!(
            expand_strict("-c $file -o $objfile", &b),
            "-c a.c -o a.o"
        );
    }
}
