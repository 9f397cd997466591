use std::collections::HashMap;
use std::str::FromStr;

/// Parses a builder parameter string such as `n=1.5, mat=glass, wire`.
///
/// Entries are comma separated; keys are trimmed and lowercased. A key
/// without `=` maps to an empty value. Later duplicates win.
pub fn parse_key_value_list(text: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for entry in text.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (key, value) = match entry.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (entry, ""),
        };
        if key.is_empty() {
            continue;
        }
        map.insert(key.to_lowercase(), value.to_string());
    }
    map
}

/// Overwrites `target` with the parsed value of `key`.
/// Returns `false` and leaves `target` unchanged if the key is missing or malformed.
pub fn try_parse<T: FromStr>(params: &HashMap<String, String>, key: &str, target: &mut T) -> bool {
    match params.get(key).map(|v| v.parse::<T>()) {
        Some(Ok(v)) => {
            *target = v;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_flags() {
        let p = parse_key_value_list(" N = 1.5 ,mat=glass,, wire ");
        assert_eq!(p.get("n").map(String::as_str), Some("1.5"));
        assert_eq!(p.get("mat").map(String::as_str), Some("glass"));
        assert_eq!(p.get("wire").map(String::as_str), Some(""));
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn try_parse_keeps_previous_value_on_failure() {
        let p = parse_key_value_list("n=abc,rows=2");
        let mut n = 1.6_f32;
        assert!(!try_parse(&p, "n", &mut n));
        assert_eq!(n, 1.6);
        let mut rows = 1_u32;
        assert!(try_parse(&p, "rows", &mut rows));
        assert_eq!(rows, 2);
        assert!(!try_parse(&p, "missing", &mut rows));
    }
}
