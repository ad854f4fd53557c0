//! Node name rules: reserved characters, sibling-unique names, `${token}` substitution.

use regex::Regex;

/// Prefixes a node name may never start with.
pub const RESERVED_PREFIXES: [char; 3] = ['@', '#', '$'];

/// Separator used by node paths.
pub const PATH_SEPARATOR: char = '/';

/// Why a name was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameViolation {
    Empty,
    ReservedPrefix(char),
    ContainsSeparator,
}

impl std::fmt::Display for NameViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameViolation::Empty => f.write_str("name must not be empty"),
            NameViolation::ReservedPrefix(c) => write!(f, "name must not start with '{c}'"),
            NameViolation::ContainsSeparator => {
                write!(f, "name must not contain '{PATH_SEPARATOR}'")
            }
        }
    }
}

/// Check a node name against the reserved-character rules.
pub fn check_name(name: &str) -> Result<(), NameViolation> {
    let Some(first) = name.chars().next() else {
        return Err(NameViolation::Empty);
    };
    if RESERVED_PREFIXES.contains(&first) {
        return Err(NameViolation::ReservedPrefix(first));
    }
    if name.contains(PATH_SEPARATOR) {
        return Err(NameViolation::ContainsSeparator);
    }
    Ok(())
}

/// Check a framework node name: `${token}` occurrences are ignored, the rest follows
/// [`check_name`].
pub fn check_template_name(name: &str) -> Result<(), NameViolation> {
    let tokens = Regex::new(r"\$\{[^}/]*\}").expect("token pattern is valid");
    check_name(&tokens.replace_all(name, "_"))
}

/// Derive a name that does not collide with any of `used`.
///
/// An unused candidate is returned verbatim. Otherwise the result is `<name>-N` where N is one
/// past the largest numeric suffix already present among `used` names of the form
/// `<name>-<digits>`, so suffixes keep increasing even after earlier siblings were removed.
/// When only the bare name collides the first suffix is `-0`. If the largest suffix cannot be
/// incremented, the lowest unused suffix is taken instead.
pub fn unique_name<'a, I>(name: &str, used: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let used: Vec<&str> = used.into_iter().collect();
    if !used.contains(&name) {
        return name.to_string();
    }

    let pattern = Regex::new(&format!(r"^{}-(\d+)$", regex::escape(name)))
        .expect("escaped name is a valid pattern");
    let next = match used
        .iter()
        .filter_map(|n| pattern.captures(n))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
        .max()
    {
        None => Some(0),
        Some(max) => max.checked_add(1),
    };
    if let Some(candidate) = next.map(|n| format!("{name}-{n}")) {
        if !used.contains(&candidate.as_str()) {
            return candidate;
        }
    }

    // suffix space exhausted: take the lowest free one
    let mut n: u64 = 0;
    loop {
        let candidate = format!("{name}-{n}");
        if !used.contains(&candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}

/// The literal token a mount point name is referenced by inside framework node names.
pub fn mount_token(mount_point_name: &str) -> String {
    format!("${{{mount_point_name}}}")
}

/// Replace every `${<token_name>}` occurrence in `name` with `replacement`.
pub fn substitute_token(name: &str, token_name: &str, replacement: &str) -> String {
    name.replace(&mount_token(token_name), replacement)
}
