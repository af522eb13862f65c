//! Declared type-name normalization

/// Outcome of normalizing a declared type name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedType {
    pub name: String,
    /// A trailing identity modifier was present and stripped
    pub identity: bool,
}

/// Resolve textual quirks in a declared type name.
///
/// Some sources append an identity modifier to the type name instead of
/// reporting the auto-increment field ("INT IDENTITY"), others emit empty
/// parameter lists ("ENUM()"), and some report no name at all. The stripped
/// name is what gets resolved against the local type registry.
pub fn normalize_type_name(
    raw: Option<&str>,
    identity_suffix: &str,
    unknown_name: &str,
) -> NormalizedType {
    let trimmed = raw.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return NormalizedType {
            name: unknown_name.to_string(),
            identity: false,
        };
    }

    let mut name = trimmed.to_string();
    let mut identity = false;
    if let Some(start) = suffix_start(&name, identity_suffix) {
        name.truncate(start);
        identity = true;
    }
    if name.ends_with("()") {
        name.truncate(name.len() - 2);
    }

    NormalizedType { name, identity }
}

/// Byte index where a case-insensitive match of `suffix` begins at the end
/// of `name`, if there is one.
///
/// The tail is located by char count, not byte length: uppercasing can
/// change a character's byte length, so the suffix's byte length is not a
/// valid truncation point in the original string.
fn suffix_start(name: &str, suffix: &str) -> Option<usize> {
    let suffix_chars = suffix.chars().count();
    if suffix_chars == 0 {
        return None;
    }
    let (start, _) = name.char_indices().rev().nth(suffix_chars - 1)?;
    (name[start..].to_uppercase() == suffix.to_uppercase()).then_some(start)
}
