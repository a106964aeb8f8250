//! Element and attribute names.
//!
//! Names are stored in their qualified form (`prefix:local`, or just `local`)
//! exactly as they appear in the source document. Lookups by name are
//! case-insensitive and accept either the qualified or the local form.

/// Split a qualified name into prefix and local name.
///
/// The prefix is empty for unprefixed names.
pub(crate) fn split_qname(qname: &str) -> (&str, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", qname),
    }
}

/// The local part of a qualified name.
pub fn local_name(qname: &str) -> &str {
    split_qname(qname).1
}

/// The prefix of a qualified name, if there is one.
pub(crate) fn prefix(qname: &str) -> Option<&str> {
    match split_qname(qname) {
        ("", _) => None,
        (prefix, _) => Some(prefix),
    }
}

/// Build a qualified name from prefix and local name.
pub(crate) fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

/// Compare two strings ignoring case.
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Does the qualified name `qname` answer to `needle`?
///
/// The needle matches if it equals either the qualified name or its local
/// part, ignoring case. This is the rule every cursor lookup uses, so
/// predicates can apply it too:
///
/// ```rust
/// use nmxml::{name_matches, Nx};
///
/// let cursor = Nx::new().parse(r#"<r xmlns:x="urn:x"><x:Item/><other/></r>"#)?;
/// let item = cursor.require(|child| {
///     child.name().map_or(false, |name| name_matches(&name, "item"))
/// })?;
/// assert_eq!(item.name().as_deref(), Some("x:Item"));
/// # Ok::<(), nmxml::Error>(())
/// ```
pub fn name_matches(qname: &str, needle: &str) -> bool {
    eq_ignore_case(qname, needle) || eq_ignore_case(local_name(qname), needle)
}

/// Does the attribute named `qname` answer to `needle`?
///
/// Attributes are looked up by local name only.
pub(crate) fn matches_local(qname: &str, needle: &str) -> bool {
    eq_ignore_case(local_name(qname), local_name(needle))
}
