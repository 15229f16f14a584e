//! Compound name encoding.
//!
//! A node's compound name is its ancestor placenames followed by its own
//! placename, joined with [`SEPARATOR`]. It is the node's external identity
//! and the key of the by-compound-name index.

/// Separator between path segments in a compound name.
pub const SEPARATOR: &str = "::";

/// Join `hierarchy ++ [placename]` into a compound name.
///
/// An empty hierarchy yields the placename alone.
pub fn encode<S: AsRef<str>>(hierarchy: &[S], placename: &str) -> String {
    let mut name = String::with_capacity(
        hierarchy
            .iter()
            .map(|s| s.as_ref().len() + SEPARATOR.len())
            .sum::<usize>()
            + placename.len(),
    );
    for segment in hierarchy {
        name.push_str(segment.as_ref());
        name.push_str(SEPARATOR);
    }
    name.push_str(placename);
    name
}

/// Split a compound name into its segments, root first.
///
/// The last element is the leaf placename. An empty compound name decodes to
/// an empty sequence.
pub fn decode(compound_name: &str) -> Vec<String> {
    if compound_name.is_empty() {
        return Vec::new();
    }
    compound_name.split(SEPARATOR).map(str::to_string).collect()
}

/// The leaf placename of a compound name, or `""` for an empty name.
pub fn leaf(compound_name: &str) -> &str {
    compound_name.rsplit(SEPARATOR).next().unwrap_or_default()
}

/// Compound names of every ancestor on `hierarchy`, root first.
///
/// Entry `i` names the node reached by walking `hierarchy[0..=i]`.
pub fn ancestor_prefixes<S: AsRef<str>>(hierarchy: &[S]) -> Vec<String> {
    let mut prefixes: Vec<String> = Vec::with_capacity(hierarchy.len());
    for segment in hierarchy {
        let next = match prefixes.last() {
            Some(previous) => format!("{}{}{}", previous, SEPARATOR, segment.as_ref()),
            None => segment.as_ref().to_string(),
        };
        prefixes.push(next);
    }
    prefixes
}
