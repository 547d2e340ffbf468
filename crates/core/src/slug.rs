//! URL slugs for catalog entities.
//!
//! Categories, subcategories and products are addressed by a unique slug
//! derived from their English name.

/// Turn a display name into a lowercase, hyphen-separated slug.
///
/// Non-ASCII-alphanumeric characters become separators; runs of separators
/// collapse into a single hyphen. An input with no usable characters yields
/// `"item"`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        slug.push_str("item");
    }
    slug
}

/// Pick a slug for `name` that `is_taken` does not reject.
///
/// Tries the plain slug first, then `-2`, `-3`, ...
pub fn unique_slug(name: &str, mut is_taken: impl FnMut(&str) -> bool) -> String {
    let base = slugify(name);
    if !is_taken(&base) {
        return base;
    }
    (2_u32..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Running Shoes"), "running-shoes");
        assert_eq!(slugify("  T-Shirts & Tops!! "), "t-shirts-tops");
        assert_eq!(slugify("Кроссовки"), "item");
        assert_eq!(slugify("Size 42"), "size-42");
    }

    #[test]
    fn test_unique_slug_appends_counter() {
        let taken = ["shoes", "shoes-2"];
        let slug = unique_slug("Shoes", |s| taken.contains(&s));
        assert_eq!(slug, "shoes-3");
        assert_eq!(unique_slug("Hats", |_| false), "hats");
    }
}
