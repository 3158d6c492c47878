//! URL slug derivation for posts, categories and tags.

/// Derives a lowercase ASCII slug from free text.
///
/// Spanish accented letters fold to their base letter; every other
/// non-alphanumeric run collapses into a single `-`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for ch in value.chars().flat_map(char::to_lowercase) {
        let folded = fold_accent(ch);
        if folded.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(folded);
        } else if folded.is_whitespace() || folded == '-' || folded == '_' {
            pending_dash = true;
        }
    }

    slug
}

/// Returns `base` or `base-N` for the first candidate `is_taken` rejects.
pub fn unique_slug(base: &str, fallback: &str, mut is_taken: impl FnMut(&str) -> bool) -> String {
    let base = if base.is_empty() { fallback } else { base };
    if !is_taken(base) {
        return base.to_string();
    }
    let mut suffix = 2_u32;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !is_taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::{slugify, unique_slug};

    #[test]
    fn slugify_folds_accents_and_collapses_separators() {
        assert_eq!(slugify("¿Qué significa  'chévere'?"), "que-significa-chevere");
        assert_eq!(slugify("Año_nuevo -- en México"), "ano-nuevo-en-mexico");
    }

    #[test]
    fn slugify_of_symbols_is_empty() {
        assert_eq!(slugify("¡¡!!"), "");
    }

    #[test]
    fn unique_slug_appends_first_free_suffix() {
        let taken = ["hola", "hola-2"];
        let slug = unique_slug("hola", "post", |candidate| taken.contains(&candidate));
        assert_eq!(slug, "hola-3");
        assert_eq!(unique_slug("", "post", |_| false), "post");
    }
}
