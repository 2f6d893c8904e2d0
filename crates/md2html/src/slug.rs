use std::collections::HashMap;

const FALLBACK_ID: &str = "heading";

/// Hands out unique heading ids for a single document.
#[derive(Debug, Default)]
pub struct HeadingIds {
    seen: HashMap<String, usize>,
}

impl HeadingIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive an id from heading text, suffixing `-1`, `-2`, ... on repeats.
    pub fn generate(&mut self, text: &str) -> String {
        let base = match slugify(text) {
            slug if slug.is_empty() => FALLBACK_ID.to_string(),
            slug => slug,
        };
        self.claim(base)
    }

    /// Reserve an explicit id so generated ones do not collide with it.
    pub fn reserve(&mut self, id: &str) {
        self.seen.entry(id.to_string()).or_insert(0);
    }

    fn claim(&mut self, base: String) -> String {
        let Some(count) = self.seen.get(&base).copied() else {
            self.seen.insert(base.clone(), 0);
            return base;
        };

        let mut next = count + 1;
        loop {
            let candidate = format!("{base}-{next}");
            if !self.seen.contains_key(&candidate) {
                self.seen.insert(base, next);
                self.seen.insert(candidate.clone(), 0);
                return candidate;
            }
            next += 1;
        }
    }
}

/// Lowercase alphanumerics, single dashes for whitespace and dash runs,
/// everything else dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut last_was_dash = false;

    for ch in text.chars().flat_map(|c| c.to_lowercase()) {
        if ch.is_alphanumeric() || ch == '_' {
            slug.push(ch);
            last_was_dash = false;
        } else if (ch.is_whitespace() || ch == '-') && !slug.is_empty() && !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }

    if slug.ends_with('-') {
        slug.pop();
    }

    slug
}
