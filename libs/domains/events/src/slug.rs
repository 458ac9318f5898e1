//! URL-safe slugs derived from event titles.

/// Lowercase `title`, collapse every run of non-ASCII-alphanumeric characters
/// into one `-`, and strip leading/trailing dashes.
///
/// ```
/// use domain_events::slugify;
///
/// assert_eq!(slugify("Tech Conference 2024"), "tech-conference-2024");
/// assert_eq!(slugify("AI & ML Summit"), "ai-ml-summit");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
