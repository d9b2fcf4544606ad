use std::borrow::Cow;

/// Normalizes a title into a filename-safe slug.
///
/// Lowercases the input and collapses every run of non-alphanumeric
/// characters into a single hyphen, trimming hyphens at both ends. Unicode
/// letters and digits are preserved, so non-ASCII titles keep their
/// characters rather than being transliterated.
///
/// The same transform is applied to new titles and to existing filenames, so
/// duplicate detection compares like with like.
///
/// # Examples
///
/// ```
/// use wxr_migrate::util::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("lorem & \"ipsum\""), "lorem-ipsum");
/// assert_eq!(slugify("  Already-Slugged  "), "already-slugged");
/// ```
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;

    for c in input.trim().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }

    out
}

/// Decodes percent-encoding in a slug, falling back to the input on error.
///
/// WordPress percent-encodes non-ASCII post names in `wp:post_name`. The
/// decoded form is used only when deriving the stored filename; the record
/// itself keeps the encoded slug.
pub fn percent_decode(input: &str) -> Cow<'_, str> {
    match urlencoding::decode(input) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!(slug = %input, error = %e, "Slug is not valid percent-encoded UTF-8, keeping as-is");
            Cow::Borrowed(input)
        }
    }
}
