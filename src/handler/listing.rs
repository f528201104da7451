//! Directory listing rendering
//!
//! Produces the minimal HTML index shown for directories without an index
//! file: a `<pre>` block with one link per entry, sorted by name.

use std::fmt::Write as _;
use std::io;
use std::path::Path;
use tokio::fs;

/// One directory entry as shown in a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Read a directory's entries, sorted by name
///
/// Symlinks are reported by their own type, not their target's.
pub async fn read_entries(dir: &Path) -> io::Result<Vec<ListingEntry>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let is_dir = entry.file_type().await?.is_dir();
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Render the listing page
pub fn render_listing(entries: &[ListingEntry]) -> String {
    let mut html = String::from(
        "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
    );

    for entry in entries {
        let suffix = if entry.is_dir { "/" } else { "" };
        let _ = writeln!(
            html,
            "<a href=\"{}{suffix}\">{}{suffix}</a>",
            urlencoding::encode(&entry.name),
            escape_html(&entry.name),
        );
    }

    html.push_str("</pre>\n");
    html
}

/// Escape text for inclusion in HTML content or a quoted attribute
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, is_dir: bool) -> ListingEntry {
        ListingEntry {
            name: name.to_string(),
            is_dir,
        }
    }

    #[test]
    fn test_render_listing() {
        let html = render_listing(&[entry("css", true), entry("index.js", false)]);
        assert_eq!(
            html,
            "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n\
             <a href=\"css/\">css/</a>\n\
             <a href=\"index.js\">index.js</a>\n\
             </pre>\n"
        );
    }

    #[test]
    fn test_render_escapes_names() {
        let html = render_listing(&[entry("a b&<c>.txt", false)]);
        assert!(html.contains("href=\"a%20b%26%3Cc%3E.txt\""));
        assert!(html.contains(">a b&amp;&lt;c&gt;.txt</a>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("\"x\" & 'y'"), "&#34;x&#34; &amp; &#39;y&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[tokio::test]
    async fn test_read_entries_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(dir.path().join("c")).unwrap();

        let entries = read_entries(dir.path()).await.unwrap();
        assert_eq!(
            entries,
            vec![entry("a.txt", false), entry("b.txt", false), entry("c", true)]
        );
    }
}
