/// Markdown-to-HTML rendering for summary text
///
/// Providers return markdown; the summary region shows HTML styled with
/// md-* classes. Code spans are lifted out before any other transform so
/// their contents stay verbatim, then restored escaped at the end.
use std::sync::LazyLock;

use regex::Regex;

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```([\s\S]*?)```").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static H3: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^### (.*)$").unwrap());
static H2: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^## (.*)$").unwrap());
static H1: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^# (.*)$").unwrap());
static BOLD_STARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static BOLD_UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__(.*?)__").unwrap());
static ITALIC_STAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static ITALIC_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_(.*?)_").unwrap());
static BULLET_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[-*+] (.+)$").unwrap());
static BULLET_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)(<li class="md-list-item">.*</li>)"#).unwrap());
static ORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\d+\. (.+)$").unwrap());
static ORDERED_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)(<li class="md-ordered-item">.*</li>)"#).unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());
static BR_AFTER_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(</h[1-6]>)<br>").unwrap());
static UNORDERED_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<ul([^>]*)>([\s\S]*?)</ul>").unwrap());
static ORDERED_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<ol([^>]*)>([\s\S]*?)</ol>").unwrap());
static EMPTY_PARAGRAPH_BEFORE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"</(h[1-6])><p class="md-paragraph"></p>(<(?:ul|ol|pre|blockquote)[^>]*>)"#)
        .unwrap()
});
static BR_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<br\s*/?>").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub fn markdown_to_html(markdown: &str) -> String {
    if markdown.is_empty() {
        return String::new();
    }

    // Lift code out first so no other transform touches it. The placeholder
    // deliberately contains no markdown metacharacters.
    let mut code_blocks = Vec::new();
    let mut html = CODE_BLOCK
        .replace_all(markdown, |caps: &regex::Captures| {
            code_blocks.push(caps[1].trim().to_string());
            format!("\u{1}CB{}\u{1}", code_blocks.len() - 1)
        })
        .into_owned();

    let mut inline_codes = Vec::new();
    html = INLINE_CODE
        .replace_all(&html, |caps: &regex::Captures| {
            inline_codes.push(caps[1].to_string());
            format!("\u{1}IC{}\u{1}", inline_codes.len() - 1)
        })
        .into_owned();

    html = H3.replace_all(&html, r#"<h3 class="md-h3">$1</h3>"#).into_owned();
    html = H2.replace_all(&html, r#"<h2 class="md-h2">$1</h2>"#).into_owned();
    html = H1.replace_all(&html, r#"<h1 class="md-h1">$1</h1>"#).into_owned();

    html = BOLD_STARS
        .replace_all(&html, r#"<strong class="md-bold">$1</strong>"#)
        .into_owned();
    html = BOLD_UNDERSCORES
        .replace_all(&html, r#"<strong class="md-bold">$1</strong>"#)
        .into_owned();
    html = ITALIC_STAR
        .replace_all(&html, r#"<em class="md-italic">$1</em>"#)
        .into_owned();
    html = ITALIC_UNDERSCORE
        .replace_all(&html, r#"<em class="md-italic">$1</em>"#)
        .into_owned();

    html = BULLET_ITEM
        .replace_all(&html, r#"<li class="md-list-item">$1</li>"#)
        .into_owned();
    html = BULLET_RUN
        .replace(&html, r#"<ul class="md-list">$1</ul>"#)
        .into_owned();
    html = ORDERED_ITEM
        .replace_all(&html, r#"<li class="md-ordered-item">$1</li>"#)
        .into_owned();
    html = ORDERED_RUN
        .replace(&html, r#"<ol class="md-ordered-list">$1</ol>"#)
        .into_owned();

    html = LINK
        .replace_all(
            &html,
            r#"<a href="$2" class="md-link" target="_blank" rel="noopener">$1</a>"#,
        )
        .into_owned();

    html = html.replace("\n\n", r#"</p><p class="md-paragraph">"#);
    html = html.replace('\n', "<br>");

    if !html.starts_with('<') {
        html = format!(r#"<p class="md-paragraph">{html}</p>"#);
    }

    html = BR_AFTER_HEADING.replace_all(&html, "$1").into_owned();
    html = clean_list_bodies(&UNORDERED_BODY, "ul", &html);
    html = clean_list_bodies(&ORDERED_BODY, "ol", &html);
    html = EMPTY_PARAGRAPH_BEFORE_BLOCK
        .replace_all(&html, "</$1>$2")
        .into_owned();

    for (i, code) in code_blocks.iter().enumerate() {
        html = html.replace(
            &format!("\u{1}CB{i}\u{1}"),
            &format!(
                r#"<pre class="md-code-block"><code>{}</code></pre>"#,
                escape_html(code)
            ),
        );
    }
    for (i, code) in inline_codes.iter().enumerate() {
        html = html.replace(
            &format!("\u{1}IC{i}\u{1}"),
            &format!(r#"<code class="md-inline-code">{}</code>"#, escape_html(code)),
        );
    }

    html
}

/// Paragraph markup leaks into list runs when blank lines separate items;
/// strip it so the list renders as one block.
fn clean_list_bodies(pattern: &Regex, tag: &str, html: &str) -> String {
    pattern
        .replace_all(html, |caps: &regex::Captures| {
            let attrs = &caps[1];
            let body = caps[2]
                .replace(r#"<p class="md-paragraph"></p>"#, "")
                .replace(r#"</p><p class="md-paragraph">"#, "")
                .replace(r#"<p class="md-paragraph">"#, "")
                .replace("</p>", "");
            let body = BR_TAG.replace_all(&body, "");
            let body = WHITESPACE_RUN.replace_all(&body, " ");
            format!("<{tag}{attrs}>{}</{tag}>", body.trim())
        })
        .into_owned()
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(markdown_to_html(""), "");
    }

    #[test]
    fn test_plain_text_becomes_paragraph() {
        assert_eq!(
            markdown_to_html("Just some text"),
            r#"<p class="md-paragraph">Just some text</p>"#
        );
    }

    #[test]
    fn test_headings() {
        let html = markdown_to_html("# Title\n## Sub\n### Sub sub");
        assert!(html.contains(r#"<h1 class="md-h1">Title</h1>"#));
        assert!(html.contains(r#"<h2 class="md-h2">Sub</h2>"#));
        assert!(html.contains(r#"<h3 class="md-h3">Sub sub</h3>"#));
        // Newlines after headings must not leave stray <br> tags.
        assert!(!html.contains("</h1><br>"));
    }

    #[test]
    fn test_bold_and_italic() {
        let html = markdown_to_html("**bold** and *italic*");
        assert!(html.contains(r#"<strong class="md-bold">bold</strong>"#));
        assert!(html.contains(r#"<em class="md-italic">italic</em>"#));
    }

    #[test]
    fn test_bullet_list_wrapped_once() {
        let html = markdown_to_html("- one\n- two\n- three");
        assert_eq!(html.matches("<ul").count(), 1);
        assert_eq!(html.matches(r#"<li class="md-list-item">"#).count(), 3);
        assert!(!html.contains("<br>"));
    }

    #[test]
    fn test_ordered_list() {
        let html = markdown_to_html("1. first\n2. second");
        assert_eq!(html.matches("<ol").count(), 1);
        assert!(html.contains(r#"<li class="md-ordered-item">first</li>"#));
    }

    #[test]
    fn test_link() {
        let html = markdown_to_html("See [docs](https://example.com)");
        assert!(html.contains(
            r#"<a href="https://example.com" class="md-link" target="_blank" rel="noopener">docs</a>"#
        ));
    }

    #[test]
    fn test_paragraph_breaks() {
        let html = markdown_to_html("first\n\nsecond");
        assert!(html.contains(r#"</p><p class="md-paragraph">"#));
    }

    #[test]
    fn test_code_block_escaped_and_untransformed() {
        let html = markdown_to_html("```\nlet x = a < b && c > d; // **not bold**\n```");
        assert!(html.contains(r#"<pre class="md-code-block"><code>"#));
        assert!(html.contains("&lt;"));
        assert!(html.contains("&gt;"));
        assert!(html.contains("&amp;&amp;"));
        // Markdown inside the fence stays literal.
        assert!(html.contains("**not bold**"));
        assert!(!html.contains("<strong"));
    }

    #[test]
    fn test_inline_code_escaped() {
        let html = markdown_to_html("Use `a & b` here");
        assert!(html.contains(r#"<code class="md-inline-code">a &amp; b</code>"#));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>"x" & 'y'</script>"#),
            "&lt;script&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }
}
