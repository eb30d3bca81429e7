use scraper::{Html, Node, Selector};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Attribute the indexing script stamps on interactive elements
pub const INDEX_ATTRIBUTE: &str = "data-scout-index";

/// Upper bound on page text included in a snapshot
pub const MAX_TEXT_CHARS: usize = 12_000;

/// Tags and indexes every visible interactive element, optionally outlining
/// it, and returns their descriptors as a JSON string.
pub const INDEX_SCRIPT: &str = r#"
(function (highlight) {
    document.querySelectorAll('[data-scout-index]').forEach(function (el) {
        el.removeAttribute('data-scout-index');
        if (el.dataset.scoutOutline !== undefined) {
            el.style.outline = el.dataset.scoutOutline;
            delete el.dataset.scoutOutline;
        }
    });
    var selector = 'a[href], button, input, select, textarea, [role="button"], [role="link"], [onclick]';
    var out = [];
    document.querySelectorAll(selector).forEach(function (el) {
        var rect = el.getBoundingClientRect();
        var style = window.getComputedStyle(el);
        if (rect.width === 0 || rect.height === 0 || style.visibility === 'hidden' || style.display === 'none') {
            return;
        }
        var index = out.length;
        el.setAttribute('data-scout-index', String(index));
        if (highlight) {
            el.dataset.scoutOutline = el.style.outline;
            el.style.outline = '2px solid #ff6a00';
        }
        var text = (el.innerText || el.value || el.getAttribute('aria-label') || el.getAttribute('placeholder') || '').trim();
        out.push({
            index: index,
            tag: el.tagName.toLowerCase(),
            text: text.replace(/\s+/g, ' ').slice(0, 120),
            href: el.getAttribute('href'),
            input_type: el.getAttribute('type')
        });
    });
    return JSON.stringify(out);
})(%HIGHLIGHT%)
"#;

/// The page as the agent sees it for one step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
    pub elements: Vec<InteractiveElement>,
    /// Visible text, whitespace-collapsed and truncated
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractiveElement {
    pub index: usize,
    pub tag: String,
    pub text: String,
    pub href: Option<String>,
    pub input_type: Option<String>,
}

impl PageSnapshot {
    /// Compact listing of the page for a prompt
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Current url: {}", self.url);
        let _ = writeln!(out, "Page title: {}", self.title);
        out.push_str("Interactive elements:\n");
        if self.elements.is_empty() {
            out.push_str("(none)\n");
        }
        for element in &self.elements {
            let _ = writeln!(out, "{}", element);
        }
        out.push_str("Page text:\n");
        out.push_str(&self.text);
        out
    }
}

impl std::fmt::Display for InteractiveElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]<{}", self.index, self.tag)?;
        if let Some(input_type) = &self.input_type {
            write!(f, " type=\"{}\"", input_type)?;
        }
        if let Some(href) = &self.href {
            write!(f, " href=\"{}\"", href)?;
        }
        write!(f, ">{}</{}>", self.text, self.tag)
    }
}

pub fn index_script(highlight: bool) -> String {
    INDEX_SCRIPT.replace("%HIGHLIGHT%", if highlight { "true" } else { "false" })
}

/// CSS selector for the element stamped with `index`
pub fn index_selector(index: usize) -> String {
    format!("[{}=\"{}\"]", INDEX_ATTRIBUTE, index)
}

/// Parse the descriptors returned by [`INDEX_SCRIPT`]
pub fn parse_elements(json: &str) -> serde_json::Result<Vec<InteractiveElement>> {
    serde_json::from_str(json)
}

/// Visible body text of an HTML document, without script or style content
pub fn visible_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").unwrap();

    let root = match document.select(&body_selector).next() {
        Some(body) => body,
        None => document.root_element(),
    };

    let mut words: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| matches!(el.name(), "script" | "style" | "noscript" | "template"))
                .unwrap_or(false)
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }

    truncate_chars(&words.join(" "), max_chars)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_text_skips_scripts_and_styles() {
        let html = r#"
            <html><head><title>T</title><style>.a { color: red }</style></head>
            <body>
                <h1>Apartments   for sale</h1>
                <script>var tracking = 1;</script>
                <p>2 rooms,
                   120 m²</p>
                <noscript>enable js</noscript>
            </body></html>"#;

        assert_eq!(visible_text(html, 1_000), "Apartments for sale 2 rooms, 120 m²");
    }

    #[test]
    fn visible_text_is_truncated_on_char_boundary() {
        let html = "<body><p>Ångström lägenhet</p></body>";
        assert_eq!(visible_text(html, 5), "Ångst...");
    }

    #[test]
    fn elements_render_with_index_and_attributes() {
        let elements = parse_elements(
            r#"[
                {"index": 0, "tag": "a", "text": "Next page", "href": "/page/2", "input_type": null},
                {"index": 1, "tag": "input", "text": "", "href": null, "input_type": "search"}
            ]"#,
        )
        .unwrap();

        let snapshot = PageSnapshot {
            url: "https://example.com".to_string(),
            title: "Example".to_string(),
            elements,
            text: "Hello".to_string(),
        };

        let rendered = snapshot.render();
        assert!(rendered.contains("[0]<a href=\"/page/2\">Next page</a>"));
        assert!(rendered.contains("[1]<input type=\"search\"></input>"));
        assert!(rendered.ends_with("Page text:\nHello"));
    }

    #[test]
    fn script_gets_highlight_flag() {
        assert!(index_script(true).contains("})(true)"));
        assert!(index_script(false).contains("})(false)"));
        assert_eq!(index_selector(4), "[data-scout-index=\"4\"]");
    }
}
