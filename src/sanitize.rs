use ego_tree::NodeRef;
use scraper::{Html, Node};

use crate::record::{FieldId, JobApplicationRecord};

/// Reduce a field to plain text: parse as an HTML fragment, keep text
/// content, drop tags, attributes, and script/style bodies, then remove
/// any leftover angle brackets.
///
/// Entity decoding can surface new markup ("&amp;lt;" decodes to "&lt;",
/// which decodes to "<"), so the pass repeats until the output is stable.
/// Each pass only ever shrinks or normalizes the text, so this terminates.
pub fn strip_markup(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_once(input: &str) -> String {
    let fragment = Html::parse_fragment(input);
    let mut text = String::new();
    collect_text(fragment.tree.root(), &mut text);
    text.retain(|c| c != '<' && c != '>');
    text
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        // script and style bodies are payload, not content
        Node::Element(element) if matches!(element.name(), "script" | "style") => {}
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

/// Sanitized copy of a record, applied to every text field just before
/// submission. Drafts are stored unsanitized; this never runs on save.
pub fn sanitize_record(record: &JobApplicationRecord) -> JobApplicationRecord {
    let mut clean = record.clone();
    for field in FieldId::ALL {
        if field.is_flag() {
            continue;
        }
        let value = clean.get(field);
        clean.set(field, &strip_markup(&value));
    }
    clean
}
