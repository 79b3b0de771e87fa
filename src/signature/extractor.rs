use crate::signature::element::ElementFacts;

/// Text at or beyond this length never participates in a signature; long
/// text is content, not identity.
const MAX_TEXT_LEN: usize = 50;

const DELIMITER: &str = "|";

/// Derive the position-independent signature for an element.
///
/// Tokens are emitted in a fixed order: lowercased tag, then `id:`,
/// `class:`, `name:`, `type:` for whichever attributes are present, then
/// `text:` with the trimmed text when it is non-empty and short. Absent
/// attributes contribute no token at all, so the same static attributes
/// always yield a byte-identical signature.
///
/// Returns `None` when the input has no tag name.
pub fn extract_signature(el: &ElementFacts) -> Option<String> {
    if el.tag.trim().is_empty() {
        return None;
    }

    let mut tokens = vec![el.tag.to_lowercase()];

    if let Some(id) = non_empty(&el.id) {
        tokens.push(format!("id:{}", id));
    }
    if let Some(class) = non_empty(&el.class_name) {
        tokens.push(format!("class:{}", class));
    }
    if let Some(name) = non_empty(&el.name) {
        tokens.push(format!("name:{}", name));
    }
    if let Some(ty) = non_empty(&el.r#type) {
        tokens.push(format!("type:{}", ty));
    }
    if let Some(text) = el.text.as_deref() {
        let trimmed = text.trim();
        if !trimmed.is_empty() && trimmed.chars().count() < MAX_TEXT_LEN {
            tokens.push(format!("text:{}", trimmed));
        }
    }

    Some(tokens.join(DELIMITER))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
