use serde::Deserialize;

/// Static attributes of a DOM element, as handed over by the host-side
/// listeners. Deliberately carries nothing positional: two elements with the
/// same static attributes are indistinguishable here no matter where they
/// sit in the document.
#[derive(Debug, Clone, Deserialize)]
pub struct ElementFacts {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "className")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Label attached by an earlier labeling pass, if any. The host checks
    /// this before asking for a new id, so the registry sees each concrete
    /// element at most once.
    #[serde(default, rename = "dataZenId")]
    pub existing_label: Option<String>,
}

impl ElementFacts {
    /// Minimal facts with just a tag name. Handy for hosts that normalize
    /// incrementally and for tests.
    pub fn with_tag(tag: impl Into<String>) -> Self {
        ElementFacts {
            tag: tag.into(),
            id: None,
            class_name: None,
            name: None,
            r#type: None,
            text: None,
            existing_label: None,
        }
    }
}
