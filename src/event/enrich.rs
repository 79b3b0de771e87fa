use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::event::event_model::TrackedEvent;

/// Host environment snapshot captured once at agent start.
///
/// Explicit instance state instead of reading host globals at enrichment
/// time; hosts that cannot supply a field leave it at its default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageContext {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub referrer: String,
    #[serde(default, rename = "userAgent")]
    pub user_agent: String,
    #[serde(default)]
    pub language: String,
    #[serde(default, rename = "screenWidth")]
    pub screen_width: u32,
    #[serde(default, rename = "screenHeight")]
    pub screen_height: u32,
    /// True when the document had already finished loading by the time the
    /// agent started.
    #[serde(default, rename = "documentLoaded")]
    pub document_loaded: bool,
}

/// Attaches the base context to raw event names and payloads.
pub struct Enricher {
    site_id: String,
    user_id: String,
    context: PageContext,
}

impl Enricher {
    pub fn new(site_id: String, user_id: String, context: PageContext) -> Self {
        Enricher {
            site_id,
            user_id,
            context,
        }
    }

    /// Merge the base context under the caller's payload.
    ///
    /// Caller keys win on conflict. The payload is accepted verbatim, no
    /// shape validation.
    pub fn enrich(&self, event_name: &str, data: Option<Map<String, Value>>) -> TrackedEvent {
        let mut fields = Map::new();
        fields.insert("eventName".into(), Value::from(event_name));
        fields.insert(
            "timestamp".into(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        fields.insert("siteId".into(), Value::from(self.site_id.as_str()));
        fields.insert("userId".into(), Value::from(self.user_id.as_str()));
        fields.insert("url".into(), Value::from(self.context.url.as_str()));
        fields.insert("referrer".into(), Value::from(self.context.referrer.as_str()));
        fields.insert(
            "userAgent".into(),
            Value::from(self.context.user_agent.as_str()),
        );
        fields.insert("language".into(), Value::from(self.context.language.as_str()));
        fields.insert("screenWidth".into(), Value::from(self.context.screen_width));
        fields.insert(
            "screenHeight".into(),
            Value::from(self.context.screen_height),
        );

        if let Some(data) = data {
            for (key, value) in data {
                fields.insert(key, value);
            }
        }

        TrackedEvent { fields }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn context(&self) -> &PageContext {
        &self.context
    }
}
