//! Event domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{EventError, Result};
use crate::id::EventId;

/// Keys owned by the service; never taken from a submission's free-form fields.
const RESERVED_KEYS: [&str; 6] = ["_id", "id", "slug", "createdAt", "updatedAt", "eventName"];

/// Submission keys that must hold a string (or null).
const TEXT_FIELDS: [&str; 13] = [
    "title",
    "eventName",
    "description",
    "overview",
    "venue",
    "location",
    "date",
    "time",
    "mode",
    "audience",
    "organizer",
    "url",
    "image",
];

/// Submission keys that must hold an array of strings (or null).
const LIST_FIELDS: [&str; 2] = ["tags", "agenda"];

/// Timestamps are written with a fixed millisecond precision so that the stored
/// strings sort in chronological order. BSON dates are accepted when reading.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use mongodb::bson::Bson;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match Bson::deserialize(deserializer)? {
            Bson::String(raw) => raw.parse().map_err(de::Error::custom),
            Bson::DateTime(at) => DateTime::from_timestamp_millis(at.timestamp_millis())
                .ok_or_else(|| de::Error::custom("timestamp out of range")),
            other => Err(de::Error::custom(format!("unsupported timestamp: {}", other))),
        }
    }
}

/// Readers for descriptive fields, which other writers may have stored with
/// another BSON type.
mod loose {
    use chrono::{DateTime, SecondsFormat};
    use mongodb::bson::Bson;
    use serde::{Deserialize, Deserializer};

    fn text(value: Bson) -> Option<String> {
        match value {
            Bson::Null | Bson::Undefined => None,
            Bson::String(s) => Some(s),
            Bson::DateTime(at) => DateTime::from_timestamp_millis(at.timestamp_millis())
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            other => Some(other.to_string()),
        }
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(text(Bson::deserialize(deserializer)?))
    }

    pub fn list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match Bson::deserialize(deserializer)? {
            Bson::Array(items) => items.into_iter().filter_map(text).collect(),
            other => text(other).into_iter().collect(),
        })
    }
}

/// A listed tech event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Store identity: a UUID v7, or an ObjectId on documents written elsewhere
    #[serde(rename = "_id", alias = "id")]
    #[schema(value_type = String)]
    pub id: EventId,

    /// Unique, immutable URL key derived from the title
    #[serde(default)]
    pub slug: String,

    /// Older documents name this `eventName`
    #[serde(default, alias = "eventName")]
    pub title: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "loose::optional_text"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "loose::optional_text"
    )]
    pub overview: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "loose::optional_text"
    )]
    pub venue: Option<String>,

    #[serde(default)]
    pub location: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "loose::optional_text"
    )]
    pub date: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "loose::optional_text"
    )]
    pub time: Option<String>,
    /// e.g. "Online" or "In-person"
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "loose::optional_text"
    )]
    pub mode: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "loose::optional_text"
    )]
    pub audience: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "loose::optional_text"
    )]
    pub organizer: Option<String>,
    /// External registration URL
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "loose::optional_text"
    )]
    pub url: Option<String>,
    /// Hosted image URL
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "loose::optional_text"
    )]
    pub image: Option<String>,

    /// Drives similarity; set semantics
    #[serde(default, deserialize_with = "loose::list")]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "loose::list")]
    pub agenda: Vec<String>,

    /// Epoch on documents that never recorded one
    #[serde(default, with = "timestamp")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,

    #[serde(default, with = "timestamp")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,

    /// Any other author-supplied fields, kept verbatim
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Event {
    /// Build a new document from a validated submission.
    ///
    /// The caller supplies the slug and the hosted image URL (if an image was uploaded).
    pub fn from_submission(create: CreateEvent, slug: String, image: Option<String>) -> Self {
        let now = Utc::now();
        let mut extra = create.extra;
        extra.retain(|key, _| !RESERVED_KEYS.contains(&key.as_str()));

        Self {
            id: EventId::new(),
            slug,
            title: create.title.unwrap_or_default(),
            description: create.description,
            overview: create.overview,
            venue: create.venue,
            location: create.location.unwrap_or_default(),
            date: create.date,
            time: create.time,
            mode: create.mode,
            audience: create.audience,
            organizer: create.organizer,
            url: create.url,
            image: image.or(create.image),
            tags: normalize_list(create.tags, true),
            agenda: normalize_list(create.agenda, false),
            created_at: now,
            updated_at: now,
            extra,
        }
    }
}

/// Event submission (JSON body, or the text fields of a multipart form).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvent {
    /// Also accepted as `eventName`
    #[serde(alias = "eventName")]
    #[validate(required, length(min = 1))]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,

    #[validate(required, length(min = 1))]
    pub location: Option<String>,

    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub organizer: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// URL of an already hosted image; an uploaded file takes precedence
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub agenda: Vec<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl CreateEvent {
    /// Decode a submission body, reporting the first wrongly typed field by name.
    pub fn from_json(body: serde_json::Value) -> Result<Self> {
        use serde_json::Value;

        let Value::Object(mut fields) = body else {
            return Err(EventError::validation(
                "body",
                "Validation Failed: the submission must be a JSON object",
            ));
        };

        if fields.contains_key("title") && fields.contains_key("eventName") {
            return Err(EventError::validation(
                "title",
                "Validation Failed: send either 'title' or 'eventName', not both",
            ));
        }

        for name in TEXT_FIELDS {
            let wrong_type = fields
                .get(name)
                .is_some_and(|value| !(value.is_string() || value.is_null()));
            if wrong_type {
                let field = if name == "eventName" { "title" } else { name };
                return Err(EventError::validation(
                    field,
                    format!("Validation Failed: '{}' must be a string", name),
                ));
            }
        }

        for name in LIST_FIELDS {
            match fields.get(name) {
                None => {}
                Some(Value::Null) => {
                    fields.remove(name);
                }
                Some(Value::Array(items)) if items.iter().all(Value::is_string) => {}
                Some(_) => {
                    return Err(EventError::validation(
                        name,
                        format!("Validation Failed: '{}' must be an array of strings", name),
                    ));
                }
            }
        }

        serde_json::from_value(Value::Object(fields))
            .map_err(|e| EventError::validation("body", format!("Validation Failed: {}", e)))
    }

    /// Trim every text field. Blank optional fields become `None`; blank
    /// required fields stay blank so validation can name them.
    pub fn normalized(mut self) -> Self {
        fn trim(value: &mut Option<String>) {
            if let Some(v) = value {
                let trimmed = v.trim();
                if trimmed.len() != v.len() {
                    *v = trimmed.to_string();
                }
            }
        }
        fn trim_optional(value: &mut Option<String>) {
            trim(value);
            if value.as_deref().is_some_and(str::is_empty) {
                *value = None;
            }
        }

        trim(&mut self.title);
        trim(&mut self.location);
        for field in [
            &mut self.description,
            &mut self.overview,
            &mut self.venue,
            &mut self.date,
            &mut self.time,
            &mut self.mode,
            &mut self.audience,
            &mut self.organizer,
            &mut self.url,
            &mut self.image,
        ] {
            trim_optional(field);
        }
        self
    }

    /// Check required fields, reporting the first failing one (`title` before `location`).
    pub fn validate_submission(&self) -> Result<()> {
        let Err(errors) = self.validate() else {
            return Ok(());
        };

        let fields = errors.field_errors();
        for field in ["title", "location"] {
            if fields.contains_key(field) {
                return Err(EventError::required(field));
            }
        }
        Err(EventError::validation("body", errors.to_string()))
    }
}

/// Multipart form layout for `POST /api/events`, for the OpenAPI docs.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct CreateEventForm {
    /// Also accepted as `eventName`
    pub title: String,
    pub location: String,
    pub description: Option<String>,
    /// JSON-encoded array of strings, e.g. `["ai","cloud"]`
    pub tags: Option<String>,
    /// JSON-encoded array of strings
    pub agenda: Option<String>,
    /// jpeg, png, webp or gif; at most 5 MiB
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

/// Data behind an event detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventPageData {
    pub event: Event,
    /// Up to 3 other events sharing at least one tag
    pub similar_events: Vec<Event>,
}

/// Parse a multipart `tags`/`agenda` value, which must be a JSON array of strings.
pub fn parse_list_field(field: &str, raw: &str) -> Result<Vec<String>> {
    serde_json::from_str::<Vec<String>>(raw).map_err(|_| {
        EventError::validation(
            field,
            format!("Validation Failed: '{}' must be a JSON array of strings", field),
        )
    })
}

/// Trim entries and drop blanks; with `dedupe`, keep only the first occurrence of each value.
fn normalize_list(values: Vec<String>, dedupe: bool) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if value.is_empty() || (dedupe && out.iter().any(|v| v == value)) {
            continue;
        }
        out.push(value.to_string());
    }
    out
}
