//! Brain entry filtering shared by the REST query string, MCP resource URIs
//! and the query tool.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BrainEntry, BrainEntryType, InvalidEntryType, normalize_tags};

/// Typed filter. Every `None` field matches everything; fields are AND-ed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrainEntryFilter {
    pub entry_type: Option<BrainEntryType>,
    /// An entry matches when it carries any of these tags
    pub tags: Option<Vec<String>>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub pinned: Option<bool>,
}

impl BrainEntryFilter {
    pub fn with_type(mut self, entry_type: BrainEntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = Some(pinned);
        self
    }

    pub fn with_date_range(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Apply the filter, keeping stored order.
    pub fn apply(&self, entries: &[BrainEntry]) -> Vec<BrainEntry> {
        let tags = self
            .tags
            .as_deref()
            .and_then(normalize_tags)
            .unwrap_or_default();
        let from = self.date_from.as_deref().and_then(parse_datetime);
        let to = self.date_to.as_deref().and_then(parse_datetime);

        entries
            .iter()
            .filter(|entry| {
                if let Some(entry_type) = self.entry_type
                    && entry.entry_type != entry_type
                {
                    return false;
                }
                if let Some(pinned) = self.pinned
                    && entry.pinned != pinned
                {
                    return false;
                }
                if !tags.is_empty() {
                    let entry_tags = entry.tags.as_deref().unwrap_or_default();
                    if !tags.iter().any(|tag| entry_tags.contains(tag)) {
                        return false;
                    }
                }
                if (from.is_some() || to.is_some())
                    && let Some(at) = parse_datetime(&entry.timestamp)
                {
                    if from.is_some_and(|from| at < from) {
                        return false;
                    }
                    if to.is_some_and(|to| at > to) {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect()
    }
}

/// Untyped query-string form: `?type=note&tags=a,b&dateFrom=..&dateTo=..&pinned=true`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrainQuery {
    #[serde(default, rename = "type")]
    pub entry_type: Option<String>,
    /// Comma separated
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
    /// `"true"` (any case) means pinned, any other value, empty included,
    /// means not pinned
    #[serde(default)]
    pub pinned: Option<String>,
}

impl BrainQuery {
    /// Build from decoded `key=value` pairs, ignoring unknown keys.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "type" => query.entry_type = Some(value),
                "tags" => query.tags = Some(value),
                "dateFrom" => query.date_from = Some(value),
                "dateTo" => query.date_to = Some(value),
                "pinned" => query.pinned = Some(value),
                _ => {}
            }
        }
        query
    }

    /// Validate and convert into a typed filter. Blank values count as absent.
    pub fn into_filter(self) -> Result<BrainEntryFilter, InvalidEntryType> {
        let entry_type = match non_blank(self.entry_type) {
            Some(value) => Some(value.parse::<BrainEntryType>()?),
            None => None,
        };
        let tags = self
            .tags
            .as_deref()
            .map(|raw| raw.split(',').collect::<Vec<_>>())
            .and_then(|parts| normalize_tags(&parts));
        // Any present `pinned` key filters; only "true" selects pinned entries
        let pinned = self
            .pinned
            .map(|value| value.trim().eq_ignore_ascii_case("true"));

        Ok(BrainEntryFilter {
            entry_type,
            tags,
            date_from: non_blank(self.date_from),
            date_to: non_blank(self.date_to),
            pinned,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) or `YYYY-MM-DD` (midnight UTC).
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
