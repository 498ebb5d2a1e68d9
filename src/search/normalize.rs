//! Recovery of flat [`SearchRecord`]s from search API responses.
//!
//! The response shape depends on the query. [`classify`] picks the first
//! branch of the payload that holds results, in a fixed preference order, and
//! [`flatten`] turns that branch into raw result objects. [`parse_record`] then
//! maps each object onto a record with field-level fallbacks.

use super::{ResultSource, SearchOutcome, SearchRecord};
use serde_json::{Map, Value};
use url::Url;

/// Category containers, in preference order
const CATEGORY_KEYS: [ResultSource; 3] = [
    ResultSource::News,
    ResultSource::Web,
    ResultSource::Discussions,
];

/// Named regions probed inside a mixed container
const MIXED_REGIONS: [&str; 3] = ["main", "top", "side"];

/// The branch of a payload that results will be taken from
#[derive(Debug, Clone, PartialEq)]
pub enum Classified<'a> {
    /// The API said there is nothing
    NoResults,
    /// `<category>.results` holding items
    Category {
        source: ResultSource,
        items: &'a [Value],
    },
    /// Top-level `results` or `hits` holding items
    Flat {
        source: ResultSource,
        items: &'a [Value],
    },
    /// `mixed` as a list of possibly wrapped items
    MixedList(&'a [Value]),
    /// `mixed` as an object with sub-lists and named regions
    MixedMap(&'a Map<String, Value>),
    /// No branch applies
    Empty,
}

/// Pick the branch of `payload` to read results from.
///
/// Branches whose list is present but empty fall through to the next one.
pub fn classify(payload: &Value) -> Classified<'_> {
    let mixed = payload.get("mixed");
    if mixed.and_then(|m| m.get("type")).and_then(Value::as_str) == Some("no_results") {
        return Classified::NoResults;
    }

    for source in CATEGORY_KEYS {
        if let Some(items) = non_empty(category_results(payload.get(source.key()))) {
            return Classified::Category {
                source,
                items: items.as_slice(),
            };
        }
    }

    for source in [ResultSource::Results, ResultSource::Hits] {
        if let Some(items) = non_empty(payload.get(source.key()).and_then(Value::as_array)) {
            return Classified::Flat {
                source,
                items: items.as_slice(),
            };
        }
    }

    match mixed {
        Some(Value::Array(items)) if !items.is_empty() => Classified::MixedList(items),
        Some(Value::Object(map)) if !map.is_empty() => Classified::MixedMap(map),
        _ => Classified::Empty,
    }
}

/// Raw result objects of a classified branch
pub fn flatten<'a>(classified: &Classified<'a>) -> Vec<&'a Value> {
    match *classified {
        Classified::NoResults | Classified::Empty => Vec::new(),
        Classified::Category { items, .. } | Classified::Flat { items, .. } => {
            items.iter().collect()
        }
        Classified::MixedList(items) => unwrap_items(items),
        Classified::MixedMap(map) => flatten_mixed_map(map),
    }
}

/// Normalize a decoded payload
pub fn normalize_payload(payload: &Value, query: &str) -> SearchOutcome {
    let classified = classify(payload);
    let source = match &classified {
        Classified::NoResults => {
            ::log::info!("Search API explicitly indicated no results for '{}'", query);
            return SearchOutcome::empty(format!("No search results found for '{}'.", query));
        }
        Classified::Category { source, .. } | Classified::Flat { source, .. } => Some(*source),
        Classified::MixedList(_) | Classified::MixedMap(_) => Some(ResultSource::Mixed),
        Classified::Empty => None,
    };
    if let Some(source) = source {
        ::log::info!("Extracting results from '{}' branch", source);
    }

    let items = flatten(&classified);
    if items.is_empty() {
        log_structure(payload);
        return SearchOutcome::empty(format!(
            "No search results found or extracted for '{}'.",
            query
        ));
    }

    let records: Vec<SearchRecord> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let record = parse_record(item);
            if record.is_none() {
                ::log::warn!("Skipping non-object item #{} in results", i);
            }
            record
        })
        .collect();
    ::log::info!("Parsed {} search records", records.len());

    if records.is_empty() {
        return SearchOutcome::empty(format!(
            "No search results found or extracted for '{}'.",
            query
        ));
    }

    SearchOutcome::Success {
        records,
        source,
        message: None,
    }
}

/// Normalize a raw response body; a body that is not JSON is a failure
pub fn normalize_body(body: &str, query: &str) -> SearchOutcome {
    match serde_json::from_str::<Value>(body) {
        Ok(payload) => normalize_payload(&payload, query),
        Err(e) => {
            ::log::error!("JSON decoding failed for search response: {}", e);
            SearchOutcome::Failure {
                reason: format!("JSON decoding failed: {}", e),
            }
        }
    }
}

/// Map one result object onto a record; `None` for anything but an object
pub fn parse_record(item: &Value) -> Option<SearchRecord> {
    let obj = item.as_object()?;
    let web = obj.get("web").and_then(Value::as_object);

    let title = str_field(obj, "title")
        .or_else(|| str_field(obj, "name"))
        .unwrap_or("No title")
        .to_string();

    let description = str_field(obj, "description")
        .or_else(|| str_field(obj, "snippet"))
        .or_else(|| web.and_then(|w| str_field(w, "snippet")))
        .unwrap_or("")
        .trim()
        .to_string();

    let url = str_field(obj, "url")
        .or_else(|| web.and_then(|w| str_field(w, "url")))
        .unwrap_or("")
        .to_string();

    let provider = obj
        .get("meta_url")
        .and_then(Value::as_object)
        .and_then(|m| str_field(m, "display_name"))
        .or_else(|| str_field(obj, "source"))
        .or_else(|| {
            obj.get("profile")
                .and_then(Value::as_object)
                .and_then(|p| str_field(p, "name"))
        })
        .map(str::to_string)
        .or_else(|| url_host(&url))
        .unwrap_or_else(|| "Unknown Provider".to_string());

    let date_published = str_field(obj, "age")
        .or_else(|| str_field(obj, "page_age"))
        .unwrap_or("")
        .to_string();

    Some(SearchRecord {
        title,
        description,
        url,
        provider,
        date_published,
    })
}

/// Non-empty string value of `key`
fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn url_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

fn category_results(container: Option<&Value>) -> Option<&Vec<Value>> {
    container?.get("results")?.as_array()
}

fn non_empty(items: Option<&Vec<Value>>) -> Option<&Vec<Value>> {
    items.filter(|items| !items.is_empty())
}

fn flatten_mixed_map(map: &Map<String, Value>) -> Vec<&Value> {
    let mut items: Vec<&Value> = Vec::new();

    for source in CATEGORY_KEYS {
        if let Some(results) = category_results(map.get(source.key())) {
            ::log::info!("Found {} results in mixed.{}.results", results.len(), source);
            items.extend(results);
        }
    }

    if let Some(searches) = map.get("searches").and_then(Value::as_array) {
        for search in searches {
            if let Some(results) = search.get("results").and_then(Value::as_array) {
                ::log::info!("Found {} results in mixed.searches[].results", results.len());
                items.extend(results);
            }
        }
    }

    for region in MIXED_REGIONS {
        if let Some(container) = map.get(region) {
            let extracted = unwrap_container(container);
            if !extracted.is_empty() {
                ::log::info!("Extended {} results from mixed.{}", extracted.len(), region);
                items.extend(extracted);
            }
        }
    }

    if items.is_empty() {
        ::log::info!("No results in mixed regions, trying direct keys of the mixed container");
        if let Some(results) = map.get("results").and_then(Value::as_array) {
            items.extend(results);
        }
    }

    items
}

/// Items of a region that is either a list of wrapped items or an object
fn unwrap_container(container: &Value) -> Vec<&Value> {
    match container {
        Value::Array(list) => unwrap_items(list),
        Value::Object(obj) => {
            if let Some(results) = obj.get("results").and_then(Value::as_array) {
                results.iter().collect()
            } else if is_flat_record(obj) {
                vec![container]
            } else {
                ::log::warn!(
                    "Mixed region has no results list or flat record. Keys: {:?}",
                    obj.keys().collect::<Vec<_>>()
                );
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

/// Unwrap each item to the innermost object carrying the result fields
fn unwrap_items(list: &[Value]) -> Vec<&Value> {
    list.iter()
        .filter_map(|item| {
            let Some(obj) = item.as_object() else {
                ::log::warn!("Skipping non-object item in a result list");
                return None;
            };
            let unwrapped = unwrap_item(obj).or_else(|| is_flat_record(obj).then_some(item));
            if unwrapped.is_none() {
                ::log::warn!(
                    "Could not extract usable data from item. Keys: {:?}",
                    obj.keys().collect::<Vec<_>>()
                );
            }
            unwrapped
        })
        .collect()
}

/// `{type: t, t: {..}}` or `{type: t, t_result: {..}}`
fn unwrap_item(obj: &Map<String, Value>) -> Option<&Value> {
    let item_type = obj.get("type").and_then(Value::as_str)?;
    [item_type.to_string(), format!("{}_result", item_type)]
        .iter()
        .find_map(|key| obj.get(key.as_str()).filter(|v| v.is_object()))
}

fn is_flat_record(obj: &Map<String, Value>) -> bool {
    obj.contains_key("title") && obj.contains_key("url")
}

fn log_structure(payload: &Value) {
    match payload.as_object() {
        Some(obj) => {
            ::log::info!(
                "No results found. Top-level keys: {:?}",
                obj.keys().collect::<Vec<_>>()
            );
            match obj.get("mixed") {
                Some(Value::Object(mixed)) => ::log::info!(
                    "  'mixed' is an object with keys: {:?}",
                    mixed.keys().collect::<Vec<_>>()
                ),
                Some(Value::Array(mixed)) => {
                    ::log::info!("  'mixed' is a list of length {}", mixed.len())
                }
                _ => {}
            }
        }
        None => ::log::info!("No results found. Payload is not an object"),
    }
}
