//! Per-platform payload rendering with length enforcement.
//!
//! Every platform follows the same shape: an inner builder renders the part of
//! the payload that counts against the platform budget for a given body text,
//! [`fit_to_limit`] measures it and trims the body once if it is too long, and
//! the platform encoder wraps the result in its envelope fields.
//!
//! | Platform  | Measured part                  | Limit |
//! |-----------|--------------------------------|-------|
//! | APNS      | whole message                  | 4096  |
//! | APNS VoIP | whole message                  | 5120  |
//! | FCM       | `data` + `notification`        | 4096  |
//! | GCM       | `data`                         | 4096  |
//! | ADM       | `data` after `_json` demotion  | 6144  |

use serde_json::{json, Map, Value};

use super::error::{MessageError, MessageResult};
use super::merge::{deep_merge, merge_into};
use super::{Message, Platform};

const ELLIPSIS: &str = "...";

/// Render the encoded payload of one platform
pub fn encode(message: &Message, platform: Platform) -> MessageResult<String> {
    match platform {
        Platform::Adm => encode_adm(message),
        Platform::Apns | Platform::ApnsVoip => encode_apns(message, platform),
        Platform::Fcm => encode_fcm(message),
        Platform::Gcm => encode_gcm(message),
    }
}

/// Render with the message text and, if too long, once more with trimmed text
///
/// Only a single retry is made. The trim is computed from raw byte counts, so
/// JSON escaping in the body can leave the retried payload over the limit, in
/// which case it is reported as too long.
fn fit_to_limit<F>(message: &Message, platform: Platform, build: F) -> MessageResult<Value>
where
    F: Fn(Option<&str>) -> Value,
{
    let limit = platform.max_length();
    let text = message.text();

    let payload = build(text);
    let json = payload.to_string();
    if json.len() <= limit {
        return Ok(payload);
    }

    let overflow = json.len() - limit;
    let text = match text {
        Some(text) if message.allow_trimming() && text.len() > overflow => text,
        _ => return Err(too_long(platform, limit, json)),
    };

    let cut = floor_char_boundary(text, (text.len() - overflow).saturating_sub(ELLIPSIS.len()));
    let trimmed = format!("{}{}", &text[..cut], ELLIPSIS);

    let payload = build(Some(&trimmed));
    let json = payload.to_string();
    if json.len() > limit {
        return Err(too_long(platform, limit, json));
    }
    Ok(payload)
}

fn too_long(platform: Platform, limit: usize, payload: String) -> MessageError {
    MessageError::TooLong {
        platform,
        length: payload.len(),
        limit,
        payload,
    }
}

/// Largest index `<= index` that does not split a UTF-8 sequence
fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut index = index;
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn encode_apns(message: &Message, platform: Platform) -> MessageResult<String> {
    let payload = fit_to_limit(message, platform, |text| apns_payload(message, text))?;
    Ok(payload.to_string())
}

fn apns_payload(message: &Message, text: Option<&str>) -> Value {
    let mut aps = Map::new();

    if let Some(alert) = apns_alert(message, text) {
        aps.insert("alert".into(), alert);
    }
    if let Some(category) = message.category() {
        aps.insert("category".into(), json!(category));
    }
    if message.is_content_available() {
        aps.insert("content-available".into(), json!(1));
    }
    if let Some(badge) = message.badge() {
        aps.insert("badge".into(), json!(badge));
    }
    if let Some(sound) = message.apns_sound() {
        aps.insert("sound".into(), sound.to_value());
    } else if let Some(sound) = message.sound() {
        aps.insert("sound".into(), json!(sound));
    }
    if let Some(thread_id) = message.thread_id() {
        aps.insert("thread-id".into(), json!(thread_id));
    }
    if message.is_mutable_content() {
        aps.insert("mutable-content".into(), json!(1));
    }

    let mut base = Map::new();
    base.insert("aps".into(), Value::Object(aps));

    let mut merged = deep_merge(
        [&base, message.custom()]
            .into_iter()
            .chain(message.apns_data()),
    );

    // aps must stay an object even when an override emptied it
    let empty_aps = match merged.get("aps") {
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(fields)) => fields.is_empty(),
        _ => false,
    };
    if empty_aps {
        merged.insert("aps".into(), Value::Object(Map::new()));
    }

    Value::Object(merged)
}

/// Plain string when only the body is set, structured otherwise
fn apns_alert(message: &Message, text: Option<&str>) -> Option<Value> {
    let mut alert = Map::new();

    if let Some(key) = message.localized_key() {
        alert.insert("loc-key".into(), json!(key));
        insert_arguments(&mut alert, "loc-args", message.localized_arguments());
    } else if let Some(text) = text {
        alert.insert("body".into(), json!(text));
    }

    if let Some(key) = message.title_localized_key() {
        alert.insert("title-loc-key".into(), json!(key));
        insert_arguments(
            &mut alert,
            "title-loc-args",
            message.title_localized_arguments(),
        );
    } else if let Some(title) = message.title() {
        alert.insert("title".into(), json!(title));
    }

    if let Some(key) = message.subtitle_localized_key() {
        alert.insert("subtitle-loc-key".into(), json!(key));
        insert_arguments(
            &mut alert,
            "subtitle-loc-args",
            message.subtitle_localized_arguments(),
        );
    } else if let Some(subtitle) = message.subtitle() {
        alert.insert("subtitle".into(), json!(subtitle));
    }

    match alert.len() {
        0 => None,
        1 if alert.contains_key("body") => alert.remove("body"),
        _ => Some(Value::Object(alert)),
    }
}

fn insert_arguments(target: &mut Map<String, Value>, key: &str, arguments: Option<&[String]>) {
    if let Some(arguments) = arguments.filter(|arguments| !arguments.is_empty()) {
        target.insert(key.into(), json!(arguments));
    }
}

/// Base `data` fields shared by ADM and GCM
fn android_payload(message: &Message, text: Option<&str>) -> Map<String, Value> {
    let mut data = Map::new();

    if let Some(key) = message.localized_key() {
        data.insert("message-loc-key".into(), json!(key));
        insert_arguments(&mut data, "message-loc-args", message.localized_arguments());
    } else if let Some(text) = text {
        data.insert("message".into(), json!(text));
    }

    if let Some(key) = message.title_localized_key() {
        data.insert("title-loc-key".into(), json!(key));
        insert_arguments(&mut data, "title-loc-args", message.title_localized_arguments());
    } else if let Some(title) = message.title() {
        data.insert("title".into(), json!(title));
    }

    if let Some(key) = message.subtitle_localized_key() {
        data.insert("subtitle-loc-key".into(), json!(key));
        insert_arguments(
            &mut data,
            "subtitle-loc-args",
            message.subtitle_localized_arguments(),
        );
    } else if let Some(subtitle) = message.subtitle() {
        data.insert("subtitle".into(), json!(subtitle));
    }

    if let Some(sound) = message.sound() {
        data.insert("sound".into(), json!(sound));
    }

    data
}

fn encode_adm(message: &Message) -> MessageResult<String> {
    // Measured after demotion, which grows every non-string value
    let data = fit_to_limit(message, Platform::Adm, |text| {
        let base = android_payload(message, text);
        Value::Object(stringify_values(deep_merge(
            [&base, message.custom()].into_iter().chain(message.adm_data()),
        )))
    })?;

    let mut adm = Map::new();
    adm.insert("data".into(), data);
    adm.insert("expiresAfter".into(), json!(message.ttl()));
    if message.collapse_key().is_collapsible() {
        adm.insert(
            "consolidationKey".into(),
            json!(message.collapse_key().as_str()),
        );
    }

    Ok(Value::Object(adm).to_string())
}

/// ADM only accepts string values: anything else moves to `<key>_json`
fn stringify_values(data: Map<String, Value>) -> Map<String, Value> {
    let mut strings = Map::new();
    let mut encoded = Map::new();

    for (key, value) in data {
        match value {
            Value::String(_) => {
                strings.insert(key, value);
            }
            other => {
                encoded.insert(format!("{key}_json"), Value::String(other.to_string()));
            }
        }
    }

    strings.extend(encoded);
    strings
}

fn encode_gcm(message: &Message) -> MessageResult<String> {
    let data = fit_to_limit(message, Platform::Gcm, |text| {
        let base = android_payload(message, text);
        Value::Object(deep_merge(
            [&base, message.custom()].into_iter().chain(message.gcm_data()),
        ))
    })?;

    let mut gcm = google_envelope(message);
    gcm.insert("data".into(), data);

    Ok(Value::Object(gcm).to_string())
}

fn encode_fcm(message: &Message) -> MessageResult<String> {
    let fragment = fit_to_limit(message, Platform::Fcm, |text| fcm_payload(message, text))?;

    let mut fcm = google_envelope(message);
    if let Value::Object(fragment) = &fragment {
        merge_into(&mut fcm, fragment);
    }
    if let Some(top_level) = message.fcm_top_level_data() {
        merge_into(&mut fcm, top_level);
    }

    Ok(Value::Object(fcm).to_string())
}

fn fcm_payload(message: &Message, text: Option<&str>) -> Value {
    let mut notification = Map::new();

    if let Some(key) = message.localized_key() {
        notification.insert("body_loc_key".into(), json!(key));
        insert_arguments(&mut notification, "body_loc_args", message.localized_arguments());
    } else if let Some(text) = text {
        notification.insert("body".into(), json!(text));
    }

    if let Some(key) = message.title_localized_key() {
        notification.insert("title_loc_key".into(), json!(key));
        insert_arguments(
            &mut notification,
            "title_loc_args",
            message.title_localized_arguments(),
        );
    } else if let Some(title) = message.title() {
        notification.insert("title".into(), json!(title));
    }

    if let Some(sound) = message.sound() {
        notification.insert("sound".into(), json!(sound));
    }
    if let Some(category) = message.category() {
        notification.insert("android_channel_id".into(), json!(category));
    }

    let data = deep_merge([message.custom()].into_iter().chain(message.fcm_data()));

    let mut fragment = Map::new();
    if !data.is_empty() || notification.is_empty() {
        fragment.insert("data".into(), Value::Object(data));
    }
    if !notification.is_empty() {
        fragment.insert("notification".into(), Value::Object(notification));
    }

    Value::Object(fragment)
}

/// Delivery options FCM and GCM carry beside the payload
fn google_envelope(message: &Message) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(
        "collapse_key".into(),
        json!(message.collapse_key().as_str()),
    );
    fields.insert("time_to_live".into(), json!(message.ttl()));
    fields.insert("delay_while_idle".into(), json!(message.delay_while_idle()));
    fields.insert("priority".into(), json!(message.priority().as_str()));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{APNS_MAX_LENGTH, GCM_MAX_LENGTH};

    #[test]
    fn test_floor_char_boundary() {
        let text = "añb";
        assert_eq!(floor_char_boundary(text, 0), 0);
        assert_eq!(floor_char_boundary(text, 1), 1);
        assert_eq!(floor_char_boundary(text, 2), 1);
        assert_eq!(floor_char_boundary(text, 3), 3);
        assert_eq!(floor_char_boundary(text, 10), 4);
    }

    #[test]
    fn test_stringify_values_moves_non_strings_last() {
        let data = json!({"count": 3, "message": "hi", "extra": {"a": 1}, "note": "x"});
        let Value::Object(data) = data else {
            unreachable!()
        };

        let result = stringify_values(data);
        let keys: Vec<_> = result.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["message", "note", "count_json", "extra_json"]);
        assert_eq!(result["count_json"], json!("3"));
        assert_eq!(result["extra_json"], json!(r#"{"a":1}"#));
    }

    #[test]
    fn test_alert_is_plain_string_for_text_only() {
        let message = Message::new("hello");
        assert_eq!(apns_alert(&message, message.text()), Some(json!("hello")));
    }

    #[test]
    fn test_alert_structured_with_title() {
        let mut message = Message::new("hello");
        message.set_title("Greeting");

        assert_eq!(
            apns_alert(&message, message.text()),
            Some(json!({"body": "hello", "title": "Greeting"}))
        );
    }

    #[test]
    fn test_alert_absent_without_display_fields() {
        let message = Message::default();
        assert_eq!(apns_alert(&message, None), None);
    }

    #[test]
    fn test_fit_retries_once_with_trimmed_text() {
        let mut message = Message::new("x".repeat(5000));
        message.set_platforms([Platform::Gcm]);

        let payload = fit_to_limit(&message, Platform::Gcm, |text| {
            json!({ "message": text })
        })
        .unwrap();

        let encoded = payload.to_string();
        assert_eq!(encoded.len(), GCM_MAX_LENGTH);
        assert!(payload["message"].as_str().unwrap().ends_with("..."));
    }

    #[test]
    fn test_fit_fails_when_text_too_short_to_cut() {
        let mut message = Message::new("short");
        message.set_platforms([Platform::Gcm]);

        let padding = "p".repeat(5000);
        let err = fit_to_limit(&message, Platform::Gcm, |text| {
            json!({ "message": text, "padding": padding })
        })
        .unwrap_err();

        match err {
            MessageError::TooLong {
                platform,
                length,
                limit,
                payload,
            } => {
                assert_eq!(platform, Platform::Gcm);
                assert_eq!(limit, 4096);
                assert_eq!(length, payload.len());
                assert!(payload.contains("short"));
            }
        }
    }

    #[test]
    fn test_fit_reports_second_attempt_overflow() {
        // The localized key replaces the body, so trimming the text cannot shrink the payload
        let mut message = Message::new("x".repeat(6000));
        message.set_localized_key("greet");
        message.set_custom(json!({"data": "p".repeat(5000)}).as_object().cloned().unwrap());

        let err = fit_to_limit(&message, Platform::Apns, |text| apns_payload(&message, text))
            .unwrap_err();
        let MessageError::TooLong { platform, length, .. } = err;
        assert_eq!(platform, Platform::Apns);
        assert!(length > APNS_MAX_LENGTH);
    }
}
