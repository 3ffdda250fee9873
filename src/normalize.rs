//! Reshapes extraction API payloads into the bounded form the UI renders.
//!
//! Field presence follows the upstream's loose conventions: a key that is
//! missing, `null`, `false`, `0` or `""` counts as absent.

use serde_json::{Map, Value, json};

use crate::models::UpstreamResult;
use crate::platform::{Platform, SUPPORTED, detect_platform};

/// Upstream error text that is not treated as a video failure.
// Exact string match on upstream wording; breaks if the API rephrases it.
pub const SENTINEL_ERROR: &str = "URL parameter is required";

pub const MAX_FORMATS: usize = 10;

// Assumed clip length for size estimates
const ESTIMATE_SECONDS: f64 = 180.0;

/// One downloadable variant, kept as the raw upstream object so fields of
/// unexpected types pass through untouched.
pub type FormatDescriptor = Map<String, Value>;

// Stand-in entry when the upstream only gave a direct link
fn best_available(url: String) -> Value {
    json!({
        "quality": "Best Available",
        "url": url,
        "container": "MP4",
        "hasAudio": true,
    })
}

/// Fill `quality` from `resolution` and `fileSize` from `bitrate` when they
/// are missing. Every other key is left as the upstream sent it.
pub fn enrich_format(format: &mut FormatDescriptor) {
    if !format.get("quality").is_some_and(truthy) {
        if let Some(resolution) = format.get("resolution").filter(|r| truthy(r)).cloned() {
            format.insert("quality".to_string(), resolution);
        }
    }

    if !format.get("fileSize").is_some_and(truthy) {
        let size = format
            .get("bitrate")
            .filter(|b| truthy(b))
            .map(|b| estimate_from_value(b).map_or(Value::Null, Value::String));
        if let Some(size) = size {
            format.insert("fileSize".to_string(), size);
        }
    }
}

// Strings use their leading integer, numbers are truncated, anything else has no estimate
fn estimate_from_value(bitrate: &Value) -> Option<String> {
    match bitrate {
        Value::String(text) => estimate_file_size(text),
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .map(|f| format_size(f.trunc())),
        _ => None,
    }
}

/// What the download handler sends back under `data`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The upstream answered but could not process the video.
    Business(Value),
    Ready(UpstreamResult),
}

impl Outcome {
    pub fn into_data(self) -> Value {
        match self {
            Outcome::Business(data) => data,
            Outcome::Ready(map) => Value::Object(map),
        }
    }
}

/// Route an upstream payload to either the business-error shape or the
/// normalized display shape.
pub fn shape(url: &str, payload: UpstreamResult) -> Outcome {
    let platform = detect_platform(url);

    let business_error = payload
        .get("error")
        .filter(|e| truthy(e) && e.as_str() != Some(SENTINEL_ERROR))
        .cloned();

    if let Some(error) = business_error {
        let supported = payload
            .get("supported_platforms")
            .filter(|v| truthy(v))
            .cloned()
            .unwrap_or_else(|| json!(SUPPORTED));
        return Outcome::Business(json!({
            "error": error,
            "platform": platform,
            "supported_platforms": supported,
        }));
    }

    Outcome::Ready(normalize_response(payload, platform))
}

pub fn normalize_response(mut payload: UpstreamResult, platform: Platform) -> UpstreamResult {
    payload.insert("platform".to_string(), Value::from(platform.label()));

    if !payload.get("formats").is_some_and(truthy) {
        let direct = match payload.get("direct_url") {
            Some(Value::String(link)) if !link.is_empty() => Some(link.clone()),
            _ => None,
        };
        if let Some(link) = direct {
            payload.insert("formats".to_string(), Value::Array(vec![best_available(link)]));
        }
    }

    if let Some(Value::Array(formats)) = payload.get_mut("formats") {
        formats.truncate(MAX_FORMATS);
        // entries that are not objects are left alone
        for format in formats.iter_mut().filter_map(Value::as_object_mut) {
            enrich_format(format);
        }
    }

    payload
}

/// Rough size of a 180 second clip at `bitrate` ("128kbps" style, unit
/// ignored). `None` when there is no leading integer.
pub fn estimate_file_size(bitrate: &str) -> Option<String> {
    leading_integer(bitrate).map(|kbps| format_size(kbps as f64))
}

fn format_size(kbps: f64) -> String {
    let size_mb = (kbps * ESTIMATE_SECONDS) / (8.0 * 1024.0);
    if size_mb > 1000.0 {
        let size_gb = (size_mb / 1024.0 * 10.0).round() / 10.0;
        format!("{size_gb:.1} GB")
    } else {
        format!("{} MB", size_mb.round() as i64)
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(value: Value) -> UpstreamResult {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn estimates_megabytes() {
        // 128 * 180 / 8192 = 2.81
        assert_eq!(estimate_file_size("128kbps").as_deref(), Some("3 MB"));
        assert_eq!(estimate_file_size(" 320 kbps").as_deref(), Some("7 MB"));
        assert_eq!(estimate_file_size("5000").as_deref(), Some("110 MB"));
    }

    #[test]
    fn switches_to_gigabytes_above_1000_mb() {
        // 50000 * 180 / 8192 = 1098.6 MB = 1.07 GB
        assert_eq!(estimate_file_size("50000kbps").as_deref(), Some("1.1 GB"));
    }

    #[test]
    fn thousand_megabytes_is_the_last_mb_value() {
        // 45511 * 180 / 8192 = 999.997, 45512 * 180 / 8192 = 1000.02
        assert_eq!(estimate_file_size("45511").as_deref(), Some("1000 MB"));
        assert_eq!(estimate_file_size("45512").as_deref(), Some("1.0 GB"));
    }

    #[test]
    fn no_estimate_without_leading_number() {
        assert_eq!(estimate_file_size("abc"), None);
        assert_eq!(estimate_file_size(""), None);
        assert_eq!(estimate_file_size("kbps128"), None);
    }

    #[test]
    fn numeric_bitrate_is_estimated() {
        assert_eq!(estimate_from_value(&json!(5000.9)).as_deref(), Some("110 MB"));
        assert_eq!(estimate_from_value(&json!(true)), None);
    }

    #[test]
    fn platform_overrides_upstream_value() {
        let out = normalize_response(
            payload(json!({"platform": "whatever", "title": "clip"})),
            Platform::TikTok,
        );
        assert_eq!(out["platform"], "TikTok");
        assert_eq!(out["title"], "clip");
        assert!(out.get("formats").is_none());
    }

    #[test]
    fn synthesizes_format_from_direct_url() {
        let out = normalize_response(
            payload(json!({"direct_url": "https://cdn.example/v.mp4"})),
            Platform::YouTube,
        );
        let formats = out["formats"].as_array().unwrap();
        assert_eq!(formats.len(), 1);
        assert_eq!(
            formats[0],
            json!({
                "quality": "Best Available",
                "url": "https://cdn.example/v.mp4",
                "container": "MP4",
                "hasAudio": true,
            })
        );
    }

    #[test]
    fn truncates_to_first_ten_formats_in_order() {
        let formats: Vec<Value> = (0..15)
            .map(|i| json!({"quality": format!("q{i}"), "url": format!("u{i}")}))
            .collect();
        let out = normalize_response(payload(json!({"formats": formats})), Platform::Unknown);

        let kept = out["formats"].as_array().unwrap();
        assert_eq!(kept.len(), 10);
        for (i, format) in kept.iter().enumerate() {
            assert_eq!(format["quality"], format!("q{i}"));
        }
    }

    #[test]
    fn enriches_quality_and_file_size() {
        let out = normalize_response(
            payload(json!({
                "formats": [
                    {"resolution": "720p", "bitrate": "128kbps", "url": "a", "codec": "h264"},
                    {"quality": "hd", "resolution": "1080p", "fileSize": "12 MB", "bitrate": "999"},
                    {"quality": "", "resolution": "480p"},
                    "not-an-object"
                ]
            })),
            Platform::YouTube,
        );
        let formats = out["formats"].as_array().unwrap();

        assert_eq!(formats[0]["quality"], "720p");
        assert_eq!(formats[0]["fileSize"], "3 MB");
        assert_eq!(formats[0]["codec"], "h264");

        assert_eq!(formats[1]["quality"], "hd");
        assert_eq!(formats[1]["fileSize"], "12 MB");

        assert_eq!(formats[2]["quality"], "480p");
        assert_eq!(formats[3], "not-an-object");
    }

    #[test]
    fn odd_sibling_types_do_not_block_enrichment() {
        let out = normalize_response(
            payload(json!({
                "formats": [
                    {"resolution": "720p", "bitrate": "128kbps", "hasAudio": 1},
                    {"resolution": "480p", "bitrate": "320kbps", "url": 7},
                    {"resolution": "360p", "bitrate": true},
                ]
            })),
            Platform::YouTube,
        );
        let formats = out["formats"].as_array().unwrap();

        assert_eq!(formats[0]["quality"], "720p");
        assert_eq!(formats[0]["fileSize"], "3 MB");
        assert_eq!(formats[0]["hasAudio"], 1);

        assert_eq!(formats[1]["quality"], "480p");
        assert_eq!(formats[1]["fileSize"], "7 MB");
        assert_eq!(formats[1]["url"], 7);

        assert_eq!(formats[2]["quality"], "360p");
        assert_eq!(formats[2].get("fileSize"), Some(&Value::Null));
    }

    #[test]
    fn null_keys_survive_and_unparsable_bitrate_sets_null_size() {
        let out = normalize_response(
            payload(json!({
                "formats": [
                    {"quality": null, "url": null, "fileSize": null, "container": "webm"},
                    {"quality": "hd", "bitrate": "abc"},
                ]
            })),
            Platform::Unknown,
        );
        let formats = out["formats"].as_array().unwrap();

        assert_eq!(
            formats[0],
            json!({"quality": null, "url": null, "fileSize": null, "container": "webm"})
        );
        assert_eq!(formats[1], json!({"quality": "hd", "bitrate": "abc", "fileSize": null}));
    }

    #[test]
    fn business_error_keeps_success_shape() {
        let outcome = shape(
            "https://youtu.be/x",
            payload(json!({"error": "Video unavailable"})),
        );
        assert_eq!(
            outcome.into_data(),
            json!({
                "error": "Video unavailable",
                "platform": "YouTube",
                "supported_platforms": ["YouTube", "TikTok", "Instagram", "Facebook", "X.com"],
            })
        );
    }

    #[test]
    fn business_error_passes_upstream_platform_list() {
        let outcome = shape(
            "https://example.com/v",
            payload(json!({"error": "nope", "supported_platforms": ["Vimeo"]})),
        );
        let data = outcome.into_data();
        assert_eq!(data["supported_platforms"], json!(["Vimeo"]));
        assert_eq!(data["platform"], "Unknown");
    }

    #[test]
    fn sentinel_error_is_normalized_instead() {
        let outcome = shape(
            "https://x.com/u/status/1",
            payload(json!({"error": SENTINEL_ERROR, "direct_url": "https://cdn/v.mp4"})),
        );
        let Outcome::Ready(data) = outcome else {
            panic!("sentinel should not be routed as a business error");
        };
        assert_eq!(data["platform"], "X.com");
        assert_eq!(data["formats"].as_array().unwrap().len(), 1);
    }
}
