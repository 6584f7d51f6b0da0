//! Recording metadata parsed from the recordings endpoint

use serde_json::Value;

use crate::error::ListError;

const NAME_MAX: usize = 255;

/// Longest saved name, leaving room for the `.part` suffix used while downloading
pub const FILE_NAME_MAX: usize = NAME_MAX - ".part".len();

const MAX_EXTENSION_LEN: usize = 8;
const MAX_SUFFIX_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub id: String,
    pub download_url: String,
    pub file_name: Option<String>,
    pub start_time: Option<String>,
    pub engagement_id: Option<String>,
    pub channel_type: Option<String>,
    /// Entry exactly as the API sent it
    pub raw: Value,
}

impl Recording {
    /// `index` is the entry's position within its page
    pub fn from_entry(index: usize, entry: &Value) -> Result<Self, ListError> {
        let id = text(entry, "recording_id")
            .or_else(|| text(entry, "id"))
            .ok_or(ListError::MissingField { index, field: "recording_id" })?;
        let download_url = text(entry, "download_url")
            .ok_or(ListError::MissingField { index, field: "download_url" })?;

        Ok(Self {
            id,
            download_url,
            file_name: text(entry, "file_name"),
            start_time: text(entry, "recording_start_time"),
            engagement_id: text(entry, "engagement_id"),
            channel_type: text(entry, "channel_type"),
            raw: entry.clone(),
        })
    }

    pub fn extension(&self) -> &'static str {
        match self.channel_type.as_deref() {
            None | Some("voice") => "mp3",
            Some(_) => "mp4",
        }
    }

    /// Name of the file this recording is saved as
    pub fn file_name(&self) -> String {
        if let Some(name) = self.file_name.as_deref() {
            let name = sanitize_file_name(name);
            if !name.is_empty() {
                return name;
            }
        }

        let stem = match (&self.start_time, &self.engagement_id) {
            (Some(start), Some(engagement)) => format!("{start}_{engagement}_{}", self.id),
            _ => self.id.clone(),
        };
        let stem = clean(&stem);
        // id made only of separators
        let stem = if stem.is_empty() { "recording" } else { stem.as_str() };
        join_stem(stem, "", self.extension())
    }
}

fn text(entry: &Value, key: &str) -> Option<String> {
    // some IDs come back numeric
    let value = match &entry[key] {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!value.is_empty()).then_some(value)
}

/// Make an API-provided name safe to use as a single path component.
///
/// The result fits in [`FILE_NAME_MAX`] bytes. A trailing extension survives
/// truncation; the stem is shortened instead.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned = clean(name);
    match split_extension(&cleaned) {
        Some((stem, ext)) => join_stem(stem, "", ext),
        None => truncate(&cleaned, FILE_NAME_MAX).to_string(),
    }
}

/// Insert `_{suffix}` before the extension of an already sanitized name,
/// shortening the stem so the suffix and extension both survive
pub fn with_suffix(name: &str, suffix: &str) -> String {
    let suffix = truncate(&clean(suffix), MAX_SUFFIX_LEN).to_string();
    let (stem, ext) = split_extension(name).unwrap_or((name, ""));
    let suffix = if suffix.is_empty() { String::new() } else { format!("_{suffix}") };
    join_stem(stem, &suffix, ext)
}

fn split_extension(name: &str) -> Option<(&str, &str)> {
    name.rsplit_once('.')
        .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty() && ext.len() <= MAX_EXTENSION_LEN)
}

fn join_stem(stem: &str, suffix: &str, ext: &str) -> String {
    let ext_len = if ext.is_empty() { 0 } else { ext.len() + 1 };
    let stem = truncate(stem, FILE_NAME_MAX - suffix.len() - ext_len);
    if ext.is_empty() {
        format!("{stem}{suffix}")
    } else {
        format!("{stem}{suffix}.{ext}")
    }
}

fn clean(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let c = if c == '/' || c == '\\' || c.is_control() || c.is_whitespace() {
            '_'
        } else {
            c
        };
        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }

    out.trim_matches(|c| c == '.' || c == '_').to_string()
}

fn truncate(s: &str, max: usize) -> &str {
    let mut take = s.len().min(max);
    while !s.is_char_boundary(take) {
        take -= 1;
    }
    &s[..take]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_zoom_entry() {
        let entry = json!({
            "recording_id": "e4b1",
            "engagement_id": "eng9",
            "channel_type": "voice",
            "recording_start_time": "2023-09-01T10:15:00Z",
            "download_url": "https://zoom.us/v2/contact_center/recordings/e4b1/download",
            "owner_name": "Front desk"
        });
        let rec = Recording::from_entry(0, &entry).unwrap();
        assert_eq!(rec.id, "e4b1");
        assert_eq!(rec.raw["owner_name"], "Front desk");
        assert_eq!(rec.file_name(), "2023-09-01T10:15:00Z_eng9_e4b1.mp3");
    }

    #[test]
    fn declared_file_name_wins() {
        let entry = json!({"id": "rec1", "download_url": "https://x/y", "file_name": "call1.mp3"});
        let rec = Recording::from_entry(0, &entry).unwrap();
        assert_eq!(rec.id, "rec1");
        assert_eq!(rec.file_name(), "call1.mp3");
    }

    #[test]
    fn falls_back_to_id_and_channel_extension() {
        let entry = json!({"id": 42, "download_url": "https://x/y", "channel_type": "video"});
        let rec = Recording::from_entry(0, &entry).unwrap();
        assert_eq!(rec.file_name(), "42.mp4");
    }

    #[test]
    fn missing_download_url_is_reported() {
        let entry = json!({"recording_id": "abc", "download_url": ""});
        let err = Recording::from_entry(3, &entry).unwrap_err();
        assert!(matches!(
            err,
            ListError::MissingField { index: 3, field: "download_url" }
        ));
    }

    #[test]
    fn missing_id_is_reported() {
        let entry = json!({"download_url": "https://x/y"});
        let err = Recording::from_entry(0, &entry).unwrap_err();
        assert!(matches!(err, ListError::MissingField { field: "recording_id", .. }));
    }

    #[test]
    fn path_separators_cannot_escape_output_dir() {
        let entry = json!({"id": "r", "download_url": "u", "file_name": "../../etc/passwd"});
        let rec = Recording::from_entry(0, &entry).unwrap();
        assert_eq!(rec.file_name(), "etc_passwd");
    }

    #[test]
    fn sanitize_collapses_and_trims() {
        assert_eq!(sanitize_file_name("  call  one\t.mp3 "), "call_one_.mp3");
        assert_eq!(sanitize_file_name("..hidden.."), "hidden");
        assert_eq!(sanitize_file_name("a\0b"), "a_b");
    }

    #[test]
    fn sanitize_caps_length_on_char_boundary() {
        let long = "é".repeat(200);
        let name = sanitize_file_name(&long);
        assert!(name.len() <= FILE_NAME_MAX);
        assert!(name.chars().all(|c| c == 'é'));
    }

    #[test]
    fn long_declared_name_keeps_extension_and_room_for_part_suffix() {
        let declared = format!("{}.mp3", "a".repeat(300));
        let entry = json!({"id": "r", "download_url": "u", "file_name": declared});
        let name = Recording::from_entry(0, &entry).unwrap().file_name();
        assert_eq!(name.len(), FILE_NAME_MAX);
        assert!(name.ends_with(".mp3"));
        assert!(name.len() + ".part".len() <= NAME_MAX);
    }

    #[test]
    fn long_derived_name_keeps_extension() {
        let entry = json!({"id": "r".repeat(300), "download_url": "u"});
        let name = Recording::from_entry(0, &entry).unwrap().file_name();
        assert!(name.ends_with(".mp3"), "{name}");
        assert!(name.len() <= FILE_NAME_MAX);

        let entry = json!({
            "recording_id": "x".repeat(200),
            "engagement_id": "e".repeat(100),
            "recording_start_time": "2023-09-01T10:15:00Z",
            "channel_type": "video",
            "download_url": "u",
        });
        let name = Recording::from_entry(0, &entry).unwrap().file_name();
        assert!(name.starts_with("2023-09-01T10:15:00Z_e"));
        assert!(name.ends_with(".mp4"), "{name}");
        assert!(name.len() <= FILE_NAME_MAX);
    }

    #[test]
    fn suffix_goes_before_extension() {
        assert_eq!(with_suffix("call.mp3", "rec/2"), "call_rec_2.mp3");
        assert_eq!(with_suffix("noext", "b"), "noext_b");

        let long = sanitize_file_name(&format!("{}.mp4", "a".repeat(300)));
        let name = with_suffix(&long, "b");
        assert!(name.ends_with("_b.mp4"), "{name}");
        assert!(name.len() <= FILE_NAME_MAX);
    }

    #[test]
    fn unusable_declared_name_falls_back() {
        let entry = json!({"id": "rec7", "download_url": "u", "file_name": "///"});
        let rec = Recording::from_entry(0, &entry).unwrap();
        assert_eq!(rec.file_name(), "rec7.mp3");
    }
}
