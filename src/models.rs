use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
    #[default]
    #[serde(other)]
    Unknown,
}

impl MediaType {
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
            MediaType::Unknown => "unknown",
        }
    }
}

/// One title split into work / season / episode by the upstream normalizer.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NormalizedTitle {
    #[serde(default)]
    pub raw_title: String,
    pub work_title: String,
    #[serde(rename = "type", default)]
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_title: Option<String>,
}

/// Catalog metadata resolved for a work. Runtime is per movie, or the
/// representative episode runtime for a series.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Metadata {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(rename = "runtime_min", default, deserialize_with = "runtime_from_number")]
    pub runtime_minutes: u64,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// Negative, null or non-finite runtimes count as unknown (0); fractional
/// minutes are truncated.
fn runtime_from_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(n) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(0);
    };
    let minutes = n
        .as_u64()
        .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
        .unwrap_or(0);
    Ok(minutes)
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BuiltItem {
    pub date: String,
    pub normalized: NormalizedTitle,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// The full viewing history for one export, as written by the build step.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct BuiltBatch {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub generated_at: String,
    pub items: Vec<BuiltItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default)]
    pub format: OutputFormat,
    /// Rows shown per leaderboard in the text report.
    #[serde(default = "default_rows")]
    pub rows: usize,
}

fn default_rows() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            rows: default_rows(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_parses_known_values() {
        let n: NormalizedTitle =
            serde_json::from_str(r#"{"work_title":"Dark","type":"tv"}"#).unwrap();
        assert_eq!(n.media_type, MediaType::Tv);
        assert_eq!(n.work_title, "Dark");
    }

    #[test]
    fn media_type_unrecognised_becomes_unknown() {
        let n: NormalizedTitle =
            serde_json::from_str(r#"{"work_title":"X","type":"special"}"#).unwrap();
        assert_eq!(n.media_type, MediaType::Unknown);
    }

    #[test]
    fn media_type_missing_becomes_unknown() {
        let n: NormalizedTitle = serde_json::from_str(r#"{"work_title":"X"}"#).unwrap();
        assert_eq!(n.media_type, MediaType::Unknown);
    }

    #[test]
    fn metadata_defaults_missing_fields() {
        let m: Metadata = serde_json::from_str(r#"{"genres":["Drama"]}"#).unwrap();
        assert_eq!(m.genres, vec!["Drama".to_string()]);
        assert_eq!(m.runtime_minutes, 0);
        assert_eq!(m.vote_average, 0.0);
        assert!(m.poster_path.is_none());
    }

    #[test]
    fn metadata_reads_runtime_min() {
        let m: Metadata = serde_json::from_str(r#"{"runtime_min":95}"#).unwrap();
        assert_eq!(m.runtime_minutes, 95);
    }

    #[test]
    fn metadata_negative_runtime_is_zero() {
        let m: Metadata =
            serde_json::from_str(r#"{"runtime_min":-5,"genres":["Drama"]}"#).unwrap();
        assert_eq!(m.runtime_minutes, 0);
        assert_eq!(m.genres, vec!["Drama".to_string()]);
    }

    #[test]
    fn metadata_odd_runtimes() {
        let m: Metadata = serde_json::from_str(r#"{"runtime_min":null}"#).unwrap();
        assert_eq!(m.runtime_minutes, 0);
        let m: Metadata = serde_json::from_str(r#"{"runtime_min":42.9}"#).unwrap();
        assert_eq!(m.runtime_minutes, 42);
        let m: Metadata =
            serde_json::from_str(r#"{"runtime_min":18446744073709551615}"#).unwrap();
        assert_eq!(m.runtime_minutes, u64::MAX);
    }

    #[test]
    fn batch_with_negative_runtime_still_parses() {
        let batch: BuiltBatch = serde_json::from_str(
            r#"{"items":[
                {"date":"2023-01-01","normalized":{"work_title":"A","type":"movie"},
                 "metadata":{"runtime_min":-90}},
                {"date":"2023-01-02","normalized":{"work_title":"B","type":"movie"},
                 "metadata":{"runtime_min":100}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(batch.items.len(), 2);
        assert_eq!(batch.items[0].metadata.as_ref().unwrap().runtime_minutes, 0);
        assert_eq!(batch.items[1].metadata.as_ref().unwrap().runtime_minutes, 100);
    }

    #[test]
    fn built_item_without_metadata_is_unresolved() {
        let it: BuiltItem = serde_json::from_str(
            r#"{"date":"2023-01-01","normalized":{"work_title":"A","type":"movie"}}"#,
        )
        .unwrap();
        assert!(it.metadata.is_none());
    }

    #[test]
    fn config_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.format, OutputFormat::Text);
        assert_eq!(cfg.rows, 10);
    }
}
