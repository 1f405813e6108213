use serde::{Deserialize, Serialize};

/// One ranked match produced by the scoring worker and returned to the
/// client verbatim (modulo score clamping).
///
/// The worker's JSON is deserialized against this schema at the parse
/// boundary: `title`, `location` and `match_score` are required, everything
/// else defaults. Consumers must not assume `company` or `matching_skills`
/// are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMatch {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_link: Option<String>,
    /// 0–100. The worker emits two-decimal floats; clamped on ingest.
    pub match_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
}

impl JobMatch {
    /// Skills used for filtering; absent is treated as empty.
    pub fn skills(&self) -> &[String] {
        self.matching_skills.as_deref().unwrap_or(&[])
    }

    /// Coerces the score into the documented [0, 100] range.
    pub fn clamp_score(&mut self) {
        self.match_score = self.match_score.clamp(0.0, 100.0);
    }
}
