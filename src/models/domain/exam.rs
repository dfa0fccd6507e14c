use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exam catalog entry. Timing and pass threshold drive the attempt timer and the result status.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Exam {
    pub id: String,
    pub title: String,
    pub duration_minutes: u32,
    pub pass_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Exam {
    pub fn new(id: &str, title: &str, duration_minutes: u32, pass_percentage: f64) -> Self {
        Exam {
            id: id.to_string(),
            title: title.to_string(),
            duration_minutes,
            pass_percentage,
            created_at: Some(Utc::now()),
        }
    }

    pub fn duration_seconds(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }
}
