//! Disorder result types.
//!
//! Maps the classifier's numeric label to a named sleep-disorder category
//! with a display colour and guidance text.

use serde::{Deserialize, Serialize};

/// Raw class code emitted by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionLabel(pub f64);

impl PredictionLabel {
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn disorder(self) -> Disorder {
        Disorder::from_label(self)
    }
}

impl std::fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Sleep-disorder category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disorder {
    Insomnia,
    #[serde(rename = "No Disorder")]
    NoDisorder,
    #[serde(rename = "Sleep Apnea")]
    SleepApnea,
    /// Label outside the known class set.
    Unknown,
}

impl Disorder {
    /// Lookup used by the classifier's class codes. Total: any other value,
    /// NaN included, is [`Disorder::Unknown`].
    #[must_use]
    pub fn from_label(label: PredictionLabel) -> Self {
        let v = label.value();
        if v == 0.0 {
            Self::Insomnia
        } else if v == 1.0 {
            Self::NoDisorder
        } else if v == 2.0 {
            Self::SleepApnea
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Insomnia => "Insomnia",
            Self::NoDisorder => "No Disorder",
            Self::SleepApnea => "Sleep Apnea",
            Self::Unknown => "Unknown",
        }
    }

    #[must_use]
    pub fn color(&self) -> SeverityColor {
        match self {
            Self::Insomnia => SeverityColor::Red,
            Self::NoDisorder => SeverityColor::Green,
            Self::SleepApnea => SeverityColor::Orange,
            Self::Unknown => SeverityColor::Gray,
        }
    }

    #[must_use]
    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            Self::Insomnia => &[
                "Maintain a consistent sleep schedule",
                "Create a relaxing bedtime routine",
                "Avoid screens before bedtime",
                "Consider consulting a sleep specialist",
            ],
            Self::SleepApnea => &[
                "Sleep on your side instead of your back",
                "Maintain a healthy weight",
                "Consider using a CPAP machine",
                "Consult a healthcare provider for proper diagnosis",
            ],
            Self::NoDisorder => &[
                "Continue maintaining good sleep habits",
                "Stay physically active",
                "Monitor sleep quality regularly",
                "Practice stress management",
            ],
            Self::Unknown => &[],
        }
    }
}

impl std::fmt::Display for Disorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Display hint attached to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityColor {
    Red,
    Green,
    Orange,
    Gray,
}

impl SeverityColor {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Orange => "orange",
            Self::Gray => "gray",
        }
    }

    /// CSS named-colour value (RGB).
    #[must_use]
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Self::Red => (255, 0, 0),
            Self::Green => (0, 128, 0),
            Self::Orange => (255, 165, 0),
            Self::Gray => (128, 128, 128),
        }
    }
}

impl std::fmt::Display for SeverityColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Human-readable outcome of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisorderResult {
    #[serde(rename = "name")]
    pub disorder: Disorder,
    pub color: SeverityColor,
    pub recommendations: Vec<String>,
}

impl DisorderResult {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.disorder.name()
    }
}

/// Map a classifier label to its result. Never fails.
#[must_use]
pub fn map_result(label: PredictionLabel) -> DisorderResult {
    let disorder = label.disorder();
    DisorderResult {
        disorder,
        color: disorder.color(),
        recommendations: disorder
            .recommendations()
            .iter()
            .map(|r| (*r).to_string())
            .collect(),
    }
}

/// Terminal output of one analysis request.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    /// Random request identifier, for correlating logs.
    pub id: String,

    /// Label as produced by the classifier
    pub label: PredictionLabel,

    pub result: DisorderResult,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Assessment {
    #[must_use]
    pub fn new(label: PredictionLabel) -> Self {
        Self {
            id: request_id(),
            label,
            result: map_result(label),
            created_at: chrono::Utc::now(),
        }
    }
}

/// Random UUID v4 string from a ChaCha20 CSPRNG seeded by the OS.
fn request_id() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let mut bytes: [u8; 16] = rng.gen();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        let r = map_result(PredictionLabel(0.0));
        assert_eq!(r.name(), "Insomnia");
        assert_eq!(r.color, SeverityColor::Red);

        let r = map_result(PredictionLabel(2.0));
        assert_eq!(r.name(), "Sleep Apnea");
        assert_eq!(r.color, SeverityColor::Orange);
        assert_eq!(r.recommendations[2], "Consider using a CPAP machine");
    }

    #[test]
    fn test_no_disorder_result() {
        let r = map_result(PredictionLabel(1.0));
        assert_eq!(r.disorder, Disorder::NoDisorder);
        assert_eq!(r.color, SeverityColor::Green);
        assert_eq!(
            r.recommendations,
            vec![
                "Continue maintaining good sleep habits",
                "Stay physically active",
                "Monitor sleep quality regularly",
                "Practice stress management",
            ]
        );
    }

    #[test]
    fn test_mapping_is_total() {
        for v in [-1.0, 0.5, 3.0, 1e9, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let r = map_result(PredictionLabel(v));
            assert_eq!(r.disorder, Disorder::Unknown);
            assert_eq!(r.color, SeverityColor::Gray);
            assert!(r.recommendations.is_empty());
        }
        // Negative zero compares equal to zero.
        assert_eq!(map_result(PredictionLabel(-0.0)).disorder, Disorder::Insomnia);
    }

    #[test]
    fn test_result_serializes_display_names() {
        let json = serde_json::to_value(map_result(PredictionLabel(2.0))).expect("serialize");
        assert_eq!(json["name"], "Sleep Apnea");
        assert_eq!(json["color"], "orange");
        assert_eq!(json["recommendations"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn test_assessment_ids_are_unique_uuids() {
        let a = Assessment::new(PredictionLabel(1.0));
        let b = Assessment::new(PredictionLabel(1.0));
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 36);
        assert_eq!(a.id.as_bytes()[14], b'4');
        assert_eq!(a.result.name(), "No Disorder");
    }
}
