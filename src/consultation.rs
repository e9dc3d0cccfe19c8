//! Patient intake values collected by the form.
//!
//! Every field carries its own range and default, so a [`ConsultationRequest`]
//! is always fully populated. Out-of-range numbers are clamped where they enter
//! the program (form parsing, JSON decoding, CLI flags) rather than rejected
//! later on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::LLMError;

/// Symptoms offered by the multi-select, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Symptom {
    Fever,
    Cough,
    Headache,
    Fatigue,
    Nausea,
    SoreThroat,
    Diarrhea,
    Rash,
    MusclePain,
    LossOfSmell,
}

impl Symptom {
    pub const ALL: [Symptom; 10] = [
        Symptom::Fever,
        Symptom::Cough,
        Symptom::Headache,
        Symptom::Fatigue,
        Symptom::Nausea,
        Symptom::SoreThroat,
        Symptom::Diarrhea,
        Symptom::Rash,
        Symptom::MusclePain,
        Symptom::LossOfSmell,
    ];

    /// Text shown to the user and interpolated into the prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Symptom::Fever => "Fever",
            Symptom::Cough => "Cough",
            Symptom::Headache => "Headache",
            Symptom::Fatigue => "Fatigue",
            Symptom::Nausea => "Nausea",
            Symptom::SoreThroat => "Sore Throat",
            Symptom::Diarrhea => "Diarrhea",
            Symptom::Rash => "Rash",
            Symptom::MusclePain => "Muscle Pain",
            Symptom::LossOfSmell => "Loss of Smell",
        }
    }
}

impl fmt::Display for Symptom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parses a symptom from its label, case-insensitively.
///
/// `sore-throat` and `sore_throat` are accepted as well so the CLI can take
/// flag-friendly spellings.
impl FromStr for Symptom {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_'], " ").to_lowercase();
        Symptom::ALL
            .into_iter()
            .find(|symptom| symptom.label().to_lowercase() == wanted)
            .ok_or_else(|| LLMError::InvalidRequest(format!("Unknown symptom: {}", s)))
    }
}

impl TryFrom<String> for Symptom {
    type Error = LLMError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symptom> for String {
    fn from(symptom: Symptom) -> Self {
        symptom.label().to_string()
    }
}

/// Generates a lowercase, closed enumeration with `Display`, `FromStr` and an
/// ordered `ALL` list. The first variant is the default, matching the first
/// option of the corresponding widget.
macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident, $what:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = LLMError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($label => Ok($name::$variant),)+
                    _ => Err(LLMError::InvalidRequest(format!(
                        concat!("Unknown ", $what, ": {}"),
                        s
                    ))),
                }
            }
        }
    };
}

choice_enum!(
    /// Age bracket picked from the select box.
    AgeGroup, "age group", { Child => "child", Young => "young", Adult => "adult", Elderly => "elderly" }
);

choice_enum!(
    /// Gender picked from the radio buttons.
    Gender, "gender", { Male => "male", Female => "female" }
);

choice_enum!(
    /// Coarse blood pressure level. Variants are declared low to high so the
    /// derived ordering matches the select-slider.
    BloodPressure, "blood pressure level", { Low => "low", Normal => "normal", High => "high" }
);

/// Body temperature in Fahrenheit, kept as tenths of a degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Temperature(u16);

impl Temperature {
    pub const MIN: Temperature = Temperature(950);
    pub const MAX: Temperature = Temperature(1100);
    pub const STEP: f64 = 0.1;

    /// Snaps `fahrenheit` to the 0.1 step and clamps it into [95.0, 110.0].
    /// Non-finite input falls back to the default.
    pub fn clamped(fahrenheit: f64) -> Self {
        if !fahrenheit.is_finite() {
            return Self::default();
        }
        let tenths = (fahrenheit * 10.0).round();
        let tenths = tenths.clamp(Self::MIN.0 as f64, Self::MAX.0 as f64);
        Temperature(tenths as u16)
    }

    pub fn tenths(&self) -> u16 {
        self.0
    }

    pub fn fahrenheit(&self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Temperature(986)
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl From<f64> for Temperature {
    fn from(value: f64) -> Self {
        Temperature::clamped(value)
    }
}

impl From<Temperature> for f64 {
    fn from(value: Temperature) -> Self {
        value.fahrenheit()
    }
}

/// Declares a bounded integer field that clamps on construction.
macro_rules! bounded_int {
    ($(#[$meta:meta])* $name:ident, $min:literal, $max:literal, $default:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(from = "i64", into = "u8")]
        pub struct $name(u8);

        impl $name {
            pub const MIN: u8 = $min;
            pub const MAX: u8 = $max;

            pub fn clamped(value: i64) -> Self {
                $name(value.clamp($min, $max) as u8)
            }

            pub fn get(&self) -> u8 {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name($default)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                $name::clamped(value)
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

bounded_int!(
    /// How long the symptoms have lasted, in days.
    DurationDays, 1, 30, 5
);

bounded_int!(
    /// Self-reported severity on a 1 to 5 scale.
    Severity, 1, 5, 3
);

/// One submission of the intake form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsultationRequest {
    #[serde(deserialize_with = "deserialize_symptoms")]
    pub symptoms: Vec<Symptom>,
    pub age_group: AgeGroup,
    pub gender: Gender,
    pub temperature: Temperature,
    pub blood_pressure: BloodPressure,
    pub duration_days: DurationDays,
    pub severity: Severity,
}

fn deserialize_symptoms<'de, D>(deserializer: D) -> Result<Vec<Symptom>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Symptom>::deserialize(deserializer)?;
    Ok(dedup_in_order(raw))
}

fn dedup_in_order(symptoms: impl IntoIterator<Item = Symptom>) -> Vec<Symptom> {
    let mut out: Vec<Symptom> = Vec::new();
    for symptom in symptoms {
        if !out.contains(&symptom) {
            out.push(symptom);
        }
    }
    out
}

impl ConsultationRequest {
    /// Replaces the symptom selection, dropping repeats but keeping order.
    pub fn with_symptoms(mut self, symptoms: impl IntoIterator<Item = Symptom>) -> Self {
        self.symptoms = dedup_in_order(symptoms);
        self
    }

    /// Symptoms joined with `", "`; empty when nothing is selected.
    pub fn symptom_list(&self) -> String {
        self.symptoms
            .iter()
            .map(Symptom::label)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Builds a request from url-encoded form pairs.
    ///
    /// `symptoms` may repeat. Missing keys keep their defaults, numbers are
    /// clamped into range, and unknown enumeration values are rejected.
    pub fn from_form_pairs(pairs: &[(String, String)]) -> Result<Self, LLMError> {
        let (request, errors) = Self::collect_form_pairs(pairs);
        match errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(request),
        }
    }

    /// Like [`ConsultationRequest::from_form_pairs`], but skips values that do
    /// not parse and keeps everything else. Used to re-fill a rejected form.
    pub fn from_form_pairs_lenient(pairs: &[(String, String)]) -> Self {
        Self::collect_form_pairs(pairs).0
    }

    fn collect_form_pairs(pairs: &[(String, String)]) -> (Self, Vec<LLMError>) {
        let mut request = ConsultationRequest::default();
        let mut symptoms = Vec::new();
        let mut errors = Vec::new();

        for (key, value) in pairs {
            let applied = match key.as_str() {
                "symptoms" => value.parse::<Symptom>().map(|s| symptoms.push(s)),
                "age_group" => value.parse::<AgeGroup>().map(|v| request.age_group = v),
                "gender" => value.parse::<Gender>().map(|v| request.gender = v),
                "blood_pressure" => value.parse::<BloodPressure>().map(|v| request.blood_pressure = v),
                "temperature" => parse_number(key, value)
                    .map(|n| request.temperature = Temperature::clamped(n)),
                "duration_days" => parse_number(key, value)
                    .map(|n| request.duration_days = DurationDays::clamped(n.round() as i64)),
                "severity" => parse_number(key, value)
                    .map(|n| request.severity = Severity::clamped(n.round() as i64)),
                _ => {
                    log::trace!("ignoring unknown form field {}", key);
                    Ok(())
                }
            };
            if let Err(e) = applied {
                errors.push(e);
            }
        }

        (request.with_symptoms(symptoms), errors)
    }
}

fn parse_number(key: &str, value: &str) -> Result<f64, LLMError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| LLMError::InvalidRequest(format!("{} must be a number, got {:?}", key, value)))
}

/// Raw text returned by the text-generation service for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub id: Uuid,
    /// Unix timestamp (seconds) when the reply arrived
    pub created: u64,
    pub model: String,
    pub text: String,
}

impl AssistantReply {
    pub fn new(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            model: model.into(),
            text: text.into(),
        }
    }
}
