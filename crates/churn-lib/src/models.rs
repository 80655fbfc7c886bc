//! Core data models for churn prediction

use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscriber gender as recorded by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

/// Subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionType {
    Free,
    Premium,
    Family,
    Student,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::Free => "Free",
            SubscriptionType::Premium => "Premium",
            SubscriptionType::Family => "Family",
            SubscriptionType::Student => "Student",
        }
    }
}

/// Primary listening device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Desktop,
    Mobile,
    Web,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Desktop => "Desktop",
            DeviceType::Mobile => "Mobile",
            DeviceType::Web => "Web",
        }
    }
}

macro_rules! impl_display_via_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display_via_as_str!(Gender, SubscriptionType, DeviceType);

/// A validated prediction request
///
/// Range checks (`skip_rate` within `[0, 1]`) belong to the transport layer;
/// the core assumes it receives a well-formed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnRequest {
    pub age: u32,
    /// Minutes of listening
    pub listening_time: u32,
    pub songs_played_per_day: u32,
    pub skip_rate: f64,
    pub gender: Gender,
    pub country: String,
    pub subscription_type: SubscriptionType,
    pub device_type: DeviceType,
}

/// Reference thresholds for the interaction features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantileSet {
    pub skip_rate_q75: f64,
    pub listening_time_q25: f64,
    pub age_q70: f64,
}

/// Feature vector handed to every scorer
///
/// Field declaration order matches [`FeatureVector::COLUMNS`] and the column
/// order the scorers were trained on. Reordering fields requires retraining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub age: u32,
    pub listening_time: u32,
    pub songs_played_per_day: u32,
    pub skip_rate: f64,
    pub high_skip_low_listening: u8,
    pub mobile_high_skip: u8,
    pub high_skip_high_age: u8,
    pub gender: Gender,
    pub country: String,
    pub subscription_type: SubscriptionType,
    pub device_type: DeviceType,
}

impl FeatureVector {
    /// Column names in training order
    pub const COLUMNS: [&'static str; 11] = [
        "age",
        "listening_time",
        "songs_played_per_day",
        "skip_rate",
        "high_skip_low_listening",
        "mobile_high_skip",
        "high_skip_high_age",
        "gender",
        "country",
        "subscription_type",
        "device_type",
    ];

    /// Numeric columns, in order
    pub const NUMERIC_COLUMNS: [&'static str; 4] =
        ["age", "listening_time", "songs_played_per_day", "skip_rate"];

    /// Interaction flag columns, in order
    pub const INTERACTION_COLUMNS: [&'static str; 3] = [
        "high_skip_low_listening",
        "mobile_high_skip",
        "high_skip_high_age",
    ];

    /// Categorical columns, in order
    pub const CATEGORICAL_COLUMNS: [&'static str; 4] =
        ["gender", "country", "subscription_type", "device_type"];

    pub fn numeric_values(&self) -> [f64; 4] {
        [
            self.age as f64,
            self.listening_time as f64,
            self.songs_played_per_day as f64,
            self.skip_rate,
        ]
    }

    pub fn interaction_flags(&self) -> [u8; 3] {
        [
            self.high_skip_low_listening,
            self.mobile_high_skip,
            self.high_skip_high_age,
        ]
    }

    pub fn categorical_values(&self) -> [&str; 4] {
        [
            self.gender.as_str(),
            self.country.as_str(),
            self.subscription_type.as_str(),
            self.device_type.as_str(),
        ]
    }
}

/// Probability at or above which a subscriber is labelled as churning
pub const CHURN_THRESHOLD: f64 = 0.5;

/// Prediction output returned to the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub churn_probability: f64,
    pub churn_label: u8,
}

impl PredictionResult {
    /// Derive the label from the probability alone
    pub fn from_probability(probability: f64) -> Self {
        Self {
            churn_probability: probability,
            churn_label: u8::from(probability >= CHURN_THRESHOLD),
        }
    }
}
