//! Feature construction for churn scoring
//!
//! Copies the raw request fields into the trained column order and derives
//! three binary interaction features from the reference quantiles.

use crate::models::{ChurnRequest, DeviceType, FeatureVector, QuantileSet};

/// Builds feature vectors from validated requests
pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Build the ordered feature vector for a request.
    ///
    /// Threshold comparisons are strict: a value equal to its threshold never
    /// raises a flag.
    pub fn build(request: &ChurnRequest, quantiles: &QuantileSet) -> FeatureVector {
        let high_skip = request.skip_rate > quantiles.skip_rate_q75;
        let low_listening = (request.listening_time as f64) < quantiles.listening_time_q25;
        let high_age = request.age as f64 > quantiles.age_q70;
        let mobile = request.device_type == DeviceType::Mobile;

        FeatureVector {
            age: request.age,
            listening_time: request.listening_time,
            songs_played_per_day: request.songs_played_per_day,
            skip_rate: request.skip_rate,
            high_skip_low_listening: flag(high_skip && low_listening),
            mobile_high_skip: flag(mobile && high_skip),
            high_skip_high_age: flag(high_skip && high_age),
            gender: request.gender,
            country: request.country.clone(),
            subscription_type: request.subscription_type,
            device_type: request.device_type,
        }
    }
}

fn flag(condition: bool) -> u8 {
    u8::from(condition)
}
