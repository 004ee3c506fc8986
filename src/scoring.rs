use crate::errors::FraudResult;
use crate::models::{RiskTier, TransactionContext};
use rand::Rng;
use tracing::{error, info, warn};

/// Amount (minor units) at which the model baseline saturates at 0.6.
const BASELINE_SATURATION_AMOUNT: f64 = 100_000.0;
const BASELINE_CAP: f64 = 0.6;
const NOISE_AMPLITUDE: f64 = 0.1;

// ===== Noise Source =====
/// Injectable randomness for the demo model, so tests (or a deterministic
/// deployment) can swap out the unseeded generator.
pub trait NoiseSource: Send + Sync {
    fn sample(&self) -> f64;
}

/// Production noise: uniform draw from [-amplitude, +amplitude].
pub struct UniformNoise {
    amplitude: f64,
}

impl UniformNoise {
    pub fn new() -> Self {
        UniformNoise {
            amplitude: NOISE_AMPLITUDE,
        }
    }
}

impl Default for UniformNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseSource for UniformNoise {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen_range(-self.amplitude..=self.amplitude)
    }
}

/// Fixed noise, for reproducible scoring.
pub struct FixedNoise(pub f64);

impl NoiseSource for FixedNoise {
    fn sample(&self) -> f64 {
        self.0
    }
}

// ===== Probabilistic Scorer =====
/// A model producing a fraud pseudo-probability in [0,1], or `None` when
/// not applicable to the event. Implementations must not panic; a failure
/// is degraded to rules-only scoring by the caller.
pub trait ModelScorer: Send + Sync {
    fn evaluate(&self, ctx: &TransactionContext) -> FraudResult<Option<f64>>;
}

/// Demo amount-proportional model: baseline `min(0.6, amount/100000)` plus
/// bounded noise, clamped into [0,1]. Not applicable to zero-amount events.
pub struct AmountModel {
    noise: Box<dyn NoiseSource>,
}

impl AmountModel {
    pub fn new() -> Self {
        AmountModel {
            noise: Box::new(UniformNoise::new()),
        }
    }

    pub fn with_noise(noise: Box<dyn NoiseSource>) -> Self {
        AmountModel { noise }
    }
}

impl Default for AmountModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelScorer for AmountModel {
    fn evaluate(&self, ctx: &TransactionContext) -> FraudResult<Option<f64>> {
        if ctx.amount == 0 {
            return Ok(None);
        }

        let base = (ctx.amount as f64 / BASELINE_SATURATION_AMOUNT).min(BASELINE_CAP);
        let prob = (base + self.noise.sample()).clamp(0.0, 1.0);

        Ok(Some(prob))
    }
}

// ===== Risk Combiner =====
/// Blend the rule score with the model output.
///
/// With a model probability the composite is the 0.5/0.5 weighted average
/// and the reason carries both parts; without one the rule score stands
/// alone. Inputs are already in [0,1], so no further clamping is needed.
pub fn combine(rule_score: f64, rule_reason: &str, model: Option<f64>) -> (f64, String) {
    match model {
        Some(p) => {
            let composite = 0.5 * rule_score + 0.5 * p;
            (composite, format!("rules:{}; ml:{:.2}", rule_reason, p))
        }
        None => (rule_score, format!("{} (no ML)", rule_reason)),
    }
}

// ===== Alert Sink =====
/// Extension hook invoked once per classified event. Side-effecting
/// integrations (Slack notification, ticket creation, automated refund)
/// implement this without touching the scoring core.
pub trait AlertSink: Send + Sync {
    fn on_classified(&self, external_id: Option<&str>, score: f64, reason: &str, tier: RiskTier);
}

/// Default sink: log-level signal only, one line per event.
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn on_classified(&self, external_id: Option<&str>, score: f64, reason: &str, tier: RiskTier) {
        let id = external_id.unwrap_or("unknown");
        match tier {
            RiskTier::HighRisk => {
                error!("[ALERT] {} {} score={:.2} reason={}", tier, id, score, reason)
            }
            RiskTier::MediumRisk => {
                warn!("[WARN] {} {} score={:.2} reason={}", tier, id, score, reason)
            }
            RiskTier::LowRisk => info!("[INFO] {} {} score={:.2}", tier, id, score),
        }
    }
}
