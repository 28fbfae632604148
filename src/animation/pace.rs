/// Pacing functions used to reparameterize normalized effect progress.
///
/// Inputs are clamped to `[0, 1]`. Not every curve is monotone:
/// [`Pace::SmoothPlateau`] rises, holds, and falls again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Pace {
    /// Identity.
    Linear,
    /// Sigmoid-smoothed ramp, normalized to hit 0 and 1 exactly.
    Smooth,
    /// Exponential approach into the target ("soft landing").
    SoftLanding,
    /// Fast exponential start that flattens out.
    Surprise,
    /// Smooth ramp up, full plateau through the middle, smooth ramp down.
    SmoothPlateau,
}

const INFLECTION: f64 = 10.0;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Sigmoid ramp rescaled so `smooth(0) == 0` and `smooth(1) == 1`.
pub(crate) fn smooth(t: f64) -> f64 {
    let error = sigmoid(-INFLECTION / 2.0);
    (sigmoid(INFLECTION * (t - 0.5)) - error) / (1.0 - 2.0 * error)
}

impl Pace {
    /// Apply this pacing function to normalized progress `s` in `[0, 1]`.
    pub fn apply(self, s: f64) -> f64 {
        let s = s.clamp(0.0, 1.0);
        match self {
            Self::Linear => s,
            Self::Smooth => smooth(s),
            Self::SoftLanding => (INFLECTION * (s - 1.0)).exp(),
            Self::Surprise => 1.0 - (-INFLECTION * s).exp(),
            Self::SmoothPlateau => {
                if s < 0.25 {
                    smooth(s)
                } else if s > 0.75 {
                    smooth(1.0 - s)
                } else {
                    1.0
                }
            }
        }
    }
}
