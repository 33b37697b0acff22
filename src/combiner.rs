// combiner.rs — Shading-rate combiners.
//
// The rasterizer resolves a final rate per pixel from three sources:
//
//   base rate (per draw) ──┐
//                          ├─ primitive combiner ─┐
//   per-primitive rate ────┘                      ├─ image combiner ─→ final
//   VRS image tile rate ──────────────────────────┘
//
// Each combiner works per axis on log2 rates:
//   Passthrough  keep the left operand
//   Override     take the right operand
//   Min / Max    per-axis min / max
//   Sum          per-axis sum of log2 rates (2x1 + 1x2 → 2x2)
//
// Results are clamped to the largest supported axis rate (2, or 4 with
// additional rates) and 1x4 / 4x1 fold to 1x2 / 2x1.

use serde::{Deserialize, Serialize};

use crate::rate::{AxisRate, ShadingRate};
use crate::tile_grid::{RateSink, TileGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combiner {
    #[default]
    Passthrough,
    Override,
    Min,
    Max,
    Sum,
}

impl Combiner {
    /// Combine `a` (left / previous stage) with `b` (right / new source).
    pub fn apply(self, a: ShadingRate, b: ShadingRate, additional_rates: bool) -> ShadingRate {
        let (ax, ay) = a.axes();
        let (bx, by) = b.axes();
        let axis = |l: AxisRate, r: AxisRate| -> u8 {
            match self {
                Combiner::Passthrough => l.log2(),
                Combiner::Override => r.log2(),
                Combiner::Min => l.log2().min(r.log2()),
                Combiner::Max => l.log2().max(r.log2()),
                Combiner::Sum => l.log2() + r.log2(),
            }
        };
        clamp_rate(axis(ax, bx), axis(ay, by), additional_rates)
    }
}

fn clamp_rate(x_log2: u8, y_log2: u8, additional_rates: bool) -> ShadingRate {
    let max = if additional_rates { 2 } else { 1 };
    ShadingRate::from_axes(
        AxisRate::from_log2(x_log2.min(max)),
        AxisRate::from_log2(y_log2.min(max)),
    )
}

/// Full combiner state of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateCombiners {
    /// Per-draw base rate.
    #[serde(with = "rate_name")]
    pub base: ShadingRate,
    /// Combines the base rate with the per-primitive rate.
    pub primitive: Combiner,
    /// Combines that result with the VRS image rate.
    pub image: Combiner,
    pub additional_rates: bool,
}

impl Default for RateCombiners {
    /// Image-driven shading: base 1x1, primitive passthrough, image override.
    fn default() -> Self {
        RateCombiners {
            base: ShadingRate::R1x1,
            primitive: Combiner::Passthrough,
            image: Combiner::Override,
            additional_rates: false,
        }
    }
}

impl RateCombiners {
    /// Final rate for one pixel. Draws without a per-primitive rate pass
    /// `None`, which stands for the base rate.
    pub fn resolve(&self, primitive_rate: Option<ShadingRate>, image_rate: ShadingRate) -> ShadingRate {
        let primitive_rate = primitive_rate.unwrap_or(self.base);
        let stage = self.primitive.apply(self.base, primitive_rate, self.additional_rates);
        self.image.apply(stage, image_rate, self.additional_rates)
    }

    /// Resolve every tile of a VRS image for a draw without per-primitive
    /// rates. Unknown codes count as 1x1.
    pub fn resolve_grid(&self, grid: &TileGrid) -> TileGrid {
        let (w, h) = grid.frame_size();
        let mut out = TileGrid::new(w, h, grid.tile_size());
        for ty in 0..grid.rows() {
            for tx in 0..grid.cols() {
                let image_rate = grid.rate(tx, ty).unwrap_or_default();
                out.write(tx, ty, self.resolve(None, image_rate).code());
            }
        }
        out
    }
}

mod rate_name {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::rate::ShadingRate;

    pub fn serialize<S: Serializer>(rate: &ShadingRate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(rate)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ShadingRate, D::Error> {
        let name = String::deserialize(d)?;
        ShadingRate::ALL
            .iter()
            .copied()
            .find(|r| r.to_string() == name)
            .ok_or_else(|| D::Error::custom(format!("unknown shading rate `{name}`")))
    }
}
