// reducer.rs — Variance → shading-rate decisions.
//
// Pure functions over the analyzer's outputs. The batch driver in
// generator.rs decides which blocks/regions feed which tile; this module
// only answers "given these numbers, which rate?".
//
// BASE MODE
//   1. Border penalty: a block next to a darker or brighter neighbour sits
//      on an edge that coarse shading would smear.
//        d_min = max(0, own_min - min(neighbour mins))
//        d_max = max(0, max(neighbour maxes) - own_max)
//      d_min + d_max is added to H, V and C, which are then floored at 0.
//   2. Decision:
//        C < cutoff            → 2x2
//        H > V                 → 1x2 if V < cutoff, else 1x1
//        otherwise (H <= V)    → 2x1 if H < cutoff, else 1x1
//
// ADDITIONAL-RATES MODE
//   Cascade from coarsest to finest, first variance under the cutoff wins:
//        4x4 → 4x2 → 2x4 → 2x2 → 2x1 → 1x2 → 1x1
//   then each region takes the MIN code of itself and its 4 neighbours.

use crate::analyzer::{BlockStats, RegionVariance};
use crate::rate::{
    make_code, AxisRate, CODE_1X1, CODE_1X2, CODE_2X1, CODE_2X2, CODE_2X4, CODE_4X2, CODE_4X4,
};

/// Base-mode variances of one block after the border penalty.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AdjustedVariance {
    pub h: f32,
    pub v: f32,
    pub c: f32,
}

impl AdjustedVariance {
    /// Component-wise maximum.
    #[inline]
    pub fn max(self, other: AdjustedVariance) -> AdjustedVariance {
        AdjustedVariance {
            h: self.h.max(other.h),
            v: self.v.max(other.v),
            c: self.c.max(other.c),
        }
    }
}

/// Edge penalty of `center` given its left, right, top and bottom neighbours.
#[inline]
pub fn border_penalty(center: &BlockStats, neighbours: [&BlockStats; 4]) -> f32 {
    let n_min = neighbours.iter().fold(f32::INFINITY, |acc, n| acc.min(n.min_lum));
    let n_max = neighbours.iter().fold(f32::NEG_INFINITY, |acc, n| acc.max(n.max_lum));
    let d_min = (center.min_lum - n_min).max(0.0);
    let d_max = (n_max - center.max_lum).max(0.0);
    d_min + d_max
}

/// Apply the border penalty and floor every component at zero.
#[inline]
pub fn adjust_block(center: &BlockStats, neighbours: [&BlockStats; 4]) -> AdjustedVariance {
    let p = border_penalty(center, neighbours);
    AdjustedVariance {
        h: (center.h + p).max(0.0),
        v: (center.v + p).max(0.0),
        c: (center.c + p).max(0.0),
    }
}

/// Base-mode rate for one set of variances.
#[inline]
pub fn decide_base_rate(var: AdjustedVariance, cutoff: f32) -> u8 {
    let reduce = |axis: f32| if axis < cutoff { AxisRate::X2 } else { AxisRate::X1 };
    if var.c < cutoff {
        CODE_2X2
    } else if var.h > var.v {
        make_code(AxisRate::X1, reduce(var.v))
    } else {
        make_code(reduce(var.h), AxisRate::X1)
    }
}

/// Additional-rates cascade for one 4x4 region.
#[inline]
pub fn select_region_rate(r: &RegionVariance, cutoff: f32) -> u8 {
    let cascade = [
        (r.v4x4, CODE_4X4),
        (r.v4x2, CODE_4X2),
        (r.v2x4, CODE_2X4),
        (r.v2x2, CODE_2X2),
        (r.v2x1, CODE_2X1),
        (r.v1x2, CODE_1X2),
    ];
    cascade
        .iter()
        .find(|(var, _)| *var < cutoff)
        .map_or(CODE_1X1, |&(_, code)| code)
}

/// Neighbour smoothing: a region is never coarser than any direct neighbour.
#[inline]
pub fn smooth_region_rate(own: u8, neighbours: [u8; 4]) -> u8 {
    neighbours.iter().fold(own, |acc, &n| acc.min(n))
}
