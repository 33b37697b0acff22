// gpu/mod.rs — GPU compute path.
//
// wgpu compute kernels that mirror the CPU generator. The CPU code in the
// parent crate stays the reference; every kernel is checked against it
// tile for tile.
//
//   upload luminance + motion → one workgroup per batch → read back codes
//
// A workgroup runs exactly the two phases of a CPU batch. Phase 1 analyzes
// one padded cell per invocation, with a strided loop for the padding ring,
// into workgroup memory. After a barrier, phase 2 reduces interior cells to
// tile codes.

pub mod device;
pub mod vrs;
