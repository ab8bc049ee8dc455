/// Workgroup size for `compute.wgsl#mandelbrot`.
pub const MANDELBROT_WORKGROUP_SIZE_Y: u32 = 64;

/// Corresponds to the `65536u` stride in `compute.wgsl#mandelbrot`, divided by
/// [`MANDELBROT_WORKGROUP_SIZE_Y`].
pub const MANDELBROT_DISPATCH_SIZE_Y: u32 = 1024;

/// Pixels written by one invocation of `compute.wgsl#mandelbrot`.
pub const PIXELS_PER_INVOCATION: usize = 4;

/// `u32` words one invocation writes: 4 pixels * 3 bytes = 12 bytes.
pub const WORDS_PER_INVOCATION: usize = 3;

/// Number of invocations needed to cover `pixel_count` pixels.
pub fn invocation_count(pixel_count: usize) -> usize {
    (pixel_count + PIXELS_PER_INVOCATION - 1) / PIXELS_PER_INVOCATION
}

/// Size, in `u32` words, of the device output buffer for `pixel_count` pixels.
/// This is `pixel_count * 3` bytes rounded up to whole invocations.
pub fn output_words(pixel_count: usize) -> usize {
    invocation_count(pixel_count) * WORDS_PER_INVOCATION
}

/**
Dispatch size for `compute.wgsl#mandelbrot`

[WGSL compute shader workgroups reference](https://www.w3.org/TR/WGSL/#compute-shader-workgroups)

The frame is stored on the device the way it is stored on disk: packed
`r, g, b` bytes, `width * height * 3` of them. WGSL has no byte-addressed
storage, and two invocations writing bytes of the same `u32` would race. Four
consecutive pixels are exactly three words, so each invocation colours four
pixels and owns three whole words. `total_work` is the number of those
invocations.

A single dispatch dimension is capped at
[maxComputeWorkgroupsPerDimension](https://www.w3.org/TR/webgpu/#dom-supported-limits-maxcomputeworkgroupsperdimension)
(65535). A 1920x1080 frame already needs 518400 invocations, so the work is laid
out in two dimensions: `y` covers `1024 (dispatch y size) * 64 (workgroup y size) = 65536`
invocations and `x` counts how many of those 65536-invocation rows are needed,
`total_work / 65536 + 1`. The shader recovers the linear index as
`global_invocation_id.x * 65536 + global_invocation_id.y` and skips indices past
the end of the frame. At most 65536 invocations are redundant.
*/
pub fn mandelbrot_dispatch_size(total_work: usize) -> (u32, u32, u32) {
    let x = total_work / (MANDELBROT_DISPATCH_SIZE_Y * MANDELBROT_WORKGROUP_SIZE_Y) as usize + 1;
    (x as u32, MANDELBROT_DISPATCH_SIZE_Y, 1)
}
