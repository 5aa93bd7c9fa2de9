//! # MSSIM
//!
//! Mean Structural Similarity Index (MSSIM) for single-channel images.
//!
//! SSIM compares two images through local luminance, contrast, and
//! structure statistics over a sliding window. This crate builds five
//! summed-area tables in one pass over the inputs and derives every
//! window's statistics from four table lookups each, so the cost is
//! linear in pixel count regardless of window size.
//!
//! ## Score interpretation
//!
//! - 1.0: structurally identical
//! - \> 0.95: differences are hard to see
//! - < 0.5: strong structural disagreement (negative values mean
//!   locally inverted structure)
//!
//! ## Example
//!
//! ```rust
//! use mssim::{mssim, Img, MssimParams};
//!
//! let width = 16;
//! let height = 16;
//! let pixels: Vec<u8> = vec![128; width * height];
//! let img = Img::new(pixels, width, height);
//!
//! let score = mssim(img.as_ref(), img.as_ref(), &MssimParams::default())?;
//! assert_eq!(score, 1.0);
//! # Ok::<(), mssim::MssimError>(())
//! ```
//!
//! ## Features
//!
//! - **`internals`**: Expose internal modules for testing/benchmarking
//!   (unstable API)

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

// Internal modules - exposed with "internals" feature for testing/benchmarking
#[cfg(feature = "internals")]
pub mod sat;
#[cfg(not(feature = "internals"))]
pub(crate) mod sat;

#[cfg(feature = "internals")]
pub mod score;
#[cfg(not(feature = "internals"))]
pub(crate) mod score;

// Re-export imgref types for convenience
pub use imgref::{Img, ImgRef, ImgVec};

/// Default sliding-window size (11, from the SSIM reference implementation).
pub const DEFAULT_WINDOW_SIZE: usize = 11;

/// Default luminance stability constant k1.
pub const DEFAULT_K1: f64 = 0.01;

/// Default contrast stability constant k2.
pub const DEFAULT_K2: f64 = 0.03;

/// Default sample bit depth.
pub const DEFAULT_BIT_DEPTH: u32 = 8;

/// Widest bit depth a [`Sample`] type can carry.
const MAX_BIT_DEPTH: u32 = 16;

/// Error type for MSSIM operations.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum MssimError {
    /// Width or height is zero (or their product overflows).
    InvalidDimensions {
        /// Width provided.
        width: usize,
        /// Height provided.
        height: usize,
    },
    /// Buffer length doesn't match width * height.
    InvalidBufferSize {
        /// Expected buffer length.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },
    /// The two images' dimensions don't match.
    DimensionMismatch {
        /// First image width.
        w1: usize,
        /// First image height.
        h1: usize,
        /// Second image width.
        w2: usize,
        /// Second image height.
        h2: usize,
    },
    /// Window size is zero.
    InvalidWindowSize {
        /// Window size provided.
        window_size: usize,
    },
    /// A stability constant is not a positive finite number.
    InvalidStabilityConstant {
        /// Which constant ("k1" or "k2").
        name: &'static str,
        /// Value provided.
        value: f64,
    },
    /// Bit depth is zero or wider than 16 bits.
    InvalidBitDepth {
        /// Bit depth provided.
        bit_depth: u32,
    },
}

impl std::fmt::Display for MssimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid dimensions: {width}x{height}")
            }
            Self::InvalidBufferSize { expected, actual } => {
                write!(
                    f,
                    "buffer length {actual} doesn't match expected length {expected}"
                )
            }
            Self::DimensionMismatch { w1, h1, w2, h2 } => {
                write!(f, "image dimensions don't match: {w1}x{h1} vs {w2}x{h2}")
            }
            Self::InvalidWindowSize { window_size } => {
                write!(f, "invalid window size: {window_size} (minimum 1)")
            }
            Self::InvalidStabilityConstant { name, value } => {
                write!(f, "stability constant {name} must be positive, got {value}")
            }
            Self::InvalidBitDepth { bit_depth } => {
                write!(f, "invalid bit depth: {bit_depth} (supported range 1-16)")
            }
        }
    }
}

impl std::error::Error for MssimError {}

/// Unsigned integer sample type the metric accepts.
///
/// Implemented for `u8` and `u16`, covering bit depths 1 through 16.
/// Samples are widened to `f64` before any squared or cross term is
/// formed, so no per-pixel product can overflow an integer type.
pub trait Sample: Copy {
    /// Widens the sample to a double-precision value.
    fn to_f64(self) -> f64;
}

impl Sample for u8 {
    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Sample for u16 {
    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

/// MSSIM computation parameters.
///
/// Use the builder pattern to construct:
/// ```rust
/// use mssim::MssimParams;
///
/// let params = MssimParams::new()
///     .with_window_size(8)   // smaller window, more local
///     .with_bit_depth(16);   // 16-bit samples
/// ```
#[derive(Debug, Clone)]
pub struct MssimParams {
    window_size: usize,
    k1: f64,
    k2: f64,
    bit_depth: u32,
}

impl Default for MssimParams {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            k1: DEFAULT_K1,
            k2: DEFAULT_K2,
            bit_depth: DEFAULT_BIT_DEPTH,
        }
    }
}

impl MssimParams {
    /// Creates a new `MssimParams` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sliding-window size.
    ///
    /// Larger windows give more stable local statistics, smaller
    /// windows are more sensitive to localized differences.
    #[must_use]
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Sets the luminance stability constant k1.
    #[must_use]
    pub fn with_k1(mut self, k1: f64) -> Self {
        self.k1 = k1;
        self
    }

    /// Sets the contrast stability constant k2.
    #[must_use]
    pub fn with_k2(mut self, k2: f64) -> Self {
        self.k2 = k2;
        self
    }

    /// Sets the sample bit depth (1-16).
    ///
    /// Defines the dynamic range `L = 2^bit_depth - 1` the stability
    /// constants are scaled by.
    #[must_use]
    pub fn with_bit_depth(mut self, bit_depth: u32) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    /// Returns the sliding-window size.
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Returns the luminance stability constant k1.
    #[must_use]
    pub fn k1(&self) -> f64 {
        self.k1
    }

    /// Returns the contrast stability constant k2.
    #[must_use]
    pub fn k2(&self) -> f64 {
        self.k2
    }

    /// Returns the sample bit depth.
    #[must_use]
    pub fn bit_depth(&self) -> u32 {
        self.bit_depth
    }

    /// Validates the parameters.
    ///
    /// # Errors
    /// Returns an error if the window size is zero, a stability
    /// constant is not a positive finite number, or the bit depth is
    /// outside 1-16.
    pub fn validate(&self) -> Result<(), MssimError> {
        if self.window_size == 0 {
            return Err(MssimError::InvalidWindowSize {
                window_size: self.window_size,
            });
        }
        if !(self.k1.is_finite() && self.k1 > 0.0) {
            return Err(MssimError::InvalidStabilityConstant {
                name: "k1",
                value: self.k1,
            });
        }
        if !(self.k2.is_finite() && self.k2 > 0.0) {
            return Err(MssimError::InvalidStabilityConstant {
                name: "k2",
                value: self.k2,
            });
        }
        if self.bit_depth == 0 || self.bit_depth > MAX_BIT_DEPTH {
            return Err(MssimError::InvalidBitDepth {
                bit_depth: self.bit_depth,
            });
        }
        Ok(())
    }

    /// Stability constants c1 and c2 scaled to the dynamic range.
    ///
    /// `L = 2^bit_depth - 1`, `c1 = (k1 * L)^2`, `c2 = (k2 * L)^2`.
    pub(crate) fn stability_constants(&self) -> (f64, f64) {
        let l = f64::from((1u32 << self.bit_depth) - 1);
        let c1 = (self.k1 * l) * (self.k1 * l);
        let c2 = (self.k2 * l) * (self.k2 * l);
        (c1, c2)
    }
}

/// Computes the mean SSIM score between two greyscale images.
///
/// This is the view-based entry point; it accepts strided `imgref`
/// views over `u8` or `u16` samples. Both images must have identical
/// dimensions.
///
/// # Arguments
/// * `img1` - Reference image (supports stride via ImgRef)
/// * `img2` - Candidate image (supports stride via ImgRef)
/// * `params` - Comparison parameters
///
/// # Returns
/// The mean SSIM score, nominally in `[-1, 1]`. `1.0` means identical
/// structural content. Images smaller than the window in either
/// dimension also score `1.0`: with no comparable window the result is
/// trivial identity, not an error.
///
/// # Errors
/// Returns an error if the dimensions don't match, either dimension is
/// zero, or the parameters fail validation.
///
/// # Example
/// ```rust
/// use mssim::{mssim, Img, MssimParams};
///
/// let width = 16;
/// let height = 16;
/// let a: Vec<u8> = (0..width * height).map(|i| (i % 251) as u8).collect();
/// let img = Img::new(a, width, height);
///
/// let score = mssim(img.as_ref(), img.as_ref(), &MssimParams::default())?;
/// assert_eq!(score, 1.0);
/// # Ok::<(), mssim::MssimError>(())
/// ```
pub fn mssim<S: Sample>(
    img1: ImgRef<'_, S>,
    img2: ImgRef<'_, S>,
    params: &MssimParams,
) -> Result<f64, MssimError> {
    let (w1, h1) = (img1.width(), img1.height());
    let (w2, h2) = (img2.width(), img2.height());

    if w1 != w2 || h1 != h2 {
        return Err(MssimError::DimensionMismatch { w1, h1, w2, h2 });
    }

    params.validate()?;

    if w1 == 0 || h1 == 0 {
        return Err(MssimError::InvalidDimensions {
            width: w1,
            height: h1,
        });
    }

    // Contiguous views can be compared in place; strided ones are
    // gathered into a flat buffer first.
    if img1.stride() == w1 && img2.stride() == w1 {
        let len = w1 * h1;
        return Ok(compute_inner(
            &img1.buf()[..len],
            &img2.buf()[..len],
            w1,
            h1,
            params,
        ));
    }

    let flat1 = flatten(img1);
    let flat2 = flatten(img2);
    Ok(compute_inner(&flat1, &flat2, w1, h1, params))
}

/// Computes the mean SSIM score between two flat sample buffers.
///
/// Both buffers are row-major with length exactly `width * height` and
/// values in `[0, 2^bit_depth - 1]`.
///
/// # Errors
/// Returns an error if either dimension is zero, a buffer length
/// doesn't match the dimensions, or the parameters fail validation.
/// The degenerate smaller-than-window case is NOT an error; it returns
/// `Ok(1.0)`.
pub fn compute_mssim<S: Sample>(
    image1: &[S],
    image2: &[S],
    width: usize,
    height: usize,
    params: &MssimParams,
) -> Result<f64, MssimError> {
    params.validate()?;

    if width == 0 || height == 0 {
        return Err(MssimError::InvalidDimensions { width, height });
    }

    let expected = width
        .checked_mul(height)
        .ok_or(MssimError::InvalidDimensions { width, height })?;

    if image1.len() != expected {
        return Err(MssimError::InvalidBufferSize {
            expected,
            actual: image1.len(),
        });
    }
    if image2.len() != expected {
        return Err(MssimError::InvalidBufferSize {
            expected,
            actual: image2.len(),
        });
    }

    Ok(compute_inner(image1, image2, width, height, params))
}

/// Gathers a strided view into a flat row-major buffer.
fn flatten<S: Sample>(img: ImgRef<'_, S>) -> Vec<S> {
    let mut flat = Vec::with_capacity(img.width() * img.height());
    for row in img.rows() {
        flat.extend_from_slice(row);
    }
    flat
}

/// Validated core: SAT build followed by window evaluation.
fn compute_inner<S: Sample>(
    a: &[S],
    b: &[S],
    width: usize,
    height: usize,
    params: &MssimParams,
) -> f64 {
    let (c1, c2) = params.stability_constants();
    let tables = sat::SumTables::build(a, b, width, height);
    score::mean_ssim(&tables, params.window_size(), c1, c2)
}
