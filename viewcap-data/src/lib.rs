//! Viewcap Data Crate
//!
//! Device-agnostic frame utilities shared by every capture backend and by the
//! reconstruction pipeline that consumes their output.
//!
//! ## Modules
//!
//! - [`crop`]: symmetric crop windows with pixel offsets
//! - [`sharpness`]: Laplacian-variance focus scoring
//! - [`intrinsics`]: camera property records and derived field-of-view values
//! - [`depth`]: depth sample conversion and false-color visualization
//! - [`frame`]: frame types and image file loading

pub mod crop;
pub mod depth;
pub mod error;
pub mod frame;
pub mod intrinsics;
pub mod sharpness;

pub use crop::{CropSpec, crop, crop_window};
pub use depth::{DEFAULT_DEPTH_ALPHA, apply_bone_colormap, raw_depth_from_le_bytes, scale_abs};
pub use error::DataError;
pub use frame::{DepthImage, RawFrame, load_rgb};
pub use intrinsics::{CameraProperties, load_camera_properties};
pub use sharpness::{laplacian_variance, sharpness, to_gray};
