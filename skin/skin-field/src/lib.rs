//! Per-bone implicit fields and blend operators for implicit skinning.
//!
//! Implicit skinning represents each bone of a skeleton as a compactly
//! supported scalar field. Fields are combined bottom-up along the bone
//! hierarchy by n-ary blend operators, and the isosurface of the combined
//! field is the skinned surface.
//!
//! This crate provides the leaf building blocks:
//!
//! - [`ImplicitField`] - The capability a per-bone field exposes (value,
//!   gradient, support box)
//! - [`SphereField`] and [`CapsuleField`] - Built-in primitives with Wyvill
//!   compact-support falloff
//! - [`BlendOperator`] and [`Combinator`] - Pluggable n-ary combinators
//! - [`FieldBounds`] - Axis-aligned support boxes
//!
//! # Field Convention
//!
//! Field values lie in `[0, 1]`, larger inside the surface. The surface is
//! the `0.5` isosurface by default. A field is exactly `0.0` outside its
//! support box.
//!
//! # Example
//!
//! ```
//! use skin_field::{BlendOperator, CapsuleField, ImplicitField};
//! use nalgebra::Point3;
//!
//! let upper_arm = CapsuleField::new(2.0, 0.5).unwrap();
//! let inside = upper_arm.value(&Point3::new(0.0, 1.0, 0.0));
//! let outside = upper_arm.value(&Point3::new(3.0, 1.0, 0.0));
//!
//! assert!(inside > 0.5);
//! assert_eq!(outside, 0.0);
//!
//! let union = BlendOperator::Max.combine(&[inside, 0.2]);
//! assert!((union - inside).abs() < f64::EPSILON);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bounds;
mod error;
mod field;
mod operator;
mod primitives;

pub use bounds::FieldBounds;
pub use error::{FieldError, FieldResult};
pub use field::{GRADIENT_STEP, ImplicitField, central_difference};
pub use operator::{BlendOperator, Combinator};
pub use primitives::{CapsuleField, SphereField, wyvill_falloff};

// Re-export nalgebra types for convenience
pub use nalgebra::{Isometry3, Point3, Vector3};
