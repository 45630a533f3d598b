//! N-ary blend operators.
//!
//! A blend operator folds the field value of a bone together with the
//! already-blended values of its children. Built-in operators are plain
//! enum variants so the evaluator dispatches on a tag; anything else plugs in
//! through [`Combinator`].

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::{FieldError, FieldResult};

/// A caller-supplied n-ary combinator.
///
/// `values[0]` is the bone's own field value; the remaining entries are the
/// blended values of its children in ascending skeleton position. Neither
/// associativity nor commutativity is assumed.
pub trait Combinator: Debug + Send + Sync {
    /// Combine the values into one.
    fn combine(&self, values: &[f64]) -> f64;
}

/// Operator used to blend fields at a bone.
#[derive(Debug, Clone, Default)]
pub enum BlendOperator {
    /// Union: the maximum value. An empty input blends to `0.0`.
    #[default]
    Max,

    /// Plain sum, clamped to `[0, 1]`.
    Sum,

    /// Ricci blend `(sum v^n)^(1/n)`, clamped to `[0, 1]`.
    ///
    /// `n = 1` is the sum; large `n` approaches [`BlendOperator::Max`].
    Ricci {
        /// Blend exponent, at least 1.
        exponent: f64,
    },

    /// Any other operator.
    Custom(Arc<dyn Combinator>),
}

impl BlendOperator {
    /// Ricci blend with the given exponent.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidExponent`] unless `exponent` is finite and
    /// at least 1.
    pub fn ricci(exponent: f64) -> FieldResult<Self> {
        if exponent.is_finite() && exponent >= 1.0 {
            Ok(Self::Ricci { exponent })
        } else {
            Err(FieldError::InvalidExponent(exponent))
        }
    }

    /// Wrap a custom combinator.
    #[must_use]
    pub fn custom(combinator: impl Combinator + 'static) -> Self {
        Self::Custom(Arc::new(combinator))
    }

    /// Combine `values` with this operator.
    ///
    /// # Example
    ///
    /// ```
    /// use skin_field::BlendOperator;
    ///
    /// assert_eq!(BlendOperator::Max.combine(&[0.2, 0.7, 0.4]), 0.7);
    /// assert_eq!(BlendOperator::Sum.combine(&[0.6, 0.7]), 1.0);
    /// assert_eq!(BlendOperator::Max.combine(&[]), 0.0);
    /// ```
    #[must_use]
    pub fn combine(&self, values: &[f64]) -> f64 {
        match self {
            Self::Max => values.iter().copied().fold(0.0, f64::max),
            Self::Sum => values.iter().sum::<f64>().clamp(0.0, 1.0),
            Self::Ricci { exponent } => {
                let sum: f64 = values.iter().map(|v| v.max(0.0).powf(*exponent)).sum();
                sum.powf(exponent.recip()).clamp(0.0, 1.0)
            }
            Self::Custom(combinator) => combinator.combine(values),
        }
    }

    /// Whether this operator is one of the built-in variants.
    #[must_use]
    pub const fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }
}
