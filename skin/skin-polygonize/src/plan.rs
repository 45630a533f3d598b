//! Flat evaluation plan for a skeleton's blended field.

use std::sync::Arc;

use nalgebra::{Isometry3, Point3, Vector3};
use smallvec::SmallVec;
use skin_field::{BlendOperator, FieldBounds, ImplicitField, central_difference};
use skin_skeleton::Skeleton;

use crate::params::BlendParams;

/// One bone, resolved for evaluation.
#[derive(Debug, Clone)]
struct PlanNode {
    field: Arc<dyn ImplicitField>,
    inverse: Isometry3<f64>,
    support: Option<FieldBounds>,
    operator: BlendOperator,
    children: SmallVec<[usize; 4]>,
}

/// A skeleton's blended field, resolved once for repeated evaluation.
///
/// Building the plan copies the skeleton's pose snapshot, looks up every
/// bone's operator and precomputes world support boxes. Later pose refreshes
/// do not affect an existing plan.
///
/// The value at a point is computed bottom-up: each bone combines its own
/// field value with its children's blended values (children in ascending
/// position) using its operator, and the roots are combined with the root
/// operator. A bone whose support box excludes the point contributes `0.0`
/// as its own value.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use nalgebra::Point3;
/// use skin_field::SphereField;
/// use skin_skeleton::{Bone, BoneId, Skeleton};
/// use skin_polygonize::{BlendParams, FieldPlan};
///
/// let field = Arc::new(SphereField::new(1.0).unwrap());
/// let skeleton = Skeleton::single(Arc::new(Bone::new(BoneId::new(0), field)));
/// let plan = FieldPlan::new(&skeleton, &BlendParams::default());
///
/// assert_eq!(plan.value(&Point3::origin()), 1.0);
/// assert_eq!(plan.value(&Point3::new(2.0, 0.0, 0.0)), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct FieldPlan {
    nodes: Vec<PlanNode>,
    roots: Vec<usize>,
    root_operator: BlendOperator,
    bounds: Option<FieldBounds>,
}

impl FieldPlan {
    /// Resolve `skeleton` under `blend`.
    #[must_use]
    pub fn new(skeleton: &Skeleton, blend: &BlendParams) -> Self {
        let pose = skeleton.pose();

        let nodes: Vec<PlanNode> = skeleton
            .bones()
            .iter()
            .zip(&pose)
            .enumerate()
            .map(|(position, (bone, transform))| PlanNode {
                field: Arc::clone(bone.field()),
                inverse: transform.inverse(),
                support: bone.world_support(transform),
                operator: blend.operator_for(bone.id()).clone(),
                children: skeleton.children(position).iter().copied().collect(),
            })
            .collect();

        let bounds = nodes
            .iter()
            .map(|n| n.support)
            .try_fold(None::<FieldBounds>, |acc, support| {
                let support = support?;
                Some(Some(acc.map_or(support, |b| b.union(&support))))
            })
            .flatten();

        Self {
            nodes,
            roots: skeleton.roots().collect(),
            root_operator: blend.root_operator.clone(),
            bounds,
        }
    }

    /// Number of bones in the plan.
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.nodes.len()
    }

    /// World box outside which the field is zero, or `None` if some bone is
    /// unbounded.
    #[must_use]
    pub const fn bounds(&self) -> Option<FieldBounds> {
        self.bounds
    }

    /// Blended field value at a world-space point.
    #[must_use]
    pub fn value(&self, point: &Point3<f64>) -> f64 {
        let mut blended: SmallVec<[f64; 32]> = SmallVec::from_elem(0.0, self.nodes.len());
        let mut inputs: SmallVec<[f64; 8]> = SmallVec::new();

        // Children always sit after their parent, so a reverse sweep sees
        // every child before its parent.
        for (position, node) in self.nodes.iter().enumerate().rev() {
            let own = match node.support {
                Some(support) if !support.contains(point) => 0.0,
                _ => node.field.value(&node.inverse.transform_point(point)),
            };

            inputs.clear();
            inputs.push(own);
            inputs.extend(node.children.iter().map(|&c| blended[c]));
            blended[position] = node.operator.combine(&inputs);
        }

        inputs.clear();
        inputs.extend(self.roots.iter().map(|&r| blended[r]));
        self.root_operator.combine(&inputs)
    }

    /// Gradient of the blended field by central differences with step `h`.
    ///
    /// Per-bone [`ImplicitField::gradient`] is not used: blend operators such as [`BlendOperator::Custom`] have no
    /// known derivative.
    #[must_use]
    pub fn gradient(&self, point: &Point3<f64>, h: f64) -> Vector3<f64> {
        central_difference(|p| self.value(p), point, h)
    }

    /// Outward unit normal at a point.
    ///
    /// The field grows towards the inside, so this is the normalized negative
    /// gradient. Returns the zero vector where the gradient vanishes.
    #[must_use]
    pub fn normal(&self, point: &Point3<f64>, h: f64) -> Vector3<f64> {
        (-self.gradient(point, h))
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use skin_field::{CapsuleField, Combinator, GRADIENT_STEP, SphereField, wyvill_falloff};
    use skin_skeleton::{Bone, BoneId};

    fn sphere_bone(id: u64, radius: f64, x: f64) -> Arc<Bone> {
        let field = Arc::new(SphereField::new(radius).unwrap());
        let bone = Bone::new(BoneId::new(id), field).with_transform(Isometry3::translation(x, 0.0, 0.0));
        Arc::new(bone)
    }

    fn two_spheres() -> Skeleton {
        Skeleton::new(
            vec![sphere_bone(0, 1.0, 0.0), sphere_bone(1, 1.0, 1.0)],
            vec![None, Some(0)],
        )
        .unwrap()
    }

    /// Returns the number of inputs.
    #[derive(Debug)]
    struct CountInputs;

    impl Combinator for CountInputs {
        fn combine(&self, values: &[f64]) -> f64 {
            values.len() as f64
        }
    }

    #[test]
    fn max_blend_of_two_bones() {
        let plan = FieldPlan::new(&two_spheres(), &BlendParams::default());
        let p = Point3::new(0.5, 0.0, 0.0);

        assert_relative_eq!(plan.value(&p), wyvill_falloff(0.5, 1.0), epsilon = 1e-12);
        assert_relative_eq!(plan.value(&Point3::new(1.0, 0.0, 0.0)), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn sum_blend_adds_contributions() {
        let plan = FieldPlan::new(&two_spheres(), &BlendParams::uniform(BlendOperator::Sum));
        let p = Point3::new(0.5, 0.0, 0.0);
        let each = wyvill_falloff(0.5, 1.0);

        assert_relative_eq!(plan.value(&p), (2.0 * each).min(1.0), epsilon = 1e-12);
    }

    #[test]
    fn custom_operator_sees_own_value_and_children() {
        let skeleton = Skeleton::new(
            vec![
                sphere_bone(0, 1.0, 0.0),
                sphere_bone(1, 1.0, 0.0),
                sphere_bone(2, 1.0, 0.0),
            ],
            vec![None, Some(0), Some(0)],
        )
        .unwrap();
        let counting = |root: BlendOperator| {
            BlendParams::default()
                .with_override(BoneId::new(0), BlendOperator::custom(CountInputs))
                .with_root_operator(root)
        };
        let origin = Point3::origin();

        // Bone 0 sees its own value and two children
        let plan = FieldPlan::new(&skeleton, &counting(BlendOperator::custom(FirstValue)));
        assert_relative_eq!(plan.value(&origin), 3.0);

        // One root
        let plan = FieldPlan::new(&skeleton, &counting(BlendOperator::custom(CountInputs)));
        assert_relative_eq!(plan.value(&origin), 1.0);

        let plan = FieldPlan::new(&skeleton, &counting(BlendOperator::Sum));
        assert_relative_eq!(plan.value(&origin), 1.0);
    }

    /// Passes the first input through unchanged.
    #[derive(Debug)]
    struct FirstValue;

    impl Combinator for FirstValue {
        fn combine(&self, values: &[f64]) -> f64 {
            values.first().copied().unwrap_or(0.0)
        }
    }

    #[test]
    fn plan_keeps_pose_at_construction() {
        let skeleton = two_spheres();
        let plan = FieldPlan::new(&skeleton, &BlendParams::default());
        let far = Point3::new(5.0, 0.0, 0.0);

        skeleton.set_bone_transform(1, Isometry3::translation(5.0, 0.0, 0.0));

        assert_relative_eq!(plan.value(&far), 0.0);
        let refreshed = FieldPlan::new(&skeleton, &BlendParams::default());
        assert_relative_eq!(refreshed.value(&far), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn bounds_cover_all_bones() {
        let plan = FieldPlan::new(&two_spheres(), &BlendParams::default());
        let bounds = plan.bounds().unwrap();

        assert_relative_eq!(bounds.min.x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(bounds.max.x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn single_bone_gradient_matches_analytic() {
        let field = SphereField::new(1.5).unwrap();
        let bone = Bone::new(BoneId::new(0), Arc::new(field))
            .with_transform(Isometry3::translation(2.0, 0.0, 0.0));
        let plan = FieldPlan::new(&Skeleton::single(Arc::new(bone)), &BlendParams::default());

        let world = Point3::new(2.6, 0.3, -0.4);
        let local = Point3::new(0.6, 0.3, -0.4);
        let numeric = plan.gradient(&world, GRADIENT_STEP);
        let analytic = field.gradient(&local);
        assert_relative_eq!(numeric, analytic, epsilon = 1e-6);
    }

    #[test]
    fn normal_points_away_from_bone() {
        let field = Arc::new(CapsuleField::new(2.0, 0.5).unwrap());
        let skeleton = Skeleton::single(Arc::new(Bone::new(BoneId::new(0), field)));
        let plan = FieldPlan::new(&skeleton, &BlendParams::default());

        let n = plan.normal(&Point3::new(0.3, 1.0, 0.0), 1e-5);
        assert_relative_eq!(n.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-9);

        // Outside the support box the field is flat
        assert_eq!(plan.normal(&Point3::new(3.0, 0.0, 0.0), 1e-5), Vector3::zeros());
    }
}
