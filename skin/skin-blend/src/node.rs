//! The implicit blend node.

use std::sync::Arc;

use skin_polygonize::{MeshGeometry, PolygonizeParams, PolygonizeResult, polygonize};
use skin_skeleton::{Skeleton, SkeletonError, SkeletonResult, SurfaceSlots, merge_skeletons};
use tracing::{debug, error};

use crate::dependencies::{AttributeDependencies, BlendAttribute};
use crate::outcome::UpdateOutcome;

/// Combines per-surface sub-skeletons into one skeleton and polygonizes it.
///
/// The node keeps two independent update paths:
///
/// - Structural: [`update_skeleton`](Self::update_skeleton) compares the
///   surface inputs with the last snapshot and merges only when they differ
/// - Pose: [`refresh_pose`](Self::refresh_pose) re-reads bone transforms into
///   the existing skeleton
///
/// Setters mark outputs dirty through the node's [`AttributeDependencies`].
/// Outputs are computed on request: [`world_implicit`](Self::world_implicit)
/// runs both update paths when dirty, and
/// [`mesh_geometry`](Self::mesh_geometry) polygonizes when dirty.
///
/// A cyclic attachment leaves the previous skeleton and geometry in place.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use skin_field::SphereField;
/// use skin_skeleton::{Bone, BoneId, Skeleton};
/// use skin_blend::{AttributeDependencies, ImplicitBlend};
///
/// let deps = Arc::new(AttributeDependencies::implicit_blend());
/// let mut node = ImplicitBlend::new("arm", deps);
///
/// let field = Arc::new(SphereField::new(1.0).unwrap());
/// let bone = |id| Arc::new(Skeleton::single(Arc::new(Bone::new(BoneId::new(id), field.clone()))));
/// node.set_surface(0, Some(bone(0)), None).unwrap();
/// node.set_surface(1, Some(bone(1)), Some(0)).unwrap();
///
/// let skeleton = node.world_implicit().unwrap();
/// assert_eq!(skeleton.bone_count(), 2);
///
/// // Unchanged inputs hand out the same skeleton
/// node.set_parent(1, Some(0)).unwrap();
/// assert!(Arc::ptr_eq(&skeleton, &node.world_implicit().unwrap()));
/// ```
#[derive(Debug)]
pub struct ImplicitBlend {
    name: String,
    dependencies: Arc<AttributeDependencies>,
    surfaces: SurfaceSlots,
    last_surfaces: Option<SurfaceSlots>,
    skeleton: Option<Arc<Skeleton>>,
    last_error: Option<SkeletonError>,
    params: PolygonizeParams,
    mesh: MeshGeometry,
    world_dirty: bool,
    mesh_dirty: bool,
}

impl ImplicitBlend {
    /// Create a node with no inputs and default polygonization parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, dependencies: Arc<AttributeDependencies>) -> Self {
        Self {
            name: name.into(),
            dependencies,
            surfaces: SurfaceSlots::new(),
            last_surfaces: None,
            skeleton: None,
            last_error: None,
            params: PolygonizeParams::default(),
            mesh: MeshGeometry::new(),
            world_dirty: true,
            mesh_dirty: true,
        }
    }

    /// Use `params` for geometry.
    #[must_use]
    pub fn with_params(mut self, params: PolygonizeParams) -> Self {
        self.params = params;
        self
    }

    /// Node name, used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current surface inputs.
    #[must_use]
    pub const fn surfaces(&self) -> &SurfaceSlots {
        &self.surfaces
    }

    /// Polygonization parameters.
    #[must_use]
    pub const fn params(&self) -> &PolygonizeParams {
        &self.params
    }

    /// Replace the polygonization parameters; geometry becomes dirty.
    pub fn set_params(&mut self, params: PolygonizeParams) {
        self.params = params;
        self.mesh_dirty = true;
    }

    /// Held skeleton, without running any update.
    #[must_use]
    pub fn skeleton(&self) -> Option<&Arc<Skeleton>> {
        self.skeleton.as_ref()
    }

    /// Error from the most recent merge, if it failed.
    #[must_use]
    pub const fn last_error(&self) -> Option<&SkeletonError> {
        self.last_error.as_ref()
    }

    /// Whether the skeleton output needs recomputing.
    #[must_use]
    pub const fn is_world_dirty(&self) -> bool {
        self.world_dirty
    }

    /// Whether the geometry output needs recomputing.
    #[must_use]
    pub const fn is_mesh_dirty(&self) -> bool {
        self.mesh_dirty
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Set a surface's sub-skeleton and parent surface.
    ///
    /// # Errors
    ///
    /// Returns [`SkeletonError::SurfaceIndexOutOfRange`] if `index` is not
    /// below [`MAX_SURFACES`](skin_skeleton::MAX_SURFACES). Nothing is
    /// marked dirty in that case.
    pub fn set_surface(
        &mut self,
        index: usize,
        skeleton: Option<Arc<Skeleton>>,
        parent: Option<usize>,
    ) -> SkeletonResult<()> {
        self.surfaces.set(index, skeleton, parent)?;
        self.set_dependents_dirty(BlendAttribute::Surfaces);
        Ok(())
    }

    /// Set a surface's sub-skeleton.
    ///
    /// # Errors
    ///
    /// See [`ImplicitBlend::set_surface`].
    pub fn set_implicit(&mut self, index: usize, skeleton: Option<Arc<Skeleton>>) -> SkeletonResult<()> {
        self.surfaces.set_skeleton(index, skeleton)?;
        self.set_dependents_dirty(BlendAttribute::Implicit);
        Ok(())
    }

    /// Set a surface's parent surface.
    ///
    /// # Errors
    ///
    /// See [`ImplicitBlend::set_surface`].
    pub fn set_parent(&mut self, index: usize, parent: Option<usize>) -> SkeletonResult<()> {
        self.surfaces.set_parent(index, parent)?;
        self.set_dependents_dirty(BlendAttribute::ParentIndex);
        Ok(())
    }

    /// Remove a surface.
    pub fn clear_surface(&mut self, index: usize) {
        self.surfaces.clear(index);
        self.set_dependents_dirty(BlendAttribute::Surfaces);
    }

    /// Mark everything that depends on `changed` as dirty.
    ///
    /// Call this when something upstream changed without going through a
    /// setter, e.g. a shared bone moved. Returns `true` when the geometry
    /// must be redrawn.
    pub fn set_dependents_dirty(&mut self, changed: BlendAttribute) -> bool {
        if self.dependencies.is_affected_by(BlendAttribute::WorldImplicit, changed) {
            self.world_dirty = true;
        }
        let redraw = self
            .dependencies
            .is_affected_by(BlendAttribute::MeshGeometryUpdate, changed);
        if redraw {
            self.mesh_dirty = true;
        }
        redraw
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Merge the surface inputs into a new skeleton if they changed.
    ///
    /// Inputs are compared with the last snapshot by sub-skeleton identity
    /// and parent index. The snapshot is replaced before merging, so the same
    /// failing input is reported once.
    pub fn update_skeleton(&mut self) -> UpdateOutcome {
        if self.last_surfaces.as_ref() == Some(&self.surfaces) {
            debug!(node = %self.name, "Surface inputs unchanged, keeping skeleton");
            return UpdateOutcome::Unchanged;
        }
        self.last_surfaces = Some(self.surfaces.clone());

        match merge_skeletons(&self.surfaces) {
            Ok(Some(skeleton)) => {
                let bones = skeleton.bone_count();
                debug!(node = %self.name, bones, "Rebuilt skeleton");
                self.skeleton = Some(Arc::new(skeleton));
                self.last_error = None;
                UpdateOutcome::Rebuilt { bones }
            }
            Ok(None) => {
                debug!(node = %self.name, "Surface inputs have no bones, clearing skeleton");
                self.skeleton = None;
                self.last_error = None;
                UpdateOutcome::Cleared
            }
            Err(err) => {
                match &err {
                    SkeletonError::CyclicAttachment { surface } => {
                        error!(node = %self.name, surface, "The implicit blend node {} contains cycles", self.name);
                    }
                    other => {
                        error!(node = %self.name, error = %other, "Skeleton merge failed");
                    }
                }
                self.last_error = Some(err.clone());
                UpdateOutcome::Rejected(err)
            }
        }
    }

    /// Re-read bone transforms into the held skeleton's pose snapshot.
    ///
    /// Structure is untouched. Returns `false` when there is no skeleton.
    pub fn refresh_pose(&mut self) -> bool {
        let Some(skeleton) = &self.skeleton else {
            return false;
        };
        skeleton.update_bones_data();
        self.mesh_dirty = true;
        true
    }

    // =========================================================================
    // Outputs
    // =========================================================================

    /// The merged skeleton, updating structure and pose first if dirty.
    ///
    /// The result can be a surface input of another node.
    pub fn world_implicit(&mut self) -> Option<Arc<Skeleton>> {
        if self.world_dirty {
            let outcome = self.update_skeleton();
            debug!(node = %self.name, %outcome, "Structural update");
            self.refresh_pose();
            self.world_dirty = false;
        }
        self.skeleton.clone()
    }

    /// Geometry of the merged skeleton, polygonizing first if dirty.
    ///
    /// Without a skeleton the geometry is empty.
    ///
    /// # Errors
    ///
    /// Returns the polygonizer's error; the previous geometry is kept and
    /// stays dirty.
    pub fn mesh_geometry(&mut self) -> PolygonizeResult<&MeshGeometry> {
        if self.mesh_dirty {
            let skeleton = self.world_implicit();
            self.mesh = polygonize(skeleton.as_deref(), &self.params)?;
            self.mesh_dirty = false;
            debug!(node = %self.name, "{}", self.mesh);
        }
        Ok(&self.mesh)
    }
}
