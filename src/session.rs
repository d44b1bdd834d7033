// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! The engine-facing side of the pipeline: convert a selection into containers, let the engine
//! edit the records, then flush, confirm or cancel.

use crate::domains;
use crate::error::TransformError;
use crate::pivot;
use crate::pose::IkSolverScope;
use crate::settings::{PivotMode, TransformMode, TransformSettings};
use crate::trans_data::TransDataContainer;
use scene::{DataSource, ObjectId, Scene};
use ultraviolet::{Mat3, Vec3};

/// Which kind of native data a container holds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TransDomain {
    Mesh,
    Curve,
    Lattice,
    MetaBall,
    EditArmature,
    Pose,
    Particle,
    Cursor3D,
    ImageCursor,
    Uv,
    Node,
    Sequencer,
    Tracking,
    Mask,
    PaintCurve,
    Graph,
    Action,
}

impl TransDomain {
    pub(crate) fn converter(self) -> &'static dyn TransConvert {
        match self {
            TransDomain::Mesh => &domains::mesh::MeshConverter,
            TransDomain::Curve => &domains::curve::CurveConverter,
            TransDomain::Lattice => &domains::lattice::LatticeConverter,
            TransDomain::MetaBall => &domains::mball::MetaBallConverter,
            TransDomain::EditArmature => &domains::armature::EditArmatureConverter,
            TransDomain::Pose => &domains::pose::PoseConverter,
            TransDomain::Particle => &domains::particle::ParticleConverter,
            TransDomain::Cursor3D => &domains::cursor::Cursor3DConverter,
            TransDomain::ImageCursor => &domains::cursor::ImageCursorConverter,
            TransDomain::Uv => &domains::uv::UvConverter,
            TransDomain::Node => &domains::node::NodeConverter,
            TransDomain::Sequencer => &domains::sequencer::SequencerConverter,
            TransDomain::Tracking => &domains::tracking::TrackingConverter,
            TransDomain::Mask => &domains::mask::MaskConverter,
            TransDomain::PaintCurve => &domains::paint_curve::PaintCurveConverter,
            TransDomain::Graph => &domains::graph::GraphConverter,
            TransDomain::Action => &domains::graph::ActionConverter,
        }
    }
}

/// What the operation is doing, fixed for its duration except for the pose mode switch.
#[derive(Clone, Debug, PartialEq)]
pub struct TransContext {
    pub mode: TransformMode,
    pub pivot: PivotMode,
    pub settings: TransformSettings,
}

#[derive(Clone, Debug)]
pub struct TransInfo {
    pub context: TransContext,
    pub containers: Vec<TransDataContainer>,
    /// The pivot, in world space.
    pub center: Vec3,
    pub axis: Mat3,
    /// Cursor position used by the cursor pivot.
    pub cursor: Vec3,
}

impl TransInfo {
    pub fn new(context: TransContext, cursor: Vec3) -> Self {
        Self {
            context,
            containers: Vec::new(),
            center: Vec3::zero(),
            axis: Mat3::identity(),
            cursor,
        }
    }

    pub fn data_len_all(&self) -> usize {
        self.containers.iter().map(|tc| tc.len()).sum()
    }
}

/// Counts of what a flush did.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FlushReport {
    /// Elements written to native storage.
    pub written: usize,
    /// Elements whose value was replaced by the nearest valid one.
    pub clamped: usize,
    /// Elements, or whole containers, left at their previous value.
    pub rejected: usize,
}

impl std::ops::AddAssign for FlushReport {
    fn add_assign(&mut self, rhs: Self) {
        self.written += rhs.written;
        self.clamped += rhs.clamped;
        self.rejected += rhs.rejected;
    }
}

/// Receives invalidation after records are committed: once per source, never per element.
pub trait UpdateNotifier {
    fn tag_update(&mut self, source: DataSource);

    /// Cached simulation state of the object's particles no longer matches the edited paths.
    fn particles_stale(&mut self, object: ObjectId) {
        let _ = object;
    }
}

impl UpdateNotifier for () {
    fn tag_update(&mut self, _source: DataSource) {}
}

/// The gather and scatter halves of one domain.
pub(crate) trait TransConvert: Sync {
    /// Appends one container per edited source to `t`.  An empty selection yields an empty
    /// container, not an error.
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError>;

    /// Checks that every owner in `tc` still resolves.
    fn validate(&self, tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError>;

    /// Writes changed records back.  Called after `validate` succeeded for every container.
    fn flush(
        &self,
        ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError>;

    /// Writes the original values back, after the records were reset.
    fn restore(
        &self,
        ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError>;

    /// Confirm-only work that must not happen on every update.
    fn finish(
        &self,
        ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        let _ = (ctx, tc, scene, report);
        Ok(())
    }
}

/// One interactive transform.  Exactly one session exists per editing session; it must end in
/// [`confirm`](Self::confirm), [`cancel`](Self::cancel) or [`abort`](Self::abort).
#[derive(Debug)]
pub struct TransformSession {
    info: TransInfo,
    ik_scope: Option<IkSolverScope>,
    finished: bool,
}

static_assertions::assert_impl_all!(TransformSession: Send);

impl TransformSession {
    /// Converts the current selection of `domain`.
    pub fn convert(
        scene: &mut Scene,
        domain: TransDomain,
        mode: TransformMode,
        pivot: PivotMode,
        settings: TransformSettings,
    ) -> Result<Self, TransformError> {
        let context = TransContext {
            mode,
            pivot,
            settings,
        };
        let mut info = TransInfo::new(context, scene.cursor.location);

        let mut ik_scope = (domain == TransDomain::Pose)
            .then(|| IkSolverScope::acquire(scene, mode, &info.context.settings));
        if let Err(err) = domain.converter().create(&mut info, scene) {
            if let Some(scope) = &mut ik_scope {
                scope.restore(scene);
            }
            return Err(err);
        }
        pivot::calculate_center(&mut info);

        log::debug!(
            "Converted {:?} for {:?}: {} containers, {} records",
            domain,
            info.context.mode,
            info.containers.len(),
            info.data_len_all()
        );
        Ok(Self {
            info,
            ik_scope,
            finished: false,
        })
    }

    pub fn info(&self) -> &TransInfo {
        &self.info
    }

    /// The mode in effect, which a pose conversion may have switched.
    pub fn mode(&self) -> TransformMode {
        self.info.context.mode
    }

    pub fn center(&self) -> Vec3 {
        self.info.center
    }

    pub fn axis(&self) -> Mat3 {
        self.info.axis
    }

    pub fn containers(&self) -> &[TransDataContainer] {
        &self.info.containers
    }

    pub fn containers_mut(&mut self) -> &mut [TransDataContainer] {
        &mut self.info.containers
    }

    /// Changes the chain length of automatic IK constraints while dragging.
    pub fn autoik_update(&mut self, scene: &mut Scene, delta: i32) -> bool {
        match &mut self.ik_scope {
            Some(scope) => crate::pose::transform_autoik_update(scope, scene, delta),
            None => false,
        }
    }

    fn validate(&self, scene: &Scene) -> Result<(), TransformError> {
        for tc in &self.info.containers {
            tc.domain.converter().validate(tc, scene)?;
        }
        Ok(())
    }

    /// Writes the current records to native storage.  Owners are validated for every container
    /// before anything is written.
    pub fn flush(
        &mut self,
        scene: &mut Scene,
        notifier: &mut dyn UpdateNotifier,
    ) -> Result<FlushReport, TransformError> {
        if self.finished {
            return Err(TransformError::SessionFinished);
        }
        self.validate(scene)?;
        let mut report = FlushReport::default();
        for tc in &mut self.info.containers {
            let mut local = FlushReport::default();
            tc.domain
                .converter()
                .flush(&self.info.context, tc, scene, &mut local)?;
            notify(tc, local, notifier);
            report += local;
        }
        if report.clamped + report.rejected > 0 {
            log::warn!(
                "Flush clamped {} and rejected {} elements",
                report.clamped,
                report.rejected
            );
        }
        Ok(report)
    }

    /// Flushes a last time, runs confirm-only fixups and releases transient state.  On failure
    /// the session is aborted and nothing is written.
    pub fn confirm(
        mut self,
        scene: &mut Scene,
        notifier: &mut dyn UpdateNotifier,
    ) -> Result<FlushReport, TransformError> {
        let mut report = match self.flush(scene, notifier) {
            Ok(report) => report,
            Err(err) => {
                self.release(scene);
                return Err(err);
            }
        };
        let mut result = Ok(());
        for tc in &mut self.info.containers {
            let mut local = FlushReport::default();
            result = tc
                .domain
                .converter()
                .finish(&self.info.context, tc, scene, &mut local);
            if result.is_err() {
                break;
            }
            notify(tc, local, notifier);
            report += local;
        }
        self.release(scene);
        result.map(|_| report)
    }

    /// Puts every element back to its value at conversion time and releases transient state.
    pub fn cancel(
        mut self,
        scene: &mut Scene,
        notifier: &mut dyn UpdateNotifier,
    ) -> Result<(), TransformError> {
        if let Err(err) = self.validate(scene) {
            self.release(scene);
            return Err(err);
        }
        let mut result = Ok(());
        for tc in &mut self.info.containers {
            tc.reset();
            result = tc
                .domain
                .converter()
                .restore(&self.info.context, tc, scene);
            if result.is_err() {
                break;
            }
            notifier.tag_update(tc.source);
        }
        self.release(scene);
        result
    }

    /// Ends the operation without writing anything, after a failed flush for instance.
    /// Transient state is still released.
    pub fn abort(mut self, scene: &mut Scene) {
        self.release(scene);
    }

    fn release(&mut self, scene: &mut Scene) {
        if let Some(scope) = &mut self.ik_scope {
            scope.restore(scene);
        }
        self.finished = true;
    }
}

fn notify(tc: &TransDataContainer, report: FlushReport, notifier: &mut dyn UpdateNotifier) {
    if report.written == 0 {
        return;
    }
    notifier.tag_update(tc.source);
    if let (TransDomain::Particle, DataSource::Object(id)) = (tc.domain, tc.source) {
        notifier.particles_stale(id);
    }
}

impl Drop for TransformSession {
    fn drop(&mut self) {
        if !self.finished {
            log::warn!("Transform session dropped without confirm, cancel or abort");
        }
    }
}

// End of File
