// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Particle path keys in particle edit mode.  Records live in object space; keys are stored in
//! the hair space of their particle.

use super::{object, object_mut, write};
use crate::error::TransformError;
use crate::falloff::calc_distance_curve_verts;
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::trans_data::{ExtraData, OwnerRef, TdFlags, TransData, TransDataContainer};
use common::math::pseudo_inverse;
use scene::particles::ParticleSystem;
use scene::{DataSource, ObjectMode, Scene};

pub(crate) struct ParticleConverter;

fn create_trans_particle_verts(
    t: &TransInfo,
    source: DataSource,
    psys: &ParticleSystem,
) -> TransDataContainer {
    let settings = &t.context.settings;
    let mut tc = TransDataContainer::new(source, TransDomain::Particle);
    for (p, particle) in psys.particles.iter().enumerate() {
        if particle.hidden {
            continue;
        }
        let first = tc.data.len();
        for (k, key) in particle.keys.iter().enumerate() {
            if !(key.selected || settings.proportional) {
                continue;
            }
            let co = particle.hair_matrix * key.co + particle.hair_offset;
            let mut td = TransData::new(OwnerRef::ParticleKey { particle: p, key: k }, co)
                .with_space(particle.hair_matrix)
                .with_extra(ExtraData::Particle {
                    hair_matrix: particle.hair_matrix,
                    hair_offset: particle.hair_offset,
                    original: key.co,
                });
            if key.selected {
                td.flags |= TdFlags::SELECTED;
            }
            if k == 0 && psys.is_hair && settings.particle_lock_root {
                td.flags |= TdFlags::SKIP;
            }
            tc.data.push(td);
        }
        if settings.proportional {
            calc_distance_curve_verts(
                &mut tc.data[first..],
                false,
                settings.disconnected_falloff,
            );
        }
    }
    tc
}

fn write_back(tc: &TransDataContainer, psys: &mut ParticleSystem, report: &mut FlushReport) {
    for td in tc.data() {
        let OwnerRef::ParticleKey { particle, key } = td.owner else {
            continue;
        };
        let ExtraData::Particle {
            hair_matrix,
            hair_offset,
            original,
        } = td.extra
        else {
            continue;
        };
        let co = if td.is_changed() && !td.flags.contains(TdFlags::SKIP) {
            pseudo_inverse(hair_matrix) * (td.working_location - hair_offset)
        } else {
            original
        };
        if let Some(k) = psys
            .particles
            .get_mut(particle)
            .and_then(|p| p.keys.get_mut(key))
        {
            write(&mut k.co, co, report);
        }
    }
}

fn psys_of(scene: &mut Scene, source: DataSource) -> Result<&mut ParticleSystem, TransformError> {
    object_mut(scene, source)?
        .particles
        .as_mut()
        .ok_or(TransformError::MissingSource(source))
}

impl TransConvert for ParticleConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        let mut containers = Vec::new();
        for ob in scene.objects_in_mode(ObjectMode::ParticleEdit) {
            if let Some(psys) = &ob.particles {
                containers.push(
                    create_trans_particle_verts(t, DataSource::Object(ob.id), psys)
                        .with_matrix(ob.matrix, ob.location),
                );
            }
        }
        t.containers.extend(containers);
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError> {
        let psys = object(scene, tc.source)?
            .particles
            .as_ref()
            .ok_or(TransformError::MissingSource(tc.source))?;
        tc.check_owners(|owner| match owner {
            OwnerRef::ParticleKey { particle, key } => psys
                .particles
                .get(particle)
                .is_some_and(|p| key < p.keys.len()),
            _ => false,
        })
    }

    fn flush(
        &self,
        _ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        write_back(tc, psys_of(scene, tc.source)?, report);
        Ok(())
    }

    fn restore(
        &self,
        _ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        write_back(tc, psys_of(scene, tc.source)?, &mut FlushReport::default());
        Ok(())
    }
}

// End of File
