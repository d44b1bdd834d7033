// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Edit-mode mesh vertices.

use super::{object, object_mut, write};
use crate::error::TransformError;
use crate::falloff::{euclidean_falloff, geodesic_falloff};
use crate::islands::build_islands;
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::trans_data::{ExtraData, OwnerRef, TdFlags, TransData, TransDataContainer};
use common::math::{basis_from_normal, mirror_x};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use scene::mesh::Mesh;
use scene::{DataSource, ObjectMode, Scene};
use std::collections::HashMap;
use ultraviolet::{Mat3, Vec3};

pub(crate) struct MeshConverter;

fn create_trans_edit_verts(
    t: &TransInfo,
    source: DataSource,
    mesh: &Mesh,
) -> TransDataContainer {
    let settings = &t.context.settings;
    let mut tc = TransDataContainer::new(source, TransDomain::Mesh);
    let mut record_of = HashMap::new();

    for v in mesh.graph.node_indices() {
        let vert = &mesh.graph[v];
        if vert.is_hidden() || !(vert.is_selected() || settings.proportional) {
            continue;
        }
        let mut td = TransData::new(OwnerRef::Vertex(v), vert.co)
            .with_flags(TdFlags::USE_ROTATE | TdFlags::USE_SCALE);
        if vert.is_selected() {
            td.flags |= TdFlags::SELECTED;
        }
        td.axis_matrix = basis_from_normal(vert.normal).unwrap_or_else(Mat3::identity);
        record_of.insert(v, tc.data.len());
        tc.data.push(td);
    }

    if settings.mirror_x {
        for td in &mut tc.data {
            let OwnerRef::Vertex(v) = td.owner else {
                continue;
            };
            let co = td.original_location();
            if co.x.abs() <= settings.mirror_epsilon {
                td.flags |= TdFlags::MIRROR_EDGE_X;
            } else if let Some(m) = mesh.mirror_vertex(v, settings.mirror_epsilon) {
                if !record_of.contains_key(&m) {
                    td.flags |= TdFlags::MIRRORED;
                    td.extra = ExtraData::Mirror {
                        counterpart: OwnerRef::Vertex(m),
                        original: mesh.graph[m].co,
                    };
                }
            }
        }
    }

    if settings.proportional {
        if settings.proportional_connected {
            geodesic_falloff(mesh, &mut tc.data, &record_of, settings.disconnected_falloff);
        } else {
            euclidean_falloff(&mut tc.data, settings.disconnected_falloff);
        }
    }

    let links: Vec<(usize, usize)> = mesh
        .graph
        .edge_references()
        .filter_map(|e| Some((*record_of.get(&e.source())?, *record_of.get(&e.target())?)))
        .collect();
    let normals: Vec<Vec3> = tc
        .data
        .iter()
        .map(|td| match td.owner {
            OwnerRef::Vertex(v) => mesh.graph[v].normal,
            _ => Vec3::zero(),
        })
        .collect();
    tc.active = mesh.active.and_then(|v| record_of.get(&v).copied());
    let islands = build_islands(&mut tc.data, links, &normals, tc.active, t.context.pivot);
    tc.set_islands(islands);
    tc
}

fn target(td: &TransData) -> Vec3 {
    if !td.is_changed() {
        return td.original_location();
    }
    let mut co = td.working_location;
    if td.flags.contains(TdFlags::MIRROR_EDGE_X) {
        co.x = td.original_location().x;
    }
    co
}

fn write_back(tc: &TransDataContainer, mesh: &mut Mesh, report: &mut FlushReport) {
    for td in tc.data() {
        let OwnerRef::Vertex(v) = td.owner else {
            continue;
        };
        let co = target(td);
        if let Some(vert) = mesh.vertex_mut(v) {
            write(&mut vert.co, co, report);
        }
        if let ExtraData::Mirror {
            counterpart: OwnerRef::Vertex(m),
            original,
        } = td.extra
        {
            let mirrored = if td.is_changed() { mirror_x(co) } else { original };
            if let Some(vert) = mesh.vertex_mut(m) {
                write(&mut vert.co, mirrored, report);
            }
        }
    }
}

fn mesh_of(scene: &mut Scene, source: DataSource) -> Result<&mut Mesh, TransformError> {
    object_mut(scene, source)?
        .mesh_mut()
        .ok_or(TransformError::MissingSource(source))
}

fn vertex_exists(mesh: &Mesh, owner: OwnerRef) -> bool {
    matches!(owner, OwnerRef::Vertex(v) if mesh.contains(v))
}

impl TransConvert for MeshConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        let mut containers = Vec::new();
        for ob in scene.objects_in_mode(ObjectMode::Edit) {
            if let Some(mesh) = ob.mesh() {
                let tc = create_trans_edit_verts(t, DataSource::Object(ob.id), mesh)
                    .with_matrix(ob.matrix, ob.location);
                log::debug!("{}: {} vertex records", ob.name, tc.len());
                containers.push(tc);
            }
        }
        t.containers.extend(containers);
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError> {
        let mesh = object(scene, tc.source)?
            .mesh()
            .ok_or(TransformError::MissingSource(tc.source))?;
        tc.check_owners(|owner| vertex_exists(mesh, owner))?;
        for td in tc.data() {
            if let ExtraData::Mirror { counterpart, .. } = td.extra {
                if !vertex_exists(mesh, counterpart) {
                    return Err(TransformError::StaleReference {
                        data: tc.source,
                        owner: counterpart,
                    });
                }
            }
        }
        Ok(())
    }

    fn flush(
        &self,
        _ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        write_back(tc, mesh_of(scene, tc.source)?, report);
        Ok(())
    }

    fn restore(
        &self,
        _ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        write_back(tc, mesh_of(scene, tc.source)?, &mut FlushReport::default());
        Ok(())
    }
}

// End of File
