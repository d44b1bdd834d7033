// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Nodes of the node editor.  Records hold absolute positions; node locations are stored
//! relative to their parent frame, so the flush subtracts the frame offset again.

use super::write;
use crate::error::TransformError;
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::trans_data::{ExtraData, OwnerRef, TdFlags, TransData, TransDataContainer};
use common::math::{flatten, lift};
use scene::nodes::NodeTree;
use scene::{DataSource, Scene};
use ultraviolet::Vec2;

pub(crate) struct NodeConverter;

fn create_trans_node_data(tree: &NodeTree) -> TransDataContainer {
    let mut tc = TransDataContainer::new(DataSource::NodeTree, TransDomain::Node);
    for (i, node) in tree.nodes.iter().enumerate() {
        // Children of a selected frame move with it.
        if !node.selected || tree.has_selected_ancestor(i) {
            continue;
        }
        let Some(abs) = tree.absolute_location(i) else {
            continue;
        };
        tc.data.push(
            TransData::new(OwnerRef::Node(i), lift(abs))
                .with_flags(TdFlags::SELECTED)
                .with_extra(ExtraData::Native2D(node.location)),
        );
    }
    tc
}

fn snap(v: Vec2, grid: f32) -> Vec2 {
    if grid > 0.0 {
        Vec2::new((v.x / grid).round() * grid, (v.y / grid).round() * grid)
    } else {
        v
    }
}

fn write_back(
    ctx: &TransContext,
    tc: &TransDataContainer,
    tree: &mut NodeTree,
    report: &mut FlushReport,
) {
    for td in tc.data() {
        let (OwnerRef::Node(i), &ExtraData::Native2D(original)) = (td.owner, &td.extra) else {
            continue;
        };
        let location = if td.is_changed() {
            let mut abs = flatten(td.working_location);
            if let Some(grid) = ctx.settings.node_grid {
                abs = snap(abs, grid);
            }
            abs - tree.parent_offset(i)
        } else {
            original
        };
        if let Some(node) = tree.nodes.get_mut(i) {
            write(&mut node.location, location, report);
        }
    }
}

impl TransConvert for NodeConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        t.containers.push(create_trans_node_data(&scene.node_tree));
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError> {
        let len = scene.node_tree.nodes.len();
        tc.check_owners(|owner| matches!(owner, OwnerRef::Node(i) if i < len))
    }

    fn flush(
        &self,
        ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        write_back(ctx, tc, &mut scene.node_tree, report);
        Ok(())
    }

    fn restore(
        &self,
        ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        write_back(ctx, tc, &mut scene.node_tree, &mut FlushReport::default());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{PivotMode, TransformSettings};
    use scene::nodes::Node;

    #[test]
    fn framed_node_is_written_relative_to_its_frame() {
        let mut frame = Node::new("Frame", Vec2::new(100.0, 0.0));
        frame.selected = false;
        let mut child = Node::new("Mix", Vec2::new(5.0, 5.0));
        child.parent = Some(0);
        child.selected = true;
        let mut tree = NodeTree {
            nodes: vec![frame, child],
        };
        let mut tc = create_trans_node_data(&tree);
        assert_eq!(tc.len(), 1);
        assert_eq!(tc.data()[0].working_location, lift(Vec2::new(105.0, 5.0)));

        tc.data_mut()[0].working_location = lift(Vec2::new(112.0, 7.0));
        let mut ctx = TransContext {
            mode: Default::default(),
            pivot: PivotMode::MedianPoint,
            settings: TransformSettings::default(),
        };
        ctx.settings.node_grid = Some(10.0);
        write_back(&ctx, &tc, &mut tree, &mut FlushReport::default());
        assert_eq!(tree.nodes[1].location, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn children_of_selected_frames_are_skipped() {
        let mut frame = Node::new("Frame", Vec2::zero());
        frame.selected = true;
        let mut child = Node::new("Mix", Vec2::one());
        child.parent = Some(0);
        child.selected = true;
        let tree = NodeTree {
            nodes: vec![frame, child],
        };
        assert_eq!(create_trans_node_data(&tree).len(), 1);
    }
}

// End of File
