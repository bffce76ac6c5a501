//! Scene graph primitive: nodes with composable transforms, stored in an arena.
//!
//! A node's pose is `global = parent.global * link * joint`, or `link * joint` for a
//! node without a parent. `shape` is only used for placing a node's mesh and never
//! flows down to children.

use crate::types::Matrix;
use cgmath::SquareMatrix;
use slotmap::SlotMap;

slotmap::new_key_type! { pub struct NodeId; }

#[derive(Debug, Clone)]
pub struct TransformNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Static, placement of the node's mesh only.
    pub shape: Matrix,
    /// Static offset from the parent.
    pub link: Matrix,
    /// Dynamic, rewritten every animation tick.
    pub joint: Matrix,
    global: Matrix,
}

impl Default for TransformNode {
    fn default() -> Self {
        TransformNode {
            parent: None,
            children: Vec::new(),
            shape: Matrix::identity(),
            link: Matrix::identity(),
            joint: Matrix::identity(),
            global: Matrix::identity(),
        }
    }
}

impl TransformNode {
    pub fn new(link: Matrix, shape: Matrix) -> Self {
        TransformNode {
            link,
            shape,
            ..Default::default()
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Last propagated world transform.
    pub fn global(&self) -> Matrix {
        self.global
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, TransformNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        SceneGraph::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&TransformNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TransformNode> {
        self.nodes.get_mut(id)
    }

    /// Add a parentless node.
    pub fn insert(&mut self, node: TransformNode) -> NodeId {
        self.nodes.insert(node)
    }

    pub fn insert_child(&mut self, parent: NodeId, node: TransformNode) -> NodeId {
        let id = self.insert(node);
        self.reparent(id, Some(parent));
        id
    }

    /// Detach `id` from its current parent (if any) and attach it under `new_parent`.
    /// Global transforms are left stale; call `compute_global` afterwards.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) {
        debug_assert!(
            new_parent.map_or(true, |p| !self.is_ancestor(id, p)),
            "reparenting would create a cycle"
        );
        if let Some(old) = self.nodes[id].parent.take() {
            if let Some(old) = self.nodes.get_mut(old) {
                old.children.retain(|&child| child != id);
            }
        }
        self.nodes[id].parent = new_parent;
        if let Some(parent) = new_parent {
            let children = &mut self.nodes[parent].children;
            if !children.contains(&id) {
                children.push(id);
            }
        }
    }

    /// True if `ancestor` is `id` or lies on the path from `id` to its root.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(current).and_then(|n| n.parent);
        }
        false
    }

    /// Nodes without a parent, in no particular order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn set_joint(&mut self, id: NodeId, joint: Matrix) {
        self.nodes[id].joint = joint;
    }

    pub fn set_link(&mut self, id: NodeId, link: Matrix) {
        self.nodes[id].link = link;
    }

    pub fn set_shape(&mut self, id: NodeId, shape: Matrix) {
        self.nodes[id].shape = shape;
    }

    pub fn global(&self, id: NodeId) -> Matrix {
        self.nodes[id].global
    }

    /// Matrix a renderer should place this node's mesh with.
    pub fn model_matrix(&self, id: NodeId) -> Matrix {
        let node = &self.nodes[id];
        node.global * node.shape
    }

    /// Recompute `global` for `start` and everything below it. The parent of `start`
    /// must already be up to date.
    pub fn compute_global(&mut self, start: NodeId) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let parent_global = self.nodes[id].parent.map(|p| self.nodes[p].global);
            let node = &mut self.nodes[id];
            let local = node.link * node.joint;
            node.global = match parent_global {
                Some(parent_global) => parent_global * local,
                None => local,
            };
            // reversed so children are visited in insertion order
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Remove `id` and all of its descendants.
    pub fn remove_subtree(&mut self, id: NodeId) {
        self.reparent(id, None);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
            }
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;
    use approx::assert_abs_diff_eq;
    use cgmath::{Deg, Matrix4};

    fn translation(x: f64, y: f64, z: f64) -> Matrix {
        Matrix4::from_translation(Position::new(x, y, z))
    }

    #[test]
    fn global_composes_parent_link_and_joint() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(TransformNode::new(translation(1.0, 0.0, 0.0), Matrix::identity()));
        let child = graph.insert_child(
            root,
            TransformNode::new(translation(0.0, 2.0, 0.0), Matrix::identity()),
        );
        graph.set_joint(root, Matrix4::from_angle_z(Deg(90.0)));
        graph.compute_global(root);

        let expected = translation(1.0, 0.0, 0.0)
            * Matrix4::from_angle_z(Deg(90.0))
            * translation(0.0, 2.0, 0.0);
        assert_abs_diff_eq!(graph.global(child), expected, epsilon = 1e-12);
    }

    #[test]
    fn propagation_is_idempotent() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(TransformNode::default());
        let mid = graph.insert_child(
            root,
            TransformNode::new(translation(0.0, 1.0, 0.0), Matrix::identity()),
        );
        let leaf = graph.insert_child(
            mid,
            TransformNode::new(translation(0.0, 1.0, 0.0), Matrix::identity()),
        );
        graph.set_joint(mid, Matrix4::from_angle_x(Deg(30.0)));

        graph.compute_global(root);
        let first: Vec<Matrix> = [root, mid, leaf].iter().map(|&id| graph.global(id)).collect();
        graph.compute_global(root);
        let second: Vec<Matrix> = [root, mid, leaf].iter().map(|&id| graph.global(id)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn reparent_moves_child_between_sets() {
        let mut graph = SceneGraph::new();
        let a = graph.insert(TransformNode::default());
        let b = graph.insert(TransformNode::default());
        let c = graph.insert_child(a, TransformNode::default());

        graph.reparent(c, Some(b));
        assert!(graph.get(a).unwrap().children().is_empty());
        assert_eq!(graph.get(b).unwrap().children(), &[c]);
        assert_eq!(graph.get(c).unwrap().parent(), Some(b));

        // reparenting to the same parent twice must not duplicate the child
        graph.reparent(c, Some(b));
        assert_eq!(graph.get(b).unwrap().children().len(), 1);

        graph.reparent(c, None);
        assert_eq!(graph.roots().len(), 3);
    }

    #[test]
    fn reparent_does_not_recompute() {
        let mut graph = SceneGraph::new();
        let a = graph.insert(TransformNode::new(translation(5.0, 0.0, 0.0), Matrix::identity()));
        let c = graph.insert(TransformNode::default());
        graph.compute_global(a);
        graph.compute_global(c);

        graph.reparent(c, Some(a));
        assert_eq!(graph.global(c), Matrix::identity());
        graph.compute_global(a);
        assert_eq!(graph.global(c), translation(5.0, 0.0, 0.0));
    }

    #[test]
    fn shape_does_not_reach_children() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(TransformNode::new(Matrix::identity(), Matrix4::from_scale(3.0)));
        let child = graph.insert_child(
            root,
            TransformNode::new(translation(0.0, 1.0, 0.0), Matrix::identity()),
        );
        graph.compute_global(root);

        assert_eq!(graph.model_matrix(root), Matrix4::from_scale(3.0));
        assert_eq!(graph.global(child), translation(0.0, 1.0, 0.0));
    }

    #[test]
    fn remove_subtree_drops_descendants() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(TransformNode::default());
        let mid = graph.insert_child(root, TransformNode::default());
        graph.insert_child(mid, TransformNode::default());
        let other = graph.insert_child(root, TransformNode::default());

        graph.remove_subtree(mid);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.get(root).unwrap().children(), &[other]);
    }
}
