use crate::scene::camera::Camera;
use crate::scene::light::Light;
use crate::scene::material::PhongMaterial;
use crate::scene::mesh::Mesh;
use crate::scene::solid::Solid;
use crate::scene::texture::Texture;
use nalgebra::{Matrix4, Vector3};
use serde::Deserialize;
use std::sync::Arc;

/// Boolean set operation of an inner CSG node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetOperation {
    #[default]
    Union,
    Intersection,
    Difference,
}

/// Index of a node in the scene graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKey {
    Material,
    Texture,
    Color,
}

/// A value attached to a node and inherited by descendants unless overridden.
#[derive(Debug, Clone)]
pub enum Attribute {
    Material(PhongMaterial),
    Texture(Arc<dyn Texture>),
    Color(Vector3<f32>),
}

impl Attribute {
    pub fn key(&self) -> AttributeKey {
        match self {
            Attribute::Material(_) => AttributeKey::Material,
            Attribute::Texture(_) => AttributeKey::Texture,
            Attribute::Color(_) => AttributeKey::Color,
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Inner {
        operation: SetOperation,
        children: Vec<NodeId>,
    },
    Leaf(Arc<dyn Solid>),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    /// Object space -> parent space.
    pub transform: Matrix4<f32>,
    attributes: Vec<Attribute>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            transform: Matrix4::identity(),
            attributes: Vec::new(),
        }
    }

    /// Attribute set directly on this node, ignoring ancestors.
    pub fn own_attribute(&self, key: AttributeKey) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.key() == key)
    }
}

/// CSG scene: node arena, camera, lights and background.
///
/// `background` doubles as the "already built" flag: builders set it last,
/// after `root` and `camera`.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    pub root: Option<NodeId>,
    pub camera: Option<Camera>,
    pub lights: Vec<Light>,
    pub background: Option<Vector3<f32>>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph is Ready once its background has been published.
    pub fn is_ready(&self) -> bool {
        self.background.is_some()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_inner(&mut self, operation: SetOperation) -> NodeId {
        self.push(NodeKind::Inner {
            operation,
            children: Vec::new(),
        })
    }

    pub fn add_solid<S: Solid + 'static>(&mut self, solid: S) -> NodeId {
        self.push(NodeKind::Leaf(Arc::new(solid)))
    }

    pub fn add_shared_solid(&mut self, solid: Arc<dyn Solid>) -> NodeId {
        self.push(NodeKind::Leaf(solid))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node::new(kind));
        NodeId(self.nodes.len() - 1)
    }

    /// Appends `child` to `parent`'s children with the given child -> parent transform.
    ///
    /// A child that already has a parent is moved. Returns `false` and changes
    /// nothing if `parent` is a leaf, or if `child` is `parent` or one of its ancestors.
    pub fn insert_child(&mut self, parent: NodeId, child: NodeId, transform: Matrix4<f32>) -> bool {
        if !matches!(self.nodes[parent.0].kind, NodeKind::Inner { .. }) || self.is_ancestor(child, parent) {
            return false;
        }

        if let Some(old) = self.nodes[child.0].parent {
            if let NodeKind::Inner { children, .. } = &mut self.nodes[old.0].kind {
                children.retain(|&c| c != child);
            }
        }

        if let NodeKind::Inner { children, .. } = &mut self.nodes[parent.0].kind {
            children.push(child);
        }
        let node = &mut self.nodes[child.0];
        node.parent = Some(parent);
        node.transform = transform;
        true
    }

    /// True if `ancestor` is `node` itself or lies on its parent chain.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    /// Attaches or overrides an attribute on `node`.
    pub fn set_attribute(&mut self, node: NodeId, value: Attribute) {
        let attrs = &mut self.nodes[node.0].attributes;
        match attrs.iter_mut().find(|a| a.key() == value.key()) {
            Some(slot) => *slot = value,
            None => attrs.push(value),
        }
    }

    /// Resolves an attribute by walking the parent chain.
    pub fn attribute(&self, node: NodeId, key: AttributeKey) -> Option<&Attribute> {
        let mut current = Some(node);
        while let Some(id) = current {
            let n = &self.nodes[id.0];
            if let Some(a) = n.own_attribute(key) {
                return Some(a);
            }
            current = n.parent;
        }
        None
    }

    pub fn material(&self, node: NodeId) -> Option<&PhongMaterial> {
        match self.attribute(node, AttributeKey::Material) {
            Some(Attribute::Material(m)) => Some(m),
            _ => None,
        }
    }

    pub fn color(&self, node: NodeId) -> Option<Vector3<f32>> {
        match self.attribute(node, AttributeKey::Color) {
            Some(Attribute::Color(c)) => Some(*c),
            _ => None,
        }
    }

    pub fn texture(&self, node: NodeId) -> Option<&Arc<dyn Texture>> {
        match self.attribute(node, AttributeKey::Texture) {
            Some(Attribute::Texture(t)) => Some(t),
            _ => None,
        }
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        match &self.nodes[node.0].kind {
            NodeKind::Inner { children, .. } => children.as_slice(),
            NodeKind::Leaf(_) => &[],
        }
    }

    /// Object space -> world space of `node`.
    pub fn world_transform(&self, node: NodeId) -> Matrix4<f32> {
        let mut m = Matrix4::identity();
        let mut current = Some(node);
        while let Some(id) = current {
            let n = &self.nodes[id.0];
            m = n.transform * m;
            current = n.parent;
        }
        m
    }

    /// Leaves reachable from the root, in insertion order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            match &self.nodes[id.0].kind {
                NodeKind::Leaf(_) => out.push(id),
                NodeKind::Inner { children, .. } => stack.extend(children.iter().rev()),
            }
        }
        out
    }

    /// Triangulated preview of every reachable solid in world space.
    /// Set operations are not evaluated; every primitive is emitted whole.
    pub fn tessellate(&self) -> Mesh {
        let mut mesh = Mesh::default();
        for id in self.leaves() {
            if let NodeKind::Leaf(solid) = &self.nodes[id.0].kind {
                mesh.append_transformed(&solid.tessellate(), &self.world_transform(id));
            }
        }
        mesh
    }
}
