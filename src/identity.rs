use crate::model::{Application, ResourceNode, ResourceRef, ResourceStatus};

/// Group of the application CRD itself; the synthetic root node and the
/// "is this an application node" check both key off it.
pub const APPLICATION_GROUP: &str = "gitops.io";

const KEY_SEPARATOR: &str = "/";

/// Anything that carries a resource identity (group/kind/namespace/name)
/// plus an optional backend-assigned unique id.
pub trait Identified {
    fn group(&self) -> &str;
    fn kind(&self) -> &str;
    fn namespace(&self) -> &str;
    fn name(&self) -> &str;
    fn uid(&self) -> &str {
        ""
    }
}

impl Identified for ResourceRef {
    fn group(&self) -> &str {
        &self.group
    }
    fn kind(&self) -> &str {
        &self.kind
    }
    fn namespace(&self) -> &str {
        &self.namespace
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn uid(&self) -> &str {
        &self.uid
    }
}

impl Identified for ResourceNode {
    fn group(&self) -> &str {
        &self.group
    }
    fn kind(&self) -> &str {
        &self.kind
    }
    fn namespace(&self) -> &str {
        &self.namespace
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn uid(&self) -> &str {
        &self.uid
    }
}

impl Identified for ResourceStatus {
    fn group(&self) -> &str {
        &self.group
    }
    fn kind(&self) -> &str {
        &self.kind
    }
    fn namespace(&self) -> &str {
        &self.namespace
    }
    fn name(&self) -> &str {
        &self.name
    }
}

/// Canonical identity key: `group/kind/namespace/name`. Deterministic for
/// structurally equal inputs; used as map key and list key everywhere.
pub fn node_key<T: Identified + ?Sized>(node: &T) -> String {
    [node.group(), node.kind(), node.namespace(), node.name()].join(KEY_SEPARATOR)
}

/// Graph node key: prefers the backend-assigned uid when present, falls
/// back to the identity key.
pub fn tree_node_key<T: Identified + ?Sized>(node: &T) -> String {
    if node.uid().is_empty() {
        node_key(node)
    } else {
        node.uid().to_string()
    }
}

/// Key of the application's own synthetic root node.
pub fn app_node_key(app: &Application) -> String {
    [
        APPLICATION_GROUP,
        &app.kind,
        &app.metadata.namespace,
        &app.metadata.name,
    ]
    .join(KEY_SEPARATOR)
}
