pub mod to_custom;
pub mod to_dot;
pub mod to_json;
pub mod to_mermaid;

/// Common context preparation shared by the handlebars-based exporters.
pub mod renderer {
    use serde_json::{json, Value};

    use crate::build::BuildOutput;
    use crate::graph::NodeKind;
    use crate::node::{describe_node, is_app_node};

    fn kind_tag(payload: &NodeKind) -> &'static str {
        match payload {
            NodeKind::Resource(_) => "resource",
            NodeKind::Grouped(_) => "grouped",
            NodeKind::PodGroup(_) => "podGroup",
            NodeKind::TrafficAnchor { .. } => "trafficAnchor",
            NodeKind::LoadBalancer { .. } => "loadBalancer",
            NodeKind::FilteredIndicator { .. } => "filteredIndicator",
        }
    }

    pub fn node_views(output: &BuildOutput) -> Vec<Value> {
        output
            .nodes
            .iter()
            .map(|node| {
                let mut view = json!({
                    "id": node.id,
                    "label": node.payload.label(),
                    "kind": kind_tag(&node.payload),
                    "x": node.x,
                    "y": node.y,
                    "width": node.width,
                    "height": node.height,
                });
                if let Some(tree_node) = node.payload.tree_node() {
                    view["resourceKind"] = json!(tree_node.kind);
                    view["namespace"] = json!(tree_node.namespace);
                    view["health"] = json!(tree_node.health_code());
                    view["sync"] = json!(tree_node.status);
                    view["orphaned"] = json!(tree_node.orphaned);
                    view["isApplication"] = json!(is_app_node(tree_node));
                    view["description"] = json!(describe_node(tree_node));
                    if let Some(info) = &tree_node.networking_info {
                        if !info.external_urls.is_empty() {
                            view["externalUrls"] = json!(info.external_urls);
                        }
                    }
                }
                view
            })
            .collect()
    }

    pub fn edge_views(output: &BuildOutput) -> Vec<Value> {
        output
            .edges
            .iter()
            .map(|edge| {
                json!({
                    "from": edge.from,
                    "to": edge.to,
                    "color": edge.colors.first(),
                    "colors": edge.colors,
                    "lines": edge.lines,
                })
            })
            .collect()
    }

    pub fn template_data(output: &BuildOutput) -> Value {
        json!({
            "nodes": node_views(output),
            "edges": edge_views(output),
            "canvas": output.canvas,
            "filtered_count": output.filtered_count,
        })
    }

}
