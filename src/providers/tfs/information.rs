use std::collections::HashMap;

use serde_json::Value;

use super::types::DetailNode;
use crate::builds::InformationNode;

/// Rebuilds the information tree from the flat `parentId`-linked list.
///
/// Nodes without a known parent hang off a synthetic, field-less root, in
/// wire order. Every node is placed exactly once: nodes caught in a parent
/// cycle are promoted to the root, so the result is always a finite tree.
pub(super) fn assemble_tree(nodes: Vec<DetailNode>) -> InformationNode {
    let count = nodes.len();
    let position: HashMap<i64, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id, i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut roots = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        let parent = node
            .parent_id
            .filter(|&parent| parent != node.id)
            .and_then(|parent| position.get(&parent));
        match parent {
            Some(&parent) => children[parent].push(i),
            None => roots.push(i),
        }
    }

    // Pre-order walk from the real roots first, then from anything left over.
    let mut visited = vec![false; count];
    let mut parent_of: Vec<Option<usize>> = vec![None; count];
    let mut order = Vec::with_capacity(count);
    let mut top_level = Vec::new();
    for start in roots.into_iter().chain(0..count) {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        top_level.push(start);

        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            order.push(i);
            for &child in children[i].iter().rev() {
                if !visited[child] {
                    visited[child] = true;
                    parent_of[child] = Some(i);
                    stack.push(child);
                }
            }
        }
    }

    let mut built: Vec<Option<InformationNode>> = nodes
        .into_iter()
        .map(|node| {
            Some(InformationNode {
                fields: node
                    .fields
                    .into_iter()
                    .map(|(key, value)| (key, field_text(value)))
                    .collect(),
                children: Vec::new(),
            })
        })
        .collect();

    // Reverse pre-order: each node is complete before its parent claims it.
    for &i in order.iter().rev() {
        let claimed: Vec<InformationNode> = children[i]
            .iter()
            .filter(|&&child| parent_of[child] == Some(i))
            .filter_map(|&child| built[child].take())
            .collect();
        if let Some(node) = built[i].as_mut() {
            node.children = claimed;
        }
    }

    InformationNode {
        fields: Default::default(),
        children: top_level
            .into_iter()
            .filter_map(|i| built[i].take())
            .collect(),
    }
}

fn field_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
