use crate::builds::InformationNode;

/// Information field the build service stamps with the agent it reserved.
pub const RESERVED_AGENT_FIELD: &str = "ReservedAgentName";

/// Finds the agent reserved for a build by searching its information tree.
///
/// Pre-order depth-first: a node's own fields are checked before any of its
/// children, children in the order given. The first hit wins. Uses an explicit
/// stack so a pathologically deep tree cannot exhaust the call stack.
pub fn resolve_agent(root: &InformationNode) -> Option<&str> {
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if let Some(agent) = node.fields.get(RESERVED_AGENT_FIELD) {
            return Some(agent.as_str());
        }
        // Reversed so the first child is popped next.
        stack.extend(node.children.iter().rev());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(key: &str, value: &str) -> InformationNode {
        InformationNode::with_fields([(key, value)])
    }

    fn empty() -> InformationNode {
        InformationNode::default()
    }

    #[test]
    fn returns_none_for_empty_tree() {
        assert_eq!(resolve_agent(&empty()), None);
    }

    #[test]
    fn finds_agent_on_root() {
        let root = InformationNode::with_fields([
            ("BuildStep", "Compile"),
            (RESERVED_AGENT_FIELD, "agent-01"),
        ]);
        assert_eq!(resolve_agent(&root), Some("agent-01"));
    }

    #[test]
    fn finds_agent_deep_in_tree() {
        let root = empty().with_children(vec![
            leaf("Message", "Starting"),
            empty().with_children(vec![
                empty(),
                empty().with_children(vec![leaf(RESERVED_AGENT_FIELD, "deep-agent")]),
            ]),
            leaf("Message", "Done"),
        ]);
        assert_eq!(resolve_agent(&root), Some("deep-agent"));
    }

    #[test]
    fn returns_none_when_key_absent() {
        let root = empty().with_children(vec![
            leaf("Message", "a"),
            empty().with_children(vec![leaf("ReservedAgent", "close-but-no")]),
        ]);
        assert_eq!(resolve_agent(&root), None);
    }

    #[test]
    fn own_fields_win_over_children() {
        let root = empty().with_children(vec![InformationNode::with_fields([(
            RESERVED_AGENT_FIELD,
            "parent",
        )])
        .with_children(vec![leaf(RESERVED_AGENT_FIELD, "child")])]);
        assert_eq!(resolve_agent(&root), Some("parent"));
    }

    #[test]
    fn earlier_subtree_wins_over_later_sibling() {
        let root = empty().with_children(vec![
            empty().with_children(vec![leaf(RESERVED_AGENT_FIELD, "first")]),
            leaf(RESERVED_AGENT_FIELD, "second"),
        ]);
        assert_eq!(resolve_agent(&root), Some("first"));
    }

    #[test]
    fn handles_very_deep_chain() {
        let mut node = leaf(RESERVED_AGENT_FIELD, "bottom");
        for _ in 0..100_000 {
            node = empty().with_children(vec![node]);
        }
        assert_eq!(resolve_agent(&node), Some("bottom"));
    }
}
