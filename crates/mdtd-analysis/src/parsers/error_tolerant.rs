//! Error-tolerant parsing: locate ERROR and MISSING nodes in a tree.

use tree_sitter::Node;

use crate::model::SyntaxRegion;

/// Every unrecoverable region in the tree, outermost first. Nested errors
/// inside an already reported ERROR node are not repeated.
pub fn syntax_regions(root: Node<'_>) -> Vec<SyntaxRegion> {
    let mut regions = Vec::new();
    collect_regions(root, &mut regions);
    regions
}

fn collect_regions(node: Node<'_>, regions: &mut Vec<SyntaxRegion>) {
    if node.is_error() || node.is_missing() {
        regions.push(region_of(node));
        return;
    }
    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_regions(child, regions);
    }
}

fn region_of(node: Node<'_>) -> SyntaxRegion {
    let start = node.start_position();
    let end = node.end_position();
    let message = if node.is_missing() {
        format!("missing {}", node.kind())
    } else {
        match node.child(0) {
            Some(first) if node.child_count() == 1 => format!("unexpected {}", first.kind()),
            _ => "unrecognized syntax".to_string(),
        }
    };
    SyntaxRegion {
        start_line: start.row as u32 + 1,
        start_column: start.column as u32 + 1,
        end_line: end.row as u32 + 1,
        end_column: end.column as u32 + 1,
        message,
    }
}

