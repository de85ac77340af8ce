//! CSV rendering of a comparison.
//!
//! Layout: header `q1,q2,<type label>...`, then one row per test node with
//! the subject qnode, the node qnode, and one similarity cell per
//! configured embedding type in order. Fields never contain commas (qnodes
//! and numeric scores), so no quoting is applied. A cell with no usable
//! score renders as `--`.

use crate::types::{EmbeddingType, Entity, TestNode, UNAVAILABLE_PLACEHOLDER};

/// A rendered CSV payload together with its suggested file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// `<subject>_similarity.csv`
    pub filename: String,
    /// The CSV text, rows joined by `\n`, no trailing newline.
    pub content: String,
}

/// Render the comparison as CSV text.
pub fn render_csv(subject: &Entity, nodes: &[TestNode], types: &[EmbeddingType]) -> String {
    let mut rows = Vec::with_capacity(nodes.len() + 1);

    let mut header = Vec::with_capacity(types.len() + 2);
    header.push("q1".to_string());
    header.push("q2".to_string());
    header.extend(types.iter().map(|t| t.label.clone()));
    rows.push(header.join(","));

    for node in nodes {
        let mut row = Vec::with_capacity(types.len() + 2);
        row.push(subject.qnode.clone());
        row.push(node.entity.qnode.clone());
        row.extend(types.iter().map(|t| {
            node.cell(&t.value)
                .map(|value| value.to_string())
                .unwrap_or_else(|| UNAVAILABLE_PLACEHOLDER.to_string())
        }));
        rows.push(row.join(","));
    }

    rows.join("\n")
}

/// The download file name for a subject's comparison.
pub fn suggested_filename(subject: &Entity) -> String {
    format!("{}_similarity.csv", subject.qnode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SimilarityValue;

    fn entity(qnode: &str) -> Entity {
        Entity {
            qnode: qnode.to_string(),
            label: vec![],
            description: vec![],
            alias: vec![],
            pagerank: 0.0,
            statements: 0,
            score: 0.0,
        }
    }

    #[test]
    fn test_single_node_single_type() {
        let subject = entity("Q1");
        let mut node = TestNode::new(entity("Q2"));
        node.similarity
            .insert("complex".to_string(), SimilarityValue::Score(0.5));
        let types = vec![EmbeddingType::new("ComplEx", "complex")];

        assert_eq!(
            render_csv(&subject, &[node], &types),
            "q1,q2,ComplEx\nQ1,Q2,0.5"
        );
        assert_eq!(suggested_filename(&subject), "Q1_similarity.csv");
    }

    #[test]
    fn test_unavailable_and_missing_cells_render_placeholder() {
        let subject = entity("Q1");
        let mut node = TestNode::new(entity("Q2"));
        node.similarity
            .insert("complex".to_string(), SimilarityValue::Unavailable);
        // No cell at all for "text".
        let types = vec![
            EmbeddingType::new("ComplEx", "complex"),
            EmbeddingType::new("Text", "text"),
        ];

        assert_eq!(
            render_csv(&subject, &[node], &types),
            "q1,q2,ComplEx,Text\nQ1,Q2,--,--"
        );
    }

    #[test]
    fn test_rows_follow_display_order() {
        let subject = entity("Q1");
        let types = vec![EmbeddingType::new("ComplEx", "complex")];

        let mut first = TestNode::new(entity("Q5"));
        first
            .similarity
            .insert("complex".to_string(), SimilarityValue::Score(0.9));
        let mut second = TestNode::new(entity("Q3"));
        second
            .similarity
            .insert("complex".to_string(), SimilarityValue::Score(0.2));

        let text = render_csv(&subject, &[first, second], &types);
        assert_eq!(text, "q1,q2,ComplEx\nQ1,Q5,0.9\nQ1,Q3,0.2");
    }

    #[test]
    fn test_empty_working_set_is_header_only() {
        let subject = entity("Q1");
        let types = vec![EmbeddingType::new("ComplEx", "complex")];
        assert_eq!(render_csv(&subject, &[], &types), "q1,q2,ComplEx");
    }
}
