use super::extract::Heading;
use serde::Serialize;

/// An entry in the table of contents, owning its subsections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingNode {
    pub level: u8,
    pub title: String,
    pub id: String,
    pub children: Vec<HeadingNode>,
}

impl HeadingNode {
    fn leaf(heading: &Heading) -> Self {
        Self {
            level: heading.level,
            title: heading.text.clone(),
            id: heading.id.clone(),
            children: vec![],
        }
    }
}

/// A table of contents: a forest of headings plus the number of headings
/// folded into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocTree {
    pub roots: Vec<HeadingNode>,
    pub count: usize,
}

impl TocTree {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Nest a flat, ordered list of headings by level.
///
/// A stack holds the indices of headings that can still take children. Each
/// heading first closes every open heading at its own level or deeper, so
/// equal levels become siblings, then attaches to whatever remains on top (or
/// becomes a root) and is pushed itself.
pub fn build_tree(headings: &[Heading]) -> TocTree {
    let mut children: Vec<Vec<usize>> = vec![vec![]; headings.len()];
    let mut roots = vec![];
    let mut stack: Vec<usize> = Vec::with_capacity(6);

    for (index, heading) in headings.iter().enumerate() {
        while stack
            .last()
            .is_some_and(|&top| headings[top].level >= heading.level)
        {
            stack.pop();
        }

        match stack.last() {
            Some(&parent) => children[parent].push(index),
            None => roots.push(index),
        }
        stack.push(index);
    }

    TocTree {
        roots: roots
            .into_iter()
            .map(|root| materialize(root, headings, &children))
            .collect(),
        count: headings.len(),
    }
}

/// Turn an arena slot and everything below it into owned nodes.
fn materialize(index: usize, headings: &[Heading], children: &[Vec<usize>]) -> HeadingNode {
    let mut node = HeadingNode::leaf(&headings[index]);
    node.children = children[index]
        .iter()
        .map(|&child| materialize(child, headings, children))
        .collect();
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headings(levels: &[u8]) -> Vec<Heading> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| Heading {
                level,
                occurrence: i,
                raw_attributes: String::new(),
                text: format!("t{i}"),
                id: format!("h{i}"),
            })
            .collect()
    }

    /// Render a forest compactly, like `h0(h1 h2) h3`.
    fn shape(nodes: &[HeadingNode]) -> String {
        nodes
            .iter()
            .map(|n| {
                if n.children.is_empty() {
                    n.id.clone()
                } else {
                    format!("{}({})", n.id, shape(&n.children))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn tree_shape(levels: &[u8]) -> String {
        shape(&build_tree(&headings(levels)).roots)
    }

    #[test]
    fn empty() {
        let tree = build_tree(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.count, 0);
    }

    #[test]
    fn nested_and_siblings() {
        assert_eq!(tree_shape(&[2, 3, 3, 2]), "h0(h1 h2) h3");
    }

    #[test]
    fn equal_levels_are_siblings() {
        assert_eq!(tree_shape(&[3, 3, 3]), "h0 h1 h2");
    }

    #[test]
    fn shallower_closes_deeper() {
        assert_eq!(tree_shape(&[1, 2, 3, 4, 2, 3]), "h0(h1(h2(h3)) h4(h5))");
    }

    #[test]
    fn skipped_levels_still_nest() {
        assert_eq!(tree_shape(&[2, 5, 3]), "h0(h1 h2)");
    }

    #[test]
    fn deeper_first_heading() {
        assert_eq!(tree_shape(&[4, 2, 3]), "h0 h1(h2)");
    }

    #[test]
    fn flattening_preserves_order() {
        let levels = [3, 1, 6, 2, 2, 5, 4, 1, 3, 6, 6, 2];
        let tree = build_tree(&headings(&levels));
        assert_eq!(tree.count, levels.len());
        fn walk(node: &HeadingNode, out: &mut Vec<u8>) {
            out.push(node.level);
            node.children.iter().for_each(|c| walk(c, out));
        }
        let mut flat = vec![];
        tree.roots.iter().for_each(|n| walk(n, &mut flat));
        assert_eq!(flat, levels);
    }

    #[test]
    fn children_are_deeper() {
        fn check(node: &HeadingNode) {
            for child in &node.children {
                assert!(child.level > node.level);
                check(child);
            }
        }
        let tree = build_tree(&headings(&[2, 4, 3, 6, 5, 2, 3, 1, 6]));
        tree.roots.iter().for_each(check);
    }
}
