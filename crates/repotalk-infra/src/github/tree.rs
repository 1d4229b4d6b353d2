//! Directory tree rendering and token-estimate formatting for digests.

use std::collections::BTreeMap;

/// A directory subtree, keyed by entry name.
#[derive(Debug, Default)]
struct TreeNode {
    children: BTreeMap<String, TreeNode>,
    is_dir: bool,
}

impl TreeNode {
    fn insert(&mut self, path: &str) {
        let mut node = self;
        let mut segments = path.split('/').peekable();
        while let Some(segment) = segments.next() {
            let is_last = segments.peek().is_none();
            node = node.children.entry(segment.to_string()).or_default();
            if !is_last {
                node.is_dir = true;
            }
        }
    }

    fn render_into(&self, prefix: &str, out: &mut String) {
        let count = self.children.len();
        for (index, (name, child)) in self.children.iter().enumerate() {
            let last = index + 1 == count;
            out.push_str(prefix);
            out.push_str(if last { "└── " } else { "├── " });
            out.push_str(name);
            if child.is_dir {
                out.push('/');
            }
            out.push('\n');

            let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            child.render_into(&child_prefix, out);
        }
    }
}

/// Render a box-drawing directory tree from a list of file paths.
///
/// Paths are slash-separated and relative to the repository root; sibling
/// entries are sorted lexicographically.
pub fn render_tree(root_name: &str, paths: &[String]) -> String {
    let mut root = TreeNode::default();
    for path in paths {
        root.insert(path);
    }

    let mut out = String::new();
    out.push_str("Directory structure:\n");
    out.push_str("└── ");
    out.push_str(root_name);
    out.push_str("/\n");
    root.render_into("    ", &mut out);
    out
}

/// Format a token estimate the way digest summaries expect it:
/// `1.2M`, `12.3K`, or a plain integer below a thousand.
pub fn format_token_estimate(tokens: usize) -> String {
    if tokens >= 1_000_000 {
        format!("{:.1}M", tokens as f64 / 1_000_000.0)
    } else if tokens >= 1_000 {
        format!("{:.1}K", tokens as f64 / 1_000.0)
    } else {
        tokens.to_string()
    }
}
