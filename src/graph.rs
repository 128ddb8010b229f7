use crate::config::RenderOptions;
use crate::error::Result;
use crate::render;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Attribute name to value. Sorted so serialization is reproducible.
pub type AttrMap = BTreeMap<String, String>;

const INDENT: &str = "    ";

/// Build an [`AttrMap`] from string pairs.
pub fn attr_map<K, V, I>(pairs: I) -> AttrMap
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Emitted verbatim, no escaping and no trailing `;`.
    RawLine(String),
    Node {
        name: String,
        attrs: AttrMap,
    },
    Edge {
        tail: String,
        head: String,
        attrs: AttrMap,
    },
    Subgraph(Graph),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    pub name: String,
    pub strict: bool,
    pub directed: bool,
    pub comment: String,
    pub graph_attr: AttrMap,
    pub node_attr: AttrMap,
    pub edge_attr: AttrMap,
    pub statements: Vec<Statement>,
}

impl Graph {
    /// An undirected graph (`graph name { ... }`).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strict: false,
            directed: false,
            comment: String::new(),
            graph_attr: AttrMap::new(),
            node_attr: AttrMap::new(),
            edge_attr: AttrMap::new(),
            statements: Vec::new(),
        }
    }

    /// A directed graph (`digraph name { ... }`).
    pub fn digraph(name: impl Into<String>) -> Self {
        Self {
            directed: true,
            ..Self::new(name)
        }
    }

    /// A directed graph named `DG`.
    pub fn default_digraph() -> Self {
        Self::digraph("DG")
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = comment.into();
        self
    }

    pub fn set_graph_attr(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.graph_attr.insert(key.into(), value.into());
        self
    }

    pub fn set_node_attr(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.node_attr.insert(key.into(), value.into());
        self
    }

    pub fn set_edge_attr(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.edge_attr.insert(key.into(), value.into());
        self
    }

    /// Add a node. An empty `label` leaves the node unlabelled.
    pub fn node(&mut self, name: impl Into<String>, label: &str) -> &mut Self {
        self.node_with_attrs(name, label, AttrMap::new())
    }

    /// Add a node with attributes. A non-empty `label` replaces any `label`
    /// already present in `attrs`.
    pub fn node_with_attrs(
        &mut self,
        name: impl Into<String>,
        label: &str,
        mut attrs: AttrMap,
    ) -> &mut Self {
        if !label.is_empty() {
            attrs.insert("label".to_string(), label.to_string());
        }
        self.statements.push(Statement::Node {
            name: name.into(),
            attrs,
        });
        self
    }

    pub fn edge(&mut self, tail: impl Into<String>, head: impl Into<String>) -> &mut Self {
        self.edge_with_attrs(tail, head, AttrMap::new())
    }

    pub fn edge_with_attrs(
        &mut self,
        tail: impl Into<String>,
        head: impl Into<String>,
        attrs: AttrMap,
    ) -> &mut Self {
        self.statements.push(Statement::Edge {
            tail: tail.into(),
            head: head.into(),
            attrs,
        });
        self
    }

    /// Add one edge per `(tail, head)` pair, each carrying a copy of `attrs`.
    pub fn edges<T, H, I>(&mut self, pairs: I, attrs: &AttrMap) -> &mut Self
    where
        T: Into<String>,
        H: Into<String>,
        I: IntoIterator<Item = (T, H)>,
    {
        for (tail, head) in pairs {
            self.edge_with_attrs(tail, head, attrs.clone());
        }
        self
    }

    pub fn raw(&mut self, line: impl Into<String>) -> &mut Self {
        self.statements.push(Statement::RawLine(line.into()));
        self
    }

    /// Embed a copy of `sub` as a `cluster_` subgraph. Later changes to `sub`
    /// do not show up in this graph.
    pub fn subgraph(&mut self, sub: &Graph) -> &mut Self {
        self.statements.push(Statement::Subgraph(sub.clone()));
        self
    }

    /// Serialize as if this graph sat `indent_level` levels deep. Level 0 is a
    /// complete document; deeper levels produce a `subgraph` block.
    pub fn to_string_indented(&self, indent_level: usize) -> String {
        let mut out = String::new();
        self.write_dot(&mut out, indent_level, edge_op(self.directed));
        out
    }

    fn write_dot(&self, out: &mut String, level: usize, op: &str) {
        let indent = INDENT.repeat(level);

        if level == 0 {
            if !self.comment.is_empty() {
                out.push_str(&format!("// {}\n", self.comment));
            }
            if self.strict {
                out.push_str("strict ");
            }
            let keyword = if self.directed { "digraph" } else { "graph" };
            out.push_str(&format!("{keyword} {} {{\n", escape_id(&self.name)));
        } else {
            let cluster = format!("cluster_{}", self.name);
            out.push_str(&format!("{indent}subgraph {} {{\n", escape_id(&cluster)));
        }

        for (keyword, attrs) in [
            ("graph", &self.graph_attr),
            ("node", &self.node_attr),
            ("edge", &self.edge_attr),
        ] {
            if !attrs.is_empty() {
                out.push_str(&format!("{indent}{INDENT}{keyword} [{}];\n", format_attrs(attrs)));
            }
        }

        let inner = INDENT.repeat(level + 1);
        for stmt in &self.statements {
            match stmt {
                Statement::RawLine(line) => {
                    out.push_str(&format!("{inner}{line}\n"));
                }
                Statement::Node { name, attrs } => {
                    out.push_str(&inner);
                    out.push_str(&escape_id(name));
                    push_attr_list(out, attrs);
                    out.push_str(";\n");
                }
                Statement::Edge { tail, head, attrs } => {
                    out.push_str(&format!("{inner}{} {op} {}", escape_id(tail), escape_id(head)));
                    push_attr_list(out, attrs);
                    out.push_str(";\n");
                }
                Statement::Subgraph(sub) => sub.write_dot(out, level + 1, op),
            }
        }

        out.push_str(&indent);
        out.push_str("}\n");
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.to_string().as_bytes())?;
        Ok(())
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_string())?;
        Ok(())
    }

    /// Render to `output` through the engine's stdin.
    pub fn render(&self, output: impl AsRef<Path>, options: &RenderOptions) -> Result<()> {
        render::render_from_string(&self.to_string(), output.as_ref(), options)
    }

    pub fn render_to_memory(&self, options: &RenderOptions) -> Result<Vec<u8>> {
        render::render_from_string_to_memory(&self.to_string(), options)
    }

    /// Render into a temp file (format defaults to
    /// [`crate::config::DEFAULT_FORMAT`]) and open it in the desktop viewer.
    pub fn view(&self, options: &RenderOptions) -> Result<PathBuf> {
        render::view_string(&self.to_string(), options)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("G")
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_indented(0))
    }
}

fn edge_op(directed: bool) -> &'static str {
    if directed { "->" } else { "--" }
}

fn push_attr_list(out: &mut String, attrs: &AttrMap) {
    if !attrs.is_empty() {
        out.push_str(" [");
        out.push_str(&format_attrs(attrs));
        out.push(']');
    }
}

fn format_attrs(attrs: &AttrMap) -> String {
    attrs
        .iter()
        .map(|(k, v)| format!("{}={}", escape_id(k), escape_id(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Bare when made only of ASCII alphanumerics and `_`, quoted otherwise.
///
/// Inside quotes `"` becomes `\"`. A run of backslashes right before a quote
/// (escaped or closing) is padded to even length so it cannot swallow that
/// quote; other backslashes, such as `\n` in labels, pass through untouched.
pub fn escape_id(id: &str) -> String {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return id.to_string();
    }
    let mut out = String::with_capacity(id.len() + 2);
    out.push('"');
    let mut backslashes = 0usize;
    for ch in id.chars() {
        match ch {
            '\\' => {
                backslashes += 1;
                out.push(ch);
            }
            '"' => {
                if backslashes % 2 == 1 {
                    out.push('\\');
                }
                backslashes = 0;
                out.push_str("\\\"");
            }
            _ => {
                backslashes = 0;
                out.push(ch);
            }
        }
    }
    if backslashes % 2 == 1 {
        out.push('\\');
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn escape_id_leaves_plain_identifiers_bare() {
        assert_eq!(escape_id("node_1"), "node_1");
        assert_eq!(escape_id("ABC"), "ABC");
    }

    #[test]
    fn escape_id_quotes_everything_else() {
        assert_eq!(escape_id(""), "\"\"");
        assert_eq!(escape_id("a b"), "\"a b\"");
        assert_eq!(escape_id("lib-c"), "\"lib-c\"");
        assert_eq!(escape_id("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(escape_id("naïve"), "\"naïve\"");
    }

    #[test]
    fn trailing_backslash_cannot_escape_closing_quote() {
        assert_eq!(escape_id("C:\\"), "\"C:\\\\\"");
        assert_eq!(escape_id("a\\\\"), "\"a\\\\\"");
        assert_eq!(escape_id("a\\\""), "\"a\\\\\\\"\"");
        assert_eq!(escape_id("line\\nnext"), "\"line\\nnext\"");

        let mut g = Graph::default_digraph();
        g.node("C:\\", "");
        assert_eq!(g.to_string(), "digraph DG {\n    \"C:\\\\\";\n}\n");
    }

    #[test]
    fn default_digraph_is_named_dg() {
        let g = Graph::default_digraph();
        assert!(g.directed);
        assert_eq!(g.name, "DG");
        assert_eq!(Graph::default().name, "G");
    }

    #[test]
    fn digraph_document_layout() {
        let mut g = Graph::digraph("deps");
        g.set_comment("generated");
        g.set_graph_attr("rankdir", "LR");
        g.set_node_attr("shape", "box");
        g.set_edge_attr("color", "gray40");
        g.node("A", "Alpha");
        g.edge("A", "B");

        let expected = "\
// generated
digraph deps {
    graph [rankdir=LR];
    node [shape=box];
    edge [color=gray40];
    A [label=Alpha];
    A -> B;
}
";
        assert_eq!(g.to_string(), expected);
    }

    #[test]
    fn undirected_graph_uses_double_dash() {
        let mut g = Graph::default();
        g.edge("a", "b");
        let text = g.to_string();
        assert!(text.starts_with("graph G {\n"));
        assert!(text.contains("    a -- b;\n"));
        assert!(!text.contains("->"));
    }

    #[test]
    fn strict_only_prefixes_top_level() {
        let mut child = Graph::digraph("inner").with_strict(true);
        child.node("x", "");
        let mut g = Graph::digraph("outer").with_strict(true);
        g.subgraph(&child);

        let text = g.to_string();
        assert!(text.starts_with("strict digraph outer {"));
        assert_eq!(text.matches("strict").count(), 1);
    }

    #[test]
    fn empty_default_blocks_are_omitted() {
        let g = Graph::digraph("empty");
        assert_eq!(g.to_string(), "digraph empty {\n}\n");
    }

    #[test]
    fn label_argument_overrides_attr_label() {
        let mut g = Graph::digraph("G");
        g.node_with_attrs("A", "hello", attr_map([("label", "x"), ("color", "red")]));
        assert!(g.to_string().contains("    A [color=red, label=hello];\n"));

        let mut g = Graph::digraph("G");
        g.node_with_attrs("A", "", attr_map([("label", "x")]));
        assert!(g.to_string().contains("    A [label=x];\n"));
    }

    #[test]
    fn node_label_is_stored_in_attrs() {
        let mut g = Graph::digraph("G");
        g.node("A", "hello");
        assert_eq!(
            g.statements[0],
            Statement::Node {
                name: "A".to_string(),
                attrs: attr_map([("label", "hello")]),
            }
        );
    }

    #[test]
    fn edges_appends_one_statement_per_pair() {
        let mut g = Graph::digraph("G");
        g.edges([("a", "b"), ("b", "c")], &attr_map([("style", "dashed")]));
        assert_eq!(g.statements.len(), 2);
        let text = g.to_string();
        assert!(text.contains("    a -> b [style=dashed];\n"));
        assert!(text.contains("    b -> c [style=dashed];\n"));
    }

    #[test]
    fn quoted_identifiers_in_edges_and_attrs() {
        let mut g = Graph::digraph("my graph");
        g.edge_with_attrs("glibc", "linux-api-headers", attr_map([("label", "needs \"x\"")]));
        let expected = "\
digraph \"my graph\" {
    glibc -> \"linux-api-headers\" [label=\"needs \\\"x\\\"\"];
}
";
        assert_eq!(g.to_string(), expected);
    }

    #[test]
    fn raw_lines_are_verbatim() {
        let mut g = Graph::digraph("G");
        g.raw("rank = same; a; b");
        assert!(g.to_string().contains("    rank = same; a; b\n"));
    }

    #[test]
    fn nested_subgraphs_are_indented_clusters() {
        let mut inner = Graph::new("inner");
        inner.set_graph_attr("label", "Inner");
        inner.node("c", "");
        let mut mid = Graph::new("mid");
        mid.node("b", "");
        mid.subgraph(&inner);
        let mut root = Graph::digraph("root");
        root.node("a", "");
        root.subgraph(&mid);
        root.edge("a", "c");

        let expected = "\
digraph root {
    a;
    subgraph cluster_mid {
        b;
        subgraph cluster_inner {
            graph [label=Inner];
            c;
        }
    }
    a -> c;
}
";
        assert_eq!(root.to_string(), expected);
    }

    #[test]
    fn subgraph_edges_follow_root_direction() {
        let mut inner = Graph::new("part");
        inner.edge("x", "y");
        let mut root = Graph::digraph("root");
        root.subgraph(&inner);
        let text = root.to_string();
        assert!(text.contains("        x -> y;\n"));
        assert!(!text.contains("--"));
    }

    #[test]
    fn subgraph_name_with_symbols_is_quoted() {
        let inner = Graph::new("core libs");
        let mut root = Graph::digraph("root");
        root.subgraph(&inner);
        assert!(root.to_string().contains("    subgraph \"cluster_core libs\" {\n"));
    }

    #[test]
    fn subgraph_is_isolated_from_later_mutation() {
        let mut child = Graph::new("child");
        child.node("a", "");
        let mut parent = Graph::digraph("parent");
        parent.subgraph(&child);
        let before = parent.to_string();

        child.node("b", "");
        child.set_graph_attr("color", "blue");

        assert_eq!(parent.to_string(), before);
    }

    #[test]
    fn serialization_is_deterministic() {
        let mut g = Graph::digraph("G");
        for key in ["z", "m", "a"] {
            g.set_node_attr(key, "1");
        }
        g.edges([("a", "b"), ("b", "c")], &AttrMap::new());
        assert_eq!(g.to_string(), g.to_string());
        assert!(g.to_string().contains("node [a=1, m=1, z=1];"));
    }

    #[test]
    fn indented_output_renders_cluster_header() {
        let mut g = Graph::new("sub");
        g.node("n", "");
        let expected = "\
    subgraph cluster_sub {
        n;
    }
";
        assert_eq!(g.to_string_indented(1), expected);
    }

    #[test]
    fn save_to_and_write_to_emit_same_text() {
        let mut g = Graph::digraph("G");
        g.edge("a", "b");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.gv");
        g.save_to(&path).unwrap();

        let mut buf = Vec::new();
        g.write_to(&mut buf).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), buf);
    }
}
