//! Immutable syntax trees supplied by the host
//!
//! Trees are arenas of [`NodeData`] addressed by [`NodeId`]. They are built
//! once through [`TreeBuilder`] (or deserialized from a host snapshot) and are
//! never mutated afterwards; rewrites go through [`TreeRewriter`] and produce a
//! fresh tree.

mod builder;
mod factory;
mod kind;
mod rewrite;

pub use builder::TreeBuilder;
pub use factory::string_literal_value;
pub use kind::SyntaxKind;
pub use rewrite::TreeRewriter;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error raised while assembling a tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("tree has no root node")]
    Empty,

    #[error("{0} node(s) were started but never finished")]
    Unclosed(usize),

    #[error("finish_node called with no open node")]
    UnbalancedFinish,

    #[error("element outside the root node")]
    MultipleRoots,

    #[error("node {node} refers to missing child {child}")]
    DanglingChild { node: usize, child: usize },

    #[error("token {0} cannot have children")]
    TokenWithChildren(usize),

    #[error("node {0} has more than one parent")]
    SharedChild(usize),

    #[error("node {0} does not exist in this tree")]
    UnknownNode(usize),
}

/// Index of a node inside its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Half-open byte range into the rendered source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `other` lies entirely inside this span
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Text carried by a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenData {
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub leading_trivia: String,
}

/// One arena slot
#[derive(Debug, Clone)]
pub struct NodeData {
    kind: SyntaxKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    token: Option<TokenData>,
    span: Span,
    full_span: Span,
}

/// Serialized form of a node; spans and parents are derived on load
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeRepr {
    kind: SyntaxKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<TokenData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TreeRepr {
    root: NodeId,
    nodes: Vec<NodeRepr>,
}

/// An immutable syntax tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TreeRepr", into = "TreeRepr")]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    /// Assemble a tree from raw slots, deriving parents and spans.
    pub(crate) fn from_parts(
        parts: Vec<(SyntaxKind, Vec<NodeId>, Option<TokenData>)>,
        root: NodeId,
    ) -> Result<Self, TreeError> {
        if parts.is_empty() || root.index() >= parts.len() {
            return Err(TreeError::Empty);
        }

        let mut nodes: Vec<NodeData> = parts
            .into_iter()
            .map(|(kind, children, token)| NodeData {
                kind,
                parent: None,
                children,
                token,
                span: Span::default(),
                full_span: Span::default(),
            })
            .collect();

        for index in 0..nodes.len() {
            if nodes[index].token.is_some() && !nodes[index].children.is_empty() {
                return Err(TreeError::TokenWithChildren(index));
            }
            for child_pos in 0..nodes[index].children.len() {
                let child = nodes[index].children[child_pos];
                if child.index() >= nodes.len() || child == root {
                    return Err(TreeError::DanglingChild {
                        node: index,
                        child: child.index(),
                    });
                }
                if nodes[child.index()].parent.is_some() {
                    return Err(TreeError::SharedChild(child.index()));
                }
                nodes[child.index()].parent = Some(NodeId::from_index(index));
            }
        }

        let mut tree = SyntaxTree { nodes, root };
        tree.compute_spans();
        Ok(tree)
    }

    /// Assign spans with an explicit stack; children are laid out left to right.
    fn compute_spans(&mut self) {
        enum Step {
            Enter(NodeId),
            Exit(NodeId),
        }

        let mut offset = 0usize;
        let mut stack = vec![Step::Enter(self.root)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(id) => {
                    let slot = &mut self.nodes[id.index()];
                    if let Some(token) = &slot.token {
                        let start = offset;
                        let text_start = start + token.leading_trivia.len();
                        offset = text_start + token.text.len();
                        slot.full_span = Span::new(start, offset);
                        slot.span = Span::new(text_start, offset);
                    } else {
                        slot.full_span = Span::new(offset, offset);
                        slot.span = Span::new(offset, offset);
                        stack.push(Step::Exit(id));
                        for child in slot.children.iter().rev() {
                            stack.push(Step::Enter(*child));
                        }
                    }
                }
                Step::Exit(id) => {
                    let full_start = self.nodes[id.index()].full_span.start;
                    let trivia = self.first_token_trivia(id);
                    let slot = &mut self.nodes[id.index()];
                    slot.full_span = Span::new(full_start, offset);
                    slot.span = match trivia {
                        Some(len) => Span::new(full_start + len, offset),
                        None => Span::new(offset, offset),
                    };
                }
            }
        }
    }

    /// Leading trivia length of the first token below `id`
    fn first_token_trivia(&self, id: NodeId) -> Option<usize> {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &self.nodes[current.index()];
            if let Some(token) = &slot.token {
                return Some(token.leading_trivia.len());
            }
            stack.extend(slot.children.iter().rev());
        }
        None
    }

    /// The root node
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: self,
            id: self.root,
        }
    }

    /// Look up a node by id
    pub fn node(&self, id: NodeId) -> Option<SyntaxNode<'_>> {
        (id.index() < self.nodes.len()).then_some(SyntaxNode { tree: self, id })
    }

    /// Number of elements (nodes and tokens)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Render the full source text, trivia included
    pub fn text(&self) -> String {
        self.root().full_text()
    }

    /// Smallest node whose span is exactly `span`.
    ///
    /// Tokens are never returned; when nested nodes share the span the
    /// innermost one wins.
    pub fn find_node(&self, span: Span) -> Option<SyntaxNode<'_>> {
        let mut current = self.root();
        if !current.span().contains(span) {
            return None;
        }

        let mut found = None;
        loop {
            if !current.is_token() && current.span() == span {
                found = Some(current);
            }
            let next = current
                .children()
                .find(|c| !c.is_token() && c.span().contains(span));
            match next {
                Some(child) => current = child,
                None => break,
            }
        }
        found
    }

    /// Compute the line index of the rendered text
    pub fn line_index(&self) -> LineIndex {
        LineIndex::new(&self.text())
    }
}

impl TryFrom<TreeRepr> for SyntaxTree {
    type Error = TreeError;

    fn try_from(repr: TreeRepr) -> Result<Self, Self::Error> {
        let parts = repr
            .nodes
            .into_iter()
            .map(|n| (n.kind, n.children, n.token))
            .collect();
        SyntaxTree::from_parts(parts, repr.root)
    }
}

impl From<SyntaxTree> for TreeRepr {
    fn from(tree: SyntaxTree) -> Self {
        TreeRepr {
            root: tree.root,
            nodes: tree
                .nodes
                .into_iter()
                .map(|n| NodeRepr {
                    kind: n.kind,
                    children: n.children,
                    token: n.token,
                })
                .collect(),
        }
    }
}

/// Borrowed view of one node or token
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> SyntaxNode<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.nodes[self.id.index()]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn is_token(&self) -> bool {
        self.data().token.is_some()
    }

    /// Span without leading trivia
    pub fn span(&self) -> Span {
        self.data().span
    }

    /// Span including leading trivia
    pub fn full_span(&self) -> Span {
        self.data().full_span
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        self.data().parent.map(|id| SyntaxNode {
            tree: self.tree,
            id,
        })
    }

    /// Direct children, tokens included
    pub fn children(&self) -> impl DoubleEndedIterator<Item = SyntaxNode<'t>> + 't {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |id| SyntaxNode { tree, id: *id })
    }

    /// Direct children that are nodes
    pub fn child_nodes(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.children().filter(|c| !c.is_token())
    }

    /// First direct child of the given kind
    pub fn child_of_kind(&self, kind: SyntaxKind) -> Option<SyntaxNode<'t>> {
        self.children().find(|c| c.kind() == kind)
    }

    /// Index of this node among its parent's children
    pub fn index_in_parent(&self) -> Option<usize> {
        self.parent()
            .and_then(|p| p.data().children.iter().position(|id| *id == self.id))
    }

    /// Whether a direct child token of the given kind is present
    pub fn has_modifier(&self, kind: SyntaxKind) -> bool {
        self.children().any(|c| c.is_token() && c.kind() == kind)
    }

    /// Token text, empty for interior nodes
    pub fn token_text(&self) -> &'t str {
        self.data().token.as_ref().map(|t| t.text.as_str()).unwrap_or("")
    }

    /// Leading trivia of this token, or of the first token below this node
    pub fn leading_trivia(&self) -> &'t str {
        self.first_token()
            .and_then(|t| t.data().token.as_ref())
            .map(|t| t.leading_trivia.as_str())
            .unwrap_or("")
    }

    /// Pre-order traversal including `self`
    pub fn descendants(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            stack: vec![self.id],
        }
    }

    /// Parent chain, excluding `self`
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        std::iter::successors(self.parent(), |n| n.parent())
    }

    /// First token in document order
    pub fn first_token(&self) -> Option<SyntaxNode<'t>> {
        self.descendants().find(|n| n.is_token())
    }

    /// Last token in document order
    pub fn last_token(&self) -> Option<SyntaxNode<'t>> {
        let mut current = *self;
        loop {
            if current.is_token() {
                return Some(current);
            }
            current = current.children().next_back()?;
        }
    }

    /// Source text of this subtree without the first token's trivia
    pub fn text(&self) -> String {
        let full = self.full_text();
        full[self.leading_trivia().len().min(full.len())..].to_string()
    }

    /// Source text of this subtree including trivia
    pub fn full_text(&self) -> String {
        let mut out = String::new();
        for node in self.descendants() {
            if let Some(token) = &node.data().token {
                out.push_str(&token.leading_trivia);
                out.push_str(&token.text);
            }
        }
        out
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}", self.kind(), self.span())
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}

/// Pre-order iterator over a subtree
pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = SyntaxNode<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let data = &self.tree.nodes[id.index()];
        self.stack.extend(data.children.iter().rev());
        Some(SyntaxNode {
            tree: self.tree,
            id,
        })
    }
}

/// Byte offset to 1-based line/column conversion
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    text: String,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            line_starts,
            text: text.to_string(),
        }
    }

    /// 1-based line and column (column counted in characters)
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let column = self
            .text
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - start);
        (line + 1, column + 1)
    }

    /// Text of a 1-based line without its terminator
    pub fn line_text(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        self.text.get(start..end).map(|s| s.trim_end_matches('\r'))
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `Foo("Bar", (x));` wrapped in a compilation unit
    fn sample() -> (SyntaxTree, NodeId, NodeId) {
        let mut b = TreeBuilder::new();
        let mut literal = None;
        let mut paren = None;
        b.node(SyntaxKind::CompilationUnit, |b| {
            b.node(SyntaxKind::ExpressionStatement, |b| {
                b.node(SyntaxKind::InvocationExpression, |b| {
                    b.identifier_name("Foo");
                    b.node(SyntaxKind::ArgumentList, |b| {
                        b.fixed_token(SyntaxKind::OpenParenToken);
                        b.node(SyntaxKind::Argument, |b| {
                            literal = Some(b.string_literal("Bar"));
                        });
                        b.fixed_token(SyntaxKind::CommaToken);
                        b.trivia(" ");
                        b.node(SyntaxKind::Argument, |b| {
                            paren = Some(b.parenthesized(|b| {
                                b.identifier_name("x");
                            }));
                        });
                        b.fixed_token(SyntaxKind::CloseParenToken);
                    });
                });
                b.fixed_token(SyntaxKind::SemicolonToken);
            });
            b.trivia("\n");
            b.fixed_token(SyntaxKind::EndOfFileToken);
        });
        let tree = b.finish().unwrap();
        (tree, literal.unwrap(), paren.unwrap())
    }

    #[test]
    fn test_render_text() {
        let (tree, _, _) = sample();
        assert_eq!(tree.text(), "Foo(\"Bar\", (x));\n");
    }

    #[test]
    fn test_spans() {
        let (tree, literal, paren) = sample();
        let literal = tree.node(literal).unwrap();
        assert_eq!(literal.span(), Span::new(4, 9));
        assert_eq!(literal.text(), "\"Bar\"");

        let paren = tree.node(paren).unwrap();
        assert_eq!(paren.span(), Span::new(11, 14));
        assert_eq!(paren.full_span(), Span::new(10, 14));
        assert_eq!(paren.leading_trivia(), " ");
    }

    #[test]
    fn test_find_node_innermost() {
        let (tree, literal, _) = sample();
        // The Argument and the LiteralExpression share a span
        let found = tree.find_node(Span::new(4, 9)).unwrap();
        assert_eq!(found.id(), literal);
        assert_eq!(found.kind(), SyntaxKind::LiteralExpression);
    }

    #[test]
    fn test_find_node_mismatch() {
        let (tree, _, _) = sample();
        assert!(tree.find_node(Span::new(5, 9)).is_none());
        assert!(tree.find_node(Span::new(100, 120)).is_none());
    }

    #[test]
    fn test_ancestors_and_parent() {
        let (tree, literal, _) = sample();
        let literal = tree.node(literal).unwrap();
        let kinds: Vec<_> = literal.ancestors().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::Argument,
                SyntaxKind::ArgumentList,
                SyntaxKind::InvocationExpression,
                SyntaxKind::ExpressionStatement,
                SyntaxKind::CompilationUnit,
            ]
        );
        assert_eq!(literal.index_in_parent(), Some(0));
    }

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(4), (2, 2));
        assert_eq!(index.line_col(7), (4, 1));
        assert_eq!(index.line_text(2), Some("cd"));
        assert_eq!(index.line_text(3), Some(""));
        assert_eq!(index.line_text(9), None);
    }

    #[test]
    fn test_serde_rederives_spans() {
        let (tree, literal, _) = sample();
        let json = serde_json::to_string(&tree).unwrap();
        assert!(!json.contains("full_span"));

        let loaded: SyntaxTree = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.text(), tree.text());
        assert_eq!(
            loaded.node(literal).unwrap().span(),
            tree.node(literal).unwrap().span()
        );
    }

    #[test]
    fn test_serde_rejects_dangling_child() {
        let json = r#"{"root":0,"nodes":[{"kind":"CompilationUnit","children":[7]}]}"#;
        let err = serde_json::from_str::<SyntaxTree>(json).unwrap_err();
        assert!(err.to_string().contains("missing child"));
    }
}
