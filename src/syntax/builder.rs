//! Incremental tree construction

use super::{NodeId, SyntaxKind, SyntaxTree, TokenData, TreeError};

/// Builds a [`SyntaxTree`] in document order.
///
/// Nodes are opened with [`start_node`](Self::start_node) and closed with
/// [`finish_node`](Self::finish_node); ids are handed out in pre-order so a
/// host can record bindings while it builds. Trivia queued with
/// [`trivia`](Self::trivia) becomes the leading trivia of the next token.
///
/// ```
/// use sharpcheck::syntax::{SyntaxKind, TreeBuilder};
///
/// let mut b = TreeBuilder::new();
/// b.node(SyntaxKind::CompilationUnit, |b| {
///     b.nameof_expression("IsEnabled");
///     b.fixed_token(SyntaxKind::EndOfFileToken);
/// });
/// let tree = b.finish().unwrap();
/// assert_eq!(tree.text(), "nameof(IsEnabled)");
/// ```
#[derive(Debug, Default)]
pub struct TreeBuilder {
    parts: Vec<(SyntaxKind, Vec<NodeId>, Option<TokenData>)>,
    stack: Vec<NodeId>,
    root: Option<NodeId>,
    pending_trivia: String,
    error: Option<TreeError>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: SyntaxKind, token: Option<TokenData>) -> NodeId {
        let id = NodeId::from_index(self.parts.len());
        self.parts.push((kind, Vec::new(), token));
        match self.stack.last() {
            Some(parent) => self.parts[parent.index()].1.push(id),
            None if self.root.is_none() => self.root = Some(id),
            None => self.fail(TreeError::MultipleRoots),
        }
        id
    }

    fn fail(&mut self, error: TreeError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Open an interior node
    pub fn start_node(&mut self, kind: SyntaxKind) -> NodeId {
        let id = self.push(kind, None);
        self.stack.push(id);
        id
    }

    /// Close the most recently opened node
    pub fn finish_node(&mut self) -> Option<NodeId> {
        let closed = self.stack.pop();
        if closed.is_none() {
            self.fail(TreeError::UnbalancedFinish);
        }
        closed
    }

    /// Open a node, fill it with `build`, and close it
    pub fn node(&mut self, kind: SyntaxKind, build: impl FnOnce(&mut Self)) -> NodeId {
        let id = self.start_node(kind);
        build(self);
        self.finish_node();
        id
    }

    /// Append a token carrying any queued trivia
    pub fn token(&mut self, kind: SyntaxKind, text: &str) -> NodeId {
        let leading_trivia = std::mem::take(&mut self.pending_trivia);
        self.push(
            kind,
            Some(TokenData {
                text: text.to_string(),
                leading_trivia,
            }),
        )
    }

    /// Append a token with explicit trivia, after any queued trivia
    pub fn token_with_trivia(&mut self, kind: SyntaxKind, text: &str, trivia: &str) -> NodeId {
        self.pending_trivia.push_str(trivia);
        self.token(kind, text)
    }

    /// Queue whitespace or comments for the next token
    pub fn trivia(&mut self, text: &str) -> &mut Self {
        self.pending_trivia.push_str(text);
        self
    }

    /// Number of elements created so far
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Validate nesting and freeze the tree
    pub fn finish(self) -> Result<SyntaxTree, TreeError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if !self.stack.is_empty() {
            return Err(TreeError::Unclosed(self.stack.len()));
        }
        let root = self.root.ok_or(TreeError::Empty)?;
        if !self.pending_trivia.is_empty() {
            log::debug!(
                "dropping {} byte(s) of trailing trivia with no token to attach to",
                self.pending_trivia.len()
            );
        }
        SyntaxTree::from_parts(self.parts, root)
    }
}
