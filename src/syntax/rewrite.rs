//! Producing new trees from old ones

use super::{NodeId, SyntaxNode, SyntaxTree, TreeBuilder, TreeError};
use std::collections::HashMap;

/// Collects edits against a tree and materializes them as a fresh tree.
///
/// The source tree is never touched. Untouched regions are copied token for
/// token, so their text and trivia survive unchanged.
pub struct TreeRewriter<'t> {
    tree: &'t SyntaxTree,
    replacements: HashMap<NodeId, SyntaxTree>,
    insertions: HashMap<NodeId, Vec<(usize, SyntaxTree)>>,
}

impl<'t> TreeRewriter<'t> {
    pub fn new(tree: &'t SyntaxTree) -> Self {
        Self {
            tree,
            replacements: HashMap::new(),
            insertions: HashMap::new(),
        }
    }

    /// Swap `target` for `replacement`.
    ///
    /// The replacement takes over the target's leading trivia so surrounding
    /// whitespace is unchanged.
    pub fn replace(&mut self, target: NodeId, replacement: SyntaxTree) -> &mut Self {
        self.replacements.insert(target, replacement);
        self
    }

    /// Insert `fragment` as a child of `parent` before the child at `index`.
    ///
    /// Fragments at the same index keep their insertion order. The fragment's
    /// own trivia is used as is.
    pub fn insert(&mut self, parent: NodeId, index: usize, fragment: SyntaxTree) -> &mut Self {
        self.insertions
            .entry(parent)
            .or_default()
            .push((index, fragment));
        self
    }

    /// Build the rewritten tree
    pub fn finish(&self) -> Result<SyntaxTree, TreeError> {
        for id in self.replacements.keys().chain(self.insertions.keys()) {
            if self.tree.node(*id).is_none() {
                return Err(TreeError::UnknownNode(id.index()));
            }
        }

        let mut builder = TreeBuilder::new();
        self.copy(&mut builder);
        builder.finish()
    }

    /// Walk the source tree with an explicit stack, splicing in edits
    fn copy(&self, b: &mut TreeBuilder) {
        // Trivia a replacement inherits from the node it stands in for
        let mut inherited: Option<String> = None;
        let mut stack = vec![Step::Source(self.tree.root())];

        while let Some(step) = stack.pop() {
            match step {
                Step::Source(node) => {
                    if let Some(replacement) = self.replacements.get(&node.id()) {
                        inherited = Some(node.leading_trivia().to_string());
                        stack.push(Step::EndReplacement);
                        stack.push(Step::Verbatim(replacement.root()));
                        continue;
                    }
                    if node.is_token() {
                        b.token_with_trivia(node.kind(), node.token_text(), node.leading_trivia());
                        continue;
                    }

                    b.start_node(node.kind());
                    let inserted = self
                        .insertions
                        .get(&node.id())
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    let mut steps = Vec::new();
                    let mut count = 0;
                    for (index, child) in node.children().enumerate() {
                        steps.extend(
                            inserted
                                .iter()
                                .filter(|(at, _)| *at == index)
                                .map(|(_, fragment)| Step::Verbatim(fragment.root())),
                        );
                        steps.push(Step::Source(child));
                        count = index + 1;
                    }
                    steps.extend(
                        inserted
                            .iter()
                            .filter(|(at, _)| *at >= count)
                            .map(|(_, fragment)| Step::Verbatim(fragment.root())),
                    );
                    steps.push(Step::Exit);
                    stack.extend(steps.into_iter().rev());
                }
                Step::Verbatim(node) => {
                    if node.is_token() {
                        let trivia = inherited
                            .take()
                            .unwrap_or_else(|| node.leading_trivia().to_string());
                        b.token_with_trivia(node.kind(), node.token_text(), &trivia);
                        continue;
                    }
                    b.start_node(node.kind());
                    stack.push(Step::Exit);
                    stack.extend(node.children().rev().map(Step::Verbatim));
                }
                Step::EndReplacement => {
                    inherited = None;
                }
                Step::Exit => {
                    b.finish_node();
                }
            }
        }
    }
}

/// One unit of work for [`TreeRewriter::copy`]
enum Step<'a> {
    /// A node of the source tree, subject to edits
    Source(SyntaxNode<'a>),
    /// A node of a replacement or inserted fragment, copied as is
    Verbatim(SyntaxNode<'a>),
    /// A replacement is done; unused inherited trivia is dropped
    EndReplacement,
    Exit,
}
