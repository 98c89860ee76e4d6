//! C#-shaped fixtures for integration tests
//!
//! A [`Fixture`] owns the symbol table of one compilation and renders units
//! through [`UnitWriter`], which lays code out the way a formatter would and
//! records host bindings as it goes. Nodes a test wants to point at are
//! marked by name and resolved to spans once the tree is finished.

#![allow(dead_code)]

use sharpcheck::semantic::{SpecialType, SymbolKind, TypeKind};
use sharpcheck::syntax::{NodeId, Span, SyntaxKind, TreeBuilder};
use sharpcheck::{Bindings, Compilation, SourceUnit, Symbol, SymbolId, SymbolTable};
use std::collections::HashMap;
use std::path::PathBuf;

const INDENT: &str = "    ";

/// Symbols and units of one test compilation
pub struct Fixture {
    pub symbols: SymbolTable,
    pub object: SymbolId,
    pub object_equals: SymbolId,
    pub object_get_hash_code: SymbolId,
    units: Vec<SourceUnit>,
    marks: HashMap<String, (PathBuf, Span)>,
}

impl Fixture {
    /// A table holding `System.Object` and its virtual members
    pub fn new() -> Self {
        let mut symbols = SymbolTable::new();
        let system = symbols.insert(Symbol::new("System", SymbolKind::Namespace));
        let object = symbols.insert(
            Symbol::named_type("Object", TypeKind::Class)
                .in_container(system)
                .with_special(SpecialType::Object),
        );
        let object_equals = symbols.insert(Symbol::method("Equals", 1).in_container(object));
        let object_get_hash_code =
            symbols.insert(Symbol::method("GetHashCode", 0).in_container(object));
        symbols.insert(Symbol::method("ToString", 0).in_container(object));
        Self {
            symbols,
            object,
            object_equals,
            object_get_hash_code,
            units: Vec::new(),
            marks: HashMap::new(),
        }
    }

    pub fn class(&mut self, name: &str) -> SymbolId {
        self.symbols
            .insert(Symbol::named_type(name, TypeKind::Class))
    }

    pub fn property(&mut self, class: SymbolId, name: &str) -> SymbolId {
        self.symbols.insert(Symbol::property(name).in_container(class))
    }

    pub fn method(&mut self, class: SymbolId, name: &str, parameters: usize) -> SymbolId {
        self.symbols
            .insert(Symbol::method(name, parameters).in_container(class))
    }

    pub fn override_of(
        &mut self,
        class: SymbolId,
        name: &str,
        parameters: usize,
        overridden: SymbolId,
    ) -> SymbolId {
        self.symbols.insert(
            Symbol::method(name, parameters)
                .in_container(class)
                .overriding(overridden),
        )
    }

    /// An enum type and its members in declaration order
    pub fn enum_type(&mut self, name: &str, members: &[&str]) -> (SymbolId, Vec<SymbolId>) {
        let ty = self.symbols.insert(Symbol::named_type(name, TypeKind::Enum));
        let members = members
            .iter()
            .map(|m| self.symbols.insert(Symbol::enum_member(m).in_container(ty)))
            .collect();
        (ty, members)
    }

    /// A compiler-synthesized member such as `value__`
    pub fn implicit_member(&mut self, ty: SymbolId, name: &str) -> SymbolId {
        self.symbols.insert(
            Symbol::new(name, SymbolKind::Field)
                .in_container(ty)
                .implicit(),
        )
    }

    /// Render one unit
    pub fn unit(&mut self, path: &str, build: impl FnOnce(&mut UnitWriter)) {
        self.unit_with_flag(path, false, build);
    }

    /// Render one unit the host marked as generated
    pub fn generated_unit(&mut self, path: &str, build: impl FnOnce(&mut UnitWriter)) {
        self.unit_with_flag(path, true, build);
    }

    fn unit_with_flag(&mut self, path: &str, generated: bool, build: impl FnOnce(&mut UnitWriter)) {
        let mut writer = UnitWriter::new();
        writer.b.start_node(SyntaxKind::CompilationUnit);
        build(&mut writer);
        writer.b.trivia("\n");
        writer.b.fixed_token(SyntaxKind::EndOfFileToken);
        writer.b.finish_node();

        let tree = writer.b.finish().expect("fixture tree is well formed");
        for (name, id) in writer.marks {
            let span = tree.node(id).expect("marked node exists").span();
            self.marks.insert(name, (PathBuf::from(path), span));
        }
        self.units.push(
            SourceUnit::new(path, tree, writer.bindings).with_generated(generated),
        );
    }

    /// Span of a marked node
    pub fn span(&self, mark: &str) -> Span {
        self.marks
            .get(mark)
            .unwrap_or_else(|| panic!("no mark named '{}'", mark))
            .1
    }

    /// Compilation over the units rendered so far; the symbol table is kept
    /// so the same fixture can render an expected "after" compilation.
    pub fn take_compilation(&mut self) -> Compilation {
        let mut compilation = Compilation::new(self.symbols.clone());
        for unit in self.units.drain(..) {
            compilation = compilation.with_unit(unit);
        }
        compilation
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Method declaration shape
pub struct Method<'a> {
    name: &'a str,
    attributes: Vec<&'a str>,
    modifiers: Vec<SyntaxKind>,
    returns: SyntaxKind,
    parameters: Vec<(SyntaxKind, &'a str)>,
    symbol: Option<SymbolId>,
}

impl<'a> Method<'a> {
    /// `public void Name()`
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            modifiers: vec![SyntaxKind::PublicKeyword],
            returns: SyntaxKind::VoidKeyword,
            parameters: Vec::new(),
            symbol: None,
        }
    }

    /// `public override <returns> Name(...)`
    pub fn overriding(name: &'a str, returns: SyntaxKind) -> Self {
        Self::new(name)
            .modifiers(&[SyntaxKind::PublicKeyword, SyntaxKind::OverrideKeyword])
            .returns(returns)
    }

    pub fn attribute(mut self, name: &'a str) -> Self {
        self.attributes.push(name);
        self
    }

    pub fn modifiers(mut self, modifiers: &[SyntaxKind]) -> Self {
        self.modifiers = modifiers.to_vec();
        self
    }

    pub fn returns(mut self, returns: SyntaxKind) -> Self {
        self.returns = returns;
        self
    }

    pub fn parameter(mut self, ty: SyntaxKind, name: &'a str) -> Self {
        self.parameters.push((ty, name));
        self
    }

    pub fn symbol(mut self, symbol: SymbolId) -> Self {
        self.symbol = Some(symbol);
        self
    }
}

/// One argument of a rendered call
#[derive(Clone, Copy)]
pub enum Arg<'a> {
    /// `"text"`
    Str(&'a str),
    /// `"text"` wrapped in `n` pairs of parentheses
    Parenthesized(usize, &'a str),
    /// `nameof(Name)`
    NameOf(&'a str),
    /// `nameof(Name)` wrapped in `n` pairs of parentheses
    ParenthesizedNameOf(usize, &'a str),
    Bool(bool),
    /// A bare identifier
    Ident(&'a str),
}

/// One label of a switch section
#[derive(Clone, Copy)]
pub enum Label<'a> {
    /// `case Enum.Member:`
    Qualified(&'a str, &'a str, Option<SymbolId>),
    /// `case Member:` (with `using static`)
    Bare(&'a str, Option<SymbolId>),
    /// `case 1:`
    Number(&'a str),
    /// `case Enum.Member when condition:`
    Guarded(&'a str, &'a str, &'a str),
    /// `default:`
    Default,
}

/// Last statement of a switch section
#[derive(Clone, Copy)]
pub enum Exit {
    Break,
    Throw,
}

/// Renders declarations into one unit's tree and records bindings
pub struct UnitWriter {
    b: TreeBuilder,
    bindings: Bindings,
    depth: usize,
    marks: Vec<(String, NodeId)>,
}

impl UnitWriter {
    fn new() -> Self {
        Self {
            b: TreeBuilder::new(),
            bindings: Bindings::new(),
            depth: 0,
            marks: Vec::new(),
        }
    }

    /// Name a node so the test can ask for its span later
    pub fn mark(&mut self, name: &str, id: NodeId) {
        self.marks.push((name.to_string(), id));
    }

    /// Raw trivia before the next token, e.g. a header comment
    pub fn comment(&mut self, text: &str) {
        self.b.trivia(text);
    }

    fn line(&mut self) {
        let trivia = format!("\n{}", INDENT.repeat(self.depth));
        self.b.trivia(&trivia);
    }

    fn space(&mut self) {
        self.b.trivia(" ");
    }

    fn modifiers(&mut self, modifiers: &[SyntaxKind]) {
        for modifier in modifiers {
            self.b.fixed_token(*modifier);
            self.space();
        }
    }

    fn braces(&mut self, body: impl FnOnce(&mut Self)) {
        self.line();
        self.b.fixed_token(SyntaxKind::OpenBraceToken);
        self.depth += 1;
        body(self);
        self.depth -= 1;
        self.line();
        self.b.fixed_token(SyntaxKind::CloseBraceToken);
    }

    /// `[modifiers] class Name { ... }`; returns the name token
    pub fn class(
        &mut self,
        name: &str,
        symbol: Option<SymbolId>,
        modifiers: &[SyntaxKind],
        body: impl FnOnce(&mut Self),
    ) -> NodeId {
        self.line();
        let class = self.b.start_node(SyntaxKind::ClassDeclaration);
        self.modifiers(modifiers);
        self.b.fixed_token(SyntaxKind::ClassKeyword);
        self.space();
        let identifier = self.b.identifier(name);
        self.braces(body);
        self.b.finish_node();
        if let Some(symbol) = symbol {
            self.bindings.declare(class, symbol);
        }
        identifier
    }

    /// `enum Name { A, B }`
    pub fn enum_declaration(&mut self, name: &str, symbol: SymbolId, members: &[(&str, SymbolId)]) {
        self.line();
        let declaration = self.b.start_node(SyntaxKind::EnumDeclaration);
        self.b.fixed_token(SyntaxKind::EnumKeyword);
        self.space();
        self.b.identifier(name);
        self.braces(|w| {
            for (i, (member, member_symbol)) in members.iter().enumerate() {
                w.line();
                let node = w.b.node(SyntaxKind::EnumMemberDeclaration, |b| {
                    b.identifier(member);
                });
                if i + 1 < members.len() {
                    w.b.fixed_token(SyntaxKind::CommaToken);
                }
                w.bindings.declare(node, *member_symbol);
            }
        });
        self.b.finish_node();
        self.bindings.declare(declaration, symbol);
    }

    /// `public <type> Name { get; set; }`
    pub fn property(&mut self, ty: SyntaxKind, name: &str, symbol: Option<SymbolId>) -> NodeId {
        self.line();
        let property = self.b.start_node(SyntaxKind::PropertyDeclaration);
        self.modifiers(&[SyntaxKind::PublicKeyword]);
        self.b.predefined_type(ty);
        self.space();
        self.b.identifier(name);
        self.space();
        self.b.node(SyntaxKind::AccessorList, |b| {
            b.fixed_token(SyntaxKind::OpenBraceToken);
            for (kind, keyword) in [
                (SyntaxKind::GetAccessorDeclaration, SyntaxKind::GetKeyword),
                (SyntaxKind::SetAccessorDeclaration, SyntaxKind::SetKeyword),
            ] {
                b.trivia(" ");
                b.node(kind, |b| {
                    b.fixed_token(keyword);
                    b.fixed_token(SyntaxKind::SemicolonToken);
                });
            }
            b.trivia(" ");
            b.fixed_token(SyntaxKind::CloseBraceToken);
        });
        self.b.finish_node();
        if let Some(symbol) = symbol {
            self.bindings.declare(property, symbol);
        }
        property
    }

    /// A method with a block body; returns the declaration node
    pub fn method(&mut self, method: Method<'_>, body: impl FnOnce(&mut Self)) -> NodeId {
        self.line();
        let declaration = self.b.start_node(SyntaxKind::MethodDeclaration);
        if !method.attributes.is_empty() {
            self.b.node(SyntaxKind::AttributeList, |b| {
                b.fixed_token(SyntaxKind::OpenBracketToken);
                for (i, name) in method.attributes.iter().enumerate() {
                    if i > 0 {
                        b.fixed_token(SyntaxKind::CommaToken);
                        b.trivia(" ");
                    }
                    b.node(SyntaxKind::Attribute, |b| {
                        b.identifier_name(name);
                    });
                }
                b.fixed_token(SyntaxKind::CloseBracketToken);
            });
            self.line();
        }
        self.modifiers(&method.modifiers);
        self.b.predefined_type(method.returns);
        self.space();
        self.b.identifier(method.name);
        self.b.node(SyntaxKind::ParameterList, |b| {
            b.fixed_token(SyntaxKind::OpenParenToken);
            for (i, (ty, name)) in method.parameters.iter().enumerate() {
                if i > 0 {
                    b.fixed_token(SyntaxKind::CommaToken);
                    b.trivia(" ");
                }
                b.node(SyntaxKind::Parameter, |b| {
                    b.predefined_type(*ty);
                    b.trivia(" ");
                    b.identifier(name);
                });
            }
            b.fixed_token(SyntaxKind::CloseParenToken);
        });
        self.b.start_node(SyntaxKind::Block);
        self.braces(body);
        self.b.finish_node();
        self.b.finish_node();
        if let Some(symbol) = method.symbol {
            self.bindings.declare(declaration, symbol);
        }
        declaration
    }

    fn argument(&mut self, arg: Arg<'_>) -> NodeId {
        let mut inner = None;
        self.b.node(SyntaxKind::Argument, |b| {
            inner = Some(match arg {
                Arg::Str(text) => b.string_literal(text),
                Arg::Parenthesized(depth, text) => {
                    wrap(b, depth, &|b: &mut TreeBuilder| b.string_literal(text))
                }
                Arg::NameOf(name) => b.nameof_expression(name),
                Arg::ParenthesizedNameOf(depth, name) => {
                    wrap(b, depth, &|b: &mut TreeBuilder| b.nameof_expression(name))
                }
                Arg::Bool(value) => b.bool_literal(value),
                Arg::Ident(name) => b.identifier_name(name),
            });
        });
        inner.expect("argument expression")
    }

    /// `callee(args);`; returns the innermost expression of each argument
    pub fn call(&mut self, callee: &str, args: &[Arg<'_>]) -> Vec<NodeId> {
        self.line();
        let mut ids = Vec::with_capacity(args.len());
        self.b.start_node(SyntaxKind::ExpressionStatement);
        self.b.start_node(SyntaxKind::InvocationExpression);
        self.b.identifier_name(callee);
        self.b.start_node(SyntaxKind::ArgumentList);
        self.b.fixed_token(SyntaxKind::OpenParenToken);
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.b.fixed_token(SyntaxKind::CommaToken);
                self.space();
            }
            ids.push(self.argument(*arg));
        }
        self.b.fixed_token(SyntaxKind::CloseParenToken);
        self.b.finish_node();
        self.b.finish_node();
        self.b.fixed_token(SyntaxKind::SemicolonToken);
        self.b.finish_node();
        ids
    }

    /// `switch (expression) { ... }`; returns the governing expression
    pub fn switch(
        &mut self,
        expression: &str,
        ty: Option<SymbolId>,
        sections: impl FnOnce(&mut Self),
    ) -> NodeId {
        self.line();
        self.b.start_node(SyntaxKind::SwitchStatement);
        self.b.fixed_token(SyntaxKind::SwitchKeyword);
        self.space();
        self.b.fixed_token(SyntaxKind::OpenParenToken);
        let governing = self.b.identifier_name(expression);
        self.b.fixed_token(SyntaxKind::CloseParenToken);
        self.braces(sections);
        self.b.finish_node();
        if let Some(ty) = ty {
            self.bindings.set_type(governing, ty);
        }
        governing
    }

    /// One switch section: labels on separate lines, then its exit statement
    pub fn section(&mut self, labels: &[Label<'_>], exit: Exit) {
        self.b.start_node(SyntaxKind::SwitchSection);
        for label in labels {
            self.line();
            self.label(*label);
        }
        self.depth += 1;
        self.line();
        match exit {
            Exit::Break => {
                self.b.node(SyntaxKind::BreakStatement, |b| {
                    b.fixed_token(SyntaxKind::BreakKeyword);
                    b.fixed_token(SyntaxKind::SemicolonToken);
                });
            }
            Exit::Throw => {
                self.b.throw_not_implemented();
            }
        }
        self.depth -= 1;
        self.b.finish_node();
    }

    fn label(&mut self, label: Label<'_>) {
        match label {
            Label::Qualified(enum_name, member, symbol) => {
                self.b.start_node(SyntaxKind::CaseSwitchLabel);
                self.b.fixed_token(SyntaxKind::CaseKeyword);
                self.space();
                let value = self.b.member_access(enum_name, member);
                self.b.fixed_token(SyntaxKind::ColonToken);
                self.b.finish_node();
                if let Some(symbol) = symbol {
                    self.bindings.reference(value, symbol);
                }
            }
            Label::Bare(member, symbol) => {
                self.b.start_node(SyntaxKind::CaseSwitchLabel);
                self.b.fixed_token(SyntaxKind::CaseKeyword);
                self.space();
                let value = self.b.identifier_name(member);
                self.b.fixed_token(SyntaxKind::ColonToken);
                self.b.finish_node();
                if let Some(symbol) = symbol {
                    self.bindings.reference(value, symbol);
                }
            }
            Label::Number(text) => {
                self.b.node(SyntaxKind::CaseSwitchLabel, |b| {
                    b.fixed_token(SyntaxKind::CaseKeyword);
                    b.trivia(" ");
                    b.numeric_literal(text);
                    b.fixed_token(SyntaxKind::ColonToken);
                });
            }
            Label::Guarded(enum_name, member, condition) => {
                self.b.node(SyntaxKind::CasePatternSwitchLabel, |b| {
                    b.fixed_token(SyntaxKind::CaseKeyword);
                    b.trivia(" ");
                    b.node(SyntaxKind::ConstantPattern, |b| {
                        b.member_access(enum_name, member);
                    });
                    b.trivia(" ");
                    b.node(SyntaxKind::WhenClause, |b| {
                        b.fixed_token(SyntaxKind::WhenKeyword);
                        b.trivia(" ");
                        b.identifier_name(condition);
                    });
                    b.fixed_token(SyntaxKind::ColonToken);
                });
            }
            Label::Default => {
                self.b.node(SyntaxKind::DefaultSwitchLabel, |b| {
                    b.fixed_token(SyntaxKind::DefaultKeyword);
                    b.fixed_token(SyntaxKind::ColonToken);
                });
            }
        }
    }
}

/// An expression inside `depth` parentheses; returns the innermost node
fn wrap(b: &mut TreeBuilder, depth: usize, inner: &dyn Fn(&mut TreeBuilder) -> NodeId) -> NodeId {
    if depth == 0 {
        return inner(b);
    }
    let mut innermost = None;
    b.parenthesized(|b| {
        innermost = Some(wrap(b, depth - 1, inner));
    });
    innermost.expect("wrapped expression")
}
