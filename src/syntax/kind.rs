//! Closed set of node and token kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind tag for every element in a syntax tree.
///
/// Node kinds and token kinds share one enum so analyzers can register for
/// either with the same API. Adding a kind here forces every exhaustive match
/// over it to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SyntaxKind {
    // Declarations
    CompilationUnit,
    UsingDirective,
    NamespaceDeclaration,
    ClassDeclaration,
    EnumDeclaration,
    EnumMemberDeclaration,
    BaseList,
    AttributeList,
    Attribute,
    MethodDeclaration,
    PropertyDeclaration,
    AccessorList,
    GetAccessorDeclaration,
    SetAccessorDeclaration,
    FieldDeclaration,
    EventFieldDeclaration,
    ParameterList,
    Parameter,

    // Statements
    Block,
    ExpressionStatement,
    ReturnStatement,
    ThrowStatement,
    BreakStatement,
    SwitchStatement,
    SwitchSection,
    CaseSwitchLabel,
    CasePatternSwitchLabel,
    DefaultSwitchLabel,
    WhenClause,
    ConstantPattern,

    // Expressions
    InvocationExpression,
    ArgumentList,
    Argument,
    LiteralExpression,
    ParenthesizedExpression,
    IdentifierName,
    PredefinedType,
    SimpleMemberAccessExpression,
    NameOfExpression,
    SimpleAssignmentExpression,
    CastExpression,
    ObjectCreationExpression,

    // Tokens
    IdentifierToken,
    StringLiteralToken,
    NumericLiteralToken,

    UsingKeyword,
    NamespaceKeyword,
    ClassKeyword,
    EnumKeyword,
    PublicKeyword,
    PrivateKeyword,
    ProtectedKeyword,
    InternalKeyword,
    StaticKeyword,
    PartialKeyword,
    OverrideKeyword,
    VirtualKeyword,
    SealedKeyword,
    AbstractKeyword,
    EventKeyword,
    GetKeyword,
    SetKeyword,
    ReturnKeyword,
    SwitchKeyword,
    CaseKeyword,
    DefaultKeyword,
    WhenKeyword,
    BreakKeyword,
    ThrowKeyword,
    NewKeyword,
    TrueKeyword,
    FalseKeyword,
    NullKeyword,
    NameOfKeyword,
    VoidKeyword,
    BoolKeyword,
    IntKeyword,
    StringKeyword,
    ObjectKeyword,

    OpenBraceToken,
    CloseBraceToken,
    OpenParenToken,
    CloseParenToken,
    OpenBracketToken,
    CloseBracketToken,
    SemicolonToken,
    ColonToken,
    CommaToken,
    DotToken,
    EqualsToken,
    EndOfFileToken,
}

impl SyntaxKind {
    /// Whether this kind is a leaf token rather than an interior node
    pub fn is_token(self) -> bool {
        self >= SyntaxKind::IdentifierToken
    }

    /// Whether this kind is a keyword token
    pub fn is_keyword(self) -> bool {
        self >= SyntaxKind::UsingKeyword && self <= SyntaxKind::ObjectKeyword
    }

    /// Whether this kind can appear as a declaration modifier
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            SyntaxKind::PublicKeyword
                | SyntaxKind::PrivateKeyword
                | SyntaxKind::ProtectedKeyword
                | SyntaxKind::InternalKeyword
                | SyntaxKind::StaticKeyword
                | SyntaxKind::PartialKeyword
                | SyntaxKind::OverrideKeyword
                | SyntaxKind::VirtualKeyword
                | SyntaxKind::SealedKeyword
                | SyntaxKind::AbstractKeyword
        )
    }

    /// Text of tokens whose spelling never varies
    pub fn fixed_text(self) -> Option<&'static str> {
        let text = match self {
            SyntaxKind::UsingKeyword => "using",
            SyntaxKind::NamespaceKeyword => "namespace",
            SyntaxKind::ClassKeyword => "class",
            SyntaxKind::EnumKeyword => "enum",
            SyntaxKind::PublicKeyword => "public",
            SyntaxKind::PrivateKeyword => "private",
            SyntaxKind::ProtectedKeyword => "protected",
            SyntaxKind::InternalKeyword => "internal",
            SyntaxKind::StaticKeyword => "static",
            SyntaxKind::PartialKeyword => "partial",
            SyntaxKind::OverrideKeyword => "override",
            SyntaxKind::VirtualKeyword => "virtual",
            SyntaxKind::SealedKeyword => "sealed",
            SyntaxKind::AbstractKeyword => "abstract",
            SyntaxKind::EventKeyword => "event",
            SyntaxKind::GetKeyword => "get",
            SyntaxKind::SetKeyword => "set",
            SyntaxKind::ReturnKeyword => "return",
            SyntaxKind::SwitchKeyword => "switch",
            SyntaxKind::CaseKeyword => "case",
            SyntaxKind::DefaultKeyword => "default",
            SyntaxKind::WhenKeyword => "when",
            SyntaxKind::BreakKeyword => "break",
            SyntaxKind::ThrowKeyword => "throw",
            SyntaxKind::NewKeyword => "new",
            SyntaxKind::TrueKeyword => "true",
            SyntaxKind::FalseKeyword => "false",
            SyntaxKind::NullKeyword => "null",
            SyntaxKind::NameOfKeyword => "nameof",
            SyntaxKind::VoidKeyword => "void",
            SyntaxKind::BoolKeyword => "bool",
            SyntaxKind::IntKeyword => "int",
            SyntaxKind::StringKeyword => "string",
            SyntaxKind::ObjectKeyword => "object",
            SyntaxKind::OpenBraceToken => "{",
            SyntaxKind::CloseBraceToken => "}",
            SyntaxKind::OpenParenToken => "(",
            SyntaxKind::CloseParenToken => ")",
            SyntaxKind::OpenBracketToken => "[",
            SyntaxKind::CloseBracketToken => "]",
            SyntaxKind::SemicolonToken => ";",
            SyntaxKind::ColonToken => ":",
            SyntaxKind::CommaToken => ",",
            SyntaxKind::DotToken => ".",
            SyntaxKind::EqualsToken => "=",
            SyntaxKind::EndOfFileToken => "",
            _ => return None,
        };
        Some(text)
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
