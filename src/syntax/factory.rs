//! Shorthand constructors for common node shapes
//!
//! Code fixes build their replacement fragments with these, and so do test
//! fixtures, which keeps rendered output identical between the two.

use super::{NodeId, SyntaxKind, TreeBuilder};
use std::iter::Peekable;
use std::str::Chars;

impl TreeBuilder {
    /// Token whose text is implied by its kind
    pub fn fixed_token(&mut self, kind: SyntaxKind) -> NodeId {
        self.token(kind, kind.fixed_text().unwrap_or(""))
    }

    pub fn identifier(&mut self, name: &str) -> NodeId {
        self.token(SyntaxKind::IdentifierToken, name)
    }

    /// `Name` as an expression
    pub fn identifier_name(&mut self, name: &str) -> NodeId {
        self.node(SyntaxKind::IdentifierName, |b| {
            b.identifier(name);
        })
    }

    /// `bool`, `int`, `string`, `object` or `void`
    pub fn predefined_type(&mut self, keyword: SyntaxKind) -> NodeId {
        self.node(SyntaxKind::PredefinedType, |b| {
            b.fixed_token(keyword);
        })
    }

    /// Regular (non-verbatim) string literal holding `value`
    pub fn string_literal(&mut self, value: &str) -> NodeId {
        let mut text = String::with_capacity(value.len() + 2);
        text.push('"');
        for c in value.chars() {
            match c {
                '"' => text.push_str("\\\""),
                '\\' => text.push_str("\\\\"),
                '\n' => text.push_str("\\n"),
                c => text.push(c),
            }
        }
        text.push('"');
        self.node(SyntaxKind::LiteralExpression, |b| {
            b.token(SyntaxKind::StringLiteralToken, &text);
        })
    }

    pub fn numeric_literal(&mut self, text: &str) -> NodeId {
        self.node(SyntaxKind::LiteralExpression, |b| {
            b.token(SyntaxKind::NumericLiteralToken, text);
        })
    }

    pub fn bool_literal(&mut self, value: bool) -> NodeId {
        let keyword = if value {
            SyntaxKind::TrueKeyword
        } else {
            SyntaxKind::FalseKeyword
        };
        self.node(SyntaxKind::LiteralExpression, |b| {
            b.fixed_token(keyword);
        })
    }

    /// `target.name`
    pub fn member_access(&mut self, target: &str, name: &str) -> NodeId {
        self.node(SyntaxKind::SimpleMemberAccessExpression, |b| {
            b.identifier_name(target);
            b.fixed_token(SyntaxKind::DotToken);
            b.identifier_name(name);
        })
    }

    /// `( inner )`
    pub fn parenthesized(&mut self, inner: impl FnOnce(&mut Self)) -> NodeId {
        self.node(SyntaxKind::ParenthesizedExpression, |b| {
            b.fixed_token(SyntaxKind::OpenParenToken);
            inner(b);
            b.fixed_token(SyntaxKind::CloseParenToken);
        })
    }

    /// `nameof(name)`
    pub fn nameof_expression(&mut self, name: &str) -> NodeId {
        self.node(SyntaxKind::NameOfExpression, |b| {
            b.fixed_token(SyntaxKind::NameOfKeyword);
            b.fixed_token(SyntaxKind::OpenParenToken);
            b.identifier_name(name);
            b.fixed_token(SyntaxKind::CloseParenToken);
        })
    }

    /// `case Enum.Member:`
    pub fn case_label(&mut self, enum_name: &str, member: &str) -> NodeId {
        self.node(SyntaxKind::CaseSwitchLabel, |b| {
            b.fixed_token(SyntaxKind::CaseKeyword);
            b.trivia(" ");
            b.member_access(enum_name, member);
            b.fixed_token(SyntaxKind::ColonToken);
        })
    }

    /// `throw new NotImplementedException();`
    pub fn throw_not_implemented(&mut self) -> NodeId {
        self.node(SyntaxKind::ThrowStatement, |b| {
            b.fixed_token(SyntaxKind::ThrowKeyword);
            b.node(SyntaxKind::ObjectCreationExpression, |b| {
                b.trivia(" ");
                b.fixed_token(SyntaxKind::NewKeyword);
                b.trivia(" ");
                b.identifier_name("NotImplementedException");
                b.node(SyntaxKind::ArgumentList, |b| {
                    b.fixed_token(SyntaxKind::OpenParenToken);
                    b.fixed_token(SyntaxKind::CloseParenToken);
                });
            });
            b.fixed_token(SyntaxKind::SemicolonToken);
        })
    }

    /// A switch section covering one enum member with a throwing body
    pub fn missing_case_section(
        &mut self,
        enum_name: &str,
        member: &str,
        section_indent: &str,
        statement_indent: &str,
    ) -> NodeId {
        self.trivia(section_indent);
        self.node(SyntaxKind::SwitchSection, |b| {
            b.case_label(enum_name, member);
            b.trivia(statement_indent);
            b.throw_not_implemented();
        })
    }
}

/// Decoded value of a string literal token, `None` when the text is not one.
///
/// Handles regular (`"a\"b"`) and verbatim (`@"a""b"`) forms. Malformed
/// escapes make the literal undecodable.
pub fn string_literal_value(text: &str) -> Option<String> {
    if let Some(body) = text
        .strip_prefix("@\"")
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return Some(body.replace("\"\"", "\""));
    }

    let body = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        let decoded = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            'u' => hex_escape(&mut chars, 4, 4)?,
            'U' => hex_escape(&mut chars, 8, 8)?,
            'x' => hex_escape(&mut chars, 1, 4)?,
            c @ ('\'' | '"' | '\\') => c,
            _ => return None,
        };
        value.push(decoded);
    }
    Some(value)
}

/// Read between `min` and `max` hex digits as one code point
fn hex_escape(chars: &mut Peekable<Chars<'_>>, min: usize, max: usize) -> Option<char> {
    let mut code = 0u32;
    let mut digits = 0;
    while digits < max {
        let Some(digit) = chars.peek().and_then(|c| c.to_digit(16)) else {
            break;
        };
        chars.next();
        code = code * 16 + digit;
        digits += 1;
    }
    if digits < min {
        return None;
    }
    char::from_u32(code)
}
