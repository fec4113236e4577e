use crate::schema::FieldKind;
use crate::selector::Operator;

/// Reasons a selector can be rejected.
///
/// Parsing is all-or-nothing: the first bad term aborts the whole selector and
/// is carried in the error for diagnostics. Evaluation of a parsed query never
/// fails, so this is the only error type the query engine produces.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated quote in `{term}`")]
    UnterminatedQuote { term: String },

    #[error("unexpected token `{token}`: expected <field><operator><value>")]
    UnexpectedToken { token: String },

    #[error("unknown field `{field}` in `{term}`")]
    UnknownField { field: String, term: String },

    #[error("invalid number `{token}` in `{term}`")]
    InvalidNumber { token: String, term: String },

    #[error("operator `{op}` cannot be applied to {kind} field `{field}`")]
    InvalidOperatorForType {
        field: String,
        op: Operator,
        kind: FieldKind,
    },

    #[error("{kind} field `{field}` cannot be compared with {found} literal in `{term}`")]
    LiteralTypeMismatch {
        field: String,
        kind: FieldKind,
        found: &'static str,
        term: String,
    },
}
