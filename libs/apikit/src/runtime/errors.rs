use crate::schema::GroupVersionKind;

#[derive(Debug, thiserror::Error)]
pub enum SchemeError {
    /// No type registered under the requested identity triple.
    #[error("unknown GroupVersionKind: {0}")]
    UnknownGvk(GroupVersionKind),

    /// No defaulting function bound to the instance's concrete type.
    #[error("unknown type: not found {0}")]
    UnknownType(GroupVersionKind),
}
