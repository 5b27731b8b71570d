use thiserror::Error;

/// Errors returned when creating a bidirectional binding
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindError {
    #[error("these two values are already bound together")]
    AlreadyBound,
    #[error("an observable value cannot be bound to itself")]
    SelfBinding,
}

/// Errors reported by a container or cursor. These are passed through to the caller
/// unchanged, and no change event is fired when one occurs.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerError {
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("range {start}..{end} out of bounds for length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },
    #[error("cursor has no current element")]
    NoCurrentElement,
}
