/// Internal invariant violations found while lowering IR to bytecode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeGenError {
    #[error("label '{0}' defined more than once")]
    DuplicateLabel(String),

    #[error("unresolved label '{label}' referenced at instruction {at}")]
    UnresolvedLabel { label: String, at: usize },
}
