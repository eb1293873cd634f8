//! Code generation modes understood by the backend.
//!
//! Apps carry the mode as a plain string (`codeGenType`); these helpers map
//! between wire values and display labels, passing unknown input through
//! unchanged.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeGenType {
    Html,
    MultiFile,
}

pub const CODE_GEN_TYPES: [CodeGenType; 2] = [CodeGenType::Html, CodeGenType::MultiFile];

impl CodeGenType {
    /// Wire value (e.g. `"multi_file"`).
    #[must_use]
    pub fn value(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::MultiFile => "multi_file",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Html => "Native HTML mode",
            Self::MultiFile => "Native multi-file mode",
        }
    }

    #[must_use]
    pub fn from_value(value: &str) -> Option<Self> {
        CODE_GEN_TYPES.into_iter().find(|t| t.value() == value)
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        CODE_GEN_TYPES.into_iter().find(|t| t.label() == label)
    }
}

/// Label for a wire value, or the value itself when unknown.
#[must_use]
pub fn label_for(value: &str) -> &str {
    CodeGenType::from_value(value).map_or(value, |t| t.label())
}

/// Wire value for a label, or the label itself when unknown.
#[must_use]
pub fn value_for(label: &str) -> &str {
    CodeGenType::from_label(label).map_or(label, |t| t.value())
}

#[cfg(test)]
#[path = "code_gen_type_test.rs"]
mod tests;
