//! Options recognized by the diff engine and renderer

/// Flags consumed by a single comparison pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffConfig {
    /// Omit schema from identity keys and from rendered qualified names.
    pub ignore_schema: bool,
    /// Embed statements as multi-line literals in generated scripts.
    /// Has no effect on identity or equality.
    pub render_definition_multiline: bool,
    /// Append CASCADE to the upgrade statement of a Drop operation.
    pub drop_cascade: bool,
}

impl DiffConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_schema(mut self, value: bool) -> Self {
        self.ignore_schema = value;
        self
    }

    pub fn render_definition_multiline(mut self, value: bool) -> Self {
        self.render_definition_multiline = value;
        self
    }

    pub fn drop_cascade(mut self, value: bool) -> Self {
        self.drop_cascade = value;
        self
    }
}
