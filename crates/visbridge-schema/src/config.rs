/// Registry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Validating a kind with no schema fails with [`SchemaError::NoSchema`](crate::SchemaError::NoSchema)
    /// instead of passing.
    pub fail_on_missing_schema: bool,
    /// Upper bound on the size of one schema file, in bytes.
    pub max_schema_file_size: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            fail_on_missing_schema: false,
            max_schema_file_size: 256 * 1024,
        }
    }
}

impl RegistryConfig {
    pub fn with_fail_on_missing_schema(mut self, fail: bool) -> Self {
        self.fail_on_missing_schema = fail;
        self
    }
}
