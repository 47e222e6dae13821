/// Controls how definitions are loaded and compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum number of definition files loaded from a directory.
    pub max_definitions_from_directory: usize,
    /// Maximum bytes allowed per definition file loaded from a directory.
    pub max_definition_file_size: usize,
    /// Maximum byte size of a compiled message layout.
    pub max_message_size: usize,
    /// When true, enum values must form the dense range `0..n`, so a bounds
    /// check alone implies a named value.
    pub require_dense_enums: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_definitions_from_directory: 256,
            max_definition_file_size: 256 * 1024,
            max_message_size: 64 * 1024,
            require_dense_enums: false,
        }
    }
}
