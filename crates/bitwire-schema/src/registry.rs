use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::config::RegistryConfig;
use crate::definition::{parse_document, Definition, MessageDefinition};
use crate::error::{Result, SchemaError};
use crate::layout::{BitfieldSpec, EnumSpec, FieldKind, MessageLayout};

/// File name suffix of definition files loaded from a directory.
pub const DEFINITION_SUFFIX: &str = ".wire.json";

/// Name-keyed registry of compiled bitfields, enums and message layouts.
///
/// Names are unique across all three kinds. Registration is all-or-nothing:
/// a document that fails to compile leaves the registry unchanged.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    bitfields: BTreeMap<String, BitfieldSpec>,
    enums: BTreeMap<String, EnumSpec>,
    messages: BTreeMap<String, MessageLayout>,
    config: RegistryConfig,
}

impl SchemaRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            bitfields: BTreeMap::new(),
            enums: BTreeMap::new(),
            messages: BTreeMap::new(),
            config,
        }
    }

    /// Register every definition in a JSON document.
    pub fn register(&mut self, json: &str) -> Result<()> {
        let definitions = parse_document(json)?;
        self.register_definitions(definitions)
    }

    pub fn register_definition(&mut self, definition: Definition) -> Result<()> {
        self.register_definitions(vec![definition])
    }

    /// Compile and register a batch of definitions.
    ///
    /// Bitfields and enums are compiled before messages, so a message may
    /// reference a type defined later in the same batch.
    pub fn register_definitions(&mut self, definitions: Vec<Definition>) -> Result<()> {
        let mut staged = self.clone();
        let mut messages: Vec<MessageDefinition> = Vec::new();

        for definition in definitions {
            staged.ensure_unused(definition.name())?;
            match definition {
                Definition::Bitfield(def) => {
                    let spec = BitfieldSpec::compile(&def)?;
                    staged.bitfields.insert(def.name, spec);
                }
                Definition::Enum(def) => {
                    let spec = EnumSpec::compile(&def, &staged.config)?;
                    staged.enums.insert(def.name, spec);
                }
                Definition::Message(def) => {
                    if messages.iter().any(|m| m.name == def.name) {
                        return Err(SchemaError::Duplicate(def.name));
                    }
                    messages.push(def);
                }
            }
        }

        for def in messages {
            if staged.bitfields.contains_key(&def.name) || staged.enums.contains_key(&def.name) {
                return Err(SchemaError::Duplicate(def.name));
            }
            let layout =
                MessageLayout::compile(&def, &staged.config, |name| staged.resolve(name))?;
            debug!(message = %layout.name, size = layout.size, "compiled message layout");
            staged.messages.insert(def.name, layout);
        }

        *self = staged;
        Ok(())
    }

    fn ensure_unused(&self, name: &str) -> Result<()> {
        if self.bitfields.contains_key(name)
            || self.enums.contains_key(name)
            || self.messages.contains_key(name)
        {
            return Err(SchemaError::Duplicate(name.to_string()));
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> Option<FieldKind> {
        if let Some(spec) = self.enums.get(name) {
            return Some(FieldKind::Enum { spec: spec.clone() });
        }
        self.bitfields
            .get(name)
            .map(|spec| FieldKind::Bitfield { spec: spec.clone() })
    }

    /// Load `*.wire.json` definition files from a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Load `*.wire.json` definition files from a directory with explicit
    /// config.
    ///
    /// Files are read in name order and compiled as one batch, so types may be
    /// referenced across files.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        let mut loaded_file_count = 0usize;

        let entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
        let mut entries = entries
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut definitions = Vec::new();
        for entry in entries {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if !file_name.ends_with(DEFINITION_SUFFIX) {
                continue;
            }
            let entry_path = entry.path();
            let path_metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_type = path_metadata.file_type();

            if file_type.is_symlink() {
                return Err(SchemaError::LoadFailed(format!(
                    "refusing to load definition symlink: {file_name}"
                )));
            }
            if !file_type.is_file() {
                continue;
            }

            loaded_file_count = loaded_file_count.saturating_add(1);
            if loaded_file_count > config.max_definitions_from_directory {
                return Err(SchemaError::LoadFailed(format!(
                    "definition file count exceeds configured max ({}): {}",
                    config.max_definitions_from_directory, loaded_file_count
                )));
            }

            let file = std::fs::File::open(&entry_path).map_err(|err| {
                SchemaError::LoadFailed(format!(
                    "failed opening definitions {}: {err}",
                    entry_path.display()
                ))
            })?;
            let opened_metadata = file
                .metadata()
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;

            #[cfg(unix)]
            {
                if !same_file_identity(&path_metadata, &opened_metadata) {
                    return Err(SchemaError::LoadFailed(format!(
                        "definition file changed during load: {file_name}"
                    )));
                }
            }

            let max_bytes = config.max_definition_file_size;
            if opened_metadata.len() > max_bytes as u64 {
                return Err(SchemaError::LoadFailed(format!(
                    "definition file too large ({} bytes): {file_name}",
                    opened_metadata.len()
                )));
            }

            let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
            let mut content = String::new();
            file.take(read_limit)
                .read_to_string(&mut content)
                .map_err(|err| {
                    SchemaError::LoadFailed(format!(
                        "failed reading definitions {}: {err}",
                        entry_path.display()
                    ))
                })?;
            if content.len() > max_bytes {
                return Err(SchemaError::LoadFailed(format!(
                    "definition file too large while reading: {file_name}"
                )));
            }

            let parsed = parse_document(&content).map_err(|err| {
                SchemaError::LoadFailed(format!("{file_name}: {err}"))
            })?;
            debug!(file = %file_name, definitions = parsed.len(), "loaded definition file");
            definitions.extend(parsed);
        }

        registry.register_definitions(definitions)?;
        Ok(registry)
    }

    /// Load from embedded definition documents.
    pub fn from_embedded(documents: &[&str]) -> Result<Self> {
        let mut definitions = Vec::new();
        for document in documents {
            definitions.extend(parse_document(document)?);
        }
        let mut registry = Self::new();
        registry.register_definitions(definitions)?;
        Ok(registry)
    }

    pub fn message(&self, name: &str) -> Result<&MessageLayout> {
        self.messages
            .get(name)
            .ok_or_else(|| SchemaError::UnknownMessage(name.to_string()))
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumSpec> {
        self.enums.get(name)
    }

    pub fn bitfield(&self, name: &str) -> Option<&BitfieldSpec> {
        self.bitfields.get(name)
    }

    /// Message layouts in name order.
    pub fn messages(&self) -> impl Iterator<Item = &MessageLayout> {
        self.messages.values()
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumSpec> {
        self.enums.values()
    }

    pub fn bitfields(&self) -> impl Iterator<Item = &BitfieldSpec> {
        self.bitfields.values()
    }

    /// Every registered name, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .bitfields
            .keys()
            .chain(self.enums.keys())
            .chain(self.messages.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.bitfields.is_empty() && self.enums.is_empty() && self.messages.is_empty()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn same_file_identity(
    path_metadata: &std::fs::Metadata,
    opened_metadata: &std::fs::Metadata,
) -> bool {
    use std::os::unix::fs::MetadataExt;
    path_metadata.dev() == opened_metadata.dev() && path_metadata.ino() == opened_metadata.ino()
}
