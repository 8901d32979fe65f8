use serde_json::Value;

/// One entry of a synthetic `files` collection.
///
/// The descriptor is kept exactly as the caller supplied it; nothing about
/// its shape is validated.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticFile {
    descriptor: Value,
}

impl SyntheticFile {
    pub fn new(descriptor: Value) -> Self {
        Self { descriptor }
    }

    pub fn descriptor(&self) -> &Value {
        &self.descriptor
    }

    /// Reads `name`, then `file`, from an object descriptor. A bare string
    /// descriptor is its own name.
    pub fn name(&self) -> Option<&str> {
        match &self.descriptor {
            Value::String(name) => Some(name.as_str()),
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .or_else(|| map.get("file").and_then(Value::as_str)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileList {
    files: Vec<SyntheticFile>,
}

impl FileList {
    pub fn new(files: Vec<SyntheticFile>) -> Self {
        Self { files }
    }

    pub fn from_descriptors(descriptors: &[Value]) -> Self {
        Self {
            files: descriptors.iter().cloned().map(SyntheticFile::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<&SyntheticFile> {
        self.files.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SyntheticFile> {
        self.files.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|file| file.name().unwrap_or_default().to_string())
            .collect()
    }
}

impl<'a> IntoIterator for &'a FileList {
    type Item = &'a SyntheticFile;
    type IntoIter = std::slice::Iter<'a, SyntheticFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
