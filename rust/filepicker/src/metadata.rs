use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::FilepickerError;

/// Metadata attributes the API can report for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataAttribute {
    /// Size in bytes.
    Size,
    /// MIME type.
    Mimetype,
    /// Original file name.
    Filename,
    /// Image width in pixels.
    Width,
    /// Image height in pixels.
    Height,
    /// Upload timestamp in milliseconds since the unix epoch.
    Uploaded,
    /// Whether the file may be overwritten.
    Writeable,
    /// MD5 checksum of the content.
    Md5,
    /// Storage backend holding the file.
    Location,
    /// Path within the storage backend.
    Path,
    /// Storage container (bucket).
    Container,
    /// Key within the storage backend.
    Key,
}

impl MetadataAttribute {
    /// Every recognized attribute, in the order they are requested.
    pub const ALL: [Self; 12] = [
        Self::Size,
        Self::Mimetype,
        Self::Filename,
        Self::Width,
        Self::Height,
        Self::Uploaded,
        Self::Writeable,
        Self::Md5,
        Self::Location,
        Self::Path,
        Self::Container,
        Self::Key,
    ];

    /// The attribute name used by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Mimetype => "mimetype",
            Self::Filename => "filename",
            Self::Width => "width",
            Self::Height => "height",
            Self::Uploaded => "uploaded",
            Self::Writeable => "writeable",
            Self::Md5 => "md5",
            Self::Location => "location",
            Self::Path => "path",
            Self::Container => "container",
            Self::Key => "key",
        }
    }
}

impl FromStr for MetadataAttribute {
    type Err = FilepickerError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|attribute| attribute.as_str() == name)
            .ok_or_else(|| FilepickerError::UnknownAttribute(name.to_string()))
    }
}

impl std::fmt::Display for MetadataAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File metadata as reported by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    /// Empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata from a store/convert response.
    ///
    /// Those responses report the MIME type as `type`; it is renamed to
    /// `mimetype` to match the metadata endpoint.
    pub fn from_response(mut response: Map<String, Value>) -> Self {
        if let Some(mimetype) = response.remove("type") {
            response.insert(MetadataAttribute::Mimetype.as_str().to_string(), mimetype);
        }
        Self(response)
    }

    /// Value of an attribute.
    pub fn get(&self, attribute: MetadataAttribute) -> Option<&Value> {
        self.0.get(attribute.as_str())
    }

    /// Value of any entry, including ones that are not metadata attributes.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    fn str(&self, attribute: MetadataAttribute) -> Option<&str> {
        self.get(attribute).and_then(Value::as_str)
    }

    fn u64(&self, attribute: MetadataAttribute) -> Option<u64> {
        self.get(attribute).and_then(Value::as_u64)
    }

    /// Size in bytes.
    pub fn size(&self) -> Option<u64> {
        self.u64(MetadataAttribute::Size)
    }

    /// MIME type.
    pub fn mimetype(&self) -> Option<&str> {
        self.str(MetadataAttribute::Mimetype)
    }

    /// Original file name.
    pub fn filename(&self) -> Option<&str> {
        self.str(MetadataAttribute::Filename)
    }

    /// Image width in pixels.
    pub fn width(&self) -> Option<u64> {
        self.u64(MetadataAttribute::Width)
    }

    /// Image height in pixels.
    pub fn height(&self) -> Option<u64> {
        self.u64(MetadataAttribute::Height)
    }

    /// Upload timestamp in milliseconds since the unix epoch.
    pub fn uploaded(&self) -> Option<f64> {
        self.get(MetadataAttribute::Uploaded).and_then(Value::as_f64)
    }

    /// Whether the file may be overwritten.
    pub fn writeable(&self) -> Option<bool> {
        self.get(MetadataAttribute::Writeable)
            .and_then(Value::as_bool)
    }

    /// MD5 checksum of the content.
    pub fn md5(&self) -> Option<&str> {
        self.str(MetadataAttribute::Md5)
    }

    /// Storage backend holding the file.
    pub fn location(&self) -> Option<&str> {
        self.str(MetadataAttribute::Location)
    }

    /// Path within the storage backend.
    pub fn path(&self) -> Option<&str> {
        self.str(MetadataAttribute::Path)
    }

    /// Storage container.
    pub fn container(&self) -> Option<&str> {
        self.str(MetadataAttribute::Container)
    }

    /// Key within the storage backend.
    pub fn key(&self) -> Option<&str> {
        self.str(MetadataAttribute::Key)
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(entries: Map<String, Value>) -> Self {
        Self(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn it_renames_type_to_mimetype() {
        let metadata = Metadata::from_response(object(json!({
            "url": "https://www.filepicker.io/api/file/hx6uhrXXXXXPIiWvl",
            "size": 8811,
            "type": "image/jpg",
            "filename": "awesome.jpg"
        })));

        assert_eq!(metadata.mimetype(), Some("image/jpg"));
        assert_eq!(metadata.raw("type"), None);
        assert_eq!(metadata.size(), Some(8811));
        assert_eq!(metadata.filename(), Some("awesome.jpg"));
    }

    #[test]
    fn it_reads_typed_attributes() {
        let metadata = Metadata::from(object(json!({
            "width": 640,
            "height": 480,
            "uploaded": 1431950945704.0,
            "writeable": true,
            "md5": "123abc",
            "location": "S3",
            "path": "uploads/a.png",
            "container": "bucket",
            "key": "uploads/a.png"
        })));

        assert_eq!(metadata.width(), Some(640));
        assert_eq!(metadata.height(), Some(480));
        assert_eq!(metadata.uploaded(), Some(1431950945704.0));
        assert_eq!(metadata.writeable(), Some(true));
        assert_eq!(metadata.md5(), Some("123abc"));
        assert_eq!(metadata.location(), Some("S3"));
        assert_eq!(metadata.path(), Some("uploads/a.png"));
        assert_eq!(metadata.container(), Some("bucket"));
        assert_eq!(metadata.key(), Some("uploads/a.png"));
        assert_eq!(metadata.size(), None);
    }

    #[test]
    fn it_parses_attribute_names() {
        for attribute in MetadataAttribute::ALL {
            assert_eq!(attribute.as_str().parse::<MetadataAttribute>().unwrap(), attribute);
        }
        assert!(matches!(
            "non_existent_attr".parse::<MetadataAttribute>(),
            Err(FilepickerError::UnknownAttribute(name)) if name == "non_existent_attr"
        ));
    }
}
