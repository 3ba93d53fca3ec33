//! Options for store and convert calls.

/// Convert options that turn a preview conversion into a stored file.
pub const STORE_OPTIONS: [&str; 5] = [
    "filename",
    "storeLocation",
    "storePath",
    "storeContainer",
    "storeAccess",
];

/// How a resized image fits the requested dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// Resize to fit within the bounds, keeping the aspect ratio.
    Clip,
    /// Resize and crop to fill the bounds.
    Crop,
    /// Stretch to the bounds.
    Scale,
    /// Like `Clip`, but never upscale.
    Max,
}

impl Fit {
    /// The value used by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clip => "clip",
            Self::Crop => "crop",
            Self::Scale => "scale",
            Self::Max => "max",
        }
    }
}

/// Parameters of a convert call.
///
/// Options are sent verbatim as query parameters, in insertion order.
///
/// ```
/// use filepicker::ConvertOptions;
///
/// let preview = ConvertOptions::new().width(200).filter("blur").blur_amount(2);
/// assert!(!preview.is_storing());
///
/// let stored = preview.store_location("Azure");
/// assert!(stored.is_storing());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions(Vec<(String, String)>);

impl ConvertOptions {
    /// No options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing an earlier value for the same name.
    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
        self
    }

    /// Target width (`w`).
    pub fn width(self, pixels: u32) -> Self {
        self.set("w", pixels)
    }

    /// Target height (`h`).
    pub fn height(self, pixels: u32) -> Self {
        self.set("h", pixels)
    }

    /// Resize mode (`fit`).
    pub fn fit(self, fit: Fit) -> Self {
        self.set("fit", fit.as_str())
    }

    /// Alignment when cropping (`align`), e.g. "top" or "faces".
    pub fn align(self, align: &str) -> Self {
        self.set("align", align)
    }

    /// Crop rectangle (`crop`).
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        self.set("crop", format!("{x},{y},{width},{height}"))
    }

    /// Output format (`format`), e.g. "png".
    pub fn format(self, format: &str) -> Self {
        self.set("format", format)
    }

    /// Image filter (`filter`), "blur" or "sharpen".
    pub fn filter(self, filter: &str) -> Self {
        self.set("filter", filter)
    }

    /// Blur strength (`blurAmount`).
    pub fn blur_amount(self, amount: u32) -> Self {
        self.set("blurAmount", amount)
    }

    /// Sharpen strength (`sharpenAmount`).
    pub fn sharpen_amount(self, amount: u32) -> Self {
        self.set("sharpenAmount", amount)
    }

    /// Compress the output (`compress`).
    pub fn compress(self, compress: bool) -> Self {
        self.set("compress", compress)
    }

    /// JPEG quality (`quality`).
    pub fn quality(self, quality: u8) -> Self {
        self.set("quality", quality)
    }

    /// Rotation (`rotate`): degrees or "exif".
    pub fn rotate(self, rotate: impl ToString) -> Self {
        self.set("rotate", rotate)
    }

    /// Watermark image URL (`watermark`).
    pub fn watermark(self, url: &str) -> Self {
        self.set("watermark", url)
    }

    /// Watermark size in percent (`watersize`).
    pub fn watersize(self, percent: u32) -> Self {
        self.set("watersize", percent)
    }

    /// Watermark position (`waterposition`), e.g. "top,left".
    pub fn waterposition(self, position: &str) -> Self {
        self.set("waterposition", position)
    }

    /// Name of the stored result (`filename`).
    pub fn filename(self, filename: &str) -> Self {
        self.set("filename", filename)
    }

    /// Storage backend of the stored result (`storeLocation`).
    pub fn store_location(self, location: &str) -> Self {
        self.set("storeLocation", location)
    }

    /// Path of the stored result (`storePath`).
    pub fn store_path(self, path: &str) -> Self {
        self.set("storePath", path)
    }

    /// Container of the stored result (`storeContainer`).
    pub fn store_container(self, container: &str) -> Self {
        self.set("storeContainer", container)
    }

    /// Access of the stored result (`storeAccess`), "public" or "private".
    pub fn store_access(self, access: &str) -> Self {
        self.set("storeAccess", access)
    }

    /// Whether any option asks for the result to be stored.
    pub fn is_storing(&self) -> bool {
        self.0
            .iter()
            .any(|(key, _)| STORE_OPTIONS.contains(&key.as_str()))
    }

    /// Value of an option.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no options.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over options in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl IntoIterator for ConvertOptions {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Parameters of a store call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub(crate) storage: Option<String>,
    pub(crate) policy: Option<String>,
    pub(crate) params: Vec<(String, String)>,
}

impl StoreOptions {
    /// Default storage, no policy, no extra parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store into the given backend instead of the client default.
    pub fn storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = Some(storage.into());
        self
    }

    /// Sign the call with the named policy.
    pub fn policy(mut self, name: impl Into<String>) -> Self {
        self.policy = Some(name.into());
        self
    }

    /// Add an extra query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Name of the stored file (`filename`).
    pub fn filename(self, filename: impl Into<String>) -> Self {
        self.param("filename", filename)
    }

    /// Path within the storage backend (`path`).
    pub fn path(self, path: impl Into<String>) -> Self {
        self.param("path", path)
    }

    /// Storage container (`container`).
    pub fn container(self, container: impl Into<String>) -> Self {
        self.param("container", container)
    }

    /// Access of the stored file (`access`).
    pub fn access(self, access: impl Into<String>) -> Self {
        self.param("access", access)
    }
}
