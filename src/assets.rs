/// A set of static files compiled into the binary.
pub struct Assets {
    /// `(name, contents)` pairs.
    files: &'static [(&'static str, &'static str)],
}

impl Assets {
    pub const fn new(files: &'static [(&'static str, &'static str)]) -> Self {
        Self { files }
    }

    /// Get the contents of one file.
    pub fn get(&self, name: &str) -> Option<&'static str> {
        self.files
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, contents)| *contents)
    }

    /// Iterate over `(name, contents)` pairs.
    pub fn contents(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        self.files.iter().copied()
    }
}

/// Embed a list of asset files in the binary.
macro_rules! assets {
    ($constname:ident, $dirname:literal, [ $($filename:literal),* ]) => {
        pub(crate) const $constname: $crate::assets::Assets = $crate::assets::Assets::new(&[$(
            (
                $filename,
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"), "/", $dirname, "/", $filename
                )),
            ),
        )*]);
    };
}

assets!(TEMPLATES, "templates", ["toc.html", "style.css"]);
