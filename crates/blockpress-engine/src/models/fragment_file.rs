use relative_path::{RelativePath, RelativePathBuf};

/// A stored post fragment (`*.html`) addressed relative to the content root.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentFile {
    relative_path: RelativePathBuf,
    display_name: String,
}

impl FragmentFile {
    pub fn new(relative_path: RelativePathBuf) -> Self {
        let display_name = relative_path
            .file_name()
            .map(|name| name.strip_suffix(".html").unwrap_or(name))
            .unwrap_or("Untitled")
            .to_string();

        Self {
            relative_path,
            display_name,
        }
    }

    pub fn from_relative_str(path: &str) -> Self {
        Self::new(RelativePathBuf::from(path))
    }

    pub fn relative_path(&self) -> &RelativePath {
        &self.relative_path
    }

    /// File name without the `.html` extension
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl From<&str> for FragmentFile {
    fn from(path: &str) -> Self {
        Self::from_relative_str(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_strips_extension() {
        let file = FragmentFile::from("posts/2024/hello-world.html");
        assert_eq!(file.display_name(), "hello-world");
        assert_eq!(file.relative_path().as_str(), "posts/2024/hello-world.html");
    }

    #[test]
    fn test_display_name_without_extension() {
        let file = FragmentFile::from("drafts/notes");
        assert_eq!(file.display_name(), "notes");
    }
}
