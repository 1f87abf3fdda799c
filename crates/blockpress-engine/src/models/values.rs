use serde::{Deserialize, Serialize};

/// A closed set of string values stored in a single attribute.
pub trait AttrChoice: Copy + Default + Send + Sync + 'static {
    fn parse_choice(raw: &str) -> Option<Self>;
    fn as_choice_str(self) -> &'static str;
}

/// Declares a closed, string-backed attribute enum.
///
/// Parsing is case-insensitive and trims surrounding whitespace so stored
/// values are normalized on load; rendering always emits the canonical form.
macro_rules! attr_enum {
    (
        $(#[$meta:meta])*
        $name:ident default $default:ident {
            $($(#[$vmeta:meta])* $variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical stored representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }

            pub fn parse(raw: &str) -> Option<Self> {
                let raw = raw.trim();
                $(
                    if raw.eq_ignore_ascii_case($value) {
                        return Some($name::$variant);
                    }
                )+
                None
            }
        }

        impl AttrChoice for $name {
            fn parse_choice(raw: &str) -> Option<Self> {
                Self::parse(raw)
            }

            fn as_choice_str(self) -> &'static str {
                self.as_str()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

attr_enum! {
    /// Horizontal placement of an image or gallery inside the content column.
    Align default Center {
        Left => "left",
        Center => "center",
        Right => "right",
    }
}

attr_enum! {
    /// Callout flavour of an alert block.
    AlertKind default Info {
        Info => "INFO",
        Tip => "TIP",
        Warning => "WARNING",
        Success => "SUCCESS",
    }
}

attr_enum! {
    /// How an embed block's code is interpreted.
    EmbedType default Javascript {
        Javascript => "javascript",
        Widget => "widget",
        Html => "html",
        Iframe => "iframe",
    }
}

attr_enum! {
    GalleryGap default Md {
        Sm => "sm",
        Md => "md",
        Lg => "lg",
    }
}

attr_enum! {
    /// Crop applied to every gallery tile.
    GalleryAspect default Auto {
        Auto => "auto",
        Square => "square",
        FourThree => "4/3",
        SixteenNine => "16/9",
    }
}

attr_enum! {
    /// Languages selectable for a code block.
    CodeLanguage default Plaintext {
        Plaintext => "plaintext",
        Javascript => "javascript",
        Typescript => "typescript",
        Jsx => "jsx",
        Tsx => "tsx",
        Python => "python",
        Rust => "rust",
        Go => "go",
        Java => "java",
        C => "c",
        Cpp => "cpp",
        Csharp => "csharp",
        Php => "php",
        Ruby => "ruby",
        Swift => "swift",
        Kotlin => "kotlin",
        Html => "html",
        Css => "css",
        Scss => "scss",
        Json => "json",
        Yaml => "yaml",
        Xml => "xml",
        Sql => "sql",
        Bash => "bash",
        Markdown => "markdown",
    }
}

impl AlertKind {
    pub fn label(self) -> &'static str {
        match self {
            AlertKind::Info => "Info",
            AlertKind::Tip => "Tip",
            AlertKind::Warning => "Warning",
            AlertKind::Success => "Success",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            AlertKind::Info => "ℹ️",
            AlertKind::Tip => "💡",
            AlertKind::Warning => "⚠️",
            AlertKind::Success => "✅",
        }
    }

    /// Next kind in declaration order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl EmbedType {
    pub fn label(self) -> &'static str {
        match self {
            EmbedType::Javascript => "JavaScript",
            EmbedType::Widget => "Widget",
            EmbedType::Html => "HTML",
            EmbedType::Iframe => "Iframe",
        }
    }
}

impl GalleryGap {
    pub fn css(self) -> &'static str {
        match self {
            GalleryGap::Sm => "0.5rem",
            GalleryGap::Md => "1rem",
            GalleryGap::Lg => "1.5rem",
        }
    }
}

impl GalleryAspect {
    pub fn css(self) -> Option<&'static str> {
        match self {
            GalleryAspect::Auto => None,
            GalleryAspect::Square => Some("1 / 1"),
            GalleryAspect::FourThree => Some("4 / 3"),
            GalleryAspect::SixteenNine => Some("16 / 9"),
        }
    }
}

impl CodeLanguage {
    /// Resolves canonical names plus the common short aliases found in
    /// `language-*` classes written by other editors.
    pub fn from_alias(raw: &str) -> Option<Self> {
        if let Some(lang) = Self::parse(raw) {
            return Some(lang);
        }
        let lang = match raw.trim().to_ascii_lowercase().as_str() {
            "" | "text" | "plain" | "txt" => CodeLanguage::Plaintext,
            "js" | "mjs" | "cjs" => CodeLanguage::Javascript,
            "ts" => CodeLanguage::Typescript,
            "py" => CodeLanguage::Python,
            "rs" => CodeLanguage::Rust,
            "golang" => CodeLanguage::Go,
            "c++" | "cc" | "hpp" => CodeLanguage::Cpp,
            "c#" | "cs" => CodeLanguage::Csharp,
            "rb" => CodeLanguage::Ruby,
            "kt" => CodeLanguage::Kotlin,
            "htm" => CodeLanguage::Html,
            "yml" => CodeLanguage::Yaml,
            "sh" | "shell" | "zsh" => CodeLanguage::Bash,
            "md" => CodeLanguage::Markdown,
            _ => return None,
        };
        Some(lang)
    }

    /// Human readable name shown in the language bar.
    pub fn label(self) -> &'static str {
        match self {
            CodeLanguage::Plaintext => "Plain Text",
            CodeLanguage::Javascript => "JavaScript",
            CodeLanguage::Typescript => "TypeScript",
            CodeLanguage::Jsx => "JSX",
            CodeLanguage::Tsx => "TSX",
            CodeLanguage::Python => "Python",
            CodeLanguage::Rust => "Rust",
            CodeLanguage::Go => "Go",
            CodeLanguage::Java => "Java",
            CodeLanguage::C => "C",
            CodeLanguage::Cpp => "C++",
            CodeLanguage::Csharp => "C#",
            CodeLanguage::Php => "PHP",
            CodeLanguage::Ruby => "Ruby",
            CodeLanguage::Swift => "Swift",
            CodeLanguage::Kotlin => "Kotlin",
            CodeLanguage::Html => "HTML",
            CodeLanguage::Css => "CSS",
            CodeLanguage::Scss => "SCSS",
            CodeLanguage::Json => "JSON",
            CodeLanguage::Yaml => "YAML",
            CodeLanguage::Xml => "XML",
            CodeLanguage::Sql => "SQL",
            CodeLanguage::Bash => "Bash",
            CodeLanguage::Markdown => "Markdown",
        }
    }
}

/// One entry of a gallery's image list, stored as JSON in `data-images`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    #[serde(default = "new_image_id")]
    pub id: String,
    pub src: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub caption: String,
}

impl GalleryImage {
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            id: new_image_id(),
            src: src.into(),
            alt: alt.into(),
            caption: String::new(),
        }
    }
}

pub fn new_image_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
