use std::path::{Path, PathBuf};

/// File layout of an assets directory for one language.
///
/// ```text
/// <root>/
///   {lang}_vocab.txt
///   {lang}_word_vectors.vec
///   {lang}_entities.jsonl
///   fields/field_meta.jsonl
///   fields/field_children.jsonl
///   fields/{lang}_field_dense_vectors.jsonl
///   fields/{lang}_field_sparse_vectors.jsonl
///   fields/{lang}_field_entity_vectors.jsonl
/// ```
///
/// Any file may instead be stored gzip-compressed with a `.gz` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    root: PathBuf,
    lang: String,
}

impl AssetPaths {
    pub fn new(root: impl Into<PathBuf>, lang: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            lang: lang.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn vocabulary(&self) -> PathBuf {
        self.resolve(format!("{}_vocab.txt", self.lang))
    }

    pub fn word_vectors(&self) -> PathBuf {
        self.resolve(format!("{}_word_vectors.vec", self.lang))
    }

    pub fn entities(&self) -> PathBuf {
        self.resolve(format!("{}_entities.jsonl", self.lang))
    }

    pub fn field_meta(&self) -> PathBuf {
        self.resolve("fields/field_meta.jsonl".to_string())
    }

    pub fn field_children(&self) -> PathBuf {
        self.resolve("fields/field_children.jsonl".to_string())
    }

    pub fn field_dense_vectors(&self) -> PathBuf {
        self.resolve(format!("fields/{}_field_dense_vectors.jsonl", self.lang))
    }

    pub fn field_sparse_vectors(&self) -> PathBuf {
        self.resolve(format!("fields/{}_field_sparse_vectors.jsonl", self.lang))
    }

    pub fn field_entity_vectors(&self) -> PathBuf {
        self.resolve(format!("fields/{}_field_entity_vectors.jsonl", self.lang))
    }

    /// The plain path, or its `.gz` sibling when only that exists.
    fn resolve(&self, relative: String) -> PathBuf {
        let plain = self.root.join(&relative);
        if !plain.exists() {
            let compressed = self.root.join(format!("{relative}.gz"));
            if compressed.exists() {
                return compressed;
            }
        }
        plain
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self::new("assets", "en")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = AssetPaths::new("/data/assets", "zh");
        assert_eq!(paths.vocabulary(), PathBuf::from("/data/assets/zh_vocab.txt"));
        assert_eq!(
            paths.field_sparse_vectors(),
            PathBuf::from("/data/assets/fields/zh_field_sparse_vectors.jsonl")
        );
        assert_eq!(paths.field_meta(), PathBuf::from("/data/assets/fields/field_meta.jsonl"));
    }

    #[test]
    fn test_prefers_gz_when_plain_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en_entities.jsonl.gz"), b"").unwrap();
        let paths = AssetPaths::new(dir.path(), "en");
        assert_eq!(paths.entities(), dir.path().join("en_entities.jsonl.gz"));
        assert_eq!(paths.vocabulary(), dir.path().join("en_vocab.txt"));
    }
}
