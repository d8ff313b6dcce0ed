//! Product knowledge base
//!
//! Loads the plain-text product corpus into ordered, immutable documents.
//! Document ids are positional: document `i` corresponds to vector `i` in the
//! index built from the same corpus.

use crate::error::{CompassError, Result};
use std::path::{Path, PathBuf};

/// A single product description from the knowledge base
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ProductDocument {
    /// Position of the document in the corpus (first-occurrence order)
    pub id: usize,
    /// Trimmed description text
    pub text: String,
}

/// The parsed product corpus
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    path: PathBuf,
    documents: Vec<ProductDocument>,
    /// BLAKE3 digest of the raw corpus bytes, used to pair the corpus with
    /// its persisted vector index
    digest: [u8; 32],
}

impl KnowledgeBase {
    /// Load and parse the corpus file
    ///
    /// Entries are separated by the literal `delimiter` string. Each segment
    /// is trimmed of surrounding whitespace; empty segments are discarded.
    /// Fails if the file is missing or contains no documents after filtering.
    pub fn load(path: &Path, delimiter: &str) -> Result<Self> {
        let raw = std::fs::read(path).map_err(|e| CompassError::KnowledgeBase {
            path: path.to_path_buf(),
            message: format!("Failed to read corpus: {}", e),
        })?;

        let content =
            String::from_utf8(raw.clone()).map_err(|e| CompassError::KnowledgeBase {
                path: path.to_path_buf(),
                message: format!("Corpus is not valid UTF-8: {}", e),
            })?;

        let documents = Self::parse(&content, delimiter);

        if documents.is_empty() {
            return Err(CompassError::KnowledgeBase {
                path: path.to_path_buf(),
                message: "Corpus contains no product descriptions".to_string(),
            });
        }

        tracing::info!(
            "Loaded {} product descriptions from {}",
            documents.len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            documents,
            digest: *blake3::hash(&raw).as_bytes(),
        })
    }

    /// Split a corpus string into ordered documents
    fn parse(content: &str, delimiter: &str) -> Vec<ProductDocument> {
        content
            .split(delimiter)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .enumerate()
            .map(|(id, text)| ProductDocument {
                id,
                text: text.to_string(),
            })
            .collect()
    }

    pub fn documents(&self) -> &[ProductDocument] {
        &self.documents
    }

    pub fn get(&self, id: usize) -> Option<&ProductDocument> {
        self.documents.get(id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Digest of the raw corpus bytes
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    /// Path the corpus was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Document texts in id order, for batch embedding
    pub fn texts(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.text.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_corpus(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("products.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_trims_and_discards_empty_segments() {
        let temp = TempDir::new().unwrap();
        let path = write_corpus(&temp, "A --- \n \n B");

        let kb = KnowledgeBase::load(&path, "---").unwrap();
        assert_eq!(kb.len(), 2);
        assert_eq!(kb.get(0).unwrap().text, "A");
        assert_eq!(kb.get(1).unwrap().text, "B");
    }

    #[test]
    fn test_order_is_first_occurrence_order() {
        let temp = TempDir::new().unwrap();
        let delimiter = "-".repeat(32);
        let content = format!(
            "Savings Account\n{}\nCredit Card\n{}\nMortgage",
            delimiter, delimiter
        );
        let path = write_corpus(&temp, &content);

        let kb = KnowledgeBase::load(&path, &delimiter).unwrap();
        let texts: Vec<&str> = kb.documents().iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["Savings Account", "Credit Card", "Mortgage"]);
        assert_eq!(kb.get(2).unwrap().id, 2);
    }

    #[test]
    fn test_missing_file_is_knowledge_base_error() {
        let result = KnowledgeBase::load(Path::new("/nonexistent/products.txt"), "---");
        assert!(matches!(
            result,
            Err(CompassError::KnowledgeBase { .. })
        ));
    }

    #[test]
    fn test_empty_corpus_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_corpus(&temp, " --- \n --- ");

        let result = KnowledgeBase::load(&path, "---");
        assert!(matches!(
            result,
            Err(CompassError::KnowledgeBase { .. })
        ));
    }

    #[test]
    fn test_digest_changes_with_content() {
        let temp = TempDir::new().unwrap();
        let path_a = write_corpus(&temp, "A");
        let kb_a = KnowledgeBase::load(&path_a, "---").unwrap();

        let path_b = temp.path().join("other.txt");
        std::fs::write(&path_b, "B").unwrap();
        let kb_b = KnowledgeBase::load(&path_b, "---").unwrap();

        assert_ne!(kb_a.digest(), kb_b.digest());
    }
}
