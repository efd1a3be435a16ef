use serde::Serialize;
use std::path::PathBuf;

/// A reclaimable artifact found by a scan: the unit of selection and deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Absolute path; unique within one inventory.
    pub path: PathBuf,

    /// Human-readable classification, e.g. "Node.js dependencies".
    pub category: String,

    /// Total size of regular files below `path`, measured once at scan time.
    pub size: u64,

    /// Marked for deletion by the user.
    pub selected: bool,
}

impl Item {
    /// Create an unselected item.
    pub fn new(path: PathBuf, category: impl Into<String>, size: u64) -> Self {
        Self {
            path,
            category: category.into(),
            size,
            selected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_creation() {
        let item = Item::new(PathBuf::from("/work/app/node_modules"), "Node.js dependencies", 2048);
        assert_eq!(item.category, "Node.js dependencies");
        assert_eq!(item.size, 2048);
        assert!(!item.selected);
    }

    #[test]
    fn test_item_serializes_to_json() {
        let item = Item::new(PathBuf::from("/work/target"), "Rust build artifacts", 10);
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"category\":\"Rust build artifacts\""));
        assert!(json.contains("\"selected\":false"));
    }
}
