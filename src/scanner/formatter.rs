use std::path::{Path, PathBuf};

use serde::Serialize;

use super::classifier::ScanMode;
use super::item::Item;
use super::size::format_size;

/// Machine-readable result of one scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub root: PathBuf,
    pub mode: ScanMode,
    pub items: Vec<Item>,
    pub total_size: u64,
    pub duration_ms: u64,
}

impl ScanReport {
    pub fn new(root: PathBuf, mode: ScanMode, items: Vec<Item>, duration_ms: u64) -> Self {
        let total_size = items.iter().map(|i| i.size).sum();
        Self {
            root,
            mode,
            items,
            total_size,
            duration_ms,
        }
    }
}

/// Format report as JSON
pub fn format_json(report: &ScanReport, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    }
}

/// Format items as a table with paths relative to `root`.
pub fn format_table(items: &[Item], root: &Path) -> String {
    let mut output = String::new();

    output.push_str(&format!("{:>12}  {:<28}  {}\n", "SIZE", "CATEGORY", "PATH"));
    output.push_str(&format!("{:->12}  {:-<28}  {:-<40}\n", "", "", ""));

    for item in items {
        let path = item.path.strip_prefix(root).unwrap_or(&item.path);
        output.push_str(&format!(
            "{:>12}  {:<28}  {}\n",
            format_size(item.size),
            item.category,
            path.display()
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_items() -> Vec<Item> {
        vec![
            Item::new(PathBuf::from("/work/api/target"), "Rust build artifacts", 1048576),
            Item::new(PathBuf::from("/work/web/node_modules"), "Node.js dependencies", 2048),
        ]
    }

    #[test]
    fn test_format_table_basic() {
        let output = format_table(&sample_items(), Path::new("/work"));

        assert!(output.contains("SIZE"));
        assert!(output.contains("CATEGORY"));
        assert!(output.contains("api/target"));
        assert!(!output.contains("/work/api"));
        assert!(output.contains("MiB"));
    }

    #[test]
    fn test_format_table_keeps_order() {
        let output = format_table(&sample_items(), Path::new("/work"));
        let target = output.find("api/target").unwrap();
        let modules = output.find("web/node_modules").unwrap();
        assert!(target < modules);
    }

    #[test]
    fn test_format_table_empty() {
        let output = format_table(&[], Path::new("/work"));
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn test_report_json() {
        let report = ScanReport::new(PathBuf::from("/work"), ScanMode::Builtin, sample_items(), 12);
        assert_eq!(report.total_size, 1048576 + 2048);

        let json = format_json(&report, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mode"], "builtin");
        assert_eq!(value["items"].as_array().unwrap().len(), 2);
        assert_eq!(value["items"][0]["category"], "Rust build artifacts");
        assert_eq!(value["duration_ms"], 12);
    }
}
