use crate::models::config::BindingConfig;
use crate::models::language::{LanguageType, LanguageUnit};
use crate::parser::extract::FieldEnum;
use crate::parser::node::Node;
use crate::Result;
use anyhow::{bail, Context};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

/// Summary of one loaded unit
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UnitReport {
    pub id: String,
    pub language_type: String,
    pub name: String,
    pub length: i32,
    pub error_fields: Vec<String>,
}

impl UnitReport {
    pub fn from_unit(unit: &LanguageUnit) -> Self {
        Self {
            id: unit.id().to_string(),
            language_type: unit.language_type().name().to_string(),
            name: unit.name().to_string(),
            length: unit.length(),
            error_fields: unit
                .base()
                .sorted_error_fields()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error_fields.is_empty()
    }
}

fn is_category(node: &Node) -> bool {
    LanguageType::from_name(node.name()).is_some()
}

/// Load every language unit of a document.
///
/// A root named after a category is a single unit. Otherwise the root is a
/// container and its category-named children are the units; a root with no
/// such children is loaded as one unit of unknown category.
pub fn load_units(content: &str, config: &BindingConfig) -> Result<Vec<LanguageUnit>> {
    let root = Node::parse(content).context("Failed to parse document")?;

    if is_category(&root) || !root.children().any(is_category) {
        return Ok(vec![LanguageUnit::from_node_with_config(&root, config)]);
    }

    Ok(root
        .children()
        .filter(|node| is_category(node))
        .map(|node| LanguageUnit::from_node_with_config(node, config))
        .collect())
}

pub fn run(file: &Path, config_path: &Path, json: bool, strict: bool) -> Result<()> {
    let config = BindingConfig::load(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let reports: Vec<UnitReport> = load_units(&content, &config)?
        .iter()
        .map(UnitReport::from_unit)
        .collect();
    let invalid = reports.iter().filter(|r| r.has_error()).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!("{}", format!("Checked: {}", file.display()).cyan().bold());
        println!();

        for report in &reports {
            let status = if report.has_error() {
                "✗".red()
            } else {
                "✓".green()
            };
            println!(
                "   {} {} {} ({})",
                status,
                report.language_type.bold(),
                report.name,
                report.length
            );
            println!("     {}", report.id.bright_black());
            if report.has_error() {
                println!(
                    "     {} {}",
                    "errors:".yellow(),
                    report.error_fields.join(", ")
                );
            }
        }

        println!();
        println!(
            "   {} unit(s), {} with errors",
            reports.len(),
            if invalid > 0 {
                invalid.to_string().red()
            } else {
                invalid.to_string().green()
            }
        );
    }

    if strict && invalid > 0 {
        bail!("{} unit(s) failed validation", invalid);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_units_from_container() {
        let content = r#"<Book>
  <Chapter Id="abc"><Name>Intro</Name><Length>12</Length></Chapter>
  <Word><Name>hello</Name><Length>five</Length></Word>
</Book>"#;
        let units = load_units(content, &BindingConfig::default()).unwrap();

        assert_eq!(units.len(), 2);
        let reports: Vec<_> = units.iter().map(UnitReport::from_unit).collect();
        assert!(!reports[0].has_error());
        assert_eq!(reports[1].language_type, "Word");
        assert_eq!(reports[1].error_fields, vec!["Length".to_string()]);
    }

    #[test]
    fn test_load_single_unit_root() {
        let units = load_units("<Phrase><Name>a</Name><Length>1</Length></Phrase>", &BindingConfig::default())
            .unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].language_type(), LanguageType::Phrase);
    }

    #[test]
    fn test_container_skips_non_category_children() {
        let content = "<Book><Title>Tales</Title><Word><Name>a</Name><Length>1</Length></Word></Book>";
        let units = load_units(content, &BindingConfig::default()).unwrap();

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].language_type(), LanguageType::Word);
        assert!(!units[0].base().has_error());
    }

    #[test]
    fn test_unknown_root_is_reported_as_one_unit() {
        let units = load_units("<Verse><Name>x</Name></Verse>", &BindingConfig::default()).unwrap();

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name(), "x");
        assert_eq!(
            units[0].base().sorted_error_fields(),
            vec!["LanguageType", "Length"]
        );
    }

    #[test]
    fn test_malformed_document() {
        assert!(load_units("<Book>", &BindingConfig::default()).is_err());
    }

    #[test]
    fn test_strict_run_fails_on_errors() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("book.xml");
        fs::write(&file, "<Book><Chapter><Name /></Chapter></Book>").unwrap();
        let config = temp_dir.path().join("viewbind.toml");

        assert!(run(&file, &config, true, false).is_ok());
        assert!(run(&file, &config, true, true).is_err());
    }
}
