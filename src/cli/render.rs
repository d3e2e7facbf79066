use crate::models::language::{LanguageType, LanguageUnit};
use crate::parser::extract::FieldEnum;
use crate::Result;
use anyhow::anyhow;

/// Build a unit from command line values and return its element text
pub fn render(language_type: &str, name: &str, length: i32) -> Result<String> {
    let language_type = LanguageType::from_name(language_type).ok_or_else(|| {
        anyhow!(
            "Unknown language type '{}' (expected one of: {})",
            language_type,
            LanguageType::VARIANTS.join(", ")
        )
    })?;

    let mut unit = LanguageUnit::new();
    unit.set_language_type(language_type);
    unit.set_name(name);
    unit.set_length(length);

    Ok(unit.to_node().to_xml_string())
}

pub fn run(language_type: &str, name: &str, length: i32) -> Result<()> {
    println!("{}", render(language_type, name, length)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_word() {
        let xml = render("Word", "fish", 4).unwrap();
        assert!(xml.starts_with("<Word Id=\""));
        assert!(xml.ends_with("<Name>fish</Name><Length>4</Length></Word>"));
    }

    #[test]
    fn test_render_unknown_type() {
        let err = render("word", "fish", 4).unwrap_err();
        assert!(err.to_string().contains("Chapter, Paragraph"));
    }
}
