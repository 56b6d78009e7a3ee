use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::predicate::Condition;
use crate::reconcile::{ComparisonRule, JoinSuffixes};
use crate::rules::{ExpectedValue, PatternRule, PatternSpec};

const US_TOML: &str = include_str!("../regions/us.toml");
const EU_TOML: &str = include_str!("../regions/eu.toml");

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    Eu,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::Us, Region::Eu];
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Us => write!(f, "US"),
            Self::Eu => write!(f, "EU"),
        }
    }
}

impl std::str::FromStr for Region {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" => Ok(Self::Us),
            "eu" => Ok(Self::Eu),
            other => Err(ConfigError::Validation(format!("unknown region '{other}' (expected us or eu)"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// New-SKU review rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReviewConfig {
    pub match_key: String,
    #[serde(default)]
    pub required_attributes: Vec<String>,
    #[serde(default)]
    pub non_empty_fields: Vec<String>,
    #[serde(default)]
    pub expected: Vec<ExpectedValue>,
    #[serde(default)]
    pub patterns: Vec<PatternSpec>,
    #[serde(default)]
    pub comparisons: Vec<ComparisonRule>,
    #[serde(default)]
    pub suffixes: JoinSuffixes,
}

/// Output projections per maintenance workflow.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ColumnSets {
    #[serde(default)]
    pub primary_child: Vec<String>,
    #[serde(default)]
    pub retire: Vec<String>,
    #[serde(default)]
    pub reassign: Vec<String>,
    #[serde(default)]
    pub visibility: Vec<String>,
}

/// Row filters applied after family expansion.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EligibilityConfig {
    /// Primary-child discovery.
    #[serde(default)]
    pub family: Vec<Condition>,
    /// Reassignment candidates when retiring a primary child.
    #[serde(default)]
    pub reassign: Vec<Condition>,
    /// Parent records pulled in by visibility re-enablement.
    #[serde(default)]
    pub visibility_parent: Vec<Condition>,
}

// ---------------------------------------------------------------------------
// RegionConfig
// ---------------------------------------------------------------------------

/// Immutable per-region catalog configuration.
///
/// Built only through `from_toml`, which validates the rules and compiles
/// `review.patterns` once.
#[derive(Debug, Clone, Serialize)]
pub struct RegionConfig {
    pub region: Region,
    pub identifier_column_candidates: Vec<String>,
    pub group_column: String,
    pub sku_column: String,
    pub product_type_column: String,
    pub primary_child_column: String,
    pub retired_column: String,
    pub stealth_column: String,
    pub admin_notes_column: String,
    pub visibility_column: String,
    pub hide_column: String,
    pub non_unique_identifiers: Vec<String>,
    pub review: ReviewConfig,
    pub columns: ColumnSets,
    pub eligibility: EligibilityConfig,
    #[serde(skip)]
    compiled_patterns: Vec<PatternRule>,
}

/// TOML shape of a region file, before validation.
#[derive(Deserialize)]
struct RawRegionConfig {
    region: Region,
    identifier_column_candidates: Vec<String>,
    #[serde(default = "default_group_column")]
    group_column: String,
    #[serde(default = "default_sku_column")]
    sku_column: String,
    #[serde(default = "default_product_type_column")]
    product_type_column: String,
    #[serde(default = "default_primary_child_column")]
    primary_child_column: String,
    #[serde(default = "default_retired_column")]
    retired_column: String,
    #[serde(default = "default_stealth_column")]
    stealth_column: String,
    #[serde(default = "default_admin_notes_column")]
    admin_notes_column: String,
    visibility_column: String,
    hide_column: String,
    #[serde(default = "default_non_unique_identifiers")]
    non_unique_identifiers: Vec<String>,
    review: ReviewConfig,
    #[serde(default)]
    columns: ColumnSets,
    #[serde(default)]
    eligibility: EligibilityConfig,
}

fn default_group_column() -> String {
    "Family Id".into()
}

fn default_sku_column() -> String {
    "Material Bank SKU".into()
}

fn default_product_type_column() -> String {
    "Product Type".into()
}

fn default_primary_child_column() -> String {
    "Primary Child".into()
}

fn default_retired_column() -> String {
    "Retired Sku".into()
}

fn default_stealth_column() -> String {
    "Stealth SKU".into()
}

fn default_admin_notes_column() -> String {
    "Admin Notes".into()
}

fn default_non_unique_identifiers() -> Vec<String> {
    vec!["Product Name".into()]
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RegionConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let raw: RawRegionConfig = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawRegionConfig) -> Result<Self, ConfigError> {
        let RawRegionConfig {
            region,
            identifier_column_candidates,
            group_column,
            sku_column,
            product_type_column,
            primary_child_column,
            retired_column,
            stealth_column,
            admin_notes_column,
            visibility_column,
            hide_column,
            non_unique_identifiers,
            review,
            columns,
            eligibility,
        } = raw;
        let mut config = RegionConfig {
            region,
            identifier_column_candidates,
            group_column,
            sku_column,
            product_type_column,
            primary_child_column,
            retired_column,
            stealth_column,
            admin_notes_column,
            visibility_column,
            hide_column,
            non_unique_identifiers,
            review,
            columns,
            eligibility,
            compiled_patterns: Vec::new(),
        };
        config.validate()?;
        config.compiled_patterns = config
            .review
            .patterns
            .iter()
            .map(PatternRule::compile)
            .collect::<Result<_, _>>()?;
        Ok(config)
    }

    /// The configuration shipped for `region`.
    pub fn builtin(region: Region) -> Result<Self, ConfigError> {
        let config = match region {
            Region::Us => Self::from_toml(US_TOML)?,
            Region::Eu => Self::from_toml(EU_TOML)?,
        };
        if config.region != region {
            return Err(ConfigError::Validation(format!(
                "built-in {region} configuration declares region {}",
                config.region
            )));
        }
        Ok(config)
    }

    /// Source text of the built-in configuration.
    pub fn builtin_source(region: Region) -> &'static str {
        match region {
            Region::Us => US_TOML,
            Region::Eu => EU_TOML,
        }
    }

    /// Semantic checks on the parsed rules. Patterns are compiled by the caller.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.identifier_column_candidates.is_empty() {
            return Err(ConfigError::Validation(
                "identifier_column_candidates must not be empty".into(),
            ));
        }

        let named = [
            ("group_column", &self.group_column),
            ("sku_column", &self.sku_column),
            ("product_type_column", &self.product_type_column),
            ("primary_child_column", &self.primary_child_column),
            ("retired_column", &self.retired_column),
            ("stealth_column", &self.stealth_column),
            ("admin_notes_column", &self.admin_notes_column),
            ("visibility_column", &self.visibility_column),
            ("hide_column", &self.hide_column),
            ("review.match_key", &self.review.match_key),
        ];
        for (name, value) in named {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }

        let lists = [
            ("identifier_column_candidates", &self.identifier_column_candidates),
            ("non_unique_identifiers", &self.non_unique_identifiers),
            ("review.required_attributes", &self.review.required_attributes),
            ("review.non_empty_fields", &self.review.non_empty_fields),
            ("columns.primary_child", &self.columns.primary_child),
            ("columns.retire", &self.columns.retire),
            ("columns.reassign", &self.columns.reassign),
            ("columns.visibility", &self.columns.visibility),
        ];
        for (name, values) in lists {
            if values.iter().any(|v| v.trim().is_empty()) {
                return Err(ConfigError::Validation(format!("{name} contains an empty column name")));
            }
        }

        check_unique("review.expected", self.review.expected.iter().map(|e| e.field.as_str()))?;
        check_unique("review.patterns", self.review.patterns.iter().map(|p| p.field.as_str()))?;
        check_unique("review.comparisons", self.review.comparisons.iter().map(|c| c.field.as_str()))?;

        let conditions = self
            .review
            .comparisons
            .iter()
            .flat_map(|c| c.skip_when.iter())
            .chain(&self.eligibility.family)
            .chain(&self.eligibility.reassign)
            .chain(&self.eligibility.visibility_parent);
        for c in conditions {
            if c.column.trim().is_empty() {
                return Err(ConfigError::Validation("condition with an empty column name".into()));
            }
        }

        if self.review.suffixes.a == self.review.suffixes.b {
            return Err(ConfigError::Validation(format!(
                "review.suffixes must differ, both are '{}'",
                self.review.suffixes.a
            )));
        }

        if self.review.comparisons.iter().any(|c| c.field == self.review.match_key) {
            return Err(ConfigError::Validation(format!(
                "review.comparisons: match key '{}' cannot be compared with itself",
                self.review.match_key
            )));
        }

        Ok(())
    }

    /// Compiled `review.patterns`, in declaration order.
    pub fn patterns(&self) -> &[PatternRule] {
        &self.compiled_patterns
    }

    /// Whether the identifier can name several unrelated records.
    pub fn is_non_unique(&self, identifier: &str) -> bool {
        self.non_unique_identifiers.iter().any(|c| c == identifier)
    }

    /// Rows flagged as the family's primary child.
    pub fn primary_condition(&self) -> Condition {
        Condition::new(&self.primary_child_column, "yes")
    }
}

fn check_unique<'a>(section: &str, fields: impl Iterator<Item = &'a str>) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for field in fields {
        if field.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{section}: empty field name")));
        }
        if !seen.insert(field) {
            return Err(ConfigError::Validation(format!("{section}: field '{field}' listed twice")));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::BATCH_NUMBER_PATTERN;

    const MINIMAL: &str = r#"
region = "us"
identifier_column_candidates = ["Material Bank SKU"]
visibility_column = "Visibility"
hide_column = "Hide From Product View"

[review]
match_key = "Manufacturer Sku"
"#;

    #[test]
    fn builtins_parse_and_validate() {
        for region in Region::ALL {
            let config = RegionConfig::builtin(region).unwrap();
            assert_eq!(config.region, region);
            assert_eq!(config.group_column, "Family Id");
            assert!(!config.columns.retire.is_empty());
        }
    }

    #[test]
    fn us_catalog_item_exception_is_a_rule() {
        let us = RegionConfig::builtin(Region::Us).unwrap();
        let rule = us
            .review
            .comparisons
            .iter()
            .find(|c| c.field == "CatalogItemID")
            .unwrap();
        assert_eq!(rule.skip_when, vec![Condition::new("Product Type", "configurable")]);
        assert_eq!(us.review.match_key, "Manufacturer Sku");
        assert!(us.review.expected.is_empty());
    }

    #[test]
    fn eu_rules_in_declaration_order() {
        let eu = RegionConfig::builtin(Region::Eu).unwrap();
        assert_eq!(eu.review.match_key, "Manufacturer Sku EU");
        assert_eq!(eu.visibility_column, "Visibility EU");
        let fields: Vec<&str> = eu.review.expected.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields[0], "Product Websites");
        assert_eq!(fields[7], "Channel");
        assert_eq!(eu.review.expected[6], ExpectedValue::new("Customs Value", "1"));
        assert!(eu.review.non_empty_fields.contains(&"Manufacturer Sku EU".to_string()));
        assert!(!eu.review.comparisons.iter().any(|c| c.field == "CatalogItemID"));
        assert_eq!(eu.patterns().len(), 1);
        assert_eq!(eu.patterns()[0].pattern, BATCH_NUMBER_PATTERN);
    }

    #[test]
    fn defaults_fill_lifecycle_columns() {
        let config = RegionConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.retired_column, "Retired Sku");
        assert_eq!(config.review.suffixes, JoinSuffixes::default());
        assert!(config.is_non_unique("Product Name"));
        assert!(!config.is_non_unique("Material Bank SKU"));
    }

    #[test]
    fn invalid_pattern_rejected_at_load() {
        let input = format!(
            "{MINIMAL}\n[[review.patterns]]\nfield = \"Batch Number\"\npattern = \"Batch (\"\n"
        );
        let err = RegionConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref field, .. } if field == "Batch Number"));
    }

    #[test]
    fn duplicate_expected_field_rejected() {
        let input = format!(
            "{MINIMAL}\n[[review.expected]]\nfield = \"Channel\"\nvalue = \"Europe\"\n[[review.expected]]\nfield = \"Channel\"\nvalue = \"US\"\n"
        );
        let err = RegionConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn empty_names_rejected() {
        let input = MINIMAL.replace("hide_column = \"Hide From Product View\"", "hide_column = \" \"");
        let err = RegionConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("hide_column"));

        let err = RegionConfig::from_toml("region = \"us\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn patterns_compiled_on_load() {
        let input = format!(
            "{MINIMAL}\n[[review.patterns]]\nfield = \"Batch Number\"\npattern = \"Batch \\\\d{{3}}\"\n"
        );
        let config = RegionConfig::from_toml(&input).unwrap();
        assert_eq!(config.patterns().len(), config.review.patterns.len());
        assert_eq!(config.patterns()[0].field, "Batch Number");
        assert!(RegionConfig::from_toml(MINIMAL).unwrap().patterns().is_empty());
    }

    #[test]
    fn match_key_comparison_rejected() {
        let input = format!("{MINIMAL}\n[[review.comparisons]]\nfield = \"Manufacturer Sku\"\n");
        let err = RegionConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("match key")));
    }

    #[test]
    fn region_from_str() {
        assert_eq!("EU".parse::<Region>().unwrap(), Region::Eu);
        assert_eq!(" us ".parse::<Region>().unwrap(), Region::Us);
        assert!("apac".parse::<Region>().is_err());
    }
}
