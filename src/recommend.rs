//! `ecomatch recommend` and `ecomatch compare`.
//!
//! Both commands load the configured catalog once and print a single
//! [`RecommendationResult`], either as text or (with `--json`) pretty JSON.
//! A failed answer is still printed; it is not an error of the command.

use anyhow::Result;
use ecomatch_core::recommend::format_kg;
use ecomatch_core::{ProductView, RecommendationResult, Recommender};

use crate::config::Config;
use crate::sources::{self, ConfiguredSource};

/// Build the engine over the configured source and perform the initial load.
pub async fn open_engine(config: &Config) -> Result<Recommender<ConfiguredSource>> {
    let source = sources::build_source(config)?;
    Ok(Recommender::new(source, config.engine_settings()).await)
}

pub async fn run_recommend(config: &Config, text: &str, json: bool) -> Result<()> {
    let engine = open_engine(config).await?;
    let result = engine.recommend(text);
    print_result(&result, json)
}

pub async fn run_compare(config: &Config, name_a: &str, name_b: &str, json: bool) -> Result<()> {
    let engine = open_engine(config).await?;
    let result = engine.compare(name_a, name_b);
    print_result(&result, json)
}

pub fn print_result(result: &RecommendationResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print!("{}", render_text(result));
    }
    Ok(())
}

/// Human-readable rendering of a result.
pub fn render_text(result: &RecommendationResult) -> String {
    let mut out = String::new();

    if result.success {
        if let Some(p) = &result.recommended {
            out.push_str(&format!("Recommended:   {}\n", describe(p)));
        }
        if let Some(p) = &result.compared_with {
            out.push_str(&format!("Compared with: {}\n", describe(p)));
        }
        if let Some(reason) = &result.reason {
            out.push('\n');
            out.push_str(reason);
            out.push('\n');
        }
        return out;
    }

    let kind = result.kind.map_or("failure", |k| k.as_str());
    out.push_str(&format!(
        "No recommendation ({}): {}\n",
        kind,
        result.message.as_deref().unwrap_or("")
    ));

    if let Some(parsed) = &result.parsed {
        out.push_str(&format!(
            "  parsed: category={} size={} compare={}\n",
            parsed.category().unwrap_or("-"),
            parsed.size_filter().unwrap_or("-"),
            parsed.is_compare_intent
        ));
        if !parsed.compare_targets.is_empty() {
            out.push_str(&format!("  targets: {}\n", parsed.compare_targets.join(", ")));
        }
    }
    out
}

fn describe(p: &ProductView) -> String {
    let mut line = format!(
        "{} ({}, {}, {}, {} kg CO₂e",
        p.name,
        p.product_type,
        p.category,
        p.size,
        format_kg(p.carbon_emission)
    );
    if let Some(price) = p.price {
        line.push_str(&format!(", {:.2}", price));
    }
    line.push(')');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecomatch_core::catalog::ClassificationPolicy;
    use ecomatch_core::compare::ComparisonResolver;
    use ecomatch_core::recommend::RecommendationEngine;
    use ecomatch_core::{CatalogIndex, CatalogRow, Matcher};

    fn index() -> CatalogIndex {
        CatalogIndex::build(
            vec![
                CatalogRow::new(1, "Steel Bottle", "drinkware", 2.0)
                    .with_type("eco")
                    .with_price(19.5),
                CatalogRow::new(2, "Plastic Bottle", "drinkware", 9.0).with_type("non-eco"),
            ],
            &ClassificationPolicy::default(),
        )
    }

    #[test]
    fn renders_success() {
        let index = index();
        let matcher = Matcher::default();
        let result = RecommendationEngine::new(&index, &matcher).recommend("recommend a bottle");
        let text = render_text(&result);
        assert!(text.contains("Recommended:   Steel Bottle (eco, drinkware, medium, 2.0 kg CO₂e, 19.50)"));
        assert!(text.contains("Compared with: Plastic Bottle (non-eco"));
        assert!(text.contains("compared to Plastic Bottle (9.0 kg CO₂e)."));
    }

    #[test]
    fn renders_failure_with_parse() {
        let index = index();
        let matcher = Matcher::default();
        let result = ComparisonResolver::new(&index, &matcher).compare("Steel Bottle", "Titanium Spork");
        let text = render_text(&result);
        assert!(text.starts_with("No recommendation (not_found): One or both products not found."));
        assert!(text.contains("targets: Steel Bottle, Titanium Spork"));
    }
}
