//! `ecomatch catalog`: load the configured catalog and summarize it.
//!
//! Prints the refresh report (counts, adaptive threshold, digest), the
//! category vocabulary and, on request, every product and every data issue.
//! Unlike `recommend`, a failed load is an error here.

use anyhow::Result;
use ecomatch_core::recommend::format_kg;
use ecomatch_core::{CatalogIndex, RefreshReport, Recommender};

use crate::config::Config;
use crate::sources;

pub async fn run_catalog(config: &Config, products: bool, issues: bool, json: bool) -> Result<()> {
    let source = sources::build_source(config)?;
    let engine = Recommender::without_snapshot(source, config.engine_settings());
    let report = engine.refresh().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    if let Some(index) = engine.snapshot() {
        print_categories(&index);
        if products {
            print_products(&index);
        }
    }
    if issues {
        print_issues(&report);
    } else if !report.issues.is_empty() {
        println!();
        println!("  {} data issue(s); rerun with --issues to list them.", report.issues.len());
    }
    println!();
    Ok(())
}

fn print_report(report: &RefreshReport) {
    println!("EcoMatch Catalog");
    println!("================");
    println!();
    println!("  Source:      {}", report.source);
    println!("  Rows:        {}", report.rows_fetched);
    println!("  Products:    {}", report.products);
    println!("  Eco:         {}", report.eco);
    println!("  Non-eco:     {}", report.non_eco);
    match report.threshold {
        Some(t) => println!("  Threshold:   {} kg CO₂e (adaptive)", format_kg(t)),
        None => println!("  Threshold:   n/a (all rows typed)"),
    }
    println!("  Digest:      {}", &report.digest[..12.min(report.digest.len())]);
    println!("  Built:       {}", report.built_at.format("%Y-%m-%d %H:%M:%S UTC"));
}

fn print_categories(index: &CatalogIndex) {
    println!();
    println!("  Categories:");
    for category in index.categories() {
        let count = index
            .products()
            .iter()
            .filter(|p| p.category_norm() == category)
            .count();
        println!("    {:<24} {:>6}", category, count);
    }
}

fn print_products(index: &CatalogIndex) {
    println!();
    println!(
        "  {:>6}  {:<32} {:<18} {:<8} {:<8} {:>10}",
        "ID", "NAME", "CATEGORY", "SIZE", "TYPE", "KG CO₂E"
    );
    println!("  {}", "-".repeat(88));
    for p in index.products() {
        println!(
            "  {:>6}  {:<32} {:<18} {:<8} {:<8} {:>10}",
            p.id(),
            truncate(p.name(), 32),
            truncate(p.category(), 18),
            p.size_norm(),
            p.type_norm(),
            format_kg(p.carbon_emission())
        );
    }
}

fn print_issues(report: &RefreshReport) {
    println!();
    if report.issues.is_empty() {
        println!("  No data issues.");
        return;
    }
    println!("  Data issues:");
    for issue in &report.issues {
        println!(
            "    [{}] product {} {}: {}",
            issue.kind, issue.product_id, issue.field, issue.detail
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
