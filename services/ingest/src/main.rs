//! Ingest CLI - imports one platform export archive and prints what came out
//!
//! Usage:
//!   ingest --archive export.zip --network instagram --range 30d --out report.json

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ingest::{
    best_performer, filter_aggregate, import_archive, Aggregate, ComparisonField, DateRange,
    ExportDocument, ImportDiagnostics, Network, PlatformComparison,
};

#[derive(Parser, Debug)]
#[command(name = "ingest", about = "Imports a social-media analytics export archive")]
struct Args {
    /// ZIP archive produced by the platform's export tool
    #[arg(long)]
    archive: PathBuf,

    /// youtube, instagram or tiktok
    #[arg(long)]
    network: Network,

    /// all, <n>d (e.g. 30d) or start..end
    #[arg(long, conflicts_with_all = ["start", "end"])]
    range: Option<DateRange>,

    /// Range start (YYYY-MM-DD), used with --end
    #[arg(long, requires = "end")]
    start: Option<NaiveDate>,

    /// Range end (YYYY-MM-DD), used with --start
    #[arg(long, requires = "start")]
    end: Option<NaiveDate>,

    /// Write the export document to this path
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print import diagnostics
    #[arg(long, default_value = "false")]
    diagnostics: bool,
}

impl Args {
    fn date_range(&self) -> Result<DateRange> {
        match (self.range, self.start, self.end) {
            (Some(range), _, _) => Ok(range),
            (None, Some(start), Some(end)) => Ok(DateRange::between(start, end)?),
            _ => Ok(DateRange::All),
        }
    }
}

fn print_diagnostics(diagnostics: &ImportDiagnostics) {
    println!("\n--- Diagnostics ---");
    println!("Archive SHA-256: {}", diagnostics.archive_sha256);
    println!("Entries seen: {}", diagnostics.entries_seen);
    for file in &diagnostics.files {
        match &file.route {
            Some(route) => println!("  [{:>14}] {} ({} rows)", route, file.name, file.rows),
            None => println!("  [{:>14}] {}", "skipped", file.name),
        }
    }
    if !diagnostics.sections_found.is_empty() {
        let sections: Vec<_> = diagnostics.sections_found.iter().map(|s| s.as_str()).collect();
        println!("Audience sections: {}", sections.join(", "));
        for (section, count) in &diagnostics.section_counts {
            println!("  {section}: {count}");
        }
    }
    if let Some(preview) = &diagnostics.audience_preview {
        println!("Audience preview:\n{preview}");
    }
    println!(
        "Defaulted values: {} missing, {} unparseable",
        diagnostics.coercion.missing, diagnostics.coercion.unparseable
    );
    for error in &diagnostics.errors {
        println!("  ! {error}");
    }
}

fn print_summary(aggregate: &Aggregate) {
    match aggregate {
        Aggregate::Youtube(data) => {
            let s = &data.summary;
            println!("Videos: {}", s.total_videos);
            println!("Views: {}", s.total_views);
            println!("Watch time (hours): {:.1}", s.total_watch_time_hours);
            println!("Subscribers: +{} / -{}", s.subscribers_gained, s.subscribers_lost);
            println!("Impressions: {}", s.total_impressions);
            println!("Likes / comments / shares: {} / {} / {}", s.total_likes, s.total_comments, s.total_shares);
        }
        Aggregate::Instagram(data) => {
            let r = &data.resumo;
            println!("Posts: {}", r.total_posts);
            println!("Views: {}", r.total_visualizacoes);
            println!("Reach: {}", r.total_alcance);
            println!("New followers: {}", r.novos_seguidores);
            println!("Interactions: {}", r.total_interacoes);
            println!("Profile visits: {}", r.total_visitas);
            println!("Link clicks: {}", r.total_cliques_link);
            println!(
                "Audience: {} age brackets, {} cities, {} countries, {} pages",
                data.publico_idade_genero.len(),
                data.publico_cidades.len(),
                data.publico_paises.len(),
                data.publico_paginas.len()
            );
        }
        Aggregate::Tiktok(data) => {
            let r = &data.resumo;
            println!("Posts: {}", r.total_posts);
            println!("Video views: {}", r.total_visualizacoes);
            println!("Profile views: {}", r.total_visualizacoes_perfil);
            println!("Likes / comments / shares: {} / {} / {}", r.total_curtidas, r.total_comentarios, r.total_compartilhamentos);
            println!("New followers: {}", r.novos_seguidores);
        }
    }
}

fn print_comparison(comparison: &PlatformComparison) {
    println!("\n--- Comparison ---");
    for field in ComparisonField::ALL {
        println!("  {:<16} {:.2}", field.as_str(), comparison.field(field));
    }
    println!("  {:<16} {:.2}", "avgViewsPerPost", comparison.avg_views_per_post);
    println!("  {:<16} {:.2}", "saves", comparison.saves);
    let best = best_performer(std::slice::from_ref(comparison), ComparisonField::EngagementRate);
    if let Some(network) = best {
        println!("  best engagement rate: {network}");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let range = args.date_range()?;

    println!("=== Analytics Ingest ===");
    println!("Archive: {}", args.archive.display());
    println!("Network: {}", args.network);
    println!("Range: {}", range);

    let bytes = std::fs::read(&args.archive)
        .with_context(|| format!("Failed to read archive {}", args.archive.display()))?;
    println!("Archive size: {} bytes", bytes.len());

    let imported = import_archive(&bytes, args.network).context("Import failed")?;
    println!(
        "Recognized {} of {} entries",
        imported.diagnostics.recognized(),
        imported.diagnostics.entries_seen
    );
    if args.diagnostics {
        print_diagnostics(&imported.diagnostics);
    }

    let view = filter_aggregate(&imported.aggregate, range);

    println!("\n--- Summary ---");
    print_summary(&view);
    print_comparison(&PlatformComparison::from_aggregate(&view));

    if let Some(out) = &args.out {
        let document = ExportDocument::new(view);
        std::fs::write(out, document.to_json_pretty()?)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        println!("\nWrote {}", out.display());
    }

    println!("\n=== Done ===");
    Ok(())
}
