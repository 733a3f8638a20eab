use super::with_paper;
use crate::config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use folio_editor::{DocumentStats, Editor, PageSummary};
use folio_markup::parse_strict;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct PaginateArgs {
    /// Document to paginate (markup file)
    pub input: PathBuf,

    /// Paper preset (a4, a5, b5, letter, legal) or WxH in mm
    #[arg(short, long)]
    pub paper: Option<String>,

    /// Print a JSON report instead of text
    #[arg(long)]
    pub json: bool,

    /// Also print each page's markup
    #[arg(long)]
    pub content: bool,

    /// Reject stray or unclosed tags instead of repairing them
    #[arg(long)]
    pub strict: bool,
}

/// Machine-readable pagination result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginateReport {
    pub paper: String,
    pub capacity: f32,
    pub pages: Vec<PageSummary>,
    pub stats: DocumentStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<String>>,
}

pub fn paginate(args: PaginateArgs, cwd: &str) -> Result<()> {
    let config = with_paper(config::load(cwd)?, args.paper.as_deref())?;
    let paper = config.paper;

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    if args.strict {
        parse_strict(&raw).map_err(|e| {
            let line = raw[..e.pos().min(raw.len())].matches('\n').count() + 1;
            anyhow::anyhow!("{}:{}: {}", args.input.display(), line, e)
        })?;
    }

    let mut editor = Editor::in_memory(config);
    editor.init()?;
    editor.load_content(&raw)?;

    let report = PaginateReport {
        paper: paper.to_string(),
        capacity: editor.pages().capacity(),
        pages: editor.page_summaries()?,
        stats: editor.stats(),
        contents: if args.content {
            Some(editor.pages().page_contents()?)
        } else {
            None
        },
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("📄 {} {}", "Paginated".green().bold(), args.input.display());
    println!("   Paper:    {}", report.paper);
    println!("   Capacity: {:.1}px", report.capacity);
    println!();
    print_pages(&report);
    println!();
    println!(
        "   {} pages, {} words, {} blocks, {} read",
        report.pages.len(),
        report.stats.words,
        report.stats.blocks,
        report.stats.reading_time()
    );

    Ok(())
}

pub fn print_pages(report: &PaginateReport) {
    for (i, page) in report.pages.iter().enumerate() {
        let fill = if page.capacity > 0.0 {
            page.extent / page.capacity * 100.0
        } else {
            0.0
        };
        let status = if page.overflowing {
            "✗".red()
        } else {
            "✓".green()
        };

        println!(
            "   {} {:<9} {:>4} nodes  {:>8.1}px  {:>5.1}%",
            status, page.label, page.node_count, page.extent, fill
        );
        if page.overflowing {
            println!("     {} single block taller than the page", "note:".yellow());
        }

        if let Some(content) = report.contents.as_ref().and_then(|c| c.get(i)) {
            println!("     {}", content.dimmed());
        }
    }
}
