use crate::config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_editor::{PageGeometry, PaperSize};

#[derive(Args, Debug)]
pub struct PapersArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn papers(args: PapersArgs, cwd: &str) -> Result<()> {
    let config = config::load(cwd)?;

    let rows: Vec<_> = PaperSize::PRESETS
        .iter()
        .map(|paper| {
            let geometry = PageGeometry::from_paper(*paper, config.margins);
            let lines = (geometry.capacity() / config.layout.line_height).floor() as usize;
            let columns = config.layout.chars_per_line(geometry.content_width);
            (*paper, geometry, lines, columns)
        })
        .collect();

    if args.json {
        let json: Vec<_> = rows
            .iter()
            .map(|(paper, geometry, lines, columns)| {
                let (width_mm, height_mm) = paper.dimensions_mm();
                serde_json::json!({
                    "name": paper.name(),
                    "widthMm": width_mm,
                    "heightMm": height_mm,
                    "contentWidth": geometry.content_width,
                    "capacity": geometry.capacity(),
                    "lines": lines,
                    "columns": columns,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("📐 {} Paper presets", "Available".green().bold());
    println!();
    for (paper, geometry, lines, columns) in rows {
        let marker = if paper == config.paper { "*" } else { " " };
        let (w, h) = paper.dimensions_mm();
        println!(
            "  {} {:<7} {:>6.1} × {:<6.1} mm  {:>7.1}px  {:>3} lines × {:>3} chars",
            marker.cyan().bold(),
            paper.name(),
            w,
            h,
            geometry.capacity(),
            lines,
            columns
        );
    }
    println!();
    println!("   * current default (folio.config.json)");

    Ok(())
}
