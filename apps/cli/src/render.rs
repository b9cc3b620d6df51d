//! Terminal table of merged results.

use std::sync::Arc;

use capwatch_market_data::{has_variants, platform_label, FetchResult, MergedToken};

/// Compact USD amount, e.g. `$1.24B`.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "-".to_string();
    }
    match value {
        v if v >= 1e9 => format!("${:.2}B", v / 1e9),
        v if v >= 1e6 => format!("${:.2}M", v / 1e6),
        v if v >= 1e3 => format!("${:.1}K", v / 1e3),
        v => format!("${:.2}", v),
    }
}

fn row(entry: &MergedToken<Arc<FetchResult>>) -> [String; 6] {
    let result = &entry.entry;
    let variants = if has_variants(entry) {
        entry
            .variants
            .iter()
            .map(|v| format!("{}:{}", v.platform, v.data_points))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        String::new()
    };

    [
        result.token.symbol.clone(),
        platform_label(entry).to_string(),
        result.data.len().to_string(),
        format_usd(result.current_market_cap),
        result.source.to_string(),
        variants,
    ]
}

/// Render display entries as a fixed-width table.
pub fn table(entries: &[&MergedToken<Arc<FetchResult>>]) -> String {
    const HEADER: [&str; 6] = ["SYMBOL", "PLATFORM", "POINTS", "MARKET CAP", "SOURCE", "VARIANTS"];

    let rows: Vec<[String; 6]> = entries.iter().map(|e| row(e)).collect();
    let mut widths = HEADER.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |cells: &[&str]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(&HEADER)];
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push(line(&cells));
    }
    out.join("\n")
}
