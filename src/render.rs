//! Plain-text rendering of beverage lists for the CLI.

use std::fmt::Write;

use beverage_mcp_core::models::Beverage;

const NAME_WIDTH: usize = 24;
const CATEGORY_WIDTH: usize = 12;
const INGREDIENT_WIDTH: usize = 18;
const ORIGIN_WIDTH: usize = 16;

/// Render `beverages` as a fixed-width table. Unset fields show as `-`.
pub fn render_table(beverages: &[Beverage]) -> String {
    if beverages.is_empty() {
        return "No beverages.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<nw$} {:<cw$} {:<iw$} {:<ow$} {:>5}",
        "ID",
        "NAME",
        "CATEGORY",
        "INGREDIENT",
        "ORIGIN",
        "KCAL",
        nw = NAME_WIDTH,
        cw = CATEGORY_WIDTH,
        iw = INGREDIENT_WIDTH,
        ow = ORIGIN_WIDTH,
    );
    let _ = writeln!(
        out,
        "{}",
        "-".repeat(4 + 2 + NAME_WIDTH + CATEGORY_WIDTH + INGREDIENT_WIDTH + ORIGIN_WIDTH + 5 + 4)
    );

    for b in beverages {
        let calories = b
            .calories_per_serving
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:>4}  {:<nw$} {:<cw$} {:<iw$} {:<ow$} {:>5}",
            b.id,
            cell(b.name.as_deref(), NAME_WIDTH),
            cell(b.category.as_deref(), CATEGORY_WIDTH),
            cell(b.primary_ingredient.as_deref(), INGREDIENT_WIDTH),
            cell(b.origin_region.as_deref(), ORIGIN_WIDTH),
            calories,
            nw = NAME_WIDTH,
            cw = CATEGORY_WIDTH,
            iw = INGREDIENT_WIDTH,
            ow = ORIGIN_WIDTH,
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{} beverage(s)", beverages.len());
    out
}

pub fn print_table(beverages: &[Beverage]) {
    print!("{}", render_table(beverages));
}

/// Fit `value` into `width` characters, marking truncation with `~`.
fn cell(value: Option<&str>, width: usize) -> String {
    let value = value.unwrap_or("-");
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(width - 1).collect();
    cut.push('~');
    cut
}
