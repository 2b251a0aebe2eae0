use aquatrack_view::prelude::*;

pub trait TableRow {
    fn headers() -> &'static [&'static str];
    fn row(&self) -> Vec<String>;
}

pub fn render_table<T: TableRow>(items: &[T]) -> String {
    let headers = T::headers();
    let rows: Vec<Vec<String>> = items.iter().map(TableRow::row).collect();
    let widths = column_widths(headers, &rows);

    let mut out = String::new();
    out.push_str(&format_row(
        &headers.iter().map(ToString::to_string).collect::<Vec<_>>(),
        &widths,
    ));
    out.push('\n');
    out.push_str(&format_separator(&widths));

    for row in rows {
        out.push('\n');
        out.push_str(&format_row(&row, &widths));
    }

    out
}

/// Display width: wide (CJK, emoji) characters take two columns
fn display_width(text: &str) -> usize {
    text.chars()
        .map(|ch| if u32::from(ch) >= 0x1100 { 2 } else { 1 })
        .sum()
}

fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let width = display_width(cell);
            if idx >= widths.len() {
                widths.push(width);
            } else {
                widths[idx] = widths[idx].max(width);
            }
        }
    }
    widths
}

fn format_row(row: &[String], widths: &[usize]) -> String {
    let mut out = String::new();
    for (idx, cell) in row.iter().enumerate() {
        if idx > 0 {
            out.push_str("  ");
        }
        out.push_str(cell);
        // no trailing padding on the last column
        if idx + 1 < row.len() {
            let width = widths.get(idx).copied().unwrap_or(0);
            out.push_str(&" ".repeat(width.saturating_sub(display_width(cell))));
        }
    }
    out
}

fn format_separator(widths: &[usize]) -> String {
    let mut out = String::new();
    for (idx, width) in widths.iter().enumerate() {
        if idx > 0 {
            out.push_str("  ");
        }
        out.push_str(&"-".repeat(*width));
    }
    out
}

fn flag(value: bool) -> String {
    if value { "✓".into() } else { String::new() }
}

impl TableRow for ItemCard {
    fn headers() -> &'static [&'static str] {
        &["id", "name", "location", "visited", "star", "note"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            self.meta.clone(),
            flag(self.visited),
            flag(self.starred),
            self.note.text.clone(),
        ]
    }
}

impl TableRow for Marker {
    fn headers() -> &'static [&'static str] {
        &["id", "icon", "lat", "lng"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.icon.glyph().to_string(),
            format!("{:.4}", self.position.lat),
            format!("{:.4}", self.position.lng),
        ]
    }
}

impl TableRow for RegionHeader {
    fn headers() -> &'static [&'static str] {
        &["region", "visited", "total", "collapsed"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.region.clone(),
            self.visited.to_string(),
            self.total.to_string(),
            self.collapsed.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(&'static str, &'static str);

    impl TableRow for Row {
        fn headers() -> &'static [&'static str] {
            &["name", "region"]
        }

        fn row(&self) -> Vec<String> {
            vec![self.0.to_string(), self.1.to_string()]
        }
    }

    #[test]
    fn wide_characters_align() {
        let table = render_table(&[Row("海遊館", "近畿"), Row("Aqua", "関東")]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "name    region");
        assert_eq!(lines[1], "------  ------");
        assert_eq!(lines[2], "海遊館  近畿");
        assert_eq!(lines[3], "Aqua    関東");
    }
}
