use comfy_table::{presets::NOTHING, Attribute, Cell, ContentArrangement, Table};

/// Borderless table for report output: bold dim headers, no wrapping, a
/// three-space gutter between columns.
pub fn report_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Disabled);
    table.set_header(headers.iter().map(|text| {
        Cell::new(text)
            .add_attribute(Attribute::Bold)
            .add_attribute(Attribute::Dim)
    }));
    for i in 0..table.column_count() {
        if let Some(col) = table.column_mut(i) {
            col.set_padding((0, 3));
        }
    }
    table
}
