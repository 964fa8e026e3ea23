use orbit_core::cpq::catalog::Catalog;
use orbit_documents::format_rupees;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct CatalogRow<'a> {
    key: &'a str,
    name: &'a str,
    unit_price: u64,
    minimum_quantity: u32,
}

pub fn run(json_output: bool) -> String {
    let catalog = Catalog::standard();
    let rows: Vec<_> = catalog
        .items()
        .iter()
        .map(|item| CatalogRow {
            key: &item.key,
            name: &item.name,
            unit_price: item.unit_price,
            minimum_quantity: item.minimum_quantity,
        })
        .collect();

    if json_output {
        return serde_json::to_string_pretty(&rows).unwrap_or_else(|error| {
            format!("{{\"error\":\"catalog serialization failed: {error}\"}}")
        });
    }

    let mut lines = vec![format!("catalog ({} items):", rows.len())];
    for row in &rows {
        let price = i64::try_from(row.unit_price).map(format_rupees).unwrap_or_default();
        lines.push(format!(
            "- {} [{}] Rs {} (minimum {})",
            row.name, row.key, price, row.minimum_quantity
        ));
    }
    lines.join("\n")
}
