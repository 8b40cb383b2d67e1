use crate::error::{DashboardError, Result};
use crate::schema::{quantity_from_number, SalesRecord};
use crate::utils::{canonical_month_label, fold_text, normalize_text};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;

/// The six columns every upload must provide, under any accepted alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalField {
    Month,
    Branch,
    Category,
    Seller,
    Amount,
    Quantity,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 6] = [
        CanonicalField::Month,
        CanonicalField::Branch,
        CanonicalField::Category,
        CanonicalField::Seller,
        CanonicalField::Amount,
        CanonicalField::Quantity,
    ];

    /// Header name shown to users in error messages.
    pub fn header_name(&self) -> &'static str {
        match self {
            CanonicalField::Month => "Mes",
            CanonicalField::Branch => "Sucursal",
            CanonicalField::Category => "Linea",
            CanonicalField::Seller => "Vendedora",
            CanonicalField::Amount => "Precio Total",
            CanonicalField::Quantity => "Cantidad",
        }
    }

    /// Accepted header spellings, in priority order, already folded.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::Month => &["mes", "month"],
            CanonicalField::Branch => &["sucursal", "branch"],
            CanonicalField::Category => &["linea", "categoria", "category"],
            CanonicalField::Seller => &["vendedora", "vendedor", "asesora", "asesor", "seller"],
            CanonicalField::Amount => &[
                "precio total",
                "preciototal",
                "total",
                "importe",
                "monto",
                "venta",
                "ventas",
                "amount",
            ],
            CanonicalField::Quantity => &[
                "cantidad",
                "qty",
                "unidades",
                "transacciones",
                "tx",
                "quantity",
            ],
        }
    }
}

/// Column index of each canonical field within the uploaded header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMap {
    month: usize,
    branch: usize,
    category: usize,
    seller: usize,
    amount: usize,
    quantity: usize,
}

impl HeaderMap {
    /// Resolves header names case- and accent-insensitively against the alias table.
    /// Fails with every unresolved field listed, not just the first.
    pub fn resolve<'a, I>(headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let folded: Vec<String> = headers.into_iter().map(fold_text).collect();

        let find = |field: CanonicalField| -> Option<usize> {
            field
                .aliases()
                .iter()
                .find_map(|alias| folded.iter().position(|h| h == alias))
        };

        let resolved: Vec<(CanonicalField, Option<usize>)> = CanonicalField::ALL
            .iter()
            .map(|f| (*f, find(*f)))
            .collect();

        let missing: Vec<CanonicalField> = resolved
            .iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(f, _)| *f)
            .collect();

        if !missing.is_empty() {
            return Err(DashboardError::MissingColumns(missing));
        }

        let idx = |field: CanonicalField| {
            resolved
                .iter()
                .find(|(f, _)| *f == field)
                .and_then(|(_, i)| *i)
                .unwrap_or_default()
        };

        Ok(Self {
            month: idx(CanonicalField::Month),
            branch: idx(CanonicalField::Branch),
            category: idx(CanonicalField::Category),
            seller: idx(CanonicalField::Seller),
            amount: idx(CanonicalField::Amount),
            quantity: idx(CanonicalField::Quantity),
        })
    }

    pub fn index_of(&self, field: CanonicalField) -> usize {
        match field {
            CanonicalField::Month => self.month,
            CanonicalField::Branch => self.branch,
            CanonicalField::Category => self.category,
            CanonicalField::Seller => self.seller,
            CanonicalField::Amount => self.amount,
            CanonicalField::Quantity => self.quantity,
        }
    }

    fn field<'r>(&self, row: &'r StringRecord, field: CanonicalField) -> &'r str {
        row.get(self.index_of(field)).unwrap_or("")
    }

    /// Normalizes one data row. Returns `None` when the row is not admissible.
    pub fn normalize_row(&self, row: &StringRecord) -> Option<SalesRecord> {
        let record = SalesRecord {
            month: canonical_month_label(self.field(row, CanonicalField::Month)),
            branch: normalize_text(self.field(row, CanonicalField::Branch)),
            category: normalize_text(self.field(row, CanonicalField::Category)),
            seller: normalize_text(self.field(row, CanonicalField::Seller)),
            amount: parse_amount(self.field(row, CanonicalField::Amount)),
            quantity: parse_quantity(self.field(row, CanonicalField::Quantity)),
        };

        record.is_admissible().then_some(record)
    }
}

/// Parses a locale-formatted number such as "$1,500.00".
/// Currency symbols, grouping commas and whitespace are stripped; anything that
/// still fails to parse as a finite number becomes 0.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Unit counts are parsed like amounts, then clamped by [`quantity_from_number`].
pub fn parse_quantity(raw: &str) -> u64 {
    quantity_from_number(parse_amount(raw))
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decodes raw file bytes as UTF-8, falling back to Latin-1 for legacy
/// spreadsheet exports. A leading byte order mark is dropped.
pub fn decode_contents(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            debug!("Upload is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|b| *b as char).collect()
        }
    }
}

/// Picks the delimiter that occurs most often, outside quotes, in the header line.
/// Ties and header lines without any candidate resolve to a comma.
pub fn sniff_delimiter(contents: &str) -> u8 {
    let header = contents.lines().next().unwrap_or_default();
    let mut counts = [(b',', 0usize), (b';', 0), (b'\t', 0)];
    let mut in_quotes = false;

    for c in header.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        for (delimiter, count) in counts.iter_mut() {
            if c == *delimiter as char {
                *count += 1;
            }
        }
    }

    counts
        .iter()
        .fold((b',', 0), |best, (d, n)| if *n > best.1 { (*d, *n) } else { best })
        .0
}

/// Result of normalizing one upload.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    /// Surviving records, in file order.
    pub records: Vec<SalesRecord>,
    /// Data rows seen, header excluded.
    pub rows_read: usize,
    /// Rows dropped by the admission rules.
    pub rows_skipped: usize,
}

/// Turns delimited text exports into canonical [`SalesRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvIngestor {
    delimiter: Option<u8>,
}

impl CsvIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces a delimiter instead of sniffing it from the header line.
    pub fn with_delimiter(delimiter: Option<u8>) -> Self {
        Self { delimiter }
    }

    pub fn parse_path(&self, path: impl AsRef<Path>) -> Result<IngestOutcome> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            DashboardError::UnreadableFile(format!("{}: {}", path.display(), e))
        })?;
        info!("Ingesting {} ({} bytes)", path.display(), bytes.len());
        self.parse_bytes(&bytes)
    }

    pub fn parse_reader<R: Read>(&self, mut reader: R) -> Result<IngestOutcome> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| DashboardError::UnreadableFile(e.to_string()))?;
        self.parse_bytes(&bytes)
    }

    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<IngestOutcome> {
        self.parse_str(&decode_contents(bytes))
    }

    pub fn parse_str(&self, contents: &str) -> Result<IngestOutcome> {
        let delimiter = self.delimiter.unwrap_or_else(|| sniff_delimiter(contents));

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(contents.as_bytes());

        let headers = reader.headers()?.clone();
        let header_map = HeaderMap::resolve(headers.iter())?;

        let mut records = Vec::new();
        let mut rows_read = 0;

        for row in reader.records() {
            let row = row?;
            rows_read += 1;
            if let Some(record) = header_map.normalize_row(&row) {
                records.push(record);
            }
        }

        let rows_skipped = rows_read - records.len();
        debug!(
            "Parsed {} data rows: {} admitted, {} skipped",
            rows_read,
            records.len(),
            rows_skipped
        );

        if records.is_empty() {
            warn!("Upload contained no valid rows ({} read)", rows_read);
            return Err(DashboardError::NoValidRows);
        }

        Ok(IngestOutcome {
            records,
            rows_read,
            rows_skipped,
        })
    }
}

/// Parses an uploaded export with delimiter sniffing and returns the admitted records.
pub fn parse_delimited(contents: &[u8]) -> Result<Vec<SalesRecord>> {
    CsvIngestor::new()
        .parse_bytes(contents)
        .map(|outcome| outcome.records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,500.00"), 1500.0);
        assert_eq!(parse_amount(" 58240 "), 58240.0);
        assert_eq!(parse_amount("$ 12,000"), 12000.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("inf"), 0.0);
        assert_eq!(parse_amount("-300"), -300.0);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("3"), 3);
        assert_eq!(parse_quantity("4.0"), 4);
        assert_eq!(parse_quantity("1,200"), 1200);
        assert_eq!(parse_quantity("-2"), 0);
        assert_eq!(parse_quantity("n/a"), 0);
        assert_eq!(parse_quantity("1e20"), 0);
    }

    #[test]
    fn test_header_aliases() {
        let headers = ["MES", "Sucursal", "Línea", "Asesora", "Importe", "Unidades"];
        let map = HeaderMap::resolve(headers.iter().copied()).unwrap();
        assert_eq!(map.index_of(CanonicalField::Category), 2);
        assert_eq!(map.index_of(CanonicalField::Seller), 3);
        assert_eq!(map.index_of(CanonicalField::Amount), 4);
        assert_eq!(map.index_of(CanonicalField::Quantity), 5);
    }

    #[test]
    fn test_header_alias_priority() {
        // "Precio Total" wins over a plain "Total" column regardless of position.
        let headers = ["Mes", "Sucursal", "Linea", "Vendedora", "Total", "Precio Total", "Cantidad"];
        let map = HeaderMap::resolve(headers.iter().copied()).unwrap();
        assert_eq!(map.index_of(CanonicalField::Amount), 5);
    }

    #[test]
    fn test_missing_columns_lists_all() {
        let headers = ["Mes", "Sucursal", "Producto"];
        match HeaderMap::resolve(headers.iter().copied()) {
            Err(DashboardError::MissingColumns(missing)) => assert_eq!(
                missing,
                vec![
                    CanonicalField::Category,
                    CanonicalField::Seller,
                    CanonicalField::Amount,
                    CanonicalField::Quantity
                ]
            ),
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_reference_row() {
        let csv = "Mes,Sucursal,Linea,Vendedora,Precio Total,Cantidad\n\
                   Enero 2026,Masaryk,Farmacia,Ana,\"$1,500.00\",3\n";
        let records = parse_delimited(csv.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![SalesRecord::new("Enero 2026", "Masaryk", "Farmacia", "Ana", 1500.0, 3)]
        );
    }

    #[test]
    fn test_rows_filtered_and_normalized() {
        let csv = "Mes,Sucursal,Linea,Vendedora,Precio Total,Cantidad\n\
                   octubre 2025,  Buenavista ,Laser,  Aura   Castro ,1500,1\n\
                   Octubre 2025,,Laser,Ana,200,1\n\
                   Octubre 2025,Masaryk,,Ana,200,1\n\
                   Octubre 2025,Masaryk,Laser,Ana,0,1\n\
                   Octubre 2025,Masaryk,Laser,Ana,-50,1\n\
                   Octubre 2025,Masaryk,Laser,Ana,gratis,1\n\
                   Octubre 2025,Masaryk,Laser,,300,\n";
        let outcome = CsvIngestor::new().parse_str(csv).unwrap();

        assert_eq!(outcome.rows_read, 7);
        assert_eq!(outcome.rows_skipped, 5);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].month, "Octubre 2025");
        assert_eq!(outcome.records[0].branch, "Buenavista");
        assert_eq!(outcome.records[0].seller, "Aura Castro");
        assert_eq!(outcome.records[1].seller, "");
        assert_eq!(outcome.records[1].quantity, 0);
    }

    #[test]
    fn test_no_valid_rows() {
        let csv = "Mes,Sucursal,Linea,Vendedora,Precio Total,Cantidad\n\
                   Octubre 2025,Masaryk,Laser,Ana,0,1\n";
        assert!(matches!(
            CsvIngestor::new().parse_str(csv),
            Err(DashboardError::NoValidRows)
        ));
    }

    #[test]
    fn test_header_only_file_has_no_valid_rows() {
        let csv = "Mes,Sucursal,Linea,Vendedora,Precio Total,Cantidad\n";
        assert!(matches!(
            CsvIngestor::new().parse_str(csv),
            Err(DashboardError::NoValidRows)
        ));
    }

    #[test]
    fn test_quoted_fields_and_escaped_quotes() {
        let csv = "Mes,Sucursal,Linea,Vendedora,Precio Total,Cantidad\n\
                   Enero 2026,Masaryk,\"Medicina, Estetica\",\"Ana \"\"La Jefa\"\"\",\"$12,000\",2\n";
        let records = parse_delimited(csv.as_bytes()).unwrap();
        assert_eq!(records[0].category, "Medicina, Estetica");
        assert_eq!(records[0].seller, "Ana \"La Jefa\"");
        assert_eq!(records[0].amount, 12000.0);
    }

    #[test]
    fn test_semicolon_delimiter_is_sniffed() {
        let csv = "Mes;Sucursal;Linea;Vendedora;Total;Cantidad\n\
                   Enero 2026;Masaryk;Farmacia;Ana;$1,500;3\n";
        assert_eq!(sniff_delimiter(csv), b';');
        let records = parse_delimited(csv.as_bytes()).unwrap();
        assert_eq!(records[0].amount, 1500.0);
    }

    #[test]
    fn test_forced_delimiter() {
        let csv = "Mes\tSucursal\tLinea\tVendedora\tTotal\tCantidad\n\
                   Enero 2026\tMasaryk\tFarmacia\tAna\t900\t1\n";
        let outcome = CsvIngestor::with_delimiter(Some(b'\t')).parse_str(csv).unwrap();
        assert_eq!(outcome.records[0].branch, "Masaryk");
    }

    #[test]
    fn test_latin1_and_bom_decoding() {
        let mut bytes = b"Mes,Sucursal,L\xednea,Vendedora,Total,Cantidad\n".to_vec();
        bytes.extend_from_slice(b"Enero 2026,Masaryk,Farmacia,Ana,100,1\n");
        let records = parse_delimited(&bytes).unwrap();
        assert_eq!(records.len(), 1);

        let mut with_bom = vec![0xEF, 0xBB, 0xBF];
        with_bom.extend_from_slice("Mes,Sucursal,Línea,Vendedora,Total,Cantidad\n".as_bytes());
        with_bom.extend_from_slice(b"Enero 2026,Masaryk,Farmacia,Ana,100,1\n");
        let records = parse_delimited(&with_bom).unwrap();
        assert_eq!(records[0].category, "Farmacia");
    }

    #[test]
    fn test_unreadable_path() {
        let result = CsvIngestor::new().parse_path("/definitely/not/here.csv");
        assert!(matches!(result, Err(DashboardError::UnreadableFile(_))));
    }
}
