use crate::schema::{Dataset, SalesRecord};

pub const BASELINE_MONTH: &str = "Octubre 2025";

// (branch, category, seller, amount, quantity)
const OCTOBER_2025: [(&str, &str, &str, f64, u64); 41] = [
    ("Buenavista", "Aparatologia", "Aura Castro", 58240.0, 4),
    ("Buenavista", "Cosmetologia", "Aura Castro", 1200.0, 1),
    ("Buenavista", "Farmacia", "Aura Castro", 22140.0, 10),
    ("Buenavista", "Inyectables", "Aura Castro", 14200.0, 2),
    ("Buenavista", "Laser", "Aura Castro", 1500.0, 1),
    ("Buenavista", "Medicina Estetica", "Aura Castro", 39950.0, 2),
    ("Buenavista", "Servicios", "Aura Castro", 3500.0, 1),
    ("Buenavista", "Aparatologia", "Mar Campos", 34600.0, 2),
    ("Buenavista", "Cosmetologia", "Mar Campos", 19400.0, 4),
    ("Buenavista", "Farmacia", "Mar Campos", 65617.0, 42),
    ("Buenavista", "Inyectables", "Mar Campos", 21940.0, 2),
    ("Buenavista", "Laser", "Mar Campos", 13800.0, 4),
    ("Buenavista", "Medicina Estetica", "Mar Campos", 193318.0, 15),
    ("Buenavista", "Servicios", "Mar Campos", 6000.0, 2),
    ("Buenavista", "Aparatologia", "Recepcion Buenavista", 3500.0, 1),
    ("Buenavista", "Cosmetologia", "Recepcion Buenavista", 18900.0, 4),
    ("Buenavista", "Farmacia", "Recepcion Buenavista", 2286.0, 5),
    ("Buenavista", "Inyectables", "Recepcion Buenavista", 10900.0, 2),
    ("Buenavista", "Laser", "Recepcion Buenavista", 10800.0, 3),
    ("Buenavista", "Medicina Estetica", "Recepcion Buenavista", 14100.0, 3),
    ("Buenavista", "Servicios", "Recepcion Buenavista", 3200.0, 1),
    ("Masaryk", "Aparatologia", "Ana Gabriela", 4500.0, 1),
    ("Masaryk", "Cosmetologia", "Ana Gabriela", 4700.0, 1),
    ("Masaryk", "Farmacia", "Ana Gabriela", 114552.0, 89),
    ("Masaryk", "Inyectables", "Ana Gabriela", 2500.0, 1),
    ("Masaryk", "Laser", "Ana Gabriela", 3600.0, 1),
    ("Masaryk", "Medicina Estetica", "Ana Gabriela", 74000.0, 4),
    ("Masaryk", "Servicios", "Ana Gabriela", 2400.0, 1),
    ("Masaryk", "Aparatologia", "Paulina", 38200.0, 2),
    ("Masaryk", "Cosmetologia", "Paulina", 15000.0, 3),
    ("Masaryk", "Farmacia", "Paulina", 3420.0, 7),
    ("Masaryk", "Inyectables", "Paulina", 15100.0, 4),
    ("Masaryk", "Laser", "Paulina", 6900.0, 2),
    ("Masaryk", "Medicina Estetica", "Paulina", 21500.0, 2),
    ("Masaryk", "Servicios", "Paulina", 6500.0, 2),
    ("Masaryk", "Cosmetologia", "Recepción Masaryk", 6000.0, 1),
    ("Masaryk", "Farmacia", "Recepción Masaryk", 940.0, 1),
    ("Masaryk", "Laser", "Recepción Masaryk", 1500.0, 1),
    ("Masaryk", "Medicina Estetica", "Recepción Masaryk", 4100.0, 1),
    ("Masaryk", "Servicios", "Recepción Masaryk", 3000.0, 2),
    ("Masaryk", "Inyectables", "Recepción Masaryk", 12500.0, 3),
];

/// Dataset a fresh session starts from, and the target of a reset.
pub fn baseline_dataset() -> Dataset {
    let records = OCTOBER_2025
        .iter()
        .map(|(branch, category, seller, amount, quantity)| {
            SalesRecord::new(BASELINE_MONTH, *branch, *category, *seller, *amount, *quantity)
        })
        .collect();

    Dataset::from_records(records)
}
