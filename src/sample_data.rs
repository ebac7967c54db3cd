//! Built-in demonstration export: part of a heat network's building
//! hierarchy, with two substations that already exist in the target model and
//! three plant codes.

use crate::hierarchy::Record;

const NETWORK: &str = r"Иркутские тепловые сети\ Здания и сооружения\ Здания и сооружения";

const SAMPLE_ROWS: &[(&str, &str, &str)] = &[
    (r"Иркутские тепловые сети\", "", ""),
    (r"Иркутские тепловые сети\ Здания и сооружения", "", ""),
    ("", "", ""),
    (r"\ Здания, сооружения ЦОЭО", "", ""),
    (r"\ Здания, сооружения ЦОЭО\ Здания, сооружения для трансформаторов", "", ""),
    (
        r"\ Здания, сооружения ЦОЭО\ Здания, сооружения для трансформаторов\ ЗДАНИЯ И СООРУЖЕНИЯ",
        "",
        "",
    ),
    (
        r#"\ Здания, сооружения ЦОЭО\ Здания, сооружения для трансформаторов\ ЗДАНИЯ И СООРУЖЕНИЯ\ Подстанция трансформаторная РК "Свердловская""#,
        "12CC9FCB-D36D-504F-BE1C-87FF16A651DA",
        "ККС-001",
    ),
    (r"\ Здания, сооружения ЦОЭО\ Здания, сооружения ОРУ", "", ""),
    (r"\ Здания, сооружения ЦОЭО\ Здания, сооружения ОРУ\ ЗДАНИЯ И СООРУЖЕНИЯ", "", ""),
    (r"\ Здания, сооружения ЦОЭО\ Здания, сооружения ОРУ\ ЗДАНИЯ И СООРУЖЕНИЯ\ ОРУ", "", ""),
    (
        r#"\ Здания, сооружения ЦОЭО\ Здания, сооружения ОРУ\ ЗДАНИЯ И СООРУЖЕНИЯ\ ОРУ\ ОРУ "Топка""#,
        "9C347BC4-B366-5446-90D8-4E061FA257CA",
        "ККС-002",
    ),
    (r"\ Здания, сооружения для традиционной выработки тепла", "", "ККС-003"),
];

/// Rows of the demonstration export.  Rows below the network level are
/// written relative to it; an empty relative path stands for the network
/// node itself.
pub fn sample_records() -> Vec<Record> {
    SAMPLE_ROWS
        .iter()
        .map(|(path, uid, code)| {
            let full = if path.starts_with('\\') || path.is_empty() {
                format!("{}{}", NETWORK, path)
            } else {
                path.to_string()
            };
            Record::new(&full, Some(*uid), Some(*code))
        })
        .collect()
}
