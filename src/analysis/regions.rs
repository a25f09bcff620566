//! Map coordinates for seller regions.
//!
//! Markers are placed at the state capital of each Brazilian federative unit.

/// Country-level map centre, used to frame the region map.
pub const MAP_CENTER: (f64, f64) = (-14.2350, -51.9253);

/// `(code, capital, latitude, longitude)` for every federative unit.
const STATE_CAPITALS: &[(&str, &str, f64, f64)] = &[
    ("AC", "Rio Branco", -9.9747, -67.8076),
    ("AL", "Maceió", -9.6658, -35.7353),
    ("AM", "Manaus", -3.1190, -60.0217),
    ("AP", "Macapá", 0.0349, -51.0694),
    ("BA", "Salvador", -12.9714, -38.5014),
    ("CE", "Fortaleza", -3.7319, -38.5267),
    ("DF", "Brasília", -15.7939, -47.8828),
    ("ES", "Vitória", -20.3155, -40.3128),
    ("GO", "Goiânia", -16.6869, -49.2648),
    ("MA", "São Luís", -2.5307, -44.3068),
    ("MG", "Belo Horizonte", -19.9167, -43.9345),
    ("MS", "Campo Grande", -20.4697, -54.6201),
    ("MT", "Cuiabá", -15.6014, -56.0979),
    ("PA", "Belém", -1.4558, -48.4902),
    ("PB", "João Pessoa", -7.1195, -34.8450),
    ("PE", "Recife", -8.0476, -34.8770),
    ("PI", "Teresina", -5.0920, -42.8038),
    ("PR", "Curitiba", -25.4284, -49.2733),
    ("RJ", "Rio de Janeiro", -22.9068, -43.1729),
    ("RN", "Natal", -5.7945, -35.2110),
    ("RO", "Porto Velho", -8.7612, -63.9004),
    ("RR", "Boa Vista", 2.8235, -60.6758),
    ("RS", "Porto Alegre", -30.0346, -51.2177),
    ("SC", "Florianópolis", -27.5954, -48.5480),
    ("SE", "Aracaju", -10.9472, -37.0731),
    ("SP", "São Paulo", -23.5505, -46.6333),
    ("TO", "Palmas", -10.1840, -48.3336),
];

/// A resolved map location for a region code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionLocation {
    pub code: &'static str,
    pub capital: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

/// Look up a region by its two-letter code (case-insensitive).
pub fn locate(code: &str) -> Option<RegionLocation> {
    let code = code.trim();
    STATE_CAPITALS
        .iter()
        .find(|(c, ..)| c.eq_ignore_ascii_case(code))
        .map(|&(code, capital, latitude, longitude)| RegionLocation {
            code,
            capital,
            latitude,
            longitude,
        })
}
