//! Text canonicalization for Vietnamese medical vocabulary.
//!
//! Every free-text field passes through `standardize` (NFC, lower-case, trim).
//! Symptom names additionally go through an ordered table of variant spellings
//! (accented, unaccented, cased, underscored) that map onto one canonical phrase.
//!
//! Matching is prefix-anchored and the first matching spelling wins, so table
//! order is significant: "hoi mieng" is claimed by the earlier `ho` spellings.
//! A spelling listed under several phrases resolves to the last of them.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Raw variant table: (spellings, canonical phrase). Order matters.
const VARIANT_SOURCE: &[(&[&str], &str)] = &[
    (&["dau mat", "đau mắt", "mat dau", "Dau mat", "Dau Mat", "Đau Mắt", "Đau mắt"], "đau mắt"),
    (&["mat do", "mắt đỏ", "do mat", "Mat do", "Mat Do", "Mắt Đỏ", "Mắt đỏ"], "mắt đỏ"),
    (&["sung tay", "sưng tấy", "mat sung", "Sung tay", "Sưng tấy", "Mat sung"], "sưng tấy"),
    (&["mat sung", "mắt sưng", "sưng mắt", "Mat sung", "Mat Sưng", "Mắt Sưng", "Mắt sưng"], "mắt sưng"),
    (
        &[
            "giam thi luc", "giảm thị lực", "mat yeu", "mắt yếu", "mat kem", "mắt kém",
            "Giam thi luc", "Giảm Thị Lực", "Mắt Yếu", "Mắt Kém",
        ],
        "giảm thị lực",
    ),
    (&["ngua mat", "ngứa mắt", "cam giac kho chiu o mat", "Ngua mat", "Ngứa Mắt", "Ngứa mắt"], "ngứa mắt"),
    (&["chay nuoc mat", "chảy nước mắt", "Chay nuoc mat", "Chảy Nước Mắt", "Chảy nước mắt"], "chảy nước mắt"),
    (&["noi mun mat", "mụn mắt", "vet loi trong mat", "Noi mun mat", "Nổi Mụn Mắt", "Nổi mụn mắt"], "nổi mụn mắt"),
    (&["cam giac lo lang", "lo lắng", "cam giac so hai vo co", "Cam giac lo lang", "Lo Lắng", "Lo lắng"], "lo lắng"),
    (&["mat ngu", "mất ngủ", "mất_ngủ", "ngu khong yen giac", "Mat ngu", "Mất Ngủ", "Mất ngủ"], "mất ngủ"),
    (&["dau nguc", "đau ngực", "đau_ngực", "khong ro nguyen nhan", "Dau nguc", "Đau Ngực", "Đau ngực"], "đau ngực"),
    (
        &[
            "danh trong nguc", "đánh trống ngực", "nhip tim bat thuong", "Danh trong nguc",
            "Đánh Trống Ngực", "Đánh trống ngực",
        ],
        "đánh trống ngực",
    ),
    (&["tram cam", "trầm cảm", "cam giac buon ba", "Tram cam", "Trầm Cảm", "Trầm cảm"], "trầm cảm"),
    (&["kho tho", "khó thở", "khó_thở", "tho gap", "Kho tho", "Khó Thở", "Khó thở"], "khó thở"),
    (&["so hai vo co", "sợ hãi", "am anh", "So hai vo co", "Sợ Hãi", "Sợ hãi"], "sợ hãi"),
    (&["dau bung", "đau bụng", "đau_bụng", "quặn thắt", "Dau bung", "Đau Bụng", "Đau bụng"], "đau bụng"),
    (&["tao bon", "táo bón", "thay doi hinh dang phan", "Tao bon", "Táo Bón", "Táo bón"], "táo bón"),
    (&["noi mun", "nổi mụn", "sưng đỏ", "Noi mun", "Nổi Mụn", "Nổi mụn"], "nổi mụn"),
    (
        &[
            "dau dau", "đau đầu", "dau_dau", "đau_đầu", "nhuc dau", "nhức đầu", "Dau dau",
            "Đau Đầu", "Đau đầu",
        ],
        "đau đầu",
    ),
    (&["hon me", "hôn mê", "mat y thuc", "Hon me", "Hôn Mê", "Hôn mê"], "hôn mê"),
    (&["ho", "ho khan", "Ho", "Ho Khan", "Ho khan"], "ho"),
    (
        &[
            "nhip tim tang", "nhịp tim tăng", "nhip tim khong deu", "Nhip tim tang",
            "Nhịp Tim Tăng", "Nhịp tim tăng",
        ],
        "nhịp tim bất thường",
    ),
    (&["hoi mieng", "hôi miệng", "Hoi mieng", "Hôi Miệng", "Hôi miệng"], "hôi miệng"),
    (&["suong ham", "sưng hàm", "kho nhai", "Suong ham", "Sưng Hàm", "Sưng hàm"], "sưng hàm"),
    (
        &[
            "dau ham", "đau hàm", "cang co ham", "Dau ham", "Đau Hàm", "Đau hàm", "căng cơ hàm",
            "Căng cơ hàm",
        ],
        "đau hàm",
    ),
    (&["sung moi", "sưng môi", "Sung moi", "Sưng Môi", "Sưng môi"], "sưng môi"),
    (&["kho noi", "khó nói", "khan giong", "Kho noi", "Khó Nói", "Khó nói"], "khàn giọng"),
    (&["co ngan", "cổ ngắn", "xuat hien nep gap", "Co ngan", "Cổ Ngắn", "Cổ ngắn"], "cổ ngắn"),
    (
        &[
            "tac tinh hoan", "tắc tinh hoàn", "dau tinh hoan", "Tac tinh hoan", "Tắc Tinh Hoàn",
            "Tắc tinh hoàn",
        ],
        "tắc tinh hoàn",
    ),
    (&["ngua am dao", "ngứa âm đạo", "kho am dao", "Ngua am dao", "Ngứa Âm Đạo", "Ngứa âm đạo"], "ngứa âm đạo"),
    (&["loet mieng", "loét miệng", "to chuc hong", "Loet mieng", "Loét Miệng", "Loét miệng"], "loét miệng"),
];

/// One spelling and the canonical phrase it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPattern {
    /// Base-normalized spelling.
    pub pattern: String,
    pub canonical: String,
}

/// Flattened table in match order. A spelling listed more than once keeps the
/// position of its first listing and the canonical phrase of its last.
static VARIANT_PATTERNS: LazyLock<Vec<VariantPattern>> = LazyLock::new(|| {
    let mut table: IndexMap<String, String> = IndexMap::new();
    for (patterns, canonical) in VARIANT_SOURCE {
        let canonical = standardize(canonical);
        for pattern in patterns.iter() {
            table.insert(standardize(pattern), canonical.clone());
        }
    }
    table
        .into_iter()
        .map(|(pattern, canonical)| VariantPattern { pattern, canonical })
        .collect()
});

static MEASUREMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(mg|ml|g|kg)").expect("valid measurement regex"));
static PER_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*lan/ngay").expect("valid frequency regex"));
static PER_WEEK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*lan/tuan").expect("valid frequency regex"));
static AFTER_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.,])\s*(\w)").expect("valid separator regex"));

/// The shared variant table, in match order.
pub fn variant_patterns() -> &'static [VariantPattern] {
    &VARIANT_PATTERNS
}

/// Base normalization: NFC, lower-case, trim.
pub fn standardize(text: &str) -> String {
    let composed: String = text.nfc().collect();
    composed.to_lowercase().trim().to_string()
}

/// Map a symptom spelling to its canonical phrase.
/// Unknown spellings come back base-normalized but otherwise unchanged.
pub fn standardize_symptom(text: &str) -> String {
    let normalized = standardize(text);
    match variant_patterns()
        .iter()
        .find(|v| normalized.starts_with(v.pattern.as_str()))
    {
        Some(variant) => variant.canonical.clone(),
        None => normalized,
    }
}

/// Canonicalize a symptom list and drop duplicates. The result is sorted.
pub fn standardize_symptoms<S: AsRef<str>>(symptoms: &[S]) -> Vec<String> {
    symptoms
        .iter()
        .map(|s| standardize_symptom(s.as_ref()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Normalize, then capitalize every whitespace-separated word.
pub fn standardize_name(name: &str) -> String {
    standardize(name)
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize, space out separators, then capitalize each comma-separated part.
pub fn standardize_address(address: &str) -> String {
    let normalized = standardize(address);
    let spaced = AFTER_SEPARATOR.replace_all(&normalized, |caps: &regex::Captures| {
        format!("{} {}", &caps[1], caps[2].to_uppercase())
    });

    spaced
        .split(',')
        .map(|part| capitalize(part.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Normalize free medical text: glue quantities to units and spell out
/// unaccented frequency shorthands.
pub fn standardize_medical_text(text: &str) -> String {
    let normalized = standardize(text);
    let glued = MEASUREMENT.replace_all(&normalized, "${1}${2}");
    let daily = PER_DAY.replace_all(&glued, "${1} lần/ngày");
    PER_WEEK.replace_all(&daily, "${1} lần/tuần").into_owned()
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
