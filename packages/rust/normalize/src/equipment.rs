//! Equipment/vehicle type classification and the vehicle-vs-equipment split.

use crate::text::{capitalize, has_phrase, prenormalize};

/// Ordered `(substring key, canonical label)` table. First hit wins, so
/// specific names must precede the generic names they contain
/// (`микроавтобус` before `автобус`, `прицеп` before `трактор`).
pub static TYPE_LEXICON: &[(&str, &str)] = &[
    ("погрузчик", "Погрузчик"),
    ("pogruzchik", "Погрузчик"),
    ("юклагич", "Погрузчик"),
    ("yuklagich", "Погрузчик"),
    ("прицеп", "Прицеп"),
    ("pritsep", "Прицеп"),
    ("prizep", "Прицеп"),
    ("pricep", "Прицеп"),
    ("тиркама", "Прицеп"),
    ("tirkama", "Прицеп"),
    ("мини бортовой", "Мини бортовой"),
    ("минии бортовой", "Мини бортовой"),
    ("микро бортовой", "Мини бортовой"),
    ("mini bortovoy", "Мини бортовой"),
    ("эвакуатор", "Эвакуатор"),
    ("evakuator", "Эвакуатор"),
    ("хлоровоз", "Хлоровоз"),
    ("xlorovoz", "Хлоровоз"),
    ("самосвал", "Самосвал"),
    ("samosval", "Самосвал"),
    ("экскаватор", "Экскаватор"),
    ("ekskavator", "Экскаватор"),
    ("ekskovator", "Экскаватор"),
    ("трактор", "Трактор"),
    ("traktor", "Трактор"),
    ("бульдозер", "Бульдозер"),
    ("buldozer", "Бульдозер"),
    ("автокран", "Автокран"),
    ("avtokran", "Автокран"),
    ("бетономешалка", "Бетономешалка"),
    ("betonomeshalka", "Бетономешалка"),
    ("цистерна", "Цистерна"),
    ("sisterna", "Цистерна"),
    ("tsisterna", "Цистерна"),
    ("фургон", "Фургон"),
    ("furgon", "Фургон"),
    ("рефрижератор", "Рефрижератор"),
    ("refrijerator", "Рефрижератор"),
    ("гидролинамическая", "Гидродинамическая"),
    ("гидролинамический", "Гидродинамическая"),
    ("гидродинамическая", "Гидродинамическая"),
    ("гидродинамический", "Гидродинамическая"),
    ("гидравлическая", "Гидродинамическая"),
    ("gidrodinamik", "Гидродинамическая"),
    ("лаболаторная", "Лабораторная"),
    ("лобораторная", "Лабораторная"),
    ("лабораторная", "Лабораторная"),
    ("laboratoriya", "Лабораторная"),
    ("камаз", "Камаз"),
    ("kamaz", "Камаз"),
    ("зил", "ЗИЛ"),
    ("газель", "ГАЗель"),
    ("gazel", "ГАЗель"),
    ("уаз", "УАЗ"),
    ("компрессор", "Компрессор"),
    ("kompressor", "Компрессор"),
    ("генератор", "Генератор"),
    ("generator", "Генератор"),
    ("микроавтобус", "Микроавтобус"),
    ("mikroavtobus", "Микроавтобус"),
    ("автобус", "Автобус"),
    ("avtobus", "Автобус"),
    ("машина", "Машина"),
    ("mashina", "Машина"),
    ("грузовик", "Грузовик"),
    ("gruzovik", "Грузовик"),
];

/// Words marking total/summary rows rather than real units.
pub static SUMMARY_MARKERS: &[&str] = &[
    "жами", "итого", "барчаси", "всего", "jami", "hammasi", "all", "total", "sum",
];

/// Placeholder texts spreadsheets emit for empty cells.
const NULL_LIKE: &[&str] = &["nan", "none", "null"];

/// Substring keywords (pre-normalized) that mark a type as support equipment
/// rather than a self-propelled vehicle.
pub static EQUIPMENT_KEYWORDS: &[&str] = &[
    "прицеп",
    "сак",
    "цистерн",
    "насос",
    "компрессор",
    "генератор",
    "агрегат",
    "мотопомп",
    "насосная",
    "насос станц",
    "pritsep",
    "prizep",
    "tirkama",
    "sistern",
    "nasos",
    "kompressor",
    "generator",
    "agregat",
    "motopomp",
];

/// Classify free-text equipment type.
///
/// Returns `None` for blank cells and summary rows (the row is dropped
/// upstream). Unknown names come back capitalized rather than dropped.
pub fn classify_type(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = prenormalize(trimmed);
    if normalized.is_empty() || NULL_LIKE.contains(&normalized.as_str()) {
        return None;
    }

    if SUMMARY_MARKERS.iter().any(|m| has_phrase(&normalized, m)) {
        return None;
    }

    if let Some((_, label)) = TYPE_LEXICON
        .iter()
        .find(|(key, _)| normalized.contains(key))
    {
        return Some((*label).to_string());
    }

    Some(capitalize(trimmed))
}

/// True if the canonical type label belongs to the equipment category.
pub fn is_equipment(type_label: &str) -> bool {
    let normalized = prenormalize(type_label);
    EQUIPMENT_KEYWORDS.iter().any(|k| normalized.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_map_to_labels() {
        assert_eq!(classify_type("Экскаватор JCB").as_deref(), Some("Экскаватор"));
        assert_eq!(classify_type("ekskavator").as_deref(), Some("Экскаватор"));
        assert_eq!(classify_type("КАМАЗ-65115").as_deref(), Some("Камаз"));
        assert_eq!(classify_type("Лоборатория / лобораторная").as_deref(), Some("Лабораторная"));
    }

    #[test]
    fn specific_names_win_over_generic_ones() {
        assert_eq!(classify_type("Микроавтобус Дамас").as_deref(), Some("Микроавтобус"));
        assert_eq!(classify_type("Автобус ISUZU").as_deref(), Some("Автобус"));
        assert_eq!(classify_type("Тракторный прицеп").as_deref(), Some("Прицеп"));
    }

    #[test]
    fn summary_and_blank_rows_have_no_type() {
        assert_eq!(classify_type(""), None);
        assert_eq!(classify_type("   "), None);
        assert_eq!(classify_type("NaN"), None);
        assert_eq!(classify_type("Жами:"), None);
        assert_eq!(classify_type("Итого по району"), None);
        assert_eq!(classify_type("Jami"), None);
    }

    #[test]
    fn summary_markers_need_whole_words() {
        // "all" inside a word is not a total row.
        assert_eq!(classify_type("Metallolom tashuvchi").as_deref(), Some("Metallolom tashuvchi"));
    }

    #[test]
    fn unknown_names_fall_back_to_capitalized_text() {
        assert_eq!(classify_type("  АВТОГРЕЙДЕР ").as_deref(), Some("Автогрейдер"));
        assert_eq!(classify_type("motor grader").as_deref(), Some("Motor grader"));
    }

    #[test]
    fn lexicon_labels_are_stable() {
        // Every canonical label classifies to itself.
        for (_, label) in TYPE_LEXICON {
            assert_eq!(classify_type(label).as_deref(), Some(*label), "label {label}");
        }
    }

    #[test]
    fn equipment_split() {
        assert!(is_equipment("Прицеп"));
        assert!(is_equipment("Цистерна"));
        assert!(is_equipment("Компрессор"));
        assert!(is_equipment("Насосная станция"));
        assert!(is_equipment("САК"));
        assert!(!is_equipment("Экскаватор"));
        assert!(!is_equipment("Камаз"));
        assert!(!is_equipment("Автобус"));
    }
}
