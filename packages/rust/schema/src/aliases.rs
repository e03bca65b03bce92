//! Header alias tables and last-resort token sets, per semantic role.
//!
//! Alias order is significant: the first alias with an exact hit wins.

use crate::Role;

pub(crate) const TYPE_ALIASES: &[&str] = &[
    "Техника тури",
    "Техники тури",
    "Тип техники",
    "Тури техника",
    "Техника тўри",
    "Вид техники",
    "Наименование техники",
    "Texnika turi",
    "Equipment type",
];

pub(crate) const STATUS_ALIASES: &[&str] = &[
    "Холати",
    "Ҳолати",
    "Статус",
    "Состояние",
    "Ҳолат",
    "Holati",
    "Status",
    "Техника холати",
    "Техника ҳолати",
    "Техника статусы",
    "Техника состояние",
    "Texnika holati",
];

pub(crate) const DISTRICT_ALIASES: &[&str] = &[
    "Бириктирилган шахар ёки туман",
    "Город/район",
    "Район",
    "Туман",
    "Населенный пункт",
    "Шахар/туман",
    "Шахар ёки туман",
    "Shahar yoki tuman",
    "Tuman",
];

pub(crate) const QUANTITY_ALIASES: &[&str] = &["Количество", "Кол-во", "Сони", "Soni", "Qty", "Count"];

pub(crate) const TRACKER_ALIASES: &[&str] = &[
    "GPS",
    "Трекер",
    "Трекер установлен",
    "Наличие трекера",
    "Наличие GPS",
    "GPS трекер",
    "GPS-трекер",
    "GPS / ГЛОНАСС",
    "GPS/ГЛОНАСС",
    "GPS билан таъминланганлиги",
    "GPS билапн таъминланганлиги",
];

const STATUS_TOKENS: &[&str] = &["холат", "ҳолат", "holat", "status", "состояние"];
const DISTRICT_TOKENS: &[&str] = &["шахар", "туман", "район", "город", "shahar", "tuman"];
const TYPE_TOKENS: &[&str] = &["техника", "тип", "тур", "вид", "texnika"];

/// Ordered alias list for `role`.
pub(crate) fn aliases(role: Role) -> &'static [&'static str] {
    match role {
        Role::Type => TYPE_ALIASES,
        Role::Status => STATUS_ALIASES,
        Role::District => DISTRICT_ALIASES,
        Role::Quantity => QUANTITY_ALIASES,
        Role::Tracker => TRACKER_ALIASES,
    }
}

/// Heuristic tokens for `role`. Quantity and tracker have none: a guess
/// there would turn an unrelated column into numbers or flags.
pub(crate) fn tokens(role: Role) -> &'static [&'static str] {
    match role {
        Role::Type => TYPE_TOKENS,
        Role::Status => STATUS_TOKENS,
        Role::District => DISTRICT_TOKENS,
        Role::Quantity | Role::Tracker => &[],
    }
}
