use chrono::{DateTime, NaiveDate, Utc};

/// `R$ 1.234,56`. Negative amounts keep the sign in front of the symbol.
pub fn money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let reais = (cents / 100).to_string();
    let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
    for (i, ch) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{sign}R$ {grouped},{:02}", cents % 100)
}

pub fn date(d: NaiveDate) -> String {
    d.format("%d/%m/%Y").to_string()
}

pub fn date_time(dt: DateTime<Utc>) -> String {
    dt.format("%d/%m/%Y %H:%M").to_string()
}

pub fn optional(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

pub fn active(flag: bool) -> String {
    let label = if flag { "Active" } else { "Inactive" };
    label.to_string()
}
