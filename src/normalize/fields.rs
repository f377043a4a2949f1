//! Per-field cleaning rules
//!
//! Every function here is pure: it takes the raw value, returns the cleaned
//! value and pushes warnings into the caller's list. None of them reject.

use super::field;
use super::tables::{country_alias, supplier_type_alias};
use crate::record::{SupplierScale, SupplierType, ValidationWarning};
use phonenumber::Mode;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use url::Url;

pub(crate) const MIN_NAME_CHARS: usize = 3;
pub(crate) const MAX_NAME_CHARS: usize = 200;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[a-z0-9]([a-z0-9-]*[a-z0-9])?(\.[a-z0-9]([a-z0-9-]*[a-z0-9])?)+$",
        )
        .expect("email pattern is valid")
    })
}

fn phone_noise() -> &'static Regex {
    static NOISE: OnceLock<Regex> = OnceLock::new();
    NOISE.get_or_init(|| Regex::new(r"[^0-9+\-() ]").expect("phone pattern is valid"))
}

/// Trim and collapse internal whitespace. Empty input is `None`.
pub(crate) fn clean_text(value: Option<&str>) -> Option<String> {
    let collapsed = value?.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

pub(crate) fn clean_company_name(
    value: Option<&str>,
    warnings: &mut Vec<ValidationWarning>,
) -> String {
    let Some(name) = clean_text(value) else {
        warnings.push(ValidationWarning::new(field::COMPANY_NAME, "company name is empty"));
        return String::new();
    };

    let len = name.chars().count();
    if len < MIN_NAME_CHARS {
        warnings.push(ValidationWarning::new(field::COMPANY_NAME, "company name is too short"));
        name
    } else if len > MAX_NAME_CHARS {
        warnings.push(ValidationWarning::new(
            field::COMPANY_NAME,
            format!("company name is too long, truncated to {} characters", MAX_NAME_CHARS),
        ));
        name.chars().take(MAX_NAME_CHARS).collect()
    } else {
        name
    }
}

pub(crate) fn clean_email(
    value: Option<&str>,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<String> {
    let email = value?.trim().to_lowercase();
    if email.is_empty() {
        return None;
    }
    if email_pattern().is_match(&email) {
        Some(email)
    } else {
        warnings.push(ValidationWarning::new(
            field::EMAIL,
            format!("invalid email address: {}", email),
        ));
        None
    }
}

pub(crate) fn clean_phone(
    value: Option<&str>,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<String> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }

    let stripped = phone_noise().replace_all(raw, "");
    let stripped = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if stripped.is_empty() {
        warnings.push(ValidationWarning::new(
            field::PHONE,
            format!("phone number has no digits: {}", raw),
        ));
        return None;
    }

    match phonenumber::parse(None, &stripped) {
        Ok(number) if phonenumber::is_valid(&number) => {
            Some(number.format().mode(Mode::International).to_string())
        }
        Ok(_) => {
            warnings.push(ValidationWarning::new(field::PHONE, "phone number may be invalid"));
            Some(stripped)
        }
        Err(_) => {
            warnings.push(ValidationWarning::new(field::PHONE, "could not parse phone number"));
            Some(stripped)
        }
    }
}

pub(crate) fn clean_website(
    value: Option<&str>,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<String> {
    let site = value?.trim();
    if site.is_empty() {
        return None;
    }

    let lower = site.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        site.to_string()
    } else {
        format!("https://{}", site)
    };

    match Url::parse(&candidate) {
        Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => Some(candidate),
        _ => {
            warnings.push(ValidationWarning::new(
                field::WEBSITE,
                format!("invalid website address: {}", site),
            ));
            None
        }
    }
}

pub(crate) fn clean_country(value: Option<&str>, warnings: &mut Vec<ValidationWarning>) -> String {
    let Some(country) = clean_text(value) else {
        warnings.push(ValidationWarning::new(field::COUNTRY, "country information missing"));
        return String::new();
    };

    match country_alias(&country.to_lowercase()) {
        Some(canonical) => canonical.to_string(),
        None => {
            warnings.push(ValidationWarning::new(
                field::COUNTRY,
                format!("unrecognized country: {}", country),
            ));
            country
        }
    }
}

/// Missing input defaults to manufacturer quietly; only input we cannot
/// map is reported.
pub(crate) fn clean_supplier_type(
    value: Option<&str>,
    warnings: &mut Vec<ValidationWarning>,
) -> SupplierType {
    let Some(kind) = clean_text(value) else {
        return SupplierType::Manufacturer;
    };

    match supplier_type_alias(&kind.to_lowercase()) {
        Some(supplier_type) => supplier_type,
        None => {
            warnings.push(ValidationWarning::new(
                field::SUPPLIER_TYPE,
                format!("unrecognized supplier type: {}, defaulting to manufacturer", kind),
            ));
            SupplierType::Manufacturer
        }
    }
}

/// Read a number from a JSON number or a numeric string ("1,200", " 35.5 ").
fn lenient_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Non-positive counts are treated as absent; sources use 0 as "unknown".
pub(crate) fn clean_employee_count(
    value: Option<&Value>,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<u32> {
    let value = value?;
    if is_blank(value) {
        return None;
    }
    match lenient_number(value) {
        Some(n) if n >= 1.0 => Some(n.min(u32::MAX as f64) as u32),
        Some(_) => None,
        None => {
            warnings.push(ValidationWarning::new(
                field::EMPLOYEE_COUNT,
                format!("employee count is not a number: {}", value),
            ));
            None
        }
    }
}

pub(crate) fn clean_annual_revenue(
    value: Option<&Value>,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<f64> {
    let value = value?;
    if is_blank(value) {
        return None;
    }
    match lenient_number(value) {
        Some(n) if n > 0.0 => Some(n),
        Some(_) => None,
        None => {
            warnings.push(ValidationWarning::new(
                field::ANNUAL_REVENUE,
                format!("annual revenue is not a number: {}", value),
            ));
            None
        }
    }
}

/// Accept years from 1900 up to the year the record was collected.
pub(crate) fn clean_established_year(
    value: Option<&Value>,
    latest: i32,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<i32> {
    let value = value?;
    if is_blank(value) {
        return None;
    }
    let year = lenient_number(value).map(|n| n.trunc() as i64);
    match year {
        Some(y) if (1900..=latest as i64).contains(&y) => Some(y as i32),
        _ => {
            warnings.push(ValidationWarning::new(
                field::ESTABLISHED_YEAR,
                format!("established year out of range: {}", value),
            ));
            None
        }
    }
}

/// Employee count first, revenue second, medium when neither is known.
pub(crate) fn determine_scale(
    employee_count: Option<u32>,
    annual_revenue: Option<f64>,
    warnings: &mut Vec<ValidationWarning>,
) -> SupplierScale {
    if let Some(count) = employee_count {
        return match count {
            c if c >= 1000 => SupplierScale::Large,
            c if c >= 100 => SupplierScale::Medium,
            c if c >= 50 => SupplierScale::Small,
            _ => SupplierScale::Startup,
        };
    }

    if let Some(revenue) = annual_revenue {
        return match revenue {
            r if r >= 10_000.0 => SupplierScale::Large,
            r if r >= 1_000.0 => SupplierScale::Medium,
            r if r >= 100.0 => SupplierScale::Small,
            _ => SupplierScale::Startup,
        };
    }

    warnings.push(ValidationWarning::new(
        field::SCALE,
        "cannot determine company scale, defaulting to medium",
    ));
    SupplierScale::Medium
}

pub(crate) fn clean_products(
    value: Option<&Value>,
    warnings: &mut Vec<ValidationWarning>,
) -> Vec<String> {
    let value = match value {
        Some(v) if !is_blank(v) && !is_empty_list(v) => v,
        _ => {
            warnings.push(ValidationWarning::new(field::PRODUCTS, "product information missing"));
            return Vec::new();
        }
    };

    let entries: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
            _ => split_list(s),
        },
        other => scalar_text(other).into_iter().collect(),
    };

    let products: Vec<String> = entries
        .iter()
        .filter_map(|entry| clean_text(Some(entry.as_str())))
        .filter(|entry| entry.chars().count() > 1)
        .collect();

    if products.is_empty() {
        warnings.push(ValidationWarning::new(field::PRODUCTS, "no valid products"));
    }
    products
}

fn split_list(s: &str) -> Vec<String> {
    s.split([',', '，', '、', ';', '；'])
        .map(str::to_string)
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn is_empty_list(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.is_empty())
}
