//! Field validators and normalizers for intake data
//!
//! Messages are user-facing and returned to the chat flow verbatim.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;

use crate::model::{NewClient, SessionState};

const TAX_ID_WEIGHTS: [u32; 10] = [5, 4, 3, 2, 7, 6, 5, 4, 3, 2];
const MAX_QUANTITY: f64 = 1_000_000.0;
const EXPIRY_WINDOW: Months = Months::new(12 * 10);
const NOT_SPECIFIED: &str = "No especificado";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static TAX_ID_FORMAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-?\d{8}-?\d$").unwrap());
static PHONE_FORMAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\+?54)?[\s-]?\(?\d{2,4}\)?[\s-]?\d{3,4}[\s-]?\d{4}$").unwrap()
});
static SLASH_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").unwrap());
static DASH_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})-(\d{1,2})-(\d{4})").unwrap());
static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)hace\s+(\d+)\s+(días|día|semanas|semana)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("El CUIT debe tener 11 dígitos")]
    TaxIdLength,
    #[error("El CUIT tiene un dígito verificador inválido")]
    TaxIdCheckDigit,
    #[error("El teléfono debe tener entre 10 y 13 dígitos")]
    PhoneLength,
    #[error("Formato de teléfono inválido")]
    PhoneFormat,
    #[error("Formato de email inválido")]
    EmailFormat,
    #[error("El lote debe ser alfanumérico (letras y números sin espacios)")]
    LotNotAlphanumeric,
    #[error("El lote debe tener al menos 4 caracteres")]
    LotTooShort,
    #[error("La fecha de vencimiento parece incorrecta (muy antigua)")]
    ExpiryTooOld,
    #[error("La fecha de vencimiento parece incorrecta (muy lejana)")]
    ExpiryTooFar,
    #[error("La cantidad debe ser mayor a 0")]
    QuantityNotPositive,
    #[error("La cantidad debe ser un número entero")]
    QuantityNotInteger,
    #[error("La cantidad parece incorrecta (muy grande)")]
    QuantityTooLarge,
    #[error("El texto debe tener al menos {0} caracteres")]
    TooShort(usize),
    #[error("URL de adjunto inválida: {0}")]
    AttachmentUrl(String),
}

/// Result of validating a group of fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(error.into());
    }

    /// Multi-line message listing every error after `heading`
    pub fn message(&self, heading: &str) -> String {
        format!("{}\n{}", heading, self.errors.join("\n"))
    }
}

/// Validate an Argentine CUIT and return it as `XX-XXXXXXXX-X`
pub fn validate_tax_id(raw: &str) -> Result<String, FieldError> {
    let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 11 {
        return Err(FieldError::TaxIdLength);
    }

    let sum: u32 = digits
        .iter()
        .zip(TAX_ID_WEIGHTS)
        .map(|(d, w)| d * w)
        .sum();
    let expected = match sum % 11 {
        0 => 0,
        1 => 9,
        r => 11 - r,
    };
    if digits[10] != expected {
        return Err(FieldError::TaxIdCheckDigit);
    }

    let s: String = digits.iter().map(|d| char::from_digit(*d, 10).unwrap_or('0')).collect();
    Ok(format!("{}-{}-{}", &s[..2], &s[2..10], &s[10..]))
}

/// Validate an Argentine phone number and return it as `XX-XXXX-XXXX`
pub fn validate_phone(raw: &str) -> Result<String, FieldError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect();

    let len = cleaned.chars().count();
    if !(10..=13).contains(&len) {
        return Err(FieldError::PhoneLength);
    }

    let local = cleaned.strip_prefix("54").unwrap_or(&cleaned);
    let local = local.strip_prefix('0').unwrap_or(local);

    if local.len() != 10 || !local.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::PhoneFormat);
    }

    Ok(format!("{}-{}-{}", &local[..2], &local[2..6], &local[6..]))
}

pub fn validate_email(email: &str) -> Result<(), FieldError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(FieldError::EmailFormat)
    }
}

/// Lot numbers are ASCII letters and digits only, at least 4 long
pub fn validate_lot(lot: &str) -> Result<(), FieldError> {
    if lot.is_empty() || !lot.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(FieldError::LotNotAlphanumeric);
    }
    if lot.len() < 4 {
        return Err(FieldError::LotTooShort);
    }
    Ok(())
}

pub fn validate_expiry_date(date: NaiveDate) -> Result<(), FieldError> {
    validate_expiry_date_at(date, Utc::now().date_naive())
}

fn validate_expiry_date_at(date: NaiveDate, today: NaiveDate) -> Result<(), FieldError> {
    if today
        .checked_sub_months(EXPIRY_WINDOW)
        .is_some_and(|oldest| date < oldest)
    {
        return Err(FieldError::ExpiryTooOld);
    }
    if today
        .checked_add_months(EXPIRY_WINDOW)
        .is_some_and(|latest| date > latest)
    {
        return Err(FieldError::ExpiryTooFar);
    }
    Ok(())
}

pub fn validate_quantity(quantity: f64) -> Result<(), FieldError> {
    if quantity <= 0.0 {
        return Err(FieldError::QuantityNotPositive);
    }
    if quantity.fract() != 0.0 {
        return Err(FieldError::QuantityNotInteger);
    }
    if quantity > MAX_QUANTITY {
        return Err(FieldError::QuantityTooLarge);
    }
    Ok(())
}

/// Attachment links must be absolute http(s) URLs
pub fn validate_attachment_url(raw: &str) -> Result<String, FieldError> {
    match url::Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url.to_string()),
        _ => Err(FieldError::AttachmentUrl(raw.to_string())),
    }
}

pub fn validate_min_length(text: &str, min: usize) -> Result<(), FieldError> {
    if text.trim().chars().count() < min {
        Err(FieldError::TooShort(min))
    } else {
        Ok(())
    }
}

/// Trim and collapse whitespace runs into a single space
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip angle brackets and surrounding whitespace
pub fn sanitize(text: &str) -> String {
    text.replace(['<', '>'], "").trim().to_string()
}

/// Parse a date as typed by a customer
///
/// Accepts RFC 3339, `YYYY-MM-DD`, `DD/MM/YYYY`, `DD-MM-YYYY` and the
/// relative forms "hace N días/semanas", "ayer" and "hoy".
pub fn parse_flexible_date(text: &str) -> Option<DateTime<Utc>> {
    parse_flexible_date_at(text, Utc::now())
}

fn parse_flexible_date_at(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(start_of_day(date));
    }

    for re in [&*SLASH_DATE_RE, &*DASH_DATE_RE] {
        if let Some(caps) = re.captures(text) {
            let day: u32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let year: i32 = caps[3].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day).map(start_of_day);
        }
    }

    if let Some(caps) = RELATIVE_DATE_RE.captures(text) {
        let amount: i64 = caps[1].parse().ok()?;
        let days = if caps[2].to_lowercase().starts_with("semana") {
            amount * 7
        } else {
            amount
        };
        return now.checked_sub_signed(Duration::try_days(days)?);
    }

    let lower = text.to_lowercase();
    if lower.contains("ayer") {
        return Some(now - Duration::days(1));
    }
    if lower.contains("hoy") {
        return Some(now);
    }

    None
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// First run of digits in `text`
pub fn extract_number(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Client fields collected by the flow, before normalization
pub fn validate_client_data(state: &SessionState) -> ValidationReport {
    let mut report = ValidationReport::valid();

    if present(state.client_name.as_deref()).is_none_or(|n| n.trim().chars().count() < 3) {
        report.add_error("Nombre y apellido requerido (mínimo 3 caracteres)");
    }

    if present(state.client_business_name.as_deref()).is_none_or(|n| n.trim().chars().count() < 2) {
        report.add_error("Razón social requerida");
    }

    match present(state.client_tax_id.as_deref()) {
        None => report.add_error("CUIT requerido"),
        Some(tax_id) => {
            if let Err(e) = validate_tax_id(tax_id) {
                report.add_error(e.to_string());
            }
        }
    }

    match present(state.client_phone.as_deref()) {
        None => report.add_error("Teléfono requerido"),
        Some(phone) => {
            if let Err(e) = validate_phone(phone) {
                report.add_error(e.to_string());
            }
        }
    }

    if let Some(email) = present(state.client_email.as_deref()) {
        if let Err(e) = validate_email(email) {
            report.add_error(e.to_string());
        }
    }

    report
}

/// Product fields collected by the flow
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductFields<'a> {
    pub name: Option<&'a str>,
    pub lot: Option<&'a str>,
    pub expiry: Option<NaiveDate>,
    pub quantity: Option<f64>,
}

pub fn validate_product_data(product: &ProductFields<'_>) -> ValidationReport {
    let mut report = ValidationReport::valid();

    if present(product.name).is_none_or(|n| n.trim().chars().count() < 2) {
        report.add_error("Nombre del producto requerido");
    }

    match present(product.lot) {
        None => report.add_error("Número de lote requerido"),
        Some(lot) => {
            if let Err(e) = validate_lot(lot) {
                report.add_error(e.to_string());
            }
        }
    }

    match product.expiry {
        None => report.add_error("Fecha de vencimiento requerida"),
        Some(date) => {
            if let Err(e) = validate_expiry_date(date) {
                report.add_error(e.to_string());
            }
        }
    }

    match product.quantity.filter(|q| *q != 0.0) {
        None => report.add_error("Cantidad afectada requerida"),
        Some(quantity) => {
            if let Err(e) = validate_quantity(quantity) {
                report.add_error(e.to_string());
            }
        }
    }

    report
}

/// Record-level checks run on a normalized client before it is stored
pub fn validate_new_client(client: &NewClient) -> ValidationReport {
    let mut report = ValidationReport::valid();

    if validate_min_length(&client.full_name, 3).is_err() {
        report.add_error("Nombre debe tener al menos 3 caracteres");
    }
    if validate_min_length(&client.business_name, 2).is_err() {
        report.add_error("Razón social requerida");
    }
    if !TAX_ID_FORMAT_RE.is_match(&client.tax_id) {
        report.add_error("CUIT inválido. Formato: XX-XXXXXXXX-X");
    }
    if validate_min_length(&client.street, 3).is_err() {
        report.add_error("Dirección requerida");
    }
    if validate_min_length(&client.locality, 2).is_err() {
        report.add_error("Localidad requerida");
    }
    if validate_min_length(&client.province, 2).is_err() {
        report.add_error("Provincia requerida");
    }
    if !PHONE_FORMAT_RE.is_match(&client.phone) {
        report.add_error("Teléfono inválido");
    }
    if let Some(email) = &client.email {
        if validate_email(email).is_err() {
            report.add_error("Email inválido");
        }
    }

    report
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub street: String,
    pub number: String,
    pub locality: String,
    pub province: String,
}

/// Split a free-form "street, number, ..., locality, province" address
pub fn parse_address(raw: &str) -> ParsedAddress {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let part = |i: Option<usize>| -> Option<String> {
        i.and_then(|i| parts.get(i))
            .filter(|p| !p.is_empty())
            .map(|p| p.to_string())
    };
    let len = parts.len();

    ParsedAddress {
        street: part(Some(0)).unwrap_or_else(|| raw.trim().to_string()),
        number: part(Some(1)).unwrap_or_default(),
        locality: part(len.checked_sub(2)).unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        province: part(len.checked_sub(1)).unwrap_or_else(|| NOT_SPECIFIED.to_string()),
    }
}
