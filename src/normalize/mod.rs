//! Field-level normalization of raw supplier records
//!
//! `Normalizer::clean` maps one raw record to one canonical record. It is a
//! pure function of its input: no I/O, no clock, no randomness, so the same
//! raw record always yields the same canonical record and warnings.
//!
//! The normalizer never rejects. An empty company name comes back as an
//! empty string plus a warning, and the caller decides to drop the record.

mod fields;
mod tables;

use crate::record::{CanonicalSupplierRecord, CertificationLevel, RawRecord};
use chrono::Datelike;

/// Field names used in validation warnings.
pub mod field {
    pub const COMPANY_NAME: &str = "company_name";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const WEBSITE: &str = "website";
    pub const COUNTRY: &str = "country";
    pub const SUPPLIER_TYPE: &str = "supplier_type";
    pub const SCALE: &str = "scale";
    pub const EMPLOYEE_COUNT: &str = "employee_count";
    pub const ANNUAL_REVENUE: &str = "annual_revenue";
    pub const ESTABLISHED_YEAR: &str = "established_year";
    pub const PRODUCTS: &str = "main_products";
}

/// Maps raw records into canonical supplier records.
#[derive(Debug, Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Clean one raw record. The returned record carries its warnings.
    pub fn clean(&self, raw: &RawRecord) -> CanonicalSupplierRecord {
        let f = raw.fields();
        let mut warnings = Vec::new();

        let company_name = fields::clean_company_name(f.company_name.as_deref(), &mut warnings);
        let email = fields::clean_email(f.email.as_deref(), &mut warnings);
        let phone = fields::clean_phone(f.phone.as_deref(), &mut warnings);
        let website = fields::clean_website(f.website.as_deref(), &mut warnings);
        let country = fields::clean_country(f.country.as_deref(), &mut warnings);
        let supplier_type = fields::clean_supplier_type(f.supplier_type.as_deref(), &mut warnings);

        let employee_count = fields::clean_employee_count(f.employee_count.as_ref(), &mut warnings);
        let annual_revenue = fields::clean_annual_revenue(f.annual_revenue.as_ref(), &mut warnings);
        let scale = fields::determine_scale(employee_count, annual_revenue, &mut warnings);
        let established_year = fields::clean_established_year(
            f.established_year.as_ref(),
            raw.collected_at().year(),
            &mut warnings,
        );

        let products = fields::clean_products(f.main_products.as_ref(), &mut warnings);

        CanonicalSupplierRecord {
            company_name,
            company_name_en: fields::clean_text(f.company_name_en.as_deref()),
            country,
            province: fields::clean_text(f.province.as_deref()),
            city: fields::clean_text(f.city.as_deref()),
            address: fields::clean_text(f.address.as_deref()),
            contact_person: fields::clean_text(f.contact_person.as_deref()),
            email,
            phone,
            website,
            supplier_type,
            scale,
            certification_level: CertificationLevel::Unverified,
            established_year,
            employee_count,
            annual_revenue,
            products,
            description: fields::clean_text(f.company_description.as_deref()),
            source_id: raw.source_id().to_string(),
            source_url: fields::clean_text(f.source_url.as_deref()),
            collected_at: raw.collected_at(),
            warnings,
        }
    }
}
