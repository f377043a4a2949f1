//! Static alias tables for country and supplier-type normalization
//!
//! Keys are matched after trimming, whitespace collapsing and lower-casing.
//! Canonical names map to themselves so already-clean input passes quietly.

use crate::record::SupplierType;

/// Canonical (Chinese) country name for a known alias.
pub(crate) fn country_alias(key: &str) -> Option<&'static str> {
    let canonical = match key {
        "china" | "cn" | "prc" | "people's republic of china" | "mainland china" | "中国"
        | "中国大陆" => "中国",
        "japan" | "jp" | "日本" => "日本",
        "south korea" | "korea" | "republic of korea" | "kr" | "韩国" | "南韩" => "韩国",
        "taiwan" | "tw" | "台湾" | "台湾省" => "台湾省",
        "hong kong" | "hk" | "香港" => "香港",
        "singapore" | "sg" | "新加坡" => "新加坡",
        "malaysia" | "my" | "马来西亚" => "马来西亚",
        "thailand" | "th" | "泰国" => "泰国",
        "vietnam" | "viet nam" | "vn" | "越南" => "越南",
        "indonesia" | "id" | "印尼" | "印度尼西亚" => "印尼",
        "philippines" | "ph" | "菲律宾" => "菲律宾",
        "india" | "in" | "印度" => "印度",
        "usa" | "us" | "u.s." | "u.s.a." | "united states" | "united states of america"
        | "美国" => "美国",
        "germany" | "de" | "德国" => "德国",
        "netherlands" | "the netherlands" | "holland" | "nl" | "荷兰" => "荷兰",
        "uk" | "united kingdom" | "great britain" | "england" | "gb" | "英国" => "英国",
        "france" | "fr" | "法国" => "法国",
        "israel" | "il" | "以色列" => "以色列",
        _ => return None,
    };
    Some(canonical)
}

/// Supplier type for a known English or Chinese alias.
pub(crate) fn supplier_type_alias(key: &str) -> Option<SupplierType> {
    let supplier_type = match key {
        "manufacturer" | "manufacturing" | "maker" | "oem" | "factory" | "制造商" | "生产商"
        | "厂家" | "工厂" => SupplierType::Manufacturer,
        "distributor" | "distribution" | "agent" | "reseller" | "分销商" | "代理商" | "经销商" => {
            SupplierType::Distributor
        }
        "trader" | "trading company" | "trading" | "贸易商" | "贸易公司" => SupplierType::Trader,
        "service provider" | "service_provider" | "service-provider" | "services" | "服务商"
        | "服务提供商" => SupplierType::ServiceProvider,
        _ => return None,
    };
    Some(supplier_type)
}
