//! 值转换表
//!
//! 把存储的原始值（如州代码 `CA`）转换成目标控件期望的显示文本。
//! 查表未命中时返回原值。

use phf::phf_map;

static STATE_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "AL" => "Alabama", "AK" => "Alaska", "AZ" => "Arizona", "AR" => "Arkansas",
    "CA" => "California", "CO" => "Colorado", "CT" => "Connecticut", "DE" => "Delaware",
    "DC" => "District of Columbia", "FL" => "Florida", "GA" => "Georgia", "HI" => "Hawaii",
    "ID" => "Idaho", "IL" => "Illinois", "IN" => "Indiana", "IA" => "Iowa",
    "KS" => "Kansas", "KY" => "Kentucky", "LA" => "Louisiana", "ME" => "Maine",
    "MD" => "Maryland", "MA" => "Massachusetts", "MI" => "Michigan", "MN" => "Minnesota",
    "MS" => "Mississippi", "MO" => "Missouri", "MT" => "Montana", "NE" => "Nebraska",
    "NV" => "Nevada", "NH" => "New Hampshire", "NJ" => "New Jersey", "NM" => "New Mexico",
    "NY" => "New York", "NC" => "North Carolina", "ND" => "North Dakota", "OH" => "Ohio",
    "OK" => "Oklahoma", "OR" => "Oregon", "PA" => "Pennsylvania", "RI" => "Rhode Island",
    "SC" => "South Carolina", "SD" => "South Dakota", "TN" => "Tennessee", "TX" => "Texas",
    "UT" => "Utah", "VT" => "Vermont", "VA" => "Virginia", "WA" => "Washington",
    "WV" => "West Virginia", "WI" => "Wisconsin", "WY" => "Wyoming", "PR" => "Puerto Rico",
};

static COUNTRY_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "US" => "United States", "USA" => "United States", "U.S." => "United States",
    "UNITED STATES OF AMERICA" => "United States",
    "UK" => "United Kingdom", "GB" => "United Kingdom",
    "CA" => "Canada", "DE" => "Germany", "FR" => "France", "IN" => "India",
    "CN" => "China", "JP" => "Japan", "AU" => "Australia", "NL" => "Netherlands",
    "IE" => "Ireland", "SG" => "Singapore", "BR" => "Brazil", "MX" => "Mexico",
    "ES" => "Spain", "IT" => "Italy", "SE" => "Sweden", "CH" => "Switzerland",
};

static YES_NO: phf::Map<&'static str, &'static str> = phf_map! {
    "TRUE" => "Yes", "FALSE" => "No", "1" => "Yes", "0" => "No",
    "Y" => "Yes", "N" => "No", "YES" => "Yes", "NO" => "No",
};

static GENDER_LABELS: phf::Map<&'static str, &'static str> = phf_map! {
    "M" => "Male", "MALE" => "Male", "F" => "Female", "FEMALE" => "Female",
    "NB" => "Non-binary", "NON-BINARY" => "Non-binary",
    "DECLINE" => "Decline to self-identify",
};

static VETERAN_LABELS: phf::Map<&'static str, &'static str> = phf_map! {
    "TRUE" => "I identify as one or more of the classifications of protected veteran",
    "YES" => "I identify as one or more of the classifications of protected veteran",
    "FALSE" => "I am not a protected veteran",
    "NO" => "I am not a protected veteran",
    "DECLINE" => "I don't wish to answer",
};

static TRANSFORMS: phf::Map<&'static str, &'static phf::Map<&'static str, &'static str>> = phf_map! {
    "stateName" => &STATE_NAMES,
    "countryName" => &COUNTRY_NAMES,
    "yesNo" => &YES_NO,
    "genderLabel" => &GENDER_LABELS,
    "veteranLabel" => &VETERAN_LABELS,
};

/// 是否存在该名称的转换表
pub fn is_known(name: &str) -> bool {
    TRANSFORMS.contains_key(name)
}

/// 查表转换；表不存在或值未命中时返回原值
pub fn apply(name: &str, raw: &str) -> String {
    let key = raw.trim().to_uppercase();
    TRANSFORMS
        .get(name)
        .and_then(|table| table.get(key.as_str()))
        .map(|v| v.to_string())
        .unwrap_or_else(|| raw.to_string())
}
