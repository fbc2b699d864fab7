use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// The translation prompt wants a human-readable language name ("Persian"),
/// while file naming and track matching work on raw codes ("fa"/"fas"/"per").
/// ISO 639-2/B codes that differ from their 639-2/T sibling are mapped here.
fn lookup(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => {
            // Bibliographic aliases first, then the terminological form
            let part2t = match normalized.as_str() {
                "per" => "fas", // Persian
                "fre" => "fra", // French
                "ger" => "deu", // German
                "dut" => "nld", // Dutch
                "gre" => "ell", // Greek
                "chi" => "zho", // Chinese
                "cze" => "ces", // Czech
                "arm" => "hye", // Armenian
                "rum" => "ron", // Romanian
                "slo" => "slk", // Slovak
                other => other,
            };
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Get the English name for a language code
pub fn get_language_name(code: &str) -> Result<String> {
    lookup(code)
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Check whether two language codes refer to the same language,
/// regardless of whether they are 2-letter or 3-letter codes
pub fn language_codes_match(first: &str, second: &str) -> bool {
    match (lookup(first), lookup(second)) {
        (Some(a), Some(b)) => a == b,
        // Fall back to literal comparison for codes isolang does not know
        _ => first.trim().eq_ignore_ascii_case(second.trim()),
    }
}

/// Normalize a language code to its 2-letter form when one exists,
/// otherwise keep the 3-letter terminological code
pub fn normalize_language_code(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    Ok(lang
        .to_639_1()
        .map(|c| c.to_string())
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}
