use regex::Regex;

const COUNTRIES: &str = "USA|United States|UK|United Kingdom|India|Canada|Germany|Australia|\
    Ireland|Singapore|Netherlands";

/// Best-effort free-text location. Never fails on content; an empty string
/// means nothing location-like was found.
pub struct LocationExtractor {
    labeled: Regex,
    work_mode: Regex,
    city: Regex,
}

impl LocationExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            labeled: Regex::new(
                r"(?im)^[\s\W]*(?:location|based\s+in|address)\s*[:\-]\s*(?P<value>\S.*?)\s*$",
            )?,
            work_mode: Regex::new(r"(?i)\b(?P<mode>remote|hybrid|on-?site)\b")?,
            city: Regex::new(&format!(
                r"(?m)\b(?P<city>[A-Z][a-z]+(?: [A-Z][a-z]+)?), ?(?P<region>[A-Z]{{2}}|{COUNTRIES})(?:$|[\s.,;:)|])"
            ))?,
        })
    }

    pub fn extract(&self, text: &str) -> String {
        if let Some(value) = self
            .labeled
            .captures(text)
            .and_then(|captures| captures.name("value"))
        {
            return value.as_str().trim_end_matches(['.', ',', ';']).to_string();
        }

        if let Some(mode) = self
            .work_mode
            .captures(text)
            .and_then(|captures| captures.name("mode"))
        {
            let canonical = match mode.as_str().to_lowercase().as_str() {
                "remote" => "Remote",
                "hybrid" => "Hybrid",
                _ => "On-site",
            };
            return canonical.to_string();
        }

        self.city
            .captures(text)
            .and_then(|captures| {
                let city = captures.name("city")?.as_str();
                let region = captures.name("region")?.as_str();
                Some(format!("{city}, {region}"))
            })
            .unwrap_or_default()
    }
}
