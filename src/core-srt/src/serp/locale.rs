/// Which Google front-end (and `gl` country code) a search is issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLocale {
    pub google_domain: &'static str,
    pub gl: &'static str,
}

const LOCALES: &[(&str, SearchLocale)] = &[
    ("United States", SearchLocale::new("google.com", "us")),
    ("United Kingdom", SearchLocale::new("google.co.uk", "uk")),
    ("France", SearchLocale::new("google.fr", "fr")),
    ("Germany", SearchLocale::new("google.de", "de")),
    ("Spain", SearchLocale::new("google.es", "es")),
    ("Italy", SearchLocale::new("google.it", "it")),
];

impl SearchLocale {
    pub const DEFAULT: SearchLocale = SearchLocale::new("google.com", "us");

    const fn new(google_domain: &'static str, gl: &'static str) -> Self {
        Self { google_domain, gl }
    }

    /// Locale for a country name. Unknown countries search google.com as `us`.
    pub fn for_country(country: &str) -> Self {
        LOCALES
            .iter()
            .find(|(name, _)| *name == country)
            .map(|(_, locale)| *locale)
            .unwrap_or(Self::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_countries() {
        assert_eq!(SearchLocale::for_country("France"), SearchLocale::new("google.fr", "fr"));
        assert_eq!(SearchLocale::for_country("United Kingdom").google_domain, "google.co.uk");
        assert_eq!(SearchLocale::for_country("United Kingdom").gl, "uk");
        assert_eq!(SearchLocale::for_country("Italy").gl, "it");
    }

    #[test]
    fn test_unknown_country_falls_back() {
        assert_eq!(SearchLocale::for_country("Narnia"), SearchLocale::DEFAULT);
        assert_eq!(SearchLocale::for_country("france"), SearchLocale::DEFAULT);
    }
}
