use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref CONFIDENCE_PATTERNS: Vec<Regex> = [
        r"confidence.*?(\d+(?:\.\d+)?)%",
        r"(\d+(?:\.\d+)?)%.*?confidence",
        r"certainty.*?(\d+(?:\.\d+)?)%",
        r"conviction.*?(\d+(?:\.\d+)?)%",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("confidence pattern must compile"))
    .collect();
}

/// Extracts a percentage confidence from normalized model text
#[derive(Debug, Clone)]
pub struct ConfidenceParser {
    default_confidence: f64,
}

impl ConfidenceParser {
    pub fn new(default_confidence: f64) -> Self {
        Self { default_confidence }
    }

    /// First percentage in [0, 100] attached to a confidence phrase
    pub fn parse(&self, text: &str) -> Option<f64> {
        CONFIDENCE_PATTERNS
            .iter()
            .flat_map(|pattern| pattern.captures_iter(text))
            .filter_map(|captures| captures.get(1)?.as_str().parse::<f64>().ok())
            .find(|value| (0.0..=100.0).contains(value))
            .inspect(|value| debug!("confidence parsed: {}%", value))
    }

    /// Parsed confidence, or the configured default when none is stated
    pub fn extract(&self, text: &str) -> f64 {
        self.parse(text).unwrap_or(self.default_confidence)
    }
}

impl Default for ConfidenceParser {
    fn default() -> Self {
        Self::new(65.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_before_value() {
        let parser = ConfidenceParser::default();
        assert_eq!(parser.parse("confidence level: 80%"), Some(80.0));
    }

    #[test]
    fn test_value_before_confidence() {
        let parser = ConfidenceParser::default();
        assert_eq!(parser.parse("i have 72% confidence in this"), Some(72.0));
    }

    #[test]
    fn test_certainty_and_conviction() {
        let parser = ConfidenceParser::default();
        assert_eq!(parser.parse("certainty around 55%"), Some(55.0));
        assert_eq!(parser.parse("conviction: 67.5%"), Some(67.5));
    }

    #[test]
    fn test_out_of_range_is_skipped() {
        let parser = ConfidenceParser::default();
        assert_eq!(parser.parse("confidence 250%. revised confidence 70%"), Some(70.0));
        assert_eq!(parser.parse("confidence 250%"), None);
    }

    #[test]
    fn test_default_when_missing() {
        let parser = ConfidenceParser::default();
        assert_eq!(parser.extract("no numbers here"), 65.0);
        assert_eq!(ConfidenceParser::new(40.0).extract("bullish"), 40.0);
    }
}
