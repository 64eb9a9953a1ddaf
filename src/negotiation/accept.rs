use super::MediaType;

/// Quality value in thousandths, so `q=0.875` is `875`.
pub type Quality = u16;

const MAX_QUALITY: Quality = 1000;

/// One entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRange {
    pub media_type: MediaType,
    pub quality: Quality,
}

/// The client's media preferences, ranked by quality and then by the order
/// they appeared in the header.
///
/// Ranges with `q=0` are dropped: they mark a type as unacceptable, which for
/// error rendering is the same as not listing it. A header that refuses
/// everything it names still counts as a preference, one nothing satisfies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptPreferences {
    ranges: Vec<MediaRange>,
    refused: bool,
}

impl AcceptPreferences {
    /// Parse one or more `Accept` header values, in header order.
    ///
    /// Entries that fail to parse are skipped.
    pub fn parse<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ranges = Vec::new();
        let mut refused = false;

        for value in values {
            for entry in value.as_ref().split(',') {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                match parse_range(entry) {
                    Some(range) if range.quality > 0 => ranges.push(range),
                    Some(_) => refused = true,
                    None => tracing::debug!("Ignoring malformed Accept entry: {}", entry),
                }
            }
        }

        // Stable, so equal qualities keep header order.
        ranges.sort_by(|a, b| b.quality.cmp(&a.quality));

        Self { ranges, refused }
    }

    pub fn ranges(&self) -> &[MediaRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// No header, or nothing but `*/*`: the client will take anything.
    pub fn has_no_preference(&self) -> bool {
        if self.ranges.is_empty() {
            return !self.refused;
        }
        self.ranges
            .iter()
            .all(|range| range.media_type.top() == "*" && range.media_type.sub() == "*")
    }

    /// Whether at least one of `types` is acceptable to the client.
    pub fn accepts_any(&self, types: &[MediaType]) -> bool {
        self.has_no_preference()
            || self
                .ranges
                .iter()
                .any(|range| types.iter().any(|t| range.media_type.matches(t)))
    }
}

fn parse_range(entry: &str) -> Option<MediaRange> {
    let mime: mime::Mime = entry.parse().ok()?;
    let quality = match mime.get_param("q") {
        Some(q) => parse_quality(q.as_str())?,
        None => MAX_QUALITY,
    };
    Some(MediaRange {
        media_type: MediaType::from(&mime),
        quality,
    })
}

// RFC 9110 qvalue: "0", "1", or up to three decimals.
fn parse_quality(value: &str) -> Option<Quality> {
    let parsed: f32 = value.trim().parse().ok()?;
    if !(0.0..=1.0).contains(&parsed) {
        return None;
    }
    Some((parsed * MAX_QUALITY as f32).round() as Quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::{APPLICATION_JSON, APPLICATION_XML, TEXT_PLAIN};

    fn essences(prefs: &AcceptPreferences) -> Vec<String> {
        prefs.ranges().iter().map(|r| r.media_type.essence()).collect()
    }

    #[test]
    fn test_ranked_by_quality_then_order() {
        let prefs = AcceptPreferences::parse([
            "text/html;q=0.5, application/xml, application/json;q=0.9",
            "text/plain",
        ]);
        assert_eq!(
            essences(&prefs),
            vec!["application/xml", "text/plain", "application/json", "text/html"]
        );
        assert_eq!(prefs.ranges()[2].quality, 900);
    }

    #[test]
    fn test_zero_quality_and_garbage_are_dropped() {
        let prefs = AcceptPreferences::parse(["application/json;q=0, nonsense, text/plain;q=2"]);
        assert!(prefs.is_empty());
    }

    #[test]
    fn test_no_preference() {
        assert!(AcceptPreferences::parse(Vec::<String>::new()).has_no_preference());
        assert!(AcceptPreferences::parse([""]).has_no_preference());
        assert!(AcceptPreferences::parse(["*/*"]).has_no_preference());
        assert!(!AcceptPreferences::parse(["*/*, text/plain"]).has_no_preference());
        assert!(AcceptPreferences::parse(["nonsense"]).has_no_preference());
    }

    #[test]
    fn test_refusing_everything_accepts_nothing() {
        let prefs = AcceptPreferences::parse(["application/json;q=0"]);
        assert!(prefs.is_empty());
        assert!(!prefs.has_no_preference());
        assert!(!prefs.accepts_any(&[APPLICATION_JSON, TEXT_PLAIN]));

        let prefs = AcceptPreferences::parse(["application/json;q=0, */*"]);
        assert!(prefs.has_no_preference());
    }

    #[test]
    fn test_accepts_any() {
        let prefs = AcceptPreferences::parse(["text/*"]);
        assert!(prefs.accepts_any(&[APPLICATION_JSON, TEXT_PLAIN]));
        assert!(!prefs.accepts_any(&[APPLICATION_JSON, APPLICATION_XML]));
    }
}
