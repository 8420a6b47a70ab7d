//! Keyed event routing.
//!
//! The router reads a key out of a packet's key-searchable form (hex text
//! for binary packets, the text itself for text packets) and looks it up in
//! an ordered rule table. Keys compare case-insensitively and the first
//! matching rule wins.

use portframe_core::{EventKeyRule, Error, KeyWindow, Result};
use tracing::{debug, warn};

/// Selects a named event for a packet based on a key field.
///
/// # Example
///
/// ```
/// use portframe_core::{EventKeyRule, KeyWindow};
/// use portframe_protocol::EventRouter;
///
/// let router = EventRouter::new(
///     KeyWindow::new(4, Some(2)),
///     [EventKeyRule::new("door_open", "01"), EventKeyRule::new("door_closed", "02")],
/// )
/// .unwrap();
///
/// // Hex text of [AA, BB, 02, FF]: key at characters 4..6 is "02".
/// let rule = router.route("AABB02FF").unwrap();
/// assert_eq!(rule.name, "door_closed");
/// ```
#[derive(Debug, Clone)]
pub struct EventRouter {
    rules: Vec<EventKeyRule>,
    key_start: usize,
    key_length: Option<usize>,
}

impl EventRouter {
    /// Build a router from a key window and an ordered rule list.
    ///
    /// # Errors
    /// - `Error::InvalidKeyWindow` if the key start is negative
    /// - `Error::DuplicateEventName` if two rules share a name
    pub fn new(window: KeyWindow, rules: impl IntoIterator<Item = EventKeyRule>) -> Result<Self> {
        let key_start = usize::try_from(window.start).map_err(|_| Error::InvalidKeyWindow {
            start: window.start,
            length: window.length.map_or(-1, |len| len as i64),
        })?;

        let mut router = Self {
            rules: Vec::new(),
            key_start,
            key_length: window.length,
        };
        for rule in rules {
            router.register(rule)?;
        }
        Ok(router)
    }

    /// Router with no rules; never matches.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            key_start: 0,
            key_length: None,
        }
    }

    /// Append a rule to the end of the table.
    ///
    /// A key already used by another rule is accepted with a warning; the
    /// earlier rule keeps matching first.
    ///
    /// # Errors
    /// Returns `Error::DuplicateEventName` if the name is already registered.
    pub fn register(&mut self, rule: EventKeyRule) -> Result<()> {
        if self.rules.iter().any(|r| r.name == rule.name) {
            return Err(Error::DuplicateEventName(rule.name));
        }

        if let Some(existing) = self.rules.iter().find(|r| keys_match(&r.key, &rule.key)) {
            warn!(
                "Event '{}' reuses key '{}' of event '{}' and will never match",
                rule.name, rule.key, existing.name
            );
        }

        self.rules.push(rule);
        Ok(())
    }

    pub fn rules(&self) -> &[EventKeyRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Cut the key out of `searchable` using character offsets.
    ///
    /// Returns `None` if the key window does not fit.
    pub fn extract_key<'a>(&self, searchable: &'a str) -> Option<&'a str> {
        let start = char_to_byte_offset(searchable, self.key_start)?;
        let end = match self.key_length {
            Some(len) => start + char_to_byte_offset(&searchable[start..], len)?,
            None => searchable.len(),
        };
        Some(&searchable[start..end])
    }

    /// Find the first rule whose key matches the key in `searchable`.
    pub fn route(&self, searchable: &str) -> Option<&EventKeyRule> {
        let Some(key) = self.extract_key(searchable) else {
            debug!(
                "Event key window ({}, {:?}) does not fit '{}'",
                self.key_start, self.key_length, searchable
            );
            return None;
        };

        let matched = self.rules.iter().find(|r| keys_match(&r.key, key));
        if matched.is_none() {
            debug!("No event registered for key '{}'", key);
        }
        matched
    }
}

/// Case-insensitive key comparison.
fn keys_match(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Byte offset of the `chars`-th character, allowing one past the end.
fn char_to_byte_offset(text: &str, chars: usize) -> Option<usize> {
    text.char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .nth(chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn router(start: i64, length: Option<usize>) -> EventRouter {
        EventRouter::new(
            KeyWindow::new(start, length),
            [
                EventKeyRule::new("open", "AA"),
                EventKeyRule::new("close", "BB"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_negative_key_start_fails_fast() {
        let err = EventRouter::new(KeyWindow::new(-1, Some(2)), []).unwrap_err();
        assert!(matches!(err, Error::InvalidKeyWindow { start: -1, length: 2 }));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut router = router(0, Some(2));
        let err = router.register(EventKeyRule::new("open", "CC")).unwrap_err();
        assert!(matches!(err, Error::DuplicateEventName(name) if name == "open"));
        assert_eq!(router.rules().len(), 2);
    }

    #[test]
    fn test_duplicate_key_first_wins() {
        let mut router = router(0, Some(2));
        router.register(EventKeyRule::new("open_again", "aa")).unwrap();

        assert_eq!(router.rules().len(), 3);
        assert_eq!(router.route("AA00").unwrap().name, "open");
    }

    #[rstest]
    #[case("AA", Some("open"))]
    #[case("aa", Some("open"))]
    #[case("Bb", Some("close"))]
    #[case("CC", None)]
    fn test_route_case_insensitive(#[case] input: &str, #[case] expected: Option<&str>) {
        let router = router(0, Some(2));
        assert_eq!(router.route(input).map(|r| r.name.as_str()), expected);
    }

    #[rstest]
    #[case("0102AA", 4, Some(2), Some("AA"))]
    #[case("0102AA", 4, None, Some("AA"))]
    #[case("0102AA", 6, None, Some(""))]
    #[case("0102AA", 5, Some(2), None)]
    #[case("0102AA", 7, None, None)]
    fn test_extract_key(
        #[case] searchable: &str,
        #[case] start: i64,
        #[case] length: Option<usize>,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(router(start, length).extract_key(searchable), expected);
    }

    #[test]
    fn test_extract_key_uses_characters() {
        let router = router(1, Some(2));
        assert_eq!(router.extract_key("éAAx"), Some("AA"));
    }

    #[test]
    fn test_key_window_outside_packet_does_not_match() {
        let router = router(10, Some(2));
        assert!(router.route("AA").is_none());
    }

    #[test]
    fn test_empty_router() {
        let router = EventRouter::empty();
        assert!(router.is_empty());
        assert!(router.route("AA").is_none());
    }
}
