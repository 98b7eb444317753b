/// User-visible strings this crate produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Message {
    /// Label shown instead of a user ID for photo attributes.
    PhotoLabel,
    KeyExtractionFailed,
    NoUsableSubkey,
}

/// Source of localized strings.
pub trait Locale: Send + Sync {
    fn message(&self, msg: Message) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLocale;

impl Locale for EnglishLocale {
    fn message(&self, msg: Message) -> String {
        match msg {
            Message::PhotoLabel => "Photo".to_string(),
            Message::KeyExtractionFailed => "Key extraction command failed".to_string(),
            Message::NoUsableSubkey => "No valid (sub-)key".to_string(),
        }
    }
}
