//! One-shot severity-tagged notices carried to the next page via a cookie.
//!
//! The rendering layer (external to this service) reads and clears the
//! `flash` cookie when it renders the page a redirect lands on.

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Warning,
    Danger,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Warning => "warning",
            Level::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: Level::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: Level::Warning, message: message.into() }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self { level: Level::Danger, message: message.into() }
    }

    /// Encode as a Set-Cookie value. The message is form-urlencoded so it
    /// stays within the cookie value grammar.
    pub fn cookie(&self) -> String {
        let value = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("level", self.level.as_str())
            .append_pair("message", &self.message)
            .finish();
        format!("{}={}; Path=/; SameSite=Lax", FLASH_COOKIE, value)
    }

    /// Decode a cookie value produced by [`Flash::cookie`].
    pub fn parse(value: &str) -> Option<Self> {
        let mut level = None;
        let mut message = None;
        for (key, val) in url::form_urlencoded::parse(value.as_bytes()) {
            match key.as_ref() {
                "level" => {
                    level = match val.as_ref() {
                        "success" => Some(Level::Success),
                        "warning" => Some(Level::Warning),
                        "danger" => Some(Level::Danger),
                        _ => None,
                    }
                }
                "message" => message = Some(val.into_owned()),
                _ => {}
            }
        }
        Some(Self { level: level?, message: message? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_round_trips_messages_with_reserved_characters() {
        let flash = Flash::success("Book \"War & Peace\"; deleted");
        let cookie = flash.cookie();
        let value = cookie
            .strip_prefix("flash=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        assert_eq!(Flash::parse(value), Some(flash));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(Flash::parse("level=shiny&message=x"), None);
        assert_eq!(Flash::parse(""), None);
    }
}
