use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap, HeaderValue};
use cookie::{Cookie, SameSite};
use parking_lot::Mutex;

use crate::model::{generate_id, Message};

/// Name of the cookie carrying the flash session id.
pub const SESSION_COOKIE: &str = "crude.sid";

#[derive(Debug, Clone)]
struct FlashSlot {
    error: Option<Message>,
    success: Option<Message>,
    touched: Instant,
}

impl FlashSlot {
    fn empty() -> Self {
        Self {
            error: None,
            success: None,
            touched: Instant::now(),
        }
    }

    fn is_empty(&self) -> bool {
        self.error.is_none() && self.success.is_none()
    }
}

/// Pending one-shot messages keyed by session id. Slots nobody came back
/// for are dropped after the TTL.
#[derive(Debug)]
pub struct FlashStore {
    slots: Mutex<HashMap<String, FlashSlot>>,
    ttl: Duration,
}

impl Default for FlashStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashStore {
    /// Create a new store with a 10 minute TTL
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(600))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn put(&self, session_id: &str, message: Message) {
        let mut slots = self.slots.lock();
        let ttl = self.ttl;
        slots.retain(|_, slot| slot.touched.elapsed() <= ttl);

        let slot = slots
            .entry(session_id.to_string())
            .or_insert_with(FlashSlot::empty);
        slot.touched = Instant::now();
        let level = message.level;
        match level {
            crate::model::MessageLevel::Error => slot.error = Some(message),
            crate::model::MessageLevel::Success => slot.success = Some(message),
        }
    }

    fn take(&self, session_id: &str, take: impl FnOnce(&mut FlashSlot) -> Option<Message>) -> Option<Message> {
        let mut slots = self.slots.lock();
        let slot = slots.get_mut(session_id)?;
        if slot.touched.elapsed() > self.ttl {
            slots.remove(session_id);
            return None;
        }
        let message = take(slot);
        if slot.is_empty() {
            slots.remove(session_id);
        }
        message
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The flash view of one browser session for the current request.
#[derive(Debug, Clone)]
pub struct FlashSession {
    id: String,
    fresh: bool,
    store: Arc<FlashStore>,
}

impl FlashSession {
    /// Resume the session named by the request cookie, or start a new one.
    pub fn from_headers(headers: &HeaderMap, store: Arc<FlashStore>) -> Self {
        let existing = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| Cookie::split_parse(value))
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == SESSION_COOKIE && !cookie.value().is_empty())
            .map(|cookie| cookie.value().to_string());

        match existing {
            Some(id) => Self {
                id,
                fresh: false,
                store,
            },
            None => Self {
                id: generate_id(),
                fresh: true,
                store,
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn add_error(&self, message: Message) {
        self.store.put(&self.id, message);
    }

    pub fn add_success(&self, message: Message) {
        self.store.put(&self.id, message);
    }

    pub fn take_error(&self) -> Option<Message> {
        self.store.take(&self.id, |slot| slot.error.take())
    }

    pub fn take_success(&self) -> Option<Message> {
        self.store.take(&self.id, |slot| slot.success.take())
    }

    /// `Set-Cookie` value for sessions created by this request.
    pub fn set_cookie(&self) -> Option<HeaderValue> {
        if !self.fresh {
            return None;
        }
        let cookie = Cookie::build((SESSION_COOKIE, self.id.as_str()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        HeaderValue::from_str(&cookie.to_string()).ok()
    }
}
