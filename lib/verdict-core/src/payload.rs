//! Decoded response payloads.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;

/// A decoded response body that can report a domain-level failure.
///
/// # Empty lists
///
/// A bare `[]` body only reaches empty-list coercion if it first decodes into
/// `Self`, which a plain struct cannot do: the decoder rejects a sequence and
/// the request is reported as a transport exception. Payloads that may arrive as
/// `[]` need a shape accepting both forms, typically an untagged enum with a
/// list variant, and an envelope variant buildable from `{}` for
/// [`Payload::empty_list`].
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use verdict_core::{Payload, from_json};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// #[serde(untagged)]
/// enum ApiResult {
///     List(Vec<String>),
///     Envelope {
///         #[serde(default)]
///         success: bool,
///         #[serde(default)]
///         items: Vec<String>,
///     },
/// }
///
/// impl Payload for ApiResult {
///     fn is_success(&self) -> bool {
///         match self {
///             Self::List(items) => !items.is_empty(),
///             Self::Envelope { success, .. } => *success,
///         }
///     }
/// }
///
/// let bare: ApiResult = from_json(b"[]").expect("decode");
/// assert_eq!(bare.rendering(), "[]");
///
/// let empty = ApiResult::empty_list().expect("coerce");
/// assert!(matches!(empty, ApiResult::Envelope { success: false, .. }));
/// ```
pub trait Payload: Serialize + DeserializeOwned {
    /// Returns `false` when the payload encodes a server-side error.
    fn is_success(&self) -> bool;

    /// Textual rendering used to detect a bare empty array.
    ///
    /// Defaults to the compact JSON serialization.
    fn rendering(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// The declared empty result, substituted for a bare `[]` payload.
    fn empty_list() -> Result<Self> {
        coerce_empty()
    }
}

/// Shape of the declared empty result: an object with no fields.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EmptyListResult {}

/// Coerces [`EmptyListResult`] into `T` through its JSON form.
///
/// # Errors
///
/// Returns an error if `T` cannot be deserialized from an empty object.
pub fn coerce_empty<T: DeserializeOwned>() -> Result<T> {
    let value = serde_json::to_vec(&EmptyListResult::default())?;
    from_json(&value)
}

/// Returns `true` for the degenerate rendering of an empty array.
///
/// Matches text that starts with `[` and is at most three characters long,
/// which also admits `"[ ]"`.
#[must_use]
pub fn is_empty_list_rendering(rendering: &str) -> bool {
    rendering.starts_with('[') && rendering.chars().count() <= 3
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Errors
///
/// Returns an error if JSON deserialization fails, with the error message
/// including the path to the problematic field (e.g., "items[0].id").
///
/// # Example
///
/// ```
/// use verdict_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct User { name: String }
///
/// let bytes = br#"{"name":"Alice"}"#;
/// let user: User = from_json(bytes).expect("deserialize");
/// assert_eq!(user, User { name: "Alice".to_string() });
/// ```
pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::decode(e.path().to_string(), e.inner().to_string())
    })
}
