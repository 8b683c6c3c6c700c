//! Header names carrying entry fields.

use hyper::header::HeaderName;

/// Hex hash of the preceding entry; omitted at height 0.
pub const X_PREV_HASH: HeaderName = HeaderName::from_static("x-prev-hash");
/// Hex hash of the following entry; omitted at the tip.
pub const X_NEXT_HASH: HeaderName = HeaderName::from_static("x-next-hash");
/// Hex hash of the entry itself.
pub const X_HASH: HeaderName = HeaderName::from_static("x-hash");
/// Decimal height.
pub const X_BLOCK: HeaderName = HeaderName::from_static("x-block");
/// `<unix-seconds>:<nanoseconds>`.
pub const X_DATE: HeaderName = HeaderName::from_static("x-date");
/// Hex digest of the body.
pub const X_CONTENT_HASH: HeaderName = HeaderName::from_static("x-content-hash");
/// Hex signature over the entry hash.
pub const X_SIGN: HeaderName = HeaderName::from_static("x-sign");
