mod hmac;

pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService, REQUEST_ID_HEADER, SIGNATURE_HEADER};
