//! Static error-code dictionary.
//!
//! FiberHome EMS units report a short code in the `EN=` field of an
//! operation response; this table translates the known codes. The parser
//! never consults it — callers do, via [`describe`] or
//! [`OperationResult::error_text`](crate::response::OperationResult::error_text).

/// Look up the English description for a remote error code.
pub fn describe(code: &str) -> Option<&'static str> {
    match code {
        "DDB" => Some("device is busy"),
        "DDNS" => Some("device may not support this operation"),
        "DDOF" => Some("device operation failed"),
        "EEEH" => Some("EMS exception happens"),
        "IANE" => Some("the alarm does not exist"),
        "IIPE" => Some("input parameter error"),
        "IIPF" => Some("invalid parameter format"),
        "IMP" => Some("missing parameter"),
        "IRNE" => Some("resource does not exist"),
        "SENS" => Some("EMS may not support this operation"),
        "SEOF" => Some("EMS operation failed"),
        "TTMB" => Some("test module is busy"),
        "TUB" => Some("user is busy"),
        "TUT" => Some("user is testing"),
        _ => None,
    }
}
