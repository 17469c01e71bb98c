//! Error taxonomy tests

use actix_web::http::StatusCode;

use linkpress::errors::LinkpressError;

#[test]
fn test_error_codes_are_stable() {
    assert_eq!(LinkpressError::invalid_input("x").code(), "E001");
    assert_eq!(LinkpressError::conflict("x").code(), "E002");
    assert_eq!(LinkpressError::not_found("x").code(), "E003");
    assert_eq!(LinkpressError::expired("x").code(), "E004");
    assert_eq!(LinkpressError::resource_exhausted("x").code(), "E005");
    assert_eq!(LinkpressError::database_config("x").code(), "E006");
    assert_eq!(LinkpressError::database_connection("x").code(), "E007");
    assert_eq!(LinkpressError::database_operation("x").code(), "E008");
}

#[test]
fn test_status_mapping() {
    assert_eq!(
        LinkpressError::invalid_input("x").status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        LinkpressError::conflict("x").status_code(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        LinkpressError::not_found("x").status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(LinkpressError::expired("x").status_code(), StatusCode::GONE);
    assert_eq!(
        LinkpressError::resource_exhausted("x").status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        LinkpressError::database_operation("x").status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_internal_detail_not_exposed() {
    let err = LinkpressError::database_operation("connection pool exhausted at 10.0.0.5");
    assert_eq!(err.public_message(), "Internal Server Error");
    // Full detail stays available for the logs
    assert!(err.message().contains("10.0.0.5"));

    let err = LinkpressError::invalid_input("URL is required.");
    assert_eq!(err.public_message(), "URL is required.");
}

#[test]
fn test_display_format() {
    let err = LinkpressError::conflict("Short code 'abc' already in use");
    assert_eq!(
        err.to_string(),
        "Conflict: Short code 'abc' already in use"
    );
}
