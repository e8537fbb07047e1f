use crate::errors::BasisHedgeError;

#[test]
fn data_unavailable_is_recoverable_and_categorised() {
    let err = BasisHedgeError::data_unavailable("CL=F returned 404");
    assert!(err.is_recoverable());
    assert!(!err.is_user_error());
    assert_eq!(err.category(), "data");
    assert!(err.user_message().contains("Suggestions"));
    assert!(err.user_message().contains("CL=F returned 404"));
}

#[test]
fn insufficient_data_reports_counts() {
    let err = BasisHedgeError::insufficient_data(5, 2);
    assert_eq!(
        err.to_string(),
        "Insufficient data: need at least 5 samples, got 2"
    );
    assert_eq!(err.category(), "model");
    assert!(!err.is_recoverable());
}

#[test]
fn config_and_validation_are_user_errors() {
    assert!(BasisHedgeError::config_error("bad window").is_user_error());
    assert!(BasisHedgeError::validation("bad coordinate").is_user_error());
    assert!(!BasisHedgeError::empty_series("no rows").is_user_error());
}

#[test]
fn foreign_errors_convert() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: BasisHedgeError = json_err.into();
    assert_eq!(err.category(), "parsing");

    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: BasisHedgeError = io_err.into();
    assert_eq!(err.category(), "io");
}
