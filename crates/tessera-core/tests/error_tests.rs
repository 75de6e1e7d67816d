use tessera_core::TesseraError;

#[test]
fn test_error_codes() {
    assert_eq!(TesseraError::BadRequest("x".into()).error_code(), "BAD_REQUEST");
    assert_eq!(TesseraError::InvalidCredential.error_code(), "INVALID_CREDENTIAL");
    assert_eq!(TesseraError::Conflict("x".into()).error_code(), "CONFLICT");
    assert_eq!(TesseraError::Integrity("x".into()).error_code(), "INTEGRITY_ERROR");
    assert_eq!(TesseraError::Timeout("x".into()).error_code(), "TIMEOUT");
    assert_eq!(TesseraError::Config("x".into()).error_code(), "CONFIG_ERROR");
    assert_eq!(TesseraError::Internal("x".into()).error_code(), "INTERNAL_ERROR");
    assert_eq!(
        TesseraError::Database(sea_orm::DbErr::Custom("x".into())).error_code(),
        "DATABASE_ERROR"
    );
}

#[test]
fn test_credential_errors_are_not_internal() {
    assert!(!TesseraError::BadRequest("x".into()).is_internal());
    assert!(!TesseraError::InvalidCredential.is_internal());
    assert!(!TesseraError::Conflict("x".into()).is_internal());

    assert!(TesseraError::Integrity("x".into()).is_internal());
    assert!(TesseraError::Timeout("x".into()).is_internal());
    assert!(TesseraError::Database(sea_orm::DbErr::Custom("x".into())).is_internal());
}

#[test]
fn test_invalid_credential_message_reveals_nothing() {
    assert_eq!(
        TesseraError::InvalidCredential.to_string(),
        "Unauthorized: invalid credential"
    );
}

#[test]
fn test_db_error_converts() {
    let err: TesseraError = sea_orm::DbErr::Custom("boom".into()).into();
    assert!(matches!(err, TesseraError::Database(_)));
}
