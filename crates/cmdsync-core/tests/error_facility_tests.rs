use cmdsync_core::errors::{ExError, ExErrorKind, SyncError};

#[test]
fn test_unknown_command_verifiable_by_kind() {
    let ex_err: ExError = SyncError::UnknownCommand {
        name: "ping".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert_eq!(ex_err.code(), "ERR_NOT_FOUND");
    assert_eq!(ex_err.command_name(), Some("ping"));
}

#[test]
fn test_missing_local_version_carries_command() {
    let ex_err: ExError = SyncError::MissingLocalVersion {
        command_name: "help".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::MissingLocalVersion);
    assert_eq!(ex_err.command_name(), Some("help"));
    assert!(ex_err.message().contains("help"));
}

#[test]
fn test_invalid_setting_value_message() {
    let ex_err: ExError = SyncError::InvalidSettingValue {
        key: "random_max".to_string(),
        reason: "must be between 1 and 1000".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidSettingValue);
    assert!(ex_err.message().contains("random_max"));
    assert!(ex_err.message().contains("between 1 and 1000"));
}

#[test]
fn test_tenant_required_distinct_from_invalid_input() {
    let ex_err: ExError = SyncError::TenantRequired {
        command_name: "settings".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::TenantRequired);
    assert_ne!(ex_err.kind(), ExErrorKind::InvalidInput);
}

#[test]
fn test_error_kind_codes_are_unique() {
    let kinds = [
        ExErrorKind::InvalidInput,
        ExErrorKind::NotFound,
        ExErrorKind::InvalidVersion,
        ExErrorKind::MissingLocalVersion,
        ExErrorKind::InvalidSettingValue,
        ExErrorKind::TenantRequired,
        ExErrorKind::PartialSync,
        ExErrorKind::Io,
        ExErrorKind::Serialization,
        ExErrorKind::Persistence,
        ExErrorKind::ExternalService,
        ExErrorKind::RateLimited,
        ExErrorKind::Timeout,
        ExErrorKind::Config,
        ExErrorKind::Unauthorised,
        ExErrorKind::Forbidden,
        ExErrorKind::Internal,
    ];

    let mut codes: Vec<_> = kinds.iter().map(|k| k.code()).collect();
    assert!(codes.iter().all(|c| c.starts_with("ERR_")));
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), kinds.len());
}

#[test]
fn test_serde_json_error_maps_to_serialization() {
    let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let ex_err: ExError = err.into();
    assert_eq!(ex_err.kind(), ExErrorKind::Serialization);
}
