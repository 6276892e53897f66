//! Unit tests for `AppError` display format and helpers.

use inliner_session::AppError;

#[test]
fn display_prefixes_name_the_variant() {
    let cases = [
        (AppError::Config("bad".into()), "config: bad"),
        (AppError::Precondition("no targets".into()), "precondition: no targets"),
        (AppError::Convergence("still changing".into()), "convergence: still changing"),
        (AppError::Kernel("stream closed".into()), "kernel: stream closed"),
        (AppError::NotFound("m.f".into()), "not found: m.f"),
        (AppError::Io("denied".into()), "io: denied"),
    ];

    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn remote_display_includes_operation_and_trace() {
    let err = AppError::remote("run_pass:inline", "Traceback\nNameError: f");

    assert_eq!(err.to_string(), "remote: run_pass:inline: Traceback\nNameError: f");
}

#[test]
fn with_operation_relabels_only_remote_errors() {
    let relabelled = AppError::remote("execute", "boom").with_operation("undo");
    assert!(matches!(
        relabelled,
        AppError::Remote { ref operation, ref trace } if operation == "undo" && trace == "boom"
    ));

    let untouched = AppError::Kernel("write failed".into()).with_operation("undo");
    assert_eq!(untouched.to_string(), "kernel: write failed");
}

#[test]
fn precondition_detection() {
    assert!(AppError::Precondition("x".into()).is_precondition());
    assert!(!AppError::NotFound("x".into()).is_precondition());
}

#[test]
fn io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");

    let err: AppError = io.into();

    assert_eq!(err.to_string(), "io: pipe closed");
}

#[test]
fn toml_errors_convert_to_config() {
    let parse_err = toml::from_str::<toml::Value>("= nope").expect_err("invalid toml");

    let err: AppError = parse_err.into();

    assert!(err.to_string().starts_with("config: invalid config"));
}

#[test]
fn error_messages_have_no_trailing_period() {
    let err = AppError::Precondition("nothing to undo".into());
    assert!(!err.to_string().ends_with('.'));
}
