//! Converter dispatch tests
//!
//! Resolution order, container wrapping, error surfaces and the batch text path.

use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use royalbit_sheetbind::converter::{
    convert, convert_as, convert_field, convert_row_to_text, resolve_destination_type,
    ConverterKey, ConverterRegistry, DestinationType, FieldDescriptor, FnConverter, RegistryBuilder,
    TypeIdentity,
};
use royalbit_sheetbind::error::{ConvertError, RoutineError};
use royalbit_sheetbind::types::{CellData, CellKind, CellValue, Row, TextRow};
use royalbit_sheetbind::GlobalConfig;
use std::error::Error as _;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Debug)]
struct BadDigit(char);

impl fmt::Display for BadDigit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bad digit '{}'", self.0)
    }
}

impl std::error::Error for BadDigit {}

fn row(cells: Vec<(usize, CellValue)>) -> Row {
    cells.into_iter().collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// REGISTRY DISPATCH
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_registered_pairs_pass_through() {
    let registry = ConverterRegistry::with_defaults();
    let config = GlobalConfig::default();

    let n: f64 = convert_as(
        &CellValue::Number(2.25),
        &DestinationType::of::<f64>(),
        None,
        &registry,
        &config,
    )
    .unwrap();
    assert_eq!(n, 2.25);

    let b: bool = convert_as(
        &CellValue::Boolean(true),
        &DestinationType::of::<bool>(),
        None,
        &registry,
        &config,
    )
    .unwrap();
    assert!(b);

    let s: String = convert_as(
        &CellValue::Error("#DIV/0!".to_string()),
        &DestinationType::text(),
        None,
        &registry,
        &config,
    )
    .unwrap();
    assert_eq!(s, "#DIV/0!");
}

#[test]
fn test_each_call_invokes_the_routine_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut builder = RegistryBuilder::new();
    builder.register::<i64>(
        CellKind::Number,
        FnConverter::new(move |_: &CellValue, _, _: &GlobalConfig| -> Result<i64, RoutineError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(5)
        }),
    );
    let registry = builder.build();

    let value: i64 = convert_as(
        &CellValue::Number(1.0),
        &DestinationType::of::<i64>(),
        None,
        &registry,
        &GlobalConfig::default(),
    )
    .unwrap();
    assert_eq!(value, 5);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unknown_type_and_kind_is_not_found() {
    struct Unregistered;

    let registry = ConverterRegistry::with_defaults();
    for kind_cell in [
        CellValue::Empty,
        CellValue::Number(1.0),
        CellValue::String("x".to_string()),
    ] {
        let err = convert(
            &kind_cell,
            &DestinationType::of::<Unregistered>(),
            None,
            &registry,
            &GlobalConfig::default(),
        )
        .err()
        .unwrap();
        match err {
            ConvertError::ConverterNotFound { kind, target } => {
                assert_eq!(kind, kind_cell.kind());
                assert!(target.ends_with("Unregistered"));
            }
            other => panic!("expected ConverterNotFound, got {other}"),
        }
    }
}

#[test]
fn test_empty_cell_is_not_special_cased() {
    let registry = ConverterRegistry::with_defaults();
    let err = convert_field(
        &CellValue::Empty,
        Some(&FieldDescriptor::new::<i64>("qty")),
        &registry,
        &GlobalConfig::default(),
    )
    .err()
    .unwrap();
    assert_eq!(err.to_string(), "Converter not found, convert EMPTY to i64");

    // A registered EMPTY routine is used like any other
    let mut builder = RegistryBuilder::with_defaults();
    builder.register::<i64>(
        CellKind::Empty,
        FnConverter::new(|_: &CellValue, _, _: &GlobalConfig| -> Result<i64, RoutineError> {
            Ok(0)
        }),
    );
    let registry = builder.build();
    let value: i64 = convert_as(
        &CellValue::Empty,
        &DestinationType::of::<i64>(),
        None,
        &registry,
        &GlobalConfig::default(),
    )
    .unwrap();
    assert_eq!(value, 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// FIELD OVERRIDES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_field_converter_beats_registry() {
    let registry = ConverterRegistry::with_defaults();
    let field = FieldDescriptor::new::<String>("label").with_converter(Arc::new(FnConverter::new(
        |cell: &CellValue, _, _: &GlobalConfig| -> Result<String, RoutineError> {
            Ok(format!("custom:{}", cell.kind()))
        },
    )));

    let value: String = convert_as(
        &CellValue::Number(9.0),
        &resolve_destination_type(Some(&field)),
        Some(&field),
        &registry,
        &GlobalConfig::default(),
    )
    .unwrap();
    assert_eq!(value, "custom:NUMBER");
}

#[test]
fn test_field_converter_handles_unregistered_kind() {
    let registry = ConverterRegistry::with_defaults();
    let field = FieldDescriptor::new::<i64>("code").with_converter(Arc::new(FnConverter::new(
        |cell: &CellValue, _, _: &GlobalConfig| -> Result<i64, RoutineError> {
            match cell {
                CellValue::Error(_) => Ok(-1),
                _ => Ok(0),
            }
        },
    )));

    let value = convert_field(
        &CellValue::Error("#N/A".to_string()),
        Some(&field),
        &registry,
        &GlobalConfig::default(),
    )
    .unwrap();
    assert_eq!(*value.downcast::<i64>().unwrap(), -1);
}

#[test]
fn test_field_format_reaches_routine() {
    let registry = ConverterRegistry::with_defaults();
    let field = FieldDescriptor::new::<String>("price").with_format("0.00");
    let value = convert_field(
        &CellValue::Number(4.5),
        Some(&field),
        &registry,
        &GlobalConfig::default(),
    )
    .unwrap();
    assert_eq!(*value.downcast::<String>().unwrap(), "4.50");
}

#[test]
fn test_field_converter_reads_locale() {
    let registry = ConverterRegistry::with_defaults();
    let field = FieldDescriptor::new::<String>("price").with_converter(Arc::new(FnConverter::new(
        |cell: &CellValue, _, config: &GlobalConfig| -> Result<String, RoutineError> {
            match (cell, config.locale.as_str()) {
                (CellValue::Number(n), "de-DE") => Ok(n.to_string().replace('.', ",")),
                (CellValue::Number(n), _) => Ok(n.to_string()),
                _ => Err("not a number".into()),
            }
        },
    )));
    let config = GlobalConfig {
        locale: "de-DE".to_string(),
        ..GlobalConfig::default()
    };

    let value: String = convert_as(
        &CellValue::Number(4.5),
        &resolve_destination_type(Some(&field)),
        Some(&field),
        &registry,
        &config,
    )
    .unwrap();
    assert_eq!(value, "4,5");
}

// ═══════════════════════════════════════════════════════════════════════════
// DESTINATION TYPES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_resolution_rules() {
    assert_eq!(resolve_destination_type(None), DestinationType::text());
    assert_eq!(
        resolve_destination_type(Some(&FieldDescriptor::new::<f64>("x"))),
        DestinationType::of::<f64>()
    );

    let container = resolve_destination_type(Some(&FieldDescriptor::cell_data::<bool>("x")));
    assert!(container.is_container());
    assert_eq!(container.target(), TypeIdentity::of::<bool>());

    let raw = resolve_destination_type(Some(&FieldDescriptor::raw_cell_data("x")));
    assert!(raw.is_container());
    assert_eq!(raw.target(), TypeIdentity::text());
}

#[test]
fn test_container_field_is_rewrapped() {
    let registry = ConverterRegistry::with_defaults();
    let field = FieldDescriptor::cell_data::<NaiveDateTime>("shipped");
    let value = convert_field(
        &CellValue::Date(45292.5),
        Some(&field),
        &registry,
        &GlobalConfig::default(),
    )
    .unwrap();

    let data = value.downcast::<CellData<NaiveDateTime>>().unwrap();
    assert_eq!(data.cell, CellValue::Date(45292.5));
    assert_eq!(
        data.data,
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    );
}

#[test]
fn test_raw_container_field_converts_to_text() {
    let registry = ConverterRegistry::with_defaults();
    let field = FieldDescriptor::raw_cell_data("note");
    let value = convert_field(
        &CellValue::Boolean(false),
        Some(&field),
        &registry,
        &GlobalConfig::default(),
    )
    .unwrap();

    let data = value.downcast::<CellData<String>>().unwrap();
    assert_eq!(data.kind(), CellKind::Boolean);
    assert_eq!(data.data, "false");
}

#[test]
fn test_no_field_converts_to_text() {
    let registry = ConverterRegistry::with_defaults();
    let value = convert_field(&CellValue::Number(12.0), None, &registry, &GlobalConfig::default())
        .unwrap();
    assert_eq!(*value.downcast::<String>().unwrap(), "12");
}

// ═══════════════════════════════════════════════════════════════════════════
// ROUTINE FAILURES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_routine_failure_keeps_original_cause() {
    let mut builder = RegistryBuilder::new();
    builder.register::<i64>(
        CellKind::String,
        FnConverter::new(|_: &CellValue, _, _: &GlobalConfig| -> Result<i64, RoutineError> {
            Err(Box::new(BadDigit('x')))
        }),
    );
    let registry = builder.build();

    let err = convert(
        &CellValue::String("1x".to_string()),
        &DestinationType::of::<i64>(),
        None,
        &registry,
        &GlobalConfig::default(),
    )
    .err()
    .unwrap();

    match &err {
        ConvertError::ConversionFailed { cell, target, .. } => {
            assert_eq!(cell, &CellValue::String("1x".to_string()));
            assert_eq!(*target, "i64");
        }
        other => panic!("expected ConversionFailed, got {other}"),
    }
    let cause = err.source().unwrap();
    assert_eq!(cause.downcast_ref::<BadDigit>().map(|b| b.0), Some('x'));
}

#[test]
fn test_builtin_parse_failure_is_conversion_failed() {
    let registry = ConverterRegistry::with_defaults();
    let err = convert_field(
        &CellValue::String("twelve".to_string()),
        Some(&FieldDescriptor::new::<i64>("qty")),
        &registry,
        &GlobalConfig::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, ConvertError::ConversionFailed { .. }));
    assert!(err.source().unwrap().to_string().contains("twelve"));
}

#[test]
fn test_invalid_date_pattern_is_conversion_failed() {
    let registry = ConverterRegistry::with_defaults();
    for pattern in ["%Y-%", "%Q"] {
        let field = FieldDescriptor::new::<String>("shipped").with_format(pattern);
        let err = convert_field(
            &CellValue::Date(45292.0),
            Some(&field),
            &registry,
            &GlobalConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConvertError::ConversionFailed { .. }));
        assert!(err.source().unwrap().to_string().contains(pattern));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// BATCH TEXT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_row_to_text_with_empty_cell() {
    let mut builder = RegistryBuilder::with_defaults();
    builder.register::<String>(
        CellKind::Number,
        FnConverter::new(|_: &CellValue, _, _: &GlobalConfig| -> Result<String, RoutineError> {
            Ok("3.5".to_string())
        }),
    );
    let registry = builder.build();

    let input = row(vec![
        (0, CellValue::String("a".to_string())),
        (1, CellValue::Empty),
        (2, CellValue::Number(3.5)),
    ]);
    let text = convert_row_to_text(&input, &registry, &GlobalConfig::default()).unwrap();

    let expected: TextRow = [
        (0, Some("a".to_string())),
        (1, None),
        (2, Some("3.5".to_string())),
    ]
    .into_iter()
    .collect();
    assert_eq!(text, expected);
}

#[test]
fn test_row_to_text_empty_needs_no_routine() {
    let registry = RegistryBuilder::new().build();
    let input = row(vec![(0, CellValue::Empty), (5, CellValue::Empty)]);
    let text = convert_row_to_text(&input, &registry, &GlobalConfig::default()).unwrap();
    assert_eq!(text.keys().copied().collect::<Vec<_>>(), vec![0, 5]);
    assert!(text.values().all(Option::is_none));
}

#[test]
fn test_row_to_text_fails_on_first_missing_routine() {
    let mut builder = RegistryBuilder::new();
    builder.register::<String>(
        CellKind::String,
        FnConverter::new(|_: &CellValue, _, _: &GlobalConfig| -> Result<String, RoutineError> {
            Ok("a".to_string())
        }),
    );
    let registry = builder.build();

    let input = row(vec![
        (0, CellValue::String("a".to_string())),
        (1, CellValue::Date(45292.0)),
    ]);
    let err = convert_row_to_text(&input, &registry, &GlobalConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::ConverterNotFound {
            kind: CellKind::Date,
            ..
        }
    ));
}

#[test]
fn test_row_to_text_fails_on_routine_error() {
    let mut builder = RegistryBuilder::new();
    builder.register::<String>(
        CellKind::Number,
        FnConverter::new(|_: &CellValue, _, _: &GlobalConfig| -> Result<String, RoutineError> {
            Err("no".into())
        }),
    );
    let registry = builder.build();

    let input = row(vec![(0, CellValue::Number(1.0)), (1, CellValue::Number(2.0))]);
    let err = convert_row_to_text(&input, &registry, &GlobalConfig::default()).unwrap_err();
    match err {
        ConvertError::ConversionFailed { cell, .. } => assert_eq!(cell, CellValue::Number(1.0)),
        other => panic!("expected ConversionFailed, got {other}"),
    }
}

#[test]
fn test_row_to_text_with_invalid_date_format() {
    let registry = ConverterRegistry::with_defaults();
    let config = GlobalConfig {
        date_format: "%Y-%".to_string(),
        ..GlobalConfig::default()
    };
    let input = row(vec![
        (0, CellValue::String("bolt".to_string())),
        (1, CellValue::Date(45292.0)),
    ]);
    let err = convert_row_to_text(&input, &registry, &config).unwrap_err();
    match err {
        ConvertError::ConversionFailed { cell, .. } => assert_eq!(cell, CellValue::Date(45292.0)),
        other => panic!("expected ConversionFailed, got {other}"),
    }
}

#[test]
fn test_row_to_text_rejects_non_text_routine() {
    let mut builder = RegistryBuilder::new();
    builder.register_key(
        ConverterKey::of::<String>(CellKind::Number),
        Arc::new(FnConverter::new(
            |_: &CellValue, _, _: &GlobalConfig| -> Result<f64, RoutineError> { Ok(1.0) },
        )),
    );
    let registry = builder.build();

    let input = row(vec![(0, CellValue::Number(1.0))]);
    let err = convert_row_to_text(&input, &registry, &GlobalConfig::default()).unwrap_err();
    assert!(matches!(err, ConvertError::ConversionFailed { .. }));
}

// ═══════════════════════════════════════════════════════════════════════════
// SHARED REGISTRY
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_registry_shared_across_threads() {
    let registry = Arc::new(ConverterRegistry::with_defaults());
    let config = Arc::new(GlobalConfig::default());

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            let config = Arc::clone(&config);
            thread::spawn(move || {
                (0..100)
                    .map(|i| {
                        let input = row(vec![
                            (0, CellValue::Number((worker * 100 + i) as f64)),
                            (1, CellValue::Empty),
                        ]);
                        convert_row_to_text(&input, &registry, &config).unwrap()
                    })
                    .filter(|text| text[&1].is_none())
                    .count()
            })
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 400);
}
