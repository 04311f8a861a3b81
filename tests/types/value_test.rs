use std::cmp::Ordering;

use baca::types::value::{Affinity, Value};

#[test]
fn test_value_type_names() {
    assert_eq!(Value::Null.type_name(), "null");
    assert_eq!(Value::Integer(42).type_name(), "integer");
    assert_eq!(Value::Real(3.5).type_name(), "real");
    assert_eq!(Value::Text("hello".to_string()).type_name(), "text");
    assert_eq!(Value::Blob(vec![1, 2]).type_name(), "blob");
    assert!(Value::Null.is_null());
    assert_eq!(Value::Integer(7).as_integer(), Some(7));
    assert_eq!(Value::Real(7.0).as_integer(), None);
}

#[test]
fn test_sql_equality() {
    assert!(Value::Integer(5).sql_eq(&Value::Integer(5)));
    assert!(Value::Integer(5).sql_eq(&Value::Real(5.0)));
    assert!(Value::Real(5.0).sql_eq(&Value::Integer(5)));
    assert!(!Value::Integer(5).sql_eq(&Value::Real(5.5)));
    assert!(Value::Text("Yellow".to_string()).sql_eq(&Value::Text("Yellow".to_string())));
    assert!(!Value::Text("Yellow".to_string()).sql_eq(&Value::Text("yellow".to_string())));
    // Storage classes never mix; literals are converted before comparing.
    assert!(!Value::Text("12".to_string()).sql_eq(&Value::Integer(12)));
    assert!(!Value::Text("abc".to_string()).sql_eq(&Value::Integer(0)));

    // NULL never equals anything, not even NULL.
    assert!(!Value::Null.sql_eq(&Value::Null));
    assert!(!Value::Null.sql_eq(&Value::Integer(0)));
}

#[test]
fn test_key_ordering_for_indexing() {
    assert_eq!(Value::Integer(5).key_cmp(&Value::Integer(10)), Ordering::Less);
    assert_eq!(Value::Integer(5).key_cmp(&Value::Real(5.5)), Ordering::Less);
    assert_eq!(Value::Real(3.25).key_cmp(&Value::Integer(4)), Ordering::Less);
    assert_eq!(Value::Real(4.0).key_cmp(&Value::Integer(4)), Ordering::Equal);

    // Text orders byte-wise: uppercase sorts before lowercase.
    assert_eq!(
        Value::Text("Zebra".to_string()).key_cmp(&Value::Text("apple".to_string())),
        Ordering::Less
    );
    assert_eq!(
        Value::Text("apple".to_string()).key_cmp(&Value::Text("apples".to_string())),
        Ordering::Less
    );

    // NULL < numbers < text < blob
    assert_eq!(Value::Null.key_cmp(&Value::Integer(i64::MIN)), Ordering::Less);
    assert_eq!(
        Value::Integer(i64::MAX).key_cmp(&Value::Text(String::new())),
        Ordering::Less
    );
    assert_eq!(
        Value::Text("zzz".to_string()).key_cmp(&Value::Blob(Vec::new())),
        Ordering::Less
    );
    assert_eq!(Value::Null.key_cmp(&Value::Null), Ordering::Equal);
}

#[test]
fn test_display_formatting() {
    assert_eq!(Value::Null.to_string(), "");
    assert_eq!(Value::Integer(-12).to_string(), "-12");
    assert_eq!(Value::Real(2.0).to_string(), "2.0");
    assert_eq!(Value::Real(2.5).to_string(), "2.5");
    assert_eq!(Value::Text("fuji".to_string()).to_string(), "fuji");
    assert_eq!(Value::Blob(b"raw".to_vec()).to_string(), "raw");
}

#[test]
fn test_sql_eq_agrees_with_key_order() {
    let values = [
        Value::Integer(3),
        Value::Real(3.0),
        Value::Real(-0.0),
        Value::Integer(0),
        Value::Text("3".to_string()),
        Value::Text("3.0".to_string()),
        Value::Blob(b"3".to_vec()),
    ];
    for a in &values {
        for b in &values {
            assert_eq!(a.sql_eq(b), a.key_cmp(b) == Ordering::Equal, "{a:?} vs {b:?}");
        }
    }
}

#[test]
fn test_affinity_from_declared_type() {
    assert_eq!(Affinity::from_declared_type("INTEGER"), Affinity::Integer);
    assert_eq!(Affinity::from_declared_type("bigint"), Affinity::Integer);
    assert_eq!(Affinity::from_declared_type("VARCHAR(20)"), Affinity::Text);
    assert_eq!(Affinity::from_declared_type("text"), Affinity::Text);
    assert_eq!(Affinity::from_declared_type(""), Affinity::Blob);
    assert_eq!(Affinity::from_declared_type("BLOB"), Affinity::Blob);
    assert_eq!(Affinity::from_declared_type("DOUBLE PRECISION"), Affinity::Real);
    assert_eq!(Affinity::from_declared_type("DECIMAL(10,2)"), Affinity::Numeric);
}

#[test]
fn test_literal_takes_column_affinity() {
    let text = |s: &str| Value::Text(s.to_string());
    assert_eq!(text("3").with_affinity(Affinity::Integer), Value::Integer(3));
    assert_eq!(text(" 3.0 ").with_affinity(Affinity::Numeric), Value::Integer(3));
    assert_eq!(text("2.5").with_affinity(Affinity::Integer), Value::Real(2.5));
    assert_eq!(text("7").with_affinity(Affinity::Real), Value::Real(7.0));
    assert_eq!(text("abc").with_affinity(Affinity::Integer), text("abc"));
    assert_eq!(text("inf").with_affinity(Affinity::Real), text("inf"));
    assert_eq!(Value::Integer(3).with_affinity(Affinity::Text), text("3"));
    assert_eq!(Value::Real(1.5).with_affinity(Affinity::Text), text("1.5"));
    assert_eq!(text("3").with_affinity(Affinity::Blob), text("3"));
    assert_eq!(Value::Null.with_affinity(Affinity::Integer), Value::Null);
}
