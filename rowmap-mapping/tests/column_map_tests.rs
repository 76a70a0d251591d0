use std::io;
use std::sync::{Arc, Mutex};

use rowmap_mapping::{ColumnMap, FieldPath, MapperConfig, build_column_map, lowercase};
use rowmap_test_utils::init_tracing_for_tests;
use rowmap_types::{ConvertError, FromColumn, Record, Value, ValueType, impl_record};
use time::OffsetDateTime;

#[derive(Debug, Default, Clone, PartialEq)]
struct EmbeddedString {
    str: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Address {
    city: String,
    zip: Option<u32>,
}

impl_record!(EmbeddedString { str });
impl_record!(Address { city, zip });

fn build<R: Record>(config: &MapperConfig) -> ColumnMap {
    build_column_map(R::descriptor(), config)
}

fn path(map: &ColumnMap, column: &str) -> Vec<usize> {
    map.get(column)
        .unwrap_or_else(|| panic!("missing column {column}"))
        .path
        .indices()
        .to_vec()
}

#[test]
fn embedded_record_is_flattened_by_default() {
    init_tracing_for_tests();
    #[derive(Default)]
    struct Flattened {
        embedded: EmbeddedString,
        int: i64,
        flag: bool,
    }
    impl_record!(Flattened {
        #[embedded]
        embedded,
        int,
        flag,
    });

    let map = build::<Flattened>(&MapperConfig::default());
    assert_eq!(map.columns(), vec!["flag", "int", "str"]);
    assert_eq!(path(&map, "str"), vec![0, 0]);
    assert!(map.get("str").expect("str").path.is_nested());
    assert_eq!(map.get("str").expect("str").field, "embedded.str");
}

#[test]
fn named_embedded_record_gets_a_prefix_unless_followed() {
    #[derive(Default)]
    struct Named {
        inner: EmbeddedString,
    }
    impl_record!(Named {
        #[embedded]
        inner: r#"db:"embedded""#,
    });

    #[derive(Default)]
    struct NamedFollow {
        inner: EmbeddedString,
    }
    impl_record!(NamedFollow {
        #[embedded]
        inner: r#"db:"name_isnt_evaluated_due_to_follow_tag,follow""#,
    });

    let named = build::<Named>(&MapperConfig::default());
    assert_eq!(named.columns(), vec!["embedded.str"]);

    let followed = build::<NamedFollow>(&MapperConfig::default());
    assert_eq!(followed.columns(), vec!["str"]);
}

#[test]
fn follow_flattens_named_and_optional_fields() {
    #[derive(Default)]
    struct Follower {
        plain: EmbeddedString,
        boxed: Option<Box<Address>>,
    }
    impl_record!(Follower {
        plain: r#"scan:"follow""#,
        boxed: r#"db:"name_isnt_evaluated" scan:"follow""#,
    });

    let map = build::<Follower>(&MapperConfig::default());
    assert_eq!(map.columns(), vec!["city", "str", "zip"]);
    assert_eq!(path(&map, "city"), vec![1, 0]);
    // Following keeps the parent's optionality.
    assert!(!map.get("city").expect("city").optional);
}

#[test]
fn notate_namespaces_under_the_column_name() {
    #[derive(Default)]
    struct Customer {
        id: i64,
        address: Address,
        billing: Option<Box<Address>>,
    }
    impl_record!(Customer {
        id,
        address: r#"db:"addr" scan:"notate""#,
        billing: r#"scan:"notate""#,
    });

    let map = build::<Customer>(&MapperConfig::default());
    assert_eq!(
        map.columns(),
        vec!["addr.city", "addr.zip", "billing.city", "billing.zip", "id"]
    );

    let city = map.get("addr.city").expect("addr.city");
    assert_eq!(city.path, FieldPath::from(vec![1, 0]));
    assert!(!city.optional);

    let billing_city = map.get("billing.city").expect("billing.city");
    assert!(billing_city.optional);
    assert_eq!(billing_city.value_type, ValueType::of::<String>());
    let billing_zip = map.get("billing.zip").expect("billing.zip");
    assert_eq!(billing_zip.value_type, ValueType::of::<Option<u32>>());
}

#[test]
fn optionality_is_sticky_down_the_tree() {
    #[derive(Default)]
    struct Leaf {
        value: i32,
    }
    #[derive(Default)]
    struct Middle {
        leaf: Leaf,
    }
    #[derive(Default)]
    struct Top {
        middle: Option<Box<Middle>>,
    }
    impl_record!(Leaf { value });
    impl_record!(Middle { leaf: r#"scan:"notate""# });
    impl_record!(Top { middle: r#"scan:"notate""# });

    let map = build::<Top>(&MapperConfig::default());
    let entry = map.get("middle.leaf.value").expect("entry");
    assert!(entry.optional);
    assert_eq!(entry.path.indices(), &[0, 0, 0]);
    assert_eq!(entry.field, "middle.leaf.value");
}

#[test]
fn notate_by_default_applies_unless_embed() {
    #[derive(Default)]
    struct Profile {
        home: Address,
        work: Address,
        name: String,
    }
    impl_record!(Profile {
        home,
        work: r#"scan:"notate,embed""#,
        name,
    });

    let off = build::<Profile>(&MapperConfig::default());
    assert_eq!(off.columns(), vec!["name"]);

    let on = build::<Profile>(&MapperConfig::default().with_notate_by_default(true));
    assert_eq!(on.columns(), vec!["home.city", "home.zip", "name"]);
}

#[test]
fn direct_fields_win_over_followed_fields() {
    #[derive(Default)]
    struct Shadow {
        id: i64,
        name: String,
    }
    #[derive(Default)]
    struct Other {
        name: String,
    }
    #[derive(Default)]
    struct Row {
        shadow: Shadow,
        id: i64,
        other: Other,
    }
    impl_record!(Shadow { id, name });
    impl_record!(Other { name });
    impl_record!(Row {
        shadow: r#"scan:"follow""#,
        id,
        other: r#"scan:"follow""#,
    });

    let map = build::<Row>(&MapperConfig::default());
    assert_eq!(map.columns(), vec!["id", "name"]);
    // The direct field is declared after the followed one and still wins.
    assert_eq!(path(&map, "id"), vec![1]);
    // Between followed records, declaration order decides.
    assert_eq!(path(&map, "name"), vec![0, 1]);
}

#[test]
fn earlier_direct_field_keeps_a_colliding_name() {
    #[derive(Default)]
    struct Duplicated {
        key: i64,
        id: i64,
    }
    impl_record!(Duplicated {
        key: r#"db:"id""#,
        id,
    });

    let map = build::<Duplicated>(&MapperConfig::default());
    assert_eq!(map.columns(), vec!["id"]);
    let entry = map.get("id").expect("id");
    assert_eq!(entry.field, "key");
    assert_eq!(entry.path, FieldPath::from(vec![0]));
}

#[test]
fn ignored_and_unsupported_fields_are_skipped() {
    init_tracing_for_tests();
    #[derive(Default)]
    struct Secretive {
        id: i64,
        secret: String,
        hidden: Address,
        weird: Option<Option<i64>>,
    }
    impl_record!(Secretive {
        id,
        secret: r#"db:"-""#,
        hidden: r#"db:"-" scan:"notate""#,
        weird,
    });

    let map = build::<Secretive>(&MapperConfig::default().with_notate_by_default(true));
    assert_eq!(map.columns(), vec!["id"]);
}

#[test]
fn explicit_names_and_rename_functions() {
    #[allow(non_snake_case)]
    #[derive(Default)]
    struct Mixed {
        UserID: i64,
        HTTPStatus: u16,
        renamed: String,
    }
    impl_record!(Mixed {
        UserID,
        HTTPStatus,
        renamed: r#"db:"display_name""#,
    });

    let snake = build::<Mixed>(&MapperConfig::default());
    assert_eq!(snake.columns(), vec!["display_name", "http_status", "user_id"]);

    let lower = build::<Mixed>(&MapperConfig::default().with_rename(lowercase));
    assert_eq!(lower.columns(), vec!["display_name", "httpstatus", "userid"]);

    let custom = build::<Mixed>(&MapperConfig::default().with_rename(|name| format!("c_{name}")));
    assert_eq!(
        custom.columns(),
        vec!["c_HTTPStatus", "c_UserID", "display_name"]
    );
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Point {
    x: i64,
    y: i64,
}

impl_record!(Point { x, y });

impl FromColumn for Point {
    fn from_column(value: Value) -> Result<Self, ConvertError> {
        let text = String::from_column(value)?;
        let (x, y) = text
            .split_once(',')
            .ok_or_else(|| ConvertError::Custom(format!("not a point: {text}")))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<i64>()
                .map_err(|err| ConvertError::Custom(err.to_string()))
        };
        Ok(Point {
            x: parse(x)?,
            y: parse(y)?,
        })
    }
}

#[test]
fn value_records_and_timestamps_are_leaves() {
    #[derive(Default)]
    struct Shape {
        origin: Point,
        corner: Option<Point>,
        created_at: Option<OffsetDateTime>,
    }
    impl_record!(Shape {
        origin: r#"scan:"notate""#,
        corner,
        created_at,
    });

    let plain = build::<Shape>(&MapperConfig::default());
    assert_eq!(plain.columns(), vec!["created_at", "origin.x", "origin.y"]);

    let config = MapperConfig::default().with_value_record::<Point>();
    let map = build::<Shape>(&config);
    assert_eq!(map.columns(), vec!["corner", "created_at", "origin"]);
    assert_eq!(
        map.get("origin").expect("origin").value_type,
        ValueType::of::<Point>()
    );
    assert_eq!(
        map.get("corner").expect("corner").value_type,
        ValueType::of::<Option<Point>>()
    );
    assert_eq!(
        map.get("created_at").expect("created_at").value_type,
        ValueType::of::<Option<OffsetDateTime>>()
    );
}

#[test]
fn self_referential_records_terminate() {
    init_tracing_for_tests();
    #[derive(Default)]
    struct Node {
        id: i64,
        parent: Option<Box<Node>>,
    }
    impl_record!(Node {
        id,
        parent: r#"scan:"notate""#,
    });

    let map = build::<Node>(&MapperConfig::default());
    assert_eq!(map.columns(), vec!["id"]);
}

#[test]
fn building_twice_yields_identical_maps() {
    #[derive(Default)]
    struct Composite {
        id: i64,
        address: Option<Box<Address>>,
        embedded: EmbeddedString,
    }
    impl_record!(Composite {
        id,
        address: r#"scan:"notate""#,
        #[embedded]
        embedded,
    });

    let config = MapperConfig::default();
    let first = build::<Composite>(&config);
    let second = build::<Composite>(&config);
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
    assert!(first.iter().all(|(name, entry)| name == entry.column_name));
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn undirected_nested_record_is_skipped_with_a_debug_event() {
    #[derive(Default)]
    struct Customer {
        id: i64,
        addr: Address,
    }
    impl_record!(Customer { id, addr });

    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let map = tracing::subscriber::with_default(subscriber, || {
        build::<Customer>(&MapperConfig::default())
    });
    assert_eq!(map.columns(), vec!["id"]);

    let output = String::from_utf8(log.0.lock().expect("log buffer").clone()).expect("utf8");
    assert!(output.contains("DEBUG"));
    assert!(output.contains("nested record without follow or notate directive is not mapped"));
    assert!(output.contains("addr"));
}
