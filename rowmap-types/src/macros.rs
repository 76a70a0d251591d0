//! Declarative macros generating [`ColumnType`](crate::ColumnType) and
//! [`Record`](crate::Record) implementations.

/// Declares one or more [`FromColumn`](crate::FromColumn) types as leaf column
/// types.
///
/// ```ignore
/// struct Cents(i64);
/// impl FromColumn for Cents { /* ... */ }
/// rowmap_types::impl_column_value!(Cents);
/// ```
#[macro_export]
macro_rules! impl_column_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl $crate::ColumnType for $t {
                fn field_kind() -> $crate::FieldKind {
                    $crate::FieldKind::Value($crate::ValueType::of::<$t>())
                }

                fn optional_kind() -> $crate::FieldKind {
                    $crate::FieldKind::Value($crate::ValueType::of::<::std::option::Option<$t>>())
                }

                fn field_mut(&mut self) -> $crate::FieldMut<'_> {
                    $crate::FieldMut::Value(self)
                }
            }
        )*
    };
}

/// Implements [`Record`](crate::Record) and [`ColumnType`](crate::ColumnType)
/// for a struct.
///
/// Fields are listed in declaration order. Each may carry an annotation string
/// using struct-tag syntax and the `#[embedded]` marker for transparent
/// embedding. Fields left out of the list are invisible to the mapper.
///
/// ```ignore
/// #[derive(Default)]
/// struct Base { id: i64 }
///
/// #[derive(Default)]
/// struct User {
///     base: Base,
///     name: String,
///     address: Option<Box<Address>>,
///     cache: Vec<String>,
/// }
///
/// impl_record!(Base { id });
/// impl_record!(User {
///     #[embedded]
///     base,
///     name: r#"db:"user_name""#,
///     address: r#"db:"addr" scan:"notate""#,
/// });
/// ```
///
/// The target type must not be generic.
#[macro_export]
macro_rules! impl_record {
    ($ty:ty { $( $(#[$flag:ident])* $field:ident $(: $tag:literal)? ),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn descriptor() -> &'static $crate::RecordDescriptor {
                static DESCRIPTOR: ::std::sync::OnceLock<$crate::RecordDescriptor> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR.get_or_init(|| {
                    $crate::RecordDescriptor::new::<$ty>(::std::vec![
                        $(
                            $crate::FieldDescriptor::new(
                                ::std::stringify!($field),
                                $crate::descriptor::kind_of(|record: &$ty| &record.$field),
                            )
                            $( .with_tag($tag) )?
                            $( .$flag() )*
                        ),*
                    ])
                })
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field_mut(&mut self, index: usize) -> ::std::option::Option<$crate::FieldMut<'_>> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return ::std::option::Option::Some(
                            $crate::ColumnType::field_mut(&mut self.$field),
                        );
                    }
                    position += 1;
                )*
                ::std::option::Option::None
            }
        }

        impl $crate::ColumnType for $ty {
            fn field_kind() -> $crate::FieldKind {
                $crate::FieldKind::Record(<$ty as $crate::Record>::descriptor)
            }

            fn optional_kind() -> $crate::FieldKind {
                $crate::FieldKind::OptionalRecord(<$ty as $crate::Record>::descriptor)
            }

            fn field_mut(&mut self) -> $crate::FieldMut<'_> {
                $crate::FieldMut::Record(self)
            }

            fn default_value() -> ::std::option::Option<Self> {
                ::std::option::Option::Some(::std::default::Default::default())
            }

            fn as_record_mut(&mut self) -> ::std::option::Option<&mut dyn $crate::DynRecord> {
                ::std::option::Option::Some(self)
            }
        }
    };
}
