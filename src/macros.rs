#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a record [`Value`](crate::Value).
///
/// ```
/// use missive::{Value, record};
///
/// let v = record!("Object1" { value: 150, label: "big" });
/// assert_eq!(v.field("value").unwrap(), &Value::Int(150));
/// ```
#[macro_export]
macro_rules! record {
    ($ty:literal { $($field:ident : $value:expr),* $(,)? }) => {
        $crate::Value::Record($crate::Record::new($ty) $(.with(stringify!($field), $value))*)
    };
    ($ty:literal) => {
        $crate::Value::Record($crate::Record::new($ty))
    };
}
