#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a [`SymbolVector`](crate::SymbolVector) from per-tape conditions.
///
/// ```
/// use hypertape::{SymbolVector, vector};
///
/// assert_eq!(vector!['a', '#'], SymbolVector::parse("a#"));
/// ```
#[macro_export]
macro_rules! vector {
    [ $($sym:expr),* $(,)? ] => {
        $crate::SymbolVector::new([ $($sym),* ])
    };
}
