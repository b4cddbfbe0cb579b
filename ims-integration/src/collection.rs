/// A collection that is known to hold exactly one `T`, or many.
pub mod one_or_many;

/// A collection that may hold zero, one, or many `T`s.
pub mod none_one_or_many;

pub use none_one_or_many::NoneOneOrMany;
pub use one_or_many::OneOrMany;
