//! Derive macro for Hazelcast Compact serialization.
//!
//! [`HazelcastCompact`] generates a `hazelcast_compact::Compact`
//! implementation that writes and reads every named field of a struct.
//!
//! # Example
//!
//! ```ignore
//! use hazelcast_compact_derive::HazelcastCompact;
//!
//! #[derive(HazelcastCompact)]
//! #[hazelcast(type_name = "com.example.Person")]
//! struct Person {
//!     name: String,
//!     age: i32,
//!     #[hazelcast(field_name = "emailAddress")]
//!     email: Option<String>,
//!     #[hazelcast(compact)]
//!     address: Option<Address>,
//! }
//! ```

extern crate proc_macro;

mod compact;

use proc_macro::TokenStream;

/// Derives the `Compact` trait for a struct.
///
/// # Attributes
///
/// ## Struct-level
/// - `#[hazelcast(type_name = "...")]` sets the compact type name (defaults to
///   the Rust struct name).
///
/// ## Field-level
/// - `#[hazelcast(field_name = "...")]` overrides the wire field name (defaults
///   to the Rust field name).
/// - `#[hazelcast(skip)]` skips the field; it is filled with `Default::default()`
///   on read.
/// - `#[hazelcast(compact)]` marks a field whose type itself implements `Compact`.
///
/// # Supported Field Types
///
/// | Rust type | Field kind |
/// |-----------|------------|
/// | `bool`, `i8`, `i16`, `i32`, `i64`, `f32`, `f64` | the primitive kind |
/// | `String`, `Decimal`, `NaiveTime`, `NaiveDate`, `NaiveDateTime`, `DateTime<FixedOffset>` | the reference kind, never null |
/// | `Option<T>` of the above | nullable primitive, or the nullable reference kind |
/// | `Vec<T>`, `Option<Vec<T>>` of primitives | array of the primitive kind |
/// | `Vec<Option<T>>` of primitives | array of the nullable primitive kind |
/// | `Vec<T>`, `Vec<Option<T>>` of references | array of the reference kind |
///
/// With `#[hazelcast(compact)]`, `T`, `Option<T>`, `Vec<T>` and
/// `Vec<Option<T>>` map to nested records and arrays of them. Any other type
/// is rejected at compile time with an error pointing at the field.
#[proc_macro_derive(HazelcastCompact, attributes(hazelcast))]
pub fn derive_compact(input: TokenStream) -> TokenStream {
    compact::derive_compact_impl(input)
}
