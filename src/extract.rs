use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use ahash::HashMap;

use crate::cursor::Cursor;
use crate::error::Error;

/// Turns the node under a cursor into a value.
pub type Extractor<R> = Rc<dyn Fn(&Cursor) -> Result<R, Error>>;

/// Extractors by result type.
///
/// A fresh registry knows how to extract `i32`, `i64`, `f32` and `f64` from
/// the text of a node. Registering an extractor for a type replaces any
/// earlier one.
pub struct ExtractorRegistry {
    extractors: HashMap<TypeId, Box<dyn Any>>,
}

impl ExtractorRegistry {
    /// A registry with the built-in numeric extractors.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(parse_text::<i32>);
        registry.register(parse_text::<i64>);
        registry.register(parse_text::<f32>);
        registry.register(parse_text::<f64>);
        registry
    }

    /// A registry without any extractors.
    pub fn empty() -> Self {
        ExtractorRegistry {
            extractors: HashMap::default(),
        }
    }

    /// Register `extractor` for result type `R`, replacing any earlier
    /// extractor for that type.
    pub fn register<R, F>(&mut self, extractor: F)
    where
        R: 'static,
        F: Fn(&Cursor) -> Result<R, Error> + 'static,
    {
        let extractor: Extractor<R> = Rc::new(extractor);
        if self
            .extractors
            .insert(TypeId::of::<R>(), Box::new(extractor))
            .is_some()
        {
            tracing::debug!(type_name = type_name::<R>(), "replaced extractor");
        }
    }

    /// The extractor registered for `R`, if any.
    pub fn resolve<R: 'static>(&self) -> Option<Extractor<R>> {
        self.extractors
            .get(&TypeId::of::<R>())
            .and_then(|extractor| extractor.downcast_ref::<Extractor<R>>())
            .cloned()
    }

    pub fn contains<R: 'static>(&self) -> bool {
        self.extractors.contains_key(&TypeId::of::<R>())
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("len", &self.extractors.len())
            .finish()
    }
}

// text is parsed as-is, surrounding whitespace makes it fail
fn parse_text<R>(cursor: &Cursor) -> Result<R, Error>
where
    R: FromStr,
    Error: From<R::Err>,
{
    Ok(cursor.text().unwrap_or_default().parse::<R>()?)
}
